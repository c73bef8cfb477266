use std::io;
use palace_chat_core::{ChatRole, ChatView, Message};
use ratatui::{backend::Backend, text::Line, Terminal};

use crate::input::InputBox;
use crate::markup::render_html;
use crate::ui;

/// One rendered history entry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub role: ChatRole,
    pub lines: Vec<Line<'static>>,
}

/// Everything the screen shows. Kept apart from the terminal so rendering can
/// borrow it while the terminal draws.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub entries: Vec<Entry>,
    pub input: InputBox,
    pub submit_enabled: bool,
    pub busy: bool,
    pub chat_type: String,
    pub endpoint: String,

    // History scrolling
    pub scroll: u16,
    pub follow_bottom: bool,

    // Sizes from the last render, for scroll and wrap calculations
    pub history_height: u16,
    pub history_width: u16,
    pub input_width: u16,
}

impl ViewState {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            input: InputBox::new(),
            submit_enabled: true,
            busy: false,
            chat_type: String::new(),
            endpoint: endpoint.into(),
            scroll: 0,
            follow_bottom: true,
            history_height: 0,
            history_width: 0,
            input_width: 0,
        }
    }

    pub fn scroll_up(&mut self) {
        self.follow_bottom = false;
        self.scroll = self.scroll.saturating_sub(self.history_height.max(1));
    }

    /// Scroll down a page; reaching the end re-attaches to the bottom.
    pub fn scroll_down(&mut self) {
        let max_scroll = ui::max_history_scroll(self);
        self.scroll = self.scroll.saturating_add(self.history_height.max(1));
        if self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow_bottom = true;
        }
    }

    pub fn clear_history(&mut self) {
        self.entries.clear();
        self.scroll = 0;
        self.follow_bottom = true;
    }
}

pub struct TuiView<B: Backend> {
    terminal: Terminal<B>,
    pub state: ViewState,
}

impl<B: Backend> TuiView<B> {
    pub fn new(terminal: Terminal<B>, endpoint: impl Into<String>) -> Self {
        Self {
            terminal,
            state: ViewState::new(endpoint),
        }
    }

    pub fn draw(&mut self) -> io::Result<()> {
        let state = &mut self.state;
        self.terminal.draw(|frame| ui::render(state, frame))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// The turn awaits its request without returning to the event loop, so
    /// changes that must be visible during it are drawn immediately.
    fn redraw(&mut self) {
        if let Err(err) = self.draw() {
            log::warn!("redraw failed: {}", err);
        }
    }
}

impl<B: Backend> ChatView for TuiView<B> {
    fn input_value(&self) -> String {
        self.state.input.value().to_string()
    }

    fn clear_input(&mut self) {
        self.state.input.clear();
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.state.input.enabled = enabled;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.state.submit_enabled = enabled;
    }

    fn set_busy(&mut self, busy: bool) {
        self.state.busy = busy;
        if busy {
            // Keep "Thinking..." in view
            self.state.follow_bottom = true;
        }
        self.redraw();
    }

    fn focus_input(&mut self) {
        self.state.input.focused = true;
    }

    fn append_message(&mut self, message: &Message, html: &str) {
        self.state.entries.push(Entry {
            role: message.role,
            lines: render_html(html),
        });
        self.redraw();
    }

    fn scroll_to_bottom(&mut self) {
        self.state.follow_bottom = true;
        self.state.scroll = ui::max_history_scroll(&self.state);
    }

    fn reset_input_height(&mut self) {
        self.state.input.reset_height();
    }

    fn input_scroll_height(&self) -> u16 {
        let width = match self.state.input_width {
            0 => 80,
            w => w as usize,
        };
        self.state.input.content_rows(width)
    }

    fn set_input_height(&mut self, height: u16) {
        self.state.input.set_height(height);
    }
}
