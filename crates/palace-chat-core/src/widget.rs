//! Turn lifecycle for the chat widget.
//!
//! Each turn moves `Idle -> Sending -> (Success | Failure) -> Idle`. The busy
//! state is held by a [`TurnGuard`] for the duration of the request, so the
//! controls come back on every exit path.

use crate::chat_type::ChatType;
use crate::format::format_message;
use crate::state::{Message, UiState};
use crate::transport::Transport;

/// The elements the widget drives: an input box, a submit control, a
/// scrollable history and a busy indicator.
pub trait ChatView {
    fn input_value(&self) -> String;
    fn clear_input(&mut self);
    fn set_input_enabled(&mut self, enabled: bool);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn set_busy(&mut self, busy: bool);
    fn focus_input(&mut self);
    /// Append a rendered entry to the end of the history.
    fn append_message(&mut self, message: &Message, html: &str);
    fn scroll_to_bottom(&mut self);

    /// Shrink the input back to its intrinsic height.
    fn reset_input_height(&mut self);
    /// Height the current input content needs, in rows.
    fn input_scroll_height(&self) -> u16;
    fn set_input_height(&mut self, height: u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        Self {
            key: Key::Enter,
            shift: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input was empty after trimming; nothing appended, nothing sent.
    Skipped,
    Answered,
    /// The transport failed. The error was logged and nothing was appended.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Submitted(TurnOutcome),
    /// Not handled here; the input box should apply its default editing
    /// (Shift+Enter inserts a newline).
    PassThrough,
}

pub struct ChatWidget<V, T> {
    view: V,
    transport: T,
    location: String,
    state: UiState,
}

impl<V: ChatView, T: Transport> ChatWidget<V, T> {
    /// `location` is the navigation path the chat type is derived from.
    pub fn new(view: V, transport: T, location: impl Into<String>) -> Self {
        Self {
            view,
            transport,
            location: location.into(),
            state: UiState::default(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn navigate(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn chat_type(&self) -> ChatType {
        ChatType::from_path(&self.location)
    }

    /// Send whatever is in the input box as one turn.
    pub async fn submit(&mut self) -> TurnOutcome {
        let text = self.view.input_value().trim().to_string();
        if text.is_empty() {
            return TurnOutcome::Skipped;
        }

        let user = Message::user(text);
        self.view.append_message(&user, &format_message(&user.text));
        self.view.clear_input();

        let chat_type = self.chat_type();
        let mut turn = TurnGuard::acquire(&mut self.view, &mut self.state);
        log::debug!("sending turn (chat_type={})", chat_type);

        match self.transport.send_turn(&user.text, chat_type.as_str()).await {
            Ok(reply) => {
                let assistant = Message::assistant(reply.response);
                turn.view
                    .append_message(&assistant, &format_message(&assistant.text));
                TurnOutcome::Answered
            }
            Err(err) => {
                log::error!("Error: {}", err);
                TurnOutcome::Failed
            }
        }
    }

    /// Enter alone submits. Everything else, Shift+Enter included, is left to
    /// the input box.
    pub async fn on_key(&mut self, press: KeyPress) -> KeyDisposition {
        match press {
            KeyPress {
                key: Key::Enter,
                shift: false,
            } => KeyDisposition::Submitted(self.submit().await),
            _ => KeyDisposition::PassThrough,
        }
    }

    /// Refit the input box to its content after an edit.
    pub fn on_input(&mut self) {
        self.view.reset_input_height();
        let height = self.view.input_scroll_height();
        self.view.set_input_height(height);
    }
}

/// Holds the widget busy while a request is outstanding.
struct TurnGuard<'a, V: ChatView> {
    view: &'a mut V,
    state: &'a mut UiState,
}

impl<'a, V: ChatView> TurnGuard<'a, V> {
    fn acquire(view: &'a mut V, state: &'a mut UiState) -> Self {
        state.busy = true;
        state.input_enabled = false;
        view.set_input_enabled(false);
        view.set_submit_enabled(false);
        view.set_busy(true);
        Self { view, state }
    }
}

impl<V: ChatView> Drop for TurnGuard<'_, V> {
    fn drop(&mut self) {
        self.state.busy = false;
        self.state.input_enabled = true;
        self.view.set_input_enabled(true);
        self.view.set_submit_enabled(true);
        self.view.set_busy(false);
        self.view.focus_input();
        self.view.scroll_to_bottom();
    }
}
