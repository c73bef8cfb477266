use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use palace_chat_core::{ChatWidget, Key, KeyDisposition, KeyPress, Transport};
use ratatui::backend::Backend;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::tui::AppEvent;
use crate::view::TuiView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A turn ran to completion inside this event.
    TurnFinished,
    Quit,
}

/// Handle `event`, and while it is busy with a turn keep reading `pending`.
///
/// Input is disabled for the whole turn, so everything read meanwhile is
/// dropped except Esc and Ctrl+C. Those abandon the turn, which still runs
/// the widget's cleanup, and quit.
pub async fn dispatch<B, T>(
    widget: &mut ChatWidget<TuiView<B>, T>,
    event: AppEvent,
    pending: &mut UnboundedReceiver<AppEvent>,
) -> Flow
where
    B: Backend,
    T: Transport,
{
    tokio::select! {
        biased;
        flow = handle_event(widget, event) => flow,
        () = wait_for_quit(pending) => {
            log::info!("quit requested while waiting for a reply");
            Flow::Quit
        }
    }
}

async fn wait_for_quit(pending: &mut UnboundedReceiver<AppEvent>) {
    while let Some(event) = pending.recv().await {
        if is_quit(&event) {
            return;
        }
        log::debug!("input disabled, dropping {:?}", event);
    }
    // Reader is gone; only the turn itself can finish now
    std::future::pending::<()>().await
}

fn is_quit(event: &AppEvent) -> bool {
    match event {
        AppEvent::Key(key) => is_quit_key(key),
        _ => false,
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub async fn handle_event<B, T>(widget: &mut ChatWidget<TuiView<B>, T>, event: AppEvent) -> Flow
where
    B: Backend,
    T: Transport,
{
    match event {
        AppEvent::Key(key) => handle_key(widget, key).await,
        AppEvent::Paste(text) => {
            if widget.state().input_enabled {
                widget.view_mut().state.input.insert_str(&text);
                widget.on_input();
            }
            Flow::Continue
        }
        AppEvent::Resize(width, _) => {
            // The input spans the full width inside its border
            widget.view_mut().state.input_width = width.saturating_sub(2);
            widget.on_input();
            Flow::Continue
        }
    }
}

async fn handle_key<B, T>(widget: &mut ChatWidget<TuiView<B>, T>, key: KeyEvent) -> Flow
where
    B: Backend,
    T: Transport,
{
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if is_quit_key(&key) {
        return Flow::Quit;
    }

    // Keys that work whether or not the input is enabled
    match key.code {
        KeyCode::Char('l') if ctrl => {
            widget.view_mut().state.clear_history();
            return Flow::Continue;
        }
        KeyCode::PageUp => {
            widget.view_mut().state.scroll_up();
            return Flow::Continue;
        }
        KeyCode::PageDown => {
            widget.view_mut().state.scroll_down();
            return Flow::Continue;
        }
        _ => {}
    }

    if !widget.state().input_enabled {
        return Flow::Continue;
    }

    if key.code == KeyCode::Enter {
        // Alt+Enter stands in for Shift+Enter on terminals that can't tell
        // Shift+Enter apart from Enter.
        let shift = key
            .modifiers
            .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
        let press = KeyPress {
            key: Key::Enter,
            shift,
        };

        return match widget.on_key(press).await {
            KeyDisposition::Submitted(outcome) => {
                log::debug!("turn finished: {:?}", outcome);
                widget.on_input();
                Flow::TurnFinished
            }
            KeyDisposition::PassThrough => {
                widget.view_mut().state.input.insert_newline();
                widget.on_input();
                Flow::Continue
            }
        };
    }

    let input = &mut widget.view_mut().state.input;
    match key.code {
        KeyCode::Char(c) if !ctrl => input.insert_char(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return Flow::Continue,
    }
    widget.on_input();

    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use palace_chat_core::{ChatReply, ChatRole, TransportError};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for Echo {
        async fn send_turn(
            &self,
            message: &str,
            chat_type: &str,
        ) -> Result<ChatReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatReply {
                response: format!("[{}] {}", chat_type, message),
            })
        }
    }

    /// A backend that never answers.
    struct Silent;

    #[async_trait]
    impl Transport for Silent {
        async fn send_turn(&self, _: &str, _: &str) -> Result<ChatReply, TransportError> {
            std::future::pending().await
        }
    }

    fn widget() -> ChatWidget<TuiView<TestBackend>, Echo> {
        let terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let view = TuiView::new(terminal, "http://localhost:8000/chat");
        ChatWidget::new(view, Echo::default(), "/ocean")
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_text<T: Transport>(widget: &mut ChatWidget<TuiView<TestBackend>, T>, text: &str) {
        for c in text.chars() {
            handle_event(widget, key(KeyCode::Char(c))).await;
        }
    }

    #[tokio::test]
    async fn test_enter_sends_and_clears() {
        let mut widget = widget();
        type_text(&mut widget, "hi").await;

        let flow = handle_event(&mut widget, key(KeyCode::Enter)).await;
        assert_eq!(flow, Flow::TurnFinished);

        let state = &widget.view().state;
        assert!(state.input.value().is_empty());
        assert!(state.input.enabled);
        assert!(!state.busy);
        let roles: Vec<ChatRole> = state.entries.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let mut widget = widget();
        type_text(&mut widget, "a").await;

        let shift_enter = AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert_eq!(handle_event(&mut widget, shift_enter).await, Flow::Continue);
        type_text(&mut widget, "b").await;

        let state = &widget.view().state;
        assert_eq!(state.input.value(), "a\nb");
        assert_eq!(state.input.height(), 2);
        assert!(state.entries.is_empty());
    }

    #[tokio::test]
    async fn test_alt_enter_also_inserts_newline() {
        let mut widget = widget();
        type_text(&mut widget, "a").await;

        let alt_enter = AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        handle_event(&mut widget, alt_enter).await;
        assert_eq!(widget.view().state.input.value(), "a\n");
    }

    #[tokio::test]
    async fn test_blank_enter_sends_nothing() {
        let mut widget = widget();
        type_text(&mut widget, "   ").await;
        handle_event(&mut widget, key(KeyCode::Enter)).await;
        assert!(widget.view().state.entries.is_empty());
    }

    #[tokio::test]
    async fn test_ctrl_l_clears_history() {
        let mut widget = widget();
        type_text(&mut widget, "hi").await;
        handle_event(&mut widget, key(KeyCode::Enter)).await;
        assert_eq!(widget.view().state.entries.len(), 2);

        let ctrl_l = AppEvent::Key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        handle_event(&mut widget, ctrl_l).await;
        assert!(widget.view().state.entries.is_empty());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut widget = widget();
        assert_eq!(handle_event(&mut widget, key(KeyCode::Esc)).await, Flow::Quit);
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut widget, ctrl_c).await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_paste_keeps_newlines() {
        let mut widget = widget();
        handle_event(&mut widget, AppEvent::Paste("one\r\ntwo".to_string())).await;
        assert_eq!(widget.view().state.input.value(), "one\ntwo");
        assert_eq!(widget.view().state.input.height(), 2);
    }

    #[tokio::test]
    async fn test_esc_quits_while_reply_is_pending() {
        let terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let view = TuiView::new(terminal, "http://localhost:8000/chat");
        let mut widget = ChatWidget::new(view, Silent, "/");
        type_text(&mut widget, "hello?").await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(key(KeyCode::Char('x'))).unwrap();
        tx.send(key(KeyCode::Esc)).unwrap();

        let flow = dispatch(&mut widget, key(KeyCode::Enter), &mut rx).await;
        assert_eq!(flow, Flow::Quit);

        // The abandoned turn still cleaned up, and the queued 'x' went nowhere
        assert!(widget.state().is_idle());
        let state = &widget.view().state;
        assert!(!state.busy);
        assert!(state.input.enabled);
        assert!(state.input.value().is_empty());
        assert_eq!(state.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_reply_is_pending() {
        let terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let view = TuiView::new(terminal, "http://localhost:8000/chat");
        let mut widget = ChatWidget::new(view, Silent, "/");
        type_text(&mut widget, "hello?").await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        tx.send(ctrl_c).unwrap();

        let flow = dispatch(&mut widget, key(KeyCode::Enter), &mut rx).await;
        assert_eq!(flow, Flow::Quit);
    }

    #[tokio::test]
    async fn test_dispatch_leaves_queued_events_between_turns() {
        let mut widget = widget();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(key(KeyCode::Char('b'))).unwrap();

        let flow = dispatch(&mut widget, key(KeyCode::Char('a')), &mut rx).await;
        assert_eq!(flow, Flow::Continue);
        assert_eq!(widget.view().state.input.value(), "a");
        assert_eq!(rx.try_recv().unwrap(), key(KeyCode::Char('b')));
    }

    #[tokio::test]
    async fn test_resize_refits_input_to_new_width() {
        let mut widget = widget();
        type_text(&mut widget, "abcdefghijklmnop").await;
        assert_eq!(widget.view().state.input.height(), 1);

        handle_event(&mut widget, AppEvent::Resize(12, 20)).await;
        assert_eq!(widget.view().state.input_width, 10);
        assert_eq!(widget.view().state.input.height(), 2);
    }
}
