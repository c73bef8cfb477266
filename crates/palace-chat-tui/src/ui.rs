use palace_chat_core::ChatRole;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::view::ViewState;

pub fn render(state: &mut ViewState, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, history, input, footer
    let [header_area, history_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(state.input.height() + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(state, frame, header_area);
    render_history(state, frame, history_area);
    render_input(state, frame, input_area);
    render_footer(state, frame, footer_area);
}

fn render_header(state: &ViewState, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Memory Palace ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}]", state.chat_type), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(state.endpoint.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// All history lines, including the busy indicator, before wrapping.
pub fn history_lines(state: &ViewState) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for entry in &state.entries {
        lines.push(role_line(entry.role));
        lines.extend(entry.lines.iter().cloned());
        lines.push(Line::default());
    }

    if state.busy {
        lines.push(role_line(ChatRole::Assistant));
        lines.push(Line::from(Span::styled(
            "Thinking...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn role_line(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Assistant => Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

/// The history paragraph without its border. Measuring and drawing go
/// through the same wrapping so the bottom row is where scrolling expects it.
fn history_paragraph(text: Text<'static>) -> Paragraph<'static> {
    Paragraph::new(text).wrap(Wrap { trim: false })
}

/// Rows the lines take once word-wrapped to `width`.
pub fn wrapped_height(lines: &[Line<'static>], width: u16) -> u16 {
    let rows = history_paragraph(Text::from(lines.to_vec())).line_count(width.max(1));
    rows.min(u16::MAX as usize) as u16
}

pub fn max_history_scroll(state: &ViewState) -> u16 {
    if state.history_width == 0 {
        return 0;
    }
    wrapped_height(&history_lines(state), state.history_width).saturating_sub(state.history_height)
}

fn render_history(state: &mut ViewState, frame: &mut Frame, area: Rect) {
    // Store inner size for scroll calculations (minus borders)
    state.history_height = area.height.saturating_sub(2);
    state.history_width = area.width.saturating_sub(2);

    let max_scroll = max_history_scroll(state);
    state.scroll = if state.follow_bottom {
        max_scroll
    } else {
        state.scroll.min(max_scroll)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let text = if state.entries.is_empty() && !state.busy {
        Text::from(Span::styled(
            "Say something to start the conversation...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(history_lines(state))
    };

    let history = history_paragraph(text)
        .block(block)
        .scroll((state.scroll, 0));

    frame.render_widget(history, area);
}

fn render_input(state: &mut ViewState, frame: &mut Frame, area: Rect) {
    state.input_width = area.width.saturating_sub(2);
    let width = state.input_width as usize;

    let (border_color, title) = if !state.input.enabled {
        (Color::DarkGray, " Waiting for reply... ")
    } else if state.input.focused {
        (Color::Yellow, " Message ")
    } else {
        (Color::DarkGray, " Message ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor row visible once content outgrows the box
    let visible_rows = state.input.height() as usize;
    let (cursor_col, cursor_row) = state.input.cursor_position(width);
    let offset = (cursor_row as usize + 1).saturating_sub(visible_rows);

    let lines: Vec<Line> = state
        .input
        .visual_rows(width)
        .into_iter()
        .skip(offset)
        .take(visible_rows)
        .map(Line::from)
        .collect();

    let text_style = if state.input.enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(lines).style(text_style).block(block);
    frame.render_widget(input, area);

    if state.input.enabled && state.input.focused && width > 0 {
        frame.set_cursor_position((
            area.x + 1 + cursor_col,
            area.y + 1 + (cursor_row as usize - offset) as u16,
        ));
    }
}

fn render_footer(state: &ViewState, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Black).bg(Color::Gray);
    let send_style = if state.submit_enabled {
        key_style
    } else {
        Style::default().fg(Color::DarkGray).bg(Color::Black)
    };

    let footer = Line::from(vec![
        Span::styled(" Enter ", send_style),
        Span::raw(" send  "),
        Span::styled(" Shift+Enter ", key_style),
        Span::raw(" newline  "),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::raw(" scroll  "),
        Span::styled(" Ctrl+L ", key_style),
        Span::raw(" clear  "),
        Span::styled(" Esc ", key_style),
        Span::raw(" quit"),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_height() {
        let lines = vec![
            Line::from("abcdef"),
            Line::default(),
            Line::from("ab"),
        ];
        assert_eq!(wrapped_height(&lines, 3), 4);
        assert_eq!(wrapped_height(&lines, 10), 3);
    }

    #[test]
    fn test_wrapped_height_breaks_at_words() {
        // 11 cells would fit in two rows of 7, but no word may straddle a row
        let lines = vec![Line::from("aa bbbbb cc")];
        assert_eq!(wrapped_height(&lines, 7), 3);
        assert_eq!(wrapped_height(&lines, 11), 1);
    }

    #[test]
    fn test_busy_adds_indicator_lines() {
        let mut state = ViewState::new("http://localhost:8000/chat");
        assert!(history_lines(&state).is_empty());
        state.busy = true;
        assert_eq!(history_lines(&state).len(), 2);
    }
}
