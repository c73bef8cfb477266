//! Renders the chat formatter's HTML subset as styled terminal lines.
//!
//! Only the tags the formatter emits are understood. Anything else that looks
//! like markup is shown literally, the same way it reached the history.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use regex::Regex;
use std::sync::OnceLock;

fn re_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^<(/?)(strong|em|code|pre|ul|ol|li|blockquote|br)(?: class="language-([A-Za-z0-9_]+)")?>"#)
            .expect("re_tag: pattern is valid and should always compile")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered(usize),
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    text: String,
    bold: usize,
    italic: usize,
    code: usize,
    pre: bool,
    quote: bool,
    lists: Vec<ListKind>,
}

impl Renderer {
    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.quote {
            style = style.fg(Color::Green);
        }
        if self.code > 0 || self.pre {
            style = style.fg(Color::Yellow);
        }
        style
    }

    /// Move buffered text into a span carrying the current style.
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let style = self.style();
            self.spans
                .push(Span::styled(std::mem::take(&mut self.text), style));
        }
    }

    fn end_line(&mut self) {
        self.flush_text();
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    /// End the current line only if something is on it.
    fn close_block(&mut self) {
        self.flush_text();
        if !self.spans.is_empty() {
            self.end_line();
        }
    }

    fn open_item(&mut self) {
        self.close_block();
        let marker = match self.lists.last_mut() {
            Some(ListKind::Ordered(n)) => {
                *n += 1;
                format!("{}. ", n)
            }
            Some(ListKind::Unordered) | None => "• ".to_string(),
        };
        self.spans
            .push(Span::styled(marker, Style::default().fg(Color::Cyan)));
    }

    fn tag(&mut self, closing: bool, name: &str, language: Option<&str>) {
        self.flush_text();
        match (closing, name) {
            (_, "br") => self.end_line(),
            (false, "strong") => self.bold += 1,
            (true, "strong") => self.bold = self.bold.saturating_sub(1),
            (false, "em") => self.italic += 1,
            (true, "em") => self.italic = self.italic.saturating_sub(1),
            (false, "code") => {
                self.code += 1;
                if let Some(language) = language {
                    self.spans.push(Span::styled(
                        format!("[{}]", language),
                        Style::default().fg(Color::DarkGray),
                    ));
                    self.end_line();
                }
            }
            (true, "code") => self.code = self.code.saturating_sub(1),
            (false, "pre") => {
                self.close_block();
                self.pre = true;
            }
            (true, "pre") => {
                self.close_block();
                self.pre = false;
            }
            (false, "ul") => {
                self.close_block();
                self.lists.push(ListKind::Unordered);
            }
            (false, "ol") => {
                self.close_block();
                self.lists.push(ListKind::Ordered(0));
            }
            (true, "ul") | (true, "ol") => {
                self.close_block();
                self.lists.pop();
            }
            (false, "li") => self.open_item(),
            (true, "li") => self.close_block(),
            (false, "blockquote") => {
                self.close_block();
                self.quote = true;
                self.spans
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
            }
            (true, "blockquote") => {
                self.close_block();
                self.quote = false;
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.close_block();
        self.lines
    }
}

pub fn render_html(html: &str) -> Vec<Line<'static>> {
    let mut renderer = Renderer::default();
    let mut i = 0;

    while i < html.len() {
        let rest = &html[i..];
        if rest.starts_with('<') {
            if let Some(caps) = re_tag().captures(rest) {
                let closing = !caps[1].is_empty();
                renderer.tag(closing, &caps[2], caps.get(3).map(|m| m.as_str()));
                i += caps[0].len();
                continue;
            }
        }

        match rest.chars().next() {
            Some(c) => {
                renderer.text.push(c);
                i += c.len_utf8();
            }
            None => break,
        }
    }

    renderer.finish()
}
