//! Markdown-subset to HTML transform for chat messages.
//!
//! The transform is a fixed pipeline of substitutions applied left to right.
//! Order matters: later rules run over the output of earlier ones. Code is
//! extracted before emphasis so backticked asterisks survive as code, list
//! items are wrapped before blockquotes, bold consumes `**` before italic sees
//! single `*`, and line breaks run last so list runs have already swallowed
//! the newlines between their items.
//!
//! This is deliberately not a markdown implementation. There is no nesting, no
//! escaping, and unmatched markers are left as typed. HTML already present in
//! the input passes through untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// One substitution step of the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    CodeFence,
    InlineCode,
    UnorderedList,
    OrderedList,
    Blockquote,
    Bold,
    Italic,
    LineBreak,
}

/// The rules in the order they must run.
pub const PIPELINE: [Rule; 8] = [
    Rule::CodeFence,
    Rule::InlineCode,
    Rule::UnorderedList,
    Rule::OrderedList,
    Rule::Blockquote,
    Rule::Bold,
    Rule::Italic,
    Rule::LineBreak,
];

/// Render raw message text to the HTML subset shown in the chat history.
pub fn format_message(raw: &str) -> String {
    PIPELINE
        .iter()
        .fold(raw.to_string(), |text, rule| rule.apply(&text))
}

impl Rule {
    pub fn apply(self, text: &str) -> String {
        match self {
            Rule::CodeFence => re_code_fence()
                .replace_all(text, |caps: &Captures| {
                    let language = caps.get(1).map_or("plaintext", |m| m.as_str());
                    format!(
                        "<pre><code class=\"language-{}\">{}</code></pre>",
                        language,
                        caps[2].trim()
                    )
                })
                .into_owned(),
            Rule::InlineCode => re_inline_code()
                .replace_all(text, "<code>${1}</code>")
                .into_owned(),
            Rule::UnorderedList => {
                wrap_list_runs(text, re_unordered_run(), re_unordered_item(), "ul")
            }
            Rule::OrderedList => wrap_list_runs(text, re_ordered_run(), re_ordered_item(), "ol"),
            Rule::Blockquote => re_blockquote()
                .replace_all(text, "<blockquote>${1}</blockquote>")
                .into_owned(),
            Rule::Bold => re_bold()
                .replace_all(text, "<strong>${1}</strong>")
                .into_owned(),
            Rule::Italic => re_italic().replace_all(text, "<em>${1}</em>").into_owned(),
            Rule::LineBreak => text.replace('\n', "<br>"),
        }
    }
}

/// Turn every item line into `<li>`, joining consecutive items without the
/// newline between them. Only the first run in the text gets the `<ul>`/`<ol>`
/// container; later runs stay bare list items.
fn wrap_list_runs(text: &str, run: &Regex, item: &Regex, container: &str) -> String {
    let mut first_run = true;
    run.replace_all(text, |caps: &Captures| {
        let items: String = caps[0]
            .split('\n')
            .filter_map(|line| item.captures(line))
            .map(|c| format!("<li>{}</li>", &c[1]))
            .collect();

        if first_run {
            first_run = false;
            format!("<{container}>{items}</{container}>")
        } else {
            items
        }
    })
    .into_owned()
}

fn re_code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```([A-Za-z0-9_]+)?\n((?s:.*?))```")
            .expect("re_code_fence: pattern is valid and should always compile")
    })
}

fn re_inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"`([^`]+)`").expect("re_inline_code: pattern is valid and should always compile")
    })
}

fn re_unordered_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*[-*][ \t]+.+(?:\n[ \t]*[-*][ \t]+.+)*")
            .expect("re_unordered_run: pattern is valid and should always compile")
    })
}

fn re_unordered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t]*[-*][ \t]+(.+)$")
            .expect("re_unordered_item: pattern is valid and should always compile")
    })
}

fn re_ordered_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+.+(?:\n[ \t]*\d+\.[ \t]+.+)*")
            .expect("re_ordered_run: pattern is valid and should always compile")
    })
}

fn re_ordered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t]*\d+\.[ \t]+(.+)$")
            .expect("re_ordered_item: pattern is valid and should always compile")
    })
}

fn re_blockquote() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*>[ \t]*(.+)$")
            .expect("re_blockquote: pattern is valid and should always compile")
    })
}

fn re_bold() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*(.+?)\*\*").expect("re_bold: pattern is valid and should always compile")
    })
}

fn re_italic() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*(.+?)\*").expect("re_italic: pattern is valid and should always compile")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold() {
        assert_eq!(format_message("**x**"), "<strong>x</strong>");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(format_message("`x`"), "<code>x</code>");
    }

    #[test]
    fn test_unordered_list_swallows_newlines() {
        assert_eq!(format_message("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(format_message("* a\n* b"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            format_message("1. one\n2. two\n10. ten"),
            "<ol><li>one</li><li>two</li><li>ten</li></ol>"
        );
    }

    #[test]
    fn test_only_first_run_is_wrapped() {
        assert_eq!(
            format_message("- a\n- b\n\ntext\n- c"),
            "<ul><li>a</li><li>b</li></ul><br><br>text<br><li>c</li>"
        );
    }

    #[test]
    fn test_only_first_ordered_run_is_wrapped() {
        assert_eq!(
            format_message("1. a\n\nx\n2. b"),
            "<ol><li>a</li></ol><br><br>x<br><li>b</li>"
        );
    }

    #[test]
    fn test_mixed_lists_get_their_own_containers() {
        assert_eq!(
            format_message("- a\n1. b"),
            "<ul><li>a</li></ul><br><ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_plain_newlines_become_breaks() {
        assert_eq!(format_message("line1\nline2"), "line1<br>line2");
    }

    #[test]
    fn test_code_fence_with_language() {
        assert_eq!(
            format_message("```rust\n  let x = 1;  \n```"),
            "<pre><code class=\"language-rust\">let x = 1;</code></pre>"
        );
    }

    #[test]
    fn test_code_fence_defaults_to_plaintext() {
        assert_eq!(
            format_message("```\na\nb\n```"),
            "<pre><code class=\"language-plaintext\">a<br>b</code></pre>"
        );
    }

    #[test]
    fn test_blockquotes_are_per_line() {
        assert_eq!(
            format_message("> a\n> b"),
            "<blockquote>a</blockquote><br><blockquote>b</blockquote>"
        );
    }

    #[test]
    fn test_indented_blockquote() {
        assert_eq!(format_message("  > q"), "<blockquote>q</blockquote>");
        assert_eq!(format_message("\t>q"), "<blockquote>q</blockquote>");
    }

    #[test]
    fn test_fence_needs_newline_after_opening() {
        assert_eq!(format_message("```rust"), "```rust");
        // Not a block; the inner backtick pair is still inline code
        let out = format_message("```rust let x```");
        assert!(!out.contains("<pre>"));
        assert_eq!(out, "``<code>rust let x</code>``");
    }

    #[test]
    fn test_bold_runs_before_italic() {
        assert_eq!(
            format_message("*a* and **b**"),
            "<em>a</em> and <strong>b</strong>"
        );
    }

    #[test]
    fn test_emphasis_inside_list_item() {
        assert_eq!(
            format_message("- **x**"),
            "<ul><li><strong>x</strong></li></ul>"
        );
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        assert_eq!(format_message("a ``` b"), "a ``` b");
        assert_eq!(format_message("2 * 3"), "2 * 3");
        assert_eq!(format_message("`open"), "`open");
    }

    #[test]
    fn test_html_is_not_escaped() {
        assert_eq!(format_message("<b>hi</b>"), "<b>hi</b>");
    }

    #[test]
    fn test_dash_without_space_is_not_a_list() {
        assert_eq!(format_message("---"), "---");
        assert_eq!(format_message("-x"), "-x");
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(PIPELINE.first(), Some(&Rule::CodeFence));
        assert_eq!(PIPELINE.last(), Some(&Rule::LineBreak));
        let bold = PIPELINE.iter().position(|r| *r == Rule::Bold);
        let italic = PIPELINE.iter().position(|r| *r == Rule::Italic);
        assert!(bold < italic);
    }
}
