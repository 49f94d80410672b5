//! Markdown conversion for message bodies.
//!
//! Incoming frames are Markdown. A [`Converter`] turns one body into the
//! rich text a display shows. Neither converter adds sanitization on its
//! own: raw HTML inside a frame is passed through unless
//! [`HtmlConverter`] is built with `sanitize` set.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

pub trait Converter {
    fn convert(&self, markdown: &str) -> String;

    /// Styled terminal lines for the same body, when the converter has them.
    fn styled_lines(&self, _markdown: &str) -> Option<Vec<Line<'static>>> {
        None
    }
}

/// CommonMark to HTML markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlConverter {
    sanitize: bool,
}

impl HtmlConverter {
    pub fn new(sanitize: bool) -> Self {
        Self { sanitize }
    }
}

impl Converter for HtmlConverter {
    fn convert(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, markdown_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);

        if self.sanitize {
            // Text events are escaped on output
            let escaped = parser.map(|event| match event {
                Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
                other => other,
            });
            html::push_html(&mut out, escaped);
        } else {
            html::push_html(&mut out, parser);
        }

        out
    }
}

/// Markdown laid out as styled terminal lines.
///
/// Blocks are separated by a blank line. Headings are bold and underlined,
/// emphasis is italic, strong is bold, code is grey, list items get bullets
/// or numbers, table cells are joined with ` | ` and links keep their target
/// in parentheses. No Markdown markers are left in the text, so
/// [`convert`](Converter::convert) returns exactly what is drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConverter;

impl TerminalConverter {
    pub fn lines(&self, markdown: &str) -> Vec<Line<'static>> {
        let mut writer = LineWriter::default();
        for event in Parser::new_ext(markdown, markdown_options()) {
            writer.event(event);
        }
        writer.finish()
    }
}

impl Converter for TerminalConverter {
    fn convert(&self, markdown: &str) -> String {
        self.lines(markdown)
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn styled_lines(&self, markdown: &str) -> Option<Vec<Line<'static>>> {
        Some(self.lines(markdown))
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options
}

fn code_style() -> Style {
    Style::default().fg(Color::Gray)
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    item_fresh: bool,
    quote_depth: usize,
    link_target: Option<String>,
    in_code_block: bool,
    table_cell: usize,
}

impl LineWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                self.start_block();
                self.push_style(Modifier::BOLD | Modifier::UNDERLINED);
            }
            Event::End(TagEnd::Heading { .. }) => {
                self.styles.pop();
                self.flush();
            }
            Event::Start(Tag::Paragraph) => {
                if self.lists.is_empty() {
                    self.start_block();
                } else if !self.item_fresh {
                    // Later paragraphs of a list item continue under the bullet
                    self.flush();
                    self.current
                        .push(Span::raw("  ".repeat(self.lists.len())));
                }
            }
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => self.flush(),
            Event::Start(Tag::BlockQuote { .. }) => {
                self.start_block();
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote { .. }) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock { .. }) => {
                self.start_block();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => self.in_code_block = false,
            Event::Start(Tag::List(first)) => {
                if self.lists.is_empty() {
                    self.start_block();
                } else {
                    self.flush();
                }
                self.lists.push(first);
            }
            Event::End(TagEnd::List { .. }) => {
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                self.flush();
                let mut marker = "  ".repeat(self.lists.len().saturating_sub(1));
                match self.lists.last_mut() {
                    Some(Some(n)) => {
                        marker.push_str(&format!("{}. ", n));
                        *n += 1;
                    }
                    _ => marker.push_str("• "),
                }
                self.current.push(Span::raw(marker));
                self.item_fresh = true;
            }
            Event::Start(Tag::Table { .. }) => self.start_block(),
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => self.table_cell = 0,
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => self.flush(),
            Event::Start(Tag::TableCell) => {
                if self.table_cell > 0 {
                    self.current.push(Span::raw(" | "));
                }
                self.table_cell += 1;
            }
            Event::Start(Tag::Emphasis) => self.push_style(Modifier::ITALIC),
            Event::Start(Tag::Strong) => self.push_style(Modifier::BOLD),
            Event::Start(Tag::Strikethrough) => self.push_style(Modifier::CROSSED_OUT),
            Event::End(TagEnd::Emphasis)
            | Event::End(TagEnd::Strong)
            | Event::End(TagEnd::Strikethrough) => {
                self.styles.pop();
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.link_target = Some(dest_url.to_string());
            }
            Event::End(TagEnd::Link) => {
                if let Some(target) = self.link_target.take() {
                    self.current.push(Span::styled(
                        format!(" ({})", target),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.lines() {
                        self.lines.push(Line::from(vec![
                            Span::raw("    "),
                            Span::styled(line.to_string(), code_style()),
                        ]));
                    }
                } else {
                    self.push_text(text, self.style());
                }
            }
            Event::Code(code) => self.push_text(code, self.style().patch(code_style())),
            Event::Html(raw) | Event::InlineHtml(raw) => {
                for (i, part) in raw.split('\n').enumerate() {
                    if i > 0 {
                        self.flush();
                    }
                    if !part.is_empty() {
                        self.push_text(CowStr::from(part.to_string()), self.style());
                    }
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                self.flush();
                if !self.lists.is_empty() {
                    self.current
                        .push(Span::raw("  ".repeat(self.lists.len())));
                }
            }
            Event::Rule => {
                self.start_block();
                self.lines.push(Line::raw("───"));
            }
            _ => {}
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn push_text(&mut self, text: CowStr<'_>, style: Style) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(Span::styled(
                "> ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        self.item_fresh = false;
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    /// Finish the current line and leave one blank line before the next block.
    fn start_block(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    fn span<'a>(lines: &'a [Line<'static>], content: &str) -> &'a Span<'static> {
        lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .find(|span| span.content == content)
            .unwrap_or_else(|| panic!("no span {:?} in {:?}", content, lines))
    }

    #[test]
    fn heading_and_paragraph_to_html() {
        let html = HtmlConverter::default().convert("# Hello\n\nWorld");
        assert_eq!(html, "<h1>Hello</h1>\n<p>World</p>\n");
    }

    #[test]
    fn raw_html_passes_through_by_default() {
        let html = HtmlConverter::default().convert("<b>hi</b> there");
        assert!(html.contains("<b>hi</b>"));
    }

    #[test]
    fn sanitize_escapes_raw_html() {
        let html = HtmlConverter::new(true).convert("<script>alert(1)</script>\n\nok");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<p>ok</p>"));
    }

    #[test]
    fn html_converter_has_no_terminal_lines() {
        assert!(HtmlConverter::default().styled_lines("# Hi").is_none());
    }

    #[test]
    fn terminal_keeps_block_structure() {
        let lines = TerminalConverter.lines("# Hello\n\nWorld");
        assert_eq!(texts(&lines), ["Hello", "", "World"]);
        assert!(span(&lines, "Hello").style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(TerminalConverter.convert("# Hello\n\nWorld"), "Hello\n\nWorld");
    }

    #[test]
    fn hash_in_paragraph_text_is_not_a_heading() {
        let cases = [
            ("#1 priority", "#1 priority"),
            ("\\# not a heading", "# not a heading"),
        ];
        for (markdown, shown) in cases {
            let lines = TerminalConverter.lines(markdown);
            assert_eq!(texts(&lines), [shown]);
            assert!(lines
                .iter()
                .flat_map(|line| line.spans.iter())
                .all(|span| !span.style.add_modifier.contains(Modifier::BOLD)));
        }
    }

    #[test]
    fn terminal_lists() {
        assert_eq!(TerminalConverter.convert("- a\n- b"), "• a\n• b");
        assert_eq!(TerminalConverter.convert("1. x\n2. y"), "1. x\n2. y");
        assert_eq!(
            TerminalConverter.convert("intro\n\n- a\n- b"),
            "intro\n\n• a\n• b"
        );
        assert_eq!(
            TerminalConverter.convert("- a\n  - nested\n- b"),
            "• a\n  • nested\n• b"
        );
    }

    #[test]
    fn loose_list_paragraphs_stay_apart() {
        assert_eq!(
            TerminalConverter.convert("- a\n\n  more a\n- b"),
            "• a\n  more a\n• b"
        );
    }

    #[test]
    fn table_cells_are_separated() {
        assert_eq!(
            TerminalConverter.convert("| a | b |\n|---|---|\n| 1 | 2 |"),
            "a | b\n1 | 2"
        );
    }

    #[test]
    fn emphasis_is_styled_without_markers() {
        let lines = TerminalConverter.lines("an *important* word");
        assert_eq!(texts(&lines), ["an important word"]);
        assert!(span(&lines, "important").style.add_modifier.contains(Modifier::ITALIC));

        let lines = TerminalConverter.lines("say **hi** now");
        assert_eq!(texts(&lines), ["say hi now"]);
        assert!(span(&lines, "hi").style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn terminal_links_keep_target() {
        assert_eq!(
            TerminalConverter.convert("see [docs](https://example.com) now"),
            "see docs (https://example.com) now"
        );
    }

    #[test]
    fn terminal_block_quote() {
        assert_eq!(TerminalConverter.convert("> quoted"), "> quoted");
    }

    #[test]
    fn terminal_code_block_is_indented() {
        let text = TerminalConverter.convert("run:\n\n```\ncargo run\n```");
        assert_eq!(text, "run:\n\n    cargo run");
    }
}
