//! Markdown to styled ratatui lines, for assistant replies.

use crate::theme::ColorPalette;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// Convert markdown to styled, owned lines.
///
/// Replies arrive incrementally, so this runs on partial markdown too; an
/// unclosed construct simply renders as whatever pulldown-cmark makes of it.
pub fn render_markdown(md: &str, palette: &ColorPalette) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(md.lines().count());
    let mut current_spans: Vec<Span<'static>> = Vec::with_capacity(4);
    let mut in_code_block = false;
    let mut in_heading = false;
    let mut in_emphasis = false;
    let mut in_strong = false;
    let mut in_link = false;
    // One entry per open list: the next ordinal for ordered lists.
    let mut lists: Vec<Option<u64>> = Vec::new();

    let flush = |lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>| {
        if !spans.is_empty() {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                in_heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut lines, &mut current_spans);
                in_heading = false;
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut current_spans);
                // Tight list items stay together.
                if lists.is_empty() {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush(&mut lines, &mut current_spans);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                lines.push(Line::from(""));
            }
            Event::Start(Tag::List(start)) => {
                flush(&mut lines, &mut current_spans);
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                flush(&mut lines, &mut current_spans);
                lists.pop();
                if lists.is_empty() {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut lines, &mut current_spans);
                let indent = "  ".repeat(lists.len().saturating_sub(1));
                let marker = match lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                current_spans.push(Span::raw(marker));
            }
            Event::End(TagEnd::Item) => {
                flush(&mut lines, &mut current_spans);
            }
            Event::Start(Tag::Emphasis) => {
                in_emphasis = true;
            }
            Event::End(TagEnd::Emphasis) => {
                in_emphasis = false;
            }
            Event::Start(Tag::Strong) => {
                in_strong = true;
            }
            Event::End(TagEnd::Strong) => {
                in_strong = false;
            }
            Event::Start(Tag::Link { .. }) => {
                in_link = true;
            }
            Event::End(TagEnd::Link) => {
                in_link = false;
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                current_spans.push(Span::styled(
                    format!("[Image: {}]", dest_url),
                    palette.md_link,
                ));
            }
            Event::Text(text) if in_code_block => {
                for code_line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", code_line),
                        palette.md_code_block,
                    )));
                }
            }
            Event::Text(text) => {
                let style = if in_heading {
                    palette.md_heading
                } else if in_link {
                    palette.md_link
                } else if in_strong {
                    palette.md_strong
                } else if in_emphasis {
                    palette.md_emphasis
                } else {
                    Style::default()
                };
                current_spans.push(Span::styled(text.into_string(), style));
            }
            Event::Code(code) => {
                current_spans.push(Span::styled(code.into_string(), palette.md_inline_code));
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                flush(&mut lines, &mut current_spans);
            }
            Event::Rule => {
                flush(&mut lines, &mut current_spans);
                lines.push(Line::from(Span::styled("───", palette.card_border)));
            }
            _ => {}
        }
    }

    flush(&mut lines, &mut current_spans);

    // Trailing blank lines only pad the transcript.
    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}
