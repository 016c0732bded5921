//! Chat view: the transcript of the current conversation.

use crate::app::App;
use crate::chat::{Message, Role};
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::markdown::render_markdown;

const TYPING_DOTS: [&str; 4] = ["", ".", "..", "..."];

pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let viewport_width = area.width.saturating_sub(2) as usize;
    let visible_lines = area.height.saturating_sub(2) as usize;

    let lines = transcript_lines(app);
    let content_lines = lines
        .iter()
        .map(|line| wrapped_line_count(line, viewport_width))
        .sum();
    // Settle the offset before drawing so a resize never shows a stale frame.
    app.update_transcript_bounds(content_lines, visible_lines);

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.card_border),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.transcript_scroll as u16, 0));
    f.render_widget(paragraph, area);
}

/// Every line of the transcript, unwrapped.
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let messages = app.session.messages();
    let status = app.session.status();
    let mut lines = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        let is_last = i + 1 == messages.len();
        match message.role {
            Role::User => push_user(&mut lines, app, message),
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    app.assistant_name.clone(),
                    app.theme.assistant_label,
                )));
                let text = message.text();
                if !text.is_empty() {
                    lines.extend(render_markdown(&strip_control_chars(&text), &app.theme));
                }
                if is_last && status.is_busy() && text.is_empty() {
                    // The dots move at half the spinner's rate.
                    let dots = TYPING_DOTS[(app.spinner_frame / 2) % TYPING_DOTS.len()];
                    lines.push(Line::from(Span::styled(
                        format!("typing{}", dots),
                        app.theme.typing_indicator,
                    )));
                }
                if is_last {
                    if let Some(notice) = app.session.chat().error_notice() {
                        lines.push(Line::from(Span::styled(notice, app.theme.error_notice)));
                    }
                }
            }
        }
    }
    lines
}

fn push_user(lines: &mut Vec<Line<'static>>, app: &App, message: &Message) {
    lines.push(Line::from(Span::styled("You", app.theme.user_label)));
    let text = message.text();
    for line in strip_control_chars(&text).lines() {
        lines.push(Line::from(Span::styled(line.to_string(), app.theme.user_text)));
    }
}

/// How many display lines a single Line will occupy after wrapping.
fn wrapped_line_count(line: &Line<'_>, viewport_width: usize) -> usize {
    let width = viewport_width.max(1);
    let line_width: usize = line.spans.iter().map(|s| s.content.width()).sum();
    if line_width == 0 {
        1 // Empty lines still take one line
    } else {
        line_width.div_ceil(width)
    }
}
