//! Render functions for the TUI.
//!
//! Every frame has the same frame around the body: a header, the query box,
//! the disclaimer, and the status bar. The body is the browse cards or the
//! chat transcript depending on the session's view.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{browse, chat, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 50;
pub(super) const MIN_HEIGHT: u16 = 16;

/// Placeholder shown in the empty query box.
pub(super) const INPUT_PLACEHOLDER: &str = "Write your query on colleges, exam here...";

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(0),    // body
            Constraint::Length(3), // query box
            Constraint::Length(1), // disclaimer
            Constraint::Length(1), // status bar
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    if app.in_chat() {
        chat::render(f, app, chunks[1]);
    } else {
        browse::render(f, app, chunks[1]);
    }
    render_input(f, app, chunks[2]);
    render_disclaimer(f, app, chunks[3]);
    status::render(f, app, chunks[4]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mode = if app.in_chat() { "Chat" } else { "Explore" };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", app.assistant_name), app.theme.header),
        Span::styled(format!("· {}", mode), app.theme.card_description),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let enabled = app.input_enabled();
    let border_style = if enabled {
        app.theme.card_border_active
    } else {
        app.theme.card_border
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner_width = area.width.saturating_sub(2) as usize;
    let line = if app.input.is_empty() {
        let hint = if enabled {
            INPUT_PLACEHOLDER
        } else {
            "Waiting for reply..."
        };
        Line::from(Span::styled(hint, app.theme.placeholder))
    } else {
        // Keep the tail of a long query visible.
        let shown = tail_within(&app.input, inner_width.saturating_sub(1));
        let style = if enabled {
            app.theme.input
        } else {
            app.theme.input_disabled
        };
        Line::from(Span::styled(shown.to_string(), style))
    };
    f.render_widget(Paragraph::new(line).block(block), area);

    if enabled {
        let typed = if app.input.is_empty() {
            0
        } else {
            crate::util::display_width(tail_within(&app.input, inner_width.saturating_sub(1)))
        };
        // Cursor sits after the typed text inside the border.
        let x = area.x + 1 + (typed as u16).min(area.width.saturating_sub(3));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_disclaimer(f: &mut Frame, app: &App, area: Rect) {
    let text = format!("{} is experimental & accuracy might vary", app.assistant_name);
    f.render_widget(
        Paragraph::new(text)
            .style(app.theme.disclaimer)
            .alignment(Alignment::Center),
        area,
    );
}

/// Longest suffix of `s` that fits in `max_width` columns.
fn tail_within(s: &str, max_width: usize) -> &str {
    let mut width = 0;
    for (idx, c) in s.char_indices().rev() {
        width += unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width > max_width {
            return &s[idx + c.len_utf8()..];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_tail_within_keeps_end() {
        assert_eq!(tail_within("hello world", 5), "world");
        assert_eq!(tail_within("short", 10), "short");
        assert_eq!(tail_within("", 3), "");
    }

    #[tokio::test]
    async fn test_small_terminal_shows_notice() {
        let mut app = test_app().await;
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_browse_frame_has_placeholder_and_disclaimer() {
        let mut app = test_app().await;
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains(INPUT_PLACEHOLDER));
        assert!(text.contains("TrueScholar AI is experimental & accuracy might vary"));
        assert!(text.contains("Colleges"));
        assert!(text.contains("What are the top colleges in India?"));
    }

    #[tokio::test]
    async fn test_chat_frame_shows_transcript() {
        let mut app = test_app().await;
        app.ask_selected_question().unwrap();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("What are the top colleges in India?"));
        assert!(text.contains("Waiting for reply..."));
    }
}
