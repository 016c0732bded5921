//! Browse view: the card carousel, the active card's sub-tab strip, and its
//! suggested questions.

use crate::app::App;
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use super::loop_runner::SPINNER_FRAMES;

/// Narrowest a carousel card is drawn.
const MIN_CARD_WIDTH: u16 = 22;
/// Carousel row height, borders included.
const CARD_HEIGHT: u16 = 4;
/// Columns reserved on each side of the strip for a scroll arrow.
const ARROW_SLOT: usize = 2;

const SPINNER: [&str; SPINNER_FRAMES] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(CARD_HEIGHT), Constraint::Min(0)])
        .split(area);

    render_carousel(f, app, chunks[0]);
    render_active_card(f, app, chunks[1]);
}

/// Side-by-side cards, as many as fit, centred on the focused one.
fn render_carousel(f: &mut Frame, app: &App, area: Rect) {
    let nav = app.session.nav();
    let per_view = (area.width / MIN_CARD_WIDTH).max(1) as usize;
    let window = nav.card_window(per_view);
    if window.is_empty() {
        return;
    }

    let shown = window.len() as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, shown); window.len()])
        .split(area);

    for (slot, index) in window.clone().enumerate() {
        let card = &nav.cards()[index];
        let active = index == nav.active_card_index();
        let border = if active {
            app.theme.card_border_active
        } else {
            app.theme.card_border
        };

        let mut title = String::new();
        if slot == 0 && window.start > 0 {
            title.push_str("‹ ");
        }
        title.push_str(&card.name);
        if slot + 1 == window.len() && window.end < nav.cards().len() {
            title.push_str(" ›");
        }

        let inner_width = columns[slot].width.saturating_sub(2) as usize;
        let description = truncate_to_width(&card.description, inner_width);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(title, app.theme.card_title));
        let body = Paragraph::new(Line::from(Span::styled(
            description.into_owned(),
            app.theme.card_description,
        )))
        .block(block);
        f.render_widget(body, columns[slot]);
    }
}

/// The active card: its sub-tab strip, then its questions.
fn render_active_card(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.card_border_active)
        .title(Span::styled(
            format!(" {} ", app.session.nav().active_category()),
            app.theme.card_title,
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width < 1 || inner.height < 1 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let strip_width = (inner.width as usize).saturating_sub(2 * ARROW_SLOT);
    app.session.resize_strip(strip_width);
    render_strip(f, app, rows[0], strip_width);
    render_questions(f, app, rows[2]);
}

fn render_strip(f: &mut Frame, app: &App, area: Rect, strip_width: usize) {
    let nav = app.session.nav();
    let Some(card) = nav.active_card() else {
        return;
    };
    let state = nav.state();

    let mut segments: Vec<(String, Style)> = Vec::new();
    for (i, tab) in card.sub_tabs.iter().enumerate() {
        if i > 0 {
            segments.push((" ".to_string(), Style::default()));
        }
        let style = if *tab == state.active_subcategory {
            app.theme.chip_active
        } else {
            app.theme.chip
        };
        segments.push((format!(" {} ", tab), style));
    }

    let arrow = |show: bool, glyph: &'static str| {
        if show {
            Span::styled(glyph, app.theme.scroll_arrow)
        } else {
            Span::raw("  ")
        }
    };

    let mut spans = vec![arrow(state.can_scroll_left, "‹ ")];
    spans.extend(clip_segments(&segments, state.scroll_offset, strip_width));
    spans.push(arrow(state.can_scroll_right, " ›"));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Cut the columns `offset..offset + width` out of a run of styled text.
fn clip_segments(segments: &[(String, Style)], offset: usize, width: usize) -> Vec<Span<'static>> {
    let end = offset + width;
    let mut column = 0;
    let mut used = 0;
    let mut spans = Vec::new();

    for (text, style) in segments {
        let mut piece = String::new();
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            // Wide chars straddling either edge are dropped whole.
            if column >= offset && column + w <= end {
                piece.push(c);
                used += w;
            }
            column += w;
        }
        if !piece.is_empty() {
            spans.push(Span::styled(piece, *style));
        }
        if column >= end {
            break;
        }
    }
    if used < width {
        spans.push(Span::raw(" ".repeat(width - used)));
    }
    spans
}

fn render_questions(f: &mut Frame, app: &App, area: Rect) {
    if area.height < 1 {
        return;
    }

    if app.session.is_catalog_loading() {
        let frame = SPINNER[app.spinner_frame % SPINNER_FRAMES];
        let text = format!("{} Loading questions...", frame);
        f.render_widget(Paragraph::new(text).style(app.theme.loading), area);
        return;
    }

    let questions = app.visible_questions();
    if questions.is_empty() {
        f.render_widget(
            Paragraph::new("No suggestions here yet. Type your own question below.")
                .style(app.theme.loading),
            area,
        );
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = questions
        .iter()
        .map(|q| {
            ListItem::new(format!("› {}", truncate_to_width(q, width))).style(app.theme.question)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected_question.min(questions.len() - 1)));
    let list = List::new(items).highlight_style(app.theme.question_selected);
    f.render_stateful_widget(list, area, &mut state);
}
