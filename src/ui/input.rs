//! Input handling for the TUI.
//!
//! Printable keys always go to the query box (when it is enabled); every
//! other key is a navigation or mode command. Browse and chat share the
//! input box, so only the arrow keys change meaning between the two views.

use crate::app::{App, AppEvent};
use crate::nav::ScrollDirection;
use crate::session::BackOutcome;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::dispatch_exchange;
use super::Action;

/// Lines moved by PageUp/PageDown when the viewport height is unknown.
const DEFAULT_PAGE: usize = 10;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) {
        return handle_control_key(app, code);
    }

    match code {
        KeyCode::Esc => return handle_back(app),
        KeyCode::Enter => handle_enter(app, event_tx),
        KeyCode::Backspace => {
            app.pop_input();
        }
        KeyCode::Char(c) => {
            app.push_input(c);
        }
        _ if app.in_chat() => handle_chat_navigation(app, code),
        _ => handle_browse_navigation(app, code, modifiers),
    }
    Action::Continue
}

fn handle_control_key(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('c') | KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('t') => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {}", name));
        }
        KeyCode::Char('u') => {
            if app.input_enabled() {
                app.input.clear();
            }
        }
        _ => {}
    }
    Action::Continue
}

/// Esc leaves chat (dropping the transcript). In browse mode it quits.
fn handle_back(app: &mut App) -> Action {
    match app.session.go_back() {
        BackOutcome::ReturnedToBrowsing => {
            app.on_returned_to_browsing();
            app.set_status("Conversation cleared");
            Action::Continue
        }
        BackOutcome::Delegated => Action::Quit,
    }
}

/// Enter sends the query box. With an empty box in browse mode it sends the
/// highlighted suggested question instead.
fn handle_enter(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.input_enabled() {
        app.set_status("Please wait for the reply to finish");
        return;
    }

    let exchange = if app.input.trim().is_empty() && !app.in_chat() {
        app.ask_selected_question()
    } else {
        app.submit_input()
    };

    if let Some(exchange) = exchange {
        dispatch_exchange(app, exchange, event_tx);
    }
}

fn handle_browse_navigation(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let shift = modifiers.contains(KeyModifiers::SHIFT);
    match code {
        KeyCode::Left if shift => {
            app.session.scroll(ScrollDirection::Left);
        }
        KeyCode::Right if shift => {
            app.session.scroll(ScrollDirection::Right);
        }
        KeyCode::Left => {
            let current = app.session.nav().active_card_index();
            if current > 0 && app.session.select_card(current - 1) {
                app.clamp_question_cursor();
            }
        }
        KeyCode::Right => {
            let next = app.session.nav().active_card_index() + 1;
            if app.session.select_card(next) {
                app.clamp_question_cursor();
            }
        }
        KeyCode::Tab => {
            if app.session.cycle_subcategory(true) {
                app.selected_question = 0;
            }
        }
        KeyCode::BackTab => {
            if app.session.cycle_subcategory(false) {
                app.selected_question = 0;
            }
        }
        KeyCode::Up => app.move_question_cursor(false),
        KeyCode::Down => app.move_question_cursor(true),
        KeyCode::Home => {
            if app.session.select_card(0) {
                app.clamp_question_cursor();
            }
        }
        _ => {}
    }
}

fn handle_chat_navigation(app: &mut App, code: KeyCode) {
    let page = match app.transcript_visible_lines {
        0 => DEFAULT_PAGE,
        n => n.saturating_sub(1).max(1),
    };
    match code {
        KeyCode::Up => app.scroll_transcript_up(1),
        KeyCode::Down => app.scroll_transcript_down(1),
        KeyCode::PageUp => app.scroll_transcript_up(page),
        KeyCode::PageDown => app.scroll_transcript_down(page),
        KeyCode::Home => app.scroll_transcript_up(usize::MAX),
        KeyCode::End => app.scroll_transcript_down(usize::MAX),
        _ => {}
    }
}
