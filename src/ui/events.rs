//! Application event handling.
//!
//! Applies the results of background tasks (catalog loads, reply events,
//! panics) to the application state.

use crate::app::{App, AppEvent};
use crate::chat::{ChatStatus, ReplyEvent};

/// Handle one event from a background task.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::CatalogLoaded(catalog) => {
            app.catalog_handle = None;
            if catalog.is_empty() {
                app.set_status("Showing built-in questions");
            }
            app.session.install_catalog(catalog);
            app.clamp_question_cursor();
        }

        AppEvent::Reply { generation, event } => {
            let terminal = event.is_terminal();
            let failed = matches!(event, ReplyEvent::Failed(_));
            if !app.session.apply_reply(generation, event) {
                return;
            }
            if terminal {
                app.exchange_handle = None;
                app.spinner_frame = 0;
            }
            if failed && app.session.status() == ChatStatus::Error {
                app.set_status("Reply failed, you can ask again");
            }
        }

        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
