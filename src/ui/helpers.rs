//! Background task plumbing for the UI layer.
//!
//! Network work never runs on the event loop: catalog loads and reply
//! streams are spawned here and report back through `AppEvent`s.

use crate::app::{App, AppEvent};
use crate::catalog::{CatalogFetcher, QuestionCatalog};
use crate::chat::{open_replies, HttpChatTransport, ReplyEvent};
use crate::session::Exchange;
use crate::storage::Database;
use futures::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking spawned task would otherwise vanish and leave the UI waiting
/// forever (a spinner that never stops, an input box that never unlocks).
/// The panic message comes back as `Err(String)` so the caller can report
/// it and unblock the UI.
///
/// # Example
///
/// ```ignore
/// tokio::spawn(async move {
///     if let Err(panic_msg) = catch_task_panic(do_work()).await {
///         let _ = tx.send(AppEvent::TaskPanicked { task: "work", error: panic_msg }).await;
///     }
/// });
/// ```
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Send `event`, logging if the event loop has already gone away.
async fn deliver(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, "Channel send failed (receiver dropped)");
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Start the session's one catalog load.
pub(super) fn start_catalog_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.session.begin_catalog_load();
    app.catalog_handle = Some(spawn_catalog_load(app.fetcher.clone(), event_tx.clone()));
}

fn spawn_catalog_load(
    fetcher: Arc<CatalogFetcher<Database>>,
    tx: mpsc::Sender<AppEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = catch_task_panic(fetcher.load()).await;

        match outcome {
            Ok(catalog) => deliver(&tx, AppEvent::CatalogLoaded(catalog)).await,
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Catalog load panicked");
                deliver(
                    &tx,
                    AppEvent::TaskPanicked {
                        task: "catalog",
                        error: panic_msg,
                    },
                )
                .await;
                // Still end the loading state; the built-in questions take over.
                deliver(&tx, AppEvent::CatalogLoaded(QuestionCatalog::default())).await;
            }
        }
    })
}

// ============================================================================
// Chat
// ============================================================================

/// Stream the reply for an accepted send in the background.
pub(super) fn dispatch_exchange(
    app: &mut App,
    exchange: Exchange,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    // A new send is only accepted once the previous reply is terminal, so any
    // handle still here belongs to a finished task.
    app.abort_exchange();
    tracing::debug!(generation = exchange.generation, "Dispatching chat request");
    app.exchange_handle = Some(spawn_exchange(
        app.backend.clone(),
        exchange,
        event_tx.clone(),
    ));
}

fn spawn_exchange(
    backend: Arc<HttpChatTransport>,
    exchange: Exchange,
    tx: mpsc::Sender<AppEvent>,
) -> tokio::task::JoinHandle<()> {
    let Exchange {
        generation,
        request,
    } = exchange;
    tokio::spawn(async move {
        let outcome = catch_task_panic(async {
            let mut replies = open_replies(backend.as_ref(), request).await;
            while let Some(event) = replies.next().await {
                deliver(&tx, AppEvent::Reply { generation, event }).await;
            }
        })
        .await;

        if let Err(panic_msg) = outcome {
            tracing::error!(error = %panic_msg, "Reply stream panicked");
            deliver(
                &tx,
                AppEvent::Reply {
                    generation,
                    event: ReplyEvent::Failed(panic_msg.clone()),
                },
            )
            .await;
            deliver(
                &tx,
                AppEvent::TaskPanicked {
                    task: "exchange",
                    error: panic_msg,
                },
            )
            .await;
        }
    })
}
