use crate::catalog::{fallback_catalog, CatalogFetcher, QuestionCatalog};
use crate::chat::{HttpChatTransport, ReplyEvent};
use crate::config::Config;
use crate::session::{Exchange, Session, ViewState};
use crate::storage::Database;
use crate::theme::{ColorPalette, ThemeVariant};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;

/// Longest input line accepted from the keyboard.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Maximum transcript scroll offset (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

// ============================================================================
// Background Events
// ============================================================================

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// The catalog load finished. An empty catalog means the built-in
    /// questions are in effect.
    CatalogLoaded(QuestionCatalog),
    /// One reply event for the exchange started at `generation`.
    Reply { generation: u64, event: ReplyEvent },
    /// A background task panicked.
    ///
    /// - `task`: Name of the task that panicked ("catalog", "exchange")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Everything the terminal front end holds between frames.
pub struct App {
    pub session: Session,
    pub fetcher: Arc<CatalogFetcher<Database>>,
    pub backend: Arc<HttpChatTransport>,

    pub theme_variant: ThemeVariant,
    pub theme: ColorPalette,
    pub assistant_name: String,
    pub max_questions: usize,

    /// Text typed into the query box.
    pub input: String,
    /// Highlighted suggested question in browse mode.
    pub selected_question: usize,

    /// Top line of the transcript viewport.
    pub transcript_scroll: usize,
    /// Pin the viewport to the newest line while replies stream in.
    pub follow_transcript: bool,
    /// Largest useful scroll offset, refreshed on every transcript render.
    pub transcript_max_scroll: usize,
    /// Transcript viewport height from the last render.
    pub transcript_visible_lines: usize,

    // Cow avoids allocation for static literals
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Skip frame renders when nothing changed.
    pub needs_redraw: bool,

    /// Current frame of the typing/loading spinner.
    pub spinner_frame: usize,

    /// The task streaming the current reply, aborted when chat is left.
    pub exchange_handle: Option<tokio::task::JoinHandle<()>>,
    /// The task loading the catalog.
    pub catalog_handle: Option<tokio::task::JoinHandle<()>>,
}

impl App {
    pub fn new(
        config: &Config,
        fetcher: Arc<CatalogFetcher<Database>>,
        backend: Arc<HttpChatTransport>,
    ) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        Self {
            session: Session::new(
                config.cards.clone(),
                fallback_catalog(),
                config.scroll_step,
            ),
            fetcher,
            backend,
            theme_variant,
            theme: theme_variant.palette(),
            assistant_name: config.assistant_name.clone(),
            max_questions: config.max_questions(),
            input: String::new(),
            selected_question: 0,
            transcript_scroll: 0,
            follow_transcript: true,
            transcript_max_scroll: 0,
            transcript_visible_lines: 0,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            exchange_handle: None,
            catalog_handle: None,
        }
    }

    // ========================================================================
    // Theme and Status
    // ========================================================================

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = variant.palette();
        self.needs_redraw = true;
    }

    /// Dark → Light → Dark. Returns the new theme's name.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    // ========================================================================
    // Input Box
    // ========================================================================

    /// The query box only takes keystrokes while no reply is outstanding.
    pub fn input_enabled(&self) -> bool {
        self.session.chat().accepts_send()
    }

    pub fn push_input(&mut self, c: char) -> bool {
        if !self.input_enabled() || c.is_control() {
            return false;
        }
        if self.input.chars().count() >= MAX_INPUT_CHARS {
            self.set_status(format!("Query too long (max {} chars)", MAX_INPUT_CHARS));
            return false;
        }
        self.input.push(c);
        true
    }

    pub fn pop_input(&mut self) -> bool {
        self.input_enabled() && self.input.pop().is_some()
    }

    /// Submit the query box. The text is kept if the send is rejected.
    pub fn submit_input(&mut self) -> Option<Exchange> {
        let exchange = self.session.submit_free_text(&self.input)?;
        self.input.clear();
        self.follow_transcript = true;
        Some(exchange)
    }

    // ========================================================================
    // Suggested Questions
    // ========================================================================

    pub fn visible_questions(&self) -> &[String] {
        self.session.visible_questions(self.max_questions)
    }

    pub fn move_question_cursor(&mut self, down: bool) {
        let count = self.visible_questions().len();
        if count == 0 {
            self.selected_question = 0;
            return;
        }
        self.selected_question = if down {
            (self.selected_question + 1).min(count - 1)
        } else {
            self.selected_question.saturating_sub(1)
        };
    }

    /// Keep the cursor on a real question after the card or sub-tab changes.
    pub fn clamp_question_cursor(&mut self) {
        let count = self.visible_questions().len();
        self.selected_question = self.selected_question.min(count.saturating_sub(1));
    }

    /// Send the highlighted question.
    pub fn ask_selected_question(&mut self) -> Option<Exchange> {
        let question = self.visible_questions().get(self.selected_question)?.clone();
        let exchange = self.session.select_question(&question)?;
        self.follow_transcript = true;
        Some(exchange)
    }

    // ========================================================================
    // Transcript Scrolling
    // ========================================================================

    pub fn scroll_transcript_up(&mut self, lines: usize) {
        self.follow_transcript = false;
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
    }

    pub fn scroll_transcript_down(&mut self, lines: usize) {
        self.transcript_scroll = self
            .transcript_scroll
            .saturating_add(lines)
            .min(self.transcript_max_scroll);
        if self.transcript_scroll >= self.transcript_max_scroll {
            self.follow_transcript = true;
        }
    }

    /// Record the transcript's size after layout and settle the offset.
    pub fn update_transcript_bounds(&mut self, content_lines: usize, visible_lines: usize) {
        self.transcript_visible_lines = visible_lines;
        self.transcript_max_scroll = content_lines.saturating_sub(visible_lines).min(MAX_SCROLL);
        if self.follow_transcript {
            self.transcript_scroll = self.transcript_max_scroll;
        } else {
            self.transcript_scroll = self.transcript_scroll.min(self.transcript_max_scroll);
        }
    }

    // ========================================================================
    // Mode Changes
    // ========================================================================

    /// Stop streaming the current reply, if any.
    pub fn abort_exchange(&mut self) {
        if let Some(handle) = self.exchange_handle.take() {
            handle.abort();
            tracing::debug!("Aborted reply stream");
        }
    }

    /// Reset chat-view state after returning to browsing.
    pub fn on_returned_to_browsing(&mut self) {
        self.abort_exchange();
        self.transcript_scroll = 0;
        self.follow_transcript = true;
        self.transcript_max_scroll = 0;
        self.clamp_question_cursor();
    }

    pub fn in_chat(&self) -> bool {
        self.session.view() == ViewState::Chat
    }
}

/// Abort in-flight tasks so nothing outlives the event loop.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.exchange_handle.take() {
            handle.abort();
            tracing::debug!("Aborted reply stream on App drop");
        }
        if let Some(handle) = self.catalog_handle.take() {
            handle.abort();
            tracing::debug!("Aborted catalog load on App drop");
        }
    }
}
