//! The assistant session: browse mode, chat mode, and the actions that move
//! between them.
//!
//! `Session` is the one place user actions land. Every action either causes
//! exactly one transition or is rejected without side effects. Network work
//! is not done here: starting an exchange returns an [`Exchange`] for the
//! caller to dispatch, and reply events come back through
//! [`Session::apply_reply`].

use crate::catalog::{CategoryCard, QuestionCatalog};
use crate::chat::{
    open_replies, ChatBackend, ChatRequest, ChatState, ChatStatus, Message, ReplyEvent,
};
use crate::nav::{BrowseNav, ScrollDirection};
use futures::StreamExt;
use std::convert::Infallible;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Browsing,
    Chat,
}

/// An accepted send, ready to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub generation: u64,
    pub request: ChatRequest,
}

/// What a back action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Left chat; the transcript is gone.
    ReturnedToBrowsing,
    /// Already browsing; the host decides what back means.
    Delegated,
}

#[derive(Debug)]
pub struct Session {
    view: ViewState,
    chat: ChatState,
    nav: BrowseNav,
    catalog: QuestionCatalog,
    fallback: QuestionCatalog,
    catalog_loading: bool,
}

impl Session {
    pub fn new(cards: Vec<CategoryCard>, fallback: QuestionCatalog, scroll_step: usize) -> Self {
        let session_id = format!("session-{}", chrono::Utc::now().timestamp_millis());
        Self {
            view: ViewState::Browsing,
            chat: ChatState::new(session_id),
            nav: BrowseNav::new(cards, scroll_step),
            catalog: QuestionCatalog::default(),
            fallback,
            catalog_loading: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    pub fn messages(&self) -> &[Message] {
        self.chat.messages()
    }

    pub fn status(&self) -> ChatStatus {
        self.chat.status()
    }

    pub fn nav(&self) -> &BrowseNav {
        &self.nav
    }

    pub fn is_catalog_loading(&self) -> bool {
        self.catalog_loading
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    pub fn begin_catalog_load(&mut self) {
        self.catalog_loading = true;
    }

    /// Install the catalog for this session. An empty catalog means the
    /// built-in questions are shown instead.
    pub fn install_catalog(&mut self, catalog: QuestionCatalog) {
        if catalog.is_empty() {
            tracing::info!("Using built-in questions");
        }
        self.catalog = catalog;
        self.catalog_loading = false;
    }

    /// The catalog questions are drawn from.
    pub fn effective_catalog(&self) -> &QuestionCatalog {
        if self.catalog.is_empty() {
            &self.fallback
        } else {
            &self.catalog
        }
    }

    /// Up to `limit` questions for the active card and sub-tab.
    pub fn visible_questions(&self, limit: usize) -> &[String] {
        self.questions_for(
            self.nav.active_category(),
            self.nav.active_subcategory(),
            limit,
        )
    }

    pub fn questions_for(&self, category: &str, subcategory: &str, limit: usize) -> &[String] {
        let questions = self.effective_catalog().questions(category, subcategory);
        &questions[..questions.len().min(limit)]
    }

    // ========================================================================
    // Chat actions
    // ========================================================================

    pub fn select_question(&mut self, question: &str) -> Option<Exchange> {
        self.send(question)
    }

    /// Submit typed input. Blank input is rejected.
    pub fn submit_free_text(&mut self, text: &str) -> Option<Exchange> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.send(text)
    }

    fn send(&mut self, text: &str) -> Option<Exchange> {
        let Some((generation, request)) = self.chat.begin(text) else {
            tracing::debug!(status = ?self.chat.status(), "Send rejected, exchange outstanding");
            return None;
        };
        self.view = ViewState::Chat;
        Some(Exchange {
            generation,
            request,
        })
    }

    /// Feed one reply event for exchange `generation`.
    ///
    /// Events from an abandoned exchange are dropped. Returns whether the
    /// session changed.
    pub fn apply_reply(&mut self, generation: u64, event: ReplyEvent) -> bool {
        if generation != self.chat.generation() {
            tracing::debug!(
                generation,
                current = self.chat.generation(),
                "Dropping reply event from abandoned exchange"
            );
            return false;
        }
        let finished = event == ReplyEvent::Finished;
        let changed = self.chat.apply(event);
        if changed && finished {
            self.view = ViewState::Chat;
        }
        changed
    }

    /// Leave chat, discarding the transcript, or hand back to the host when
    /// already browsing.
    pub fn go_back(&mut self) -> BackOutcome {
        match self.view {
            ViewState::Chat => {
                self.chat.reset();
                self.view = ViewState::Browsing;
                BackOutcome::ReturnedToBrowsing
            }
            ViewState::Browsing => BackOutcome::Delegated,
        }
    }

    /// Dispatch `exchange` on `backend` and apply its whole reply.
    ///
    /// `observe` sees every event before it is applied.
    pub async fn run_exchange<B: ChatBackend>(
        &mut self,
        backend: &B,
        exchange: Exchange,
        mut observe: impl FnMut(&ReplyEvent),
    ) -> ChatStatus {
        let outcome = self
            .try_run_exchange(backend, exchange, |event| {
                observe(event);
                Ok::<(), Infallible>(())
            })
            .await;
        match outcome {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }

    /// Like [`Self::run_exchange`], but an error from `observe` stops the
    /// exchange. The reply stream is dropped, which closes the request, and
    /// the event that failed is not applied.
    pub async fn try_run_exchange<B: ChatBackend, E>(
        &mut self,
        backend: &B,
        exchange: Exchange,
        mut observe: impl FnMut(&ReplyEvent) -> Result<(), E>,
    ) -> Result<ChatStatus, E> {
        let Exchange {
            generation,
            request,
        } = exchange;
        let mut replies = open_replies(backend, request).await;
        while let Some(event) = replies.next().await {
            observe(&event)?;
            self.apply_reply(generation, event);
        }
        Ok(self.chat.status())
    }

    // ========================================================================
    // Navigation actions
    // ========================================================================

    pub fn select_category(&mut self, name: &str) -> bool {
        self.nav.select_category(name)
    }

    pub fn select_card(&mut self, index: usize) -> bool {
        self.nav.select_card(index)
    }

    pub fn select_subcategory(&mut self, name: &str) -> bool {
        self.nav.select_subcategory(name)
    }

    pub fn cycle_subcategory(&mut self, forward: bool) -> bool {
        self.nav.cycle_subcategory(forward)
    }

    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        self.nav.scroll(direction)
    }

    pub fn scroll_to_card(&mut self, index: usize) -> bool {
        self.nav.scroll_to_card(index)
    }

    pub fn resize_strip(&mut self, visible_width: usize) {
        self.nav.resize(visible_width);
    }
}
