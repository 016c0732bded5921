//! Terminal client for an education-directory assistant.
//!
//! Browse suggested questions grouped by category, or ask your own, and
//! watch the answer stream in.
//!
//! - [`cache`] - TTL-bounded key/value cache over a pluggable store
//! - [`catalog`] - Suggested-question catalog and its cached fetcher
//! - [`chat`] - Transcript state and the streaming reply transport
//! - [`session`] - Browse/chat state machine tying the above together
//! - [`nav`] - Card, sub-tab and scroll-strip navigation
//! - [`storage`] - SQLite backing store for the cache
//! - [`ui`] - ratatui front end

pub mod app;
pub mod cache;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod nav;
pub mod session;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
