//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Background task spawning
//! - `render` - Frame layout
//! - `browse` - Card carousel, sub-tab strip, suggested questions
//! - `chat` - Conversation transcript
//! - `markdown` - Markdown rendering for replies
//! - `status` - Status bar widget

mod browse;
mod chat;
mod events;
mod helpers;
mod input;
mod loop_runner;
pub mod markdown;
mod render;
mod status;

pub use loop_runner::{run, Action};
