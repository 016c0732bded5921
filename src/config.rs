//! Configuration file parser for ~/.config/scholar/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde but logged as likely typos.
//! `SCHOLAR_BASE_URL` and `SCHOLAR_API_TOKEN` override the file.
use crate::catalog::{default_cards, CategoryCard};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

pub const BASE_URL_ENV: &str = "SCHOLAR_BASE_URL";
pub const API_TOKEN_ENV: &str = "SCHOLAR_API_TOKEN";

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` masks `api_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service origin both endpoints are resolved against.
    pub base_url: String,

    pub catalog_path: String,

    pub chat_path: String,

    /// How long a fetched catalog is reused, in hours.
    pub cache_ttl_hours: u64,

    /// Timeout for the catalog request. The chat stream has none.
    pub catalog_timeout_secs: u64,

    /// Optional bearer token sent with chat requests.
    pub api_token: Option<String>,

    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// Name shown in the header.
    pub assistant_name: String,

    pub max_questions_per_card: usize,

    /// Columns the sub-tab strip moves per scroll.
    pub scroll_step: usize,

    /// Browsable cards, in display order.
    pub cards: Vec<CategoryCard>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            catalog_path: "/api/predefined-questions".to_string(),
            chat_path: "/api/chat".to_string(),
            cache_ttl_hours: 24,
            catalog_timeout_secs: 10,
            api_token: None,
            theme: "dark".to_string(),
            assistant_name: "TrueScholar AI".to_string(),
            max_questions_per_card: 3,
            scroll_step: 12,
            cards: default_cards(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("catalog_path", &self.catalog_path)
            .field("chat_path", &self.chat_path)
            .field("cache_ttl_hours", &self.cache_ttl_hours)
            .field("catalog_timeout_secs", &self.catalog_timeout_secs)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("theme", &self.theme)
            .field("assistant_name", &self.assistant_name)
            .field("max_questions_per_card", &self.max_questions_per_card)
            .field("scroll_step", &self.scroll_step)
            .field("cards", &self.cards.len())
            .finish()
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 11] = [
        "base_url",
        "catalog_path",
        "chat_path",
        "cache_ttl_hours",
        "catalog_timeout_secs",
        "api_token",
        "theme",
        "assistant_name",
        "max_questions_per_card",
        "scroll_step",
        "cards",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Cards without sub-tabs are dropped; no usable cards → built-in cards
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file can't exhaust memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        config.sanitize_cards();
        tracing::info!(
            path = %path.display(),
            base_url = %config.base_url,
            cards = config.cards.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in the
    /// binary and a map in tests.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(base_url = %url, "Base URL overridden by environment");
            self.base_url = url;
        }
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_token = Some(token);
        }
        self
    }

    pub fn api_token_secret(&self) -> Option<SecretString> {
        self.api_token.clone().map(SecretString::from)
    }

    /// Catalog cache TTL, never shorter than an hour.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.max(1).saturating_mul(60 * 60))
    }

    /// Questions shown per card, at least one.
    pub fn max_questions(&self) -> usize {
        self.max_questions_per_card.max(1)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs.max(1))
    }

    fn sanitize_cards(&mut self) {
        self.cards.retain(|card| {
            let usable = !card.sub_tabs.is_empty();
            if !usable {
                tracing::warn!(card = %card.name, "Dropping card with no sub_tabs");
            }
            usable
        });
        if self.cards.is_empty() {
            self.cards = default_cards();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
