//! Feed pipeline configuration.
//!
//! A `FeedConfig` can be built directly, taken from `Default`, or loaded
//! from an optional TOML file — a missing or empty file yields the defaults,
//! and any subset of keys may be specified. Unknown keys are silently ignored
//! by serde (`deny_unknown_fields` is off).

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::locale::DEFAULT_LOCALE;

/// Where the curated feed is published: one variant per supported locale,
/// selected by substituting the `%s` placeholder.
pub const DEFAULT_ENDPOINT: &str = "https://feeds.getiantem.org/%s/feed.json";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Configuration
// ============================================================================

/// Everything the fetch pipeline needs to know up front.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Feed endpoint URL template containing a single `%s` locale placeholder.
    pub endpoint: String,

    /// Requested/default locale. Empty behaves as `en_US`; locales outside
    /// the supported set collapse to `en_US` at fetch time.
    pub locale: String,

    /// Localized display label for the "all items" bucket.
    pub all_label: String,

    /// Proxy address to route the fetch through. `None` or empty = direct.
    pub proxy: Option<String>,

    /// Overall per-request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            all_label: "All".to_string(),
            proxy: None,
            request_timeout_secs: 30,
        }
    }
}

impl FeedConfig {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(FeedConfig::default())`
    /// - Empty file → `Ok(FeedConfig::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: FeedConfig = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), locale = %config.locale, "Loaded feed configuration");
        Ok(config)
    }

    /// Format the final feed URL for a resolved locale.
    ///
    /// Pure formatting: the template's first `%s` is replaced with the
    /// locale. Templates are trusted configuration — nothing validates
    /// them here.
    pub fn feed_url(&self, locale: &str) -> String {
        self.endpoint.replacen("%s", locale, 1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
