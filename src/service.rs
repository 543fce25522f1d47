//! The feed service: owns configuration, the geolocation seam, and the
//! shared current-feed state, and drives one fetch cycle end to end —
//! resolve locale → build URL → fetch → parse → normalize → publish.

use crate::config::FeedConfig;
use crate::feed::{self, FeedDocument, FeedProvider, FeedRetriever, FetchError};
use crate::locale::{determine_locale, supported_or_default, GeoLookup};
use crate::state::FeedState;
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a refresh cycle.
///
/// Whichever variant occurs, the shared state has already been cleared to
/// absent by the time the caller sees it: accessors report an empty feed,
/// never data from an earlier cycle.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Retrieval or decompression failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Decompressed payload did not match the feed schema
    #[error("Malformed feed document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One owner for the whole pipeline. Clones share the underlying state
/// slot, so a UI thread can hold its own handle for queries while another
/// drives refreshes.
#[derive(Clone)]
pub struct FeedService {
    config: FeedConfig,
    geo: Arc<dyn GeoLookup>,
    state: FeedState,
}

impl FeedService {
    pub fn new(config: FeedConfig, geo: Arc<dyn GeoLookup>) -> Self {
        Self {
            config,
            geo,
            state: FeedState::new(),
        }
    }

    /// Resolve the endpoint URL for the configured locale.
    ///
    /// The requested locale first collapses onto the supported set, then an
    /// `en_US` default may be overridden by geolocation. Never fails; the
    /// worst case is the default locale's URL.
    pub async fn feed_url(&self) -> String {
        let requested = supported_or_default(&self.config.locale);
        let locale = determine_locale(requested, self.geo.as_ref()).await;
        let url = self.config.feed_url(&locale);
        tracing::debug!(url = %url, "Resolved feed URL");
        url
    }

    /// Run one full fetch cycle and publish the result.
    ///
    /// `provider` is notified of each source title while the new document is
    /// normalized. On any failure the current feed is cleared to absent —
    /// deliberately fail-fast, never a stale cache — and the error is
    /// returned so callers and tests can see what went wrong. A previously
    /// published document stays visible to readers until this cycle
    /// completes one way or the other.
    pub async fn refresh(&self, provider: &mut dyn FeedProvider) -> Result<(), RefreshError> {
        match self.try_refresh(provider).await {
            Ok(entries) => {
                tracing::info!(entries, "Feed refreshed");
                Ok(())
            }
            Err(e) => {
                self.state.clear();
                tracing::error!(error = %e, "Feed refresh failed, current feed cleared");
                Err(e)
            }
        }
    }

    async fn try_refresh(&self, provider: &mut dyn FeedProvider) -> Result<usize, RefreshError> {
        let url = self.feed_url().await;
        let bytes = feed::fetch_feed(
            &url,
            self.config.proxy.as_deref(),
            self.config.request_timeout(),
        )
        .await?;

        let mut doc = feed::parse_document(&bytes)?;
        feed::normalize(&mut doc, &self.config.all_label, provider);

        let entries = doc.entries.len();
        self.state.publish(doc);
        Ok(entries)
    }

    /// Stream the named source's entries into `retriever`, in stored order.
    ///
    /// Absent state or an unknown name yields no calls — not an error.
    pub fn feed_by_name(&self, name: &str, retriever: &mut dyn FeedRetriever) {
        if let Some(doc) = self.state.snapshot() {
            for entry in doc.entries_for(name) {
                retriever.add_feed(&entry.title, &entry.description, &entry.image, &entry.link);
            }
        }
    }

    /// Total number of entries in the current document, zero when absent.
    pub fn entry_count(&self) -> usize {
        match self.state.snapshot() {
            Some(doc) => doc.entries.len(),
            None => {
                tracing::debug!("No current feed, reporting zero entries");
                0
            }
        }
    }

    /// Snapshot of the current document, without copying. `None` = absent.
    pub fn current(&self) -> Option<Arc<FeedDocument>> {
        self.state.snapshot()
    }
}

// ============================================================================
// Tests
// ============================================================================
