use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Wire Types
// ============================================================================

/// The full deserialized payload from the remote feed endpoint, plus the
/// derived per-source index built during normalization.
///
/// `entries` order is significant: `Source::entry_indices` and
/// `items_by_source` both refer to entries by position in this list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedDocument {
    /// Content authorities keyed by source identifier.
    #[serde(rename = "feeds")]
    pub sources: HashMap<String, Source>,

    /// Every entry in the feed, in arrival order.
    pub entries: Vec<FeedEntry>,

    /// Source keys in UI display order.
    #[serde(rename = "sorted_feeds")]
    pub sorted_sources: Vec<String>,

    /// Display label (source title, or the caller's "all" label) to entry
    /// indices, in insertion order. Derived — rebuilt from scratch on every
    /// successful fetch, never part of the wire format. Indices stored here
    /// have been validated against `entries`.
    #[serde(skip)]
    pub items_by_source: HashMap<String, Vec<usize>>,
}

impl FeedDocument {
    /// Iterate the entries bucketed under a display label, in stored order.
    ///
    /// Unknown labels yield an empty iterator. Index lookups are defensive:
    /// a stale index silently yields nothing rather than panicking.
    pub fn entries_for<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a FeedEntry> + 'a {
        self.items_by_source
            .get(label)
            .into_iter()
            .flatten()
            .filter_map(move |&idx| self.entries.get(idx))
    }
}

/// A content authority contributing entries to the feed (a news outlet,
/// an aggregator, etc.).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Source {
    #[serde(rename = "feedUrl")]
    pub feed_url: String,

    /// Display title. May be empty — such sources are skipped when listing
    /// sources for the UI, but their buckets are still built.
    pub title: String,

    #[serde(rename = "link")]
    pub link: String,

    /// When true, this source's entries are omitted from the "all" bucket.
    #[serde(rename = "excludeFromAll")]
    pub exclude_from_all: bool,

    /// Positions of this source's entries in `FeedDocument::entries`, in the
    /// order the source wants them shown. Raw wire integers: values may be
    /// negative or past the end of `entries` and are validated (and skipped
    /// with a diagnostic) during normalization.
    #[serde(rename = "entries")]
    pub entry_indices: Vec<i64>,
}

/// One article/item within the feed document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub image: String,

    /// Free-form metadata. Only the `description` key is ever interpreted,
    /// and only when it holds a string.
    pub meta: HashMap<String, Value>,

    /// Raw snippet text from the source.
    #[serde(rename = "contentSnippetText")]
    pub content: String,

    /// Key into `FeedDocument::sources`. Entries whose key matches no known
    /// source are left out of the "all" bucket.
    #[serde(rename = "source")]
    pub source_key: String,

    /// Derived during normalization: trimmed `meta["description"]` when that
    /// is a non-empty string, the raw `content` otherwise. Never on the wire.
    #[serde(skip)]
    pub description: String,
}

// ============================================================================
// UI Collaborator Interfaces
// ============================================================================

/// Implemented by the UI layer: receives the ordered list of source titles
/// while a freshly fetched document is being normalized.
pub trait FeedProvider {
    /// Called once per valid source, in `sorted_sources` order.
    fn add_source(&mut self, title: &str);
}

/// Implemented by the UI layer: collects one source's entries when the feed
/// is queried by source name.
pub trait FeedRetriever {
    /// Called once per entry, in the source's stored order.
    fn add_feed(&mut self, title: &str, description: &str, image: &str, link: &str);
}

// ============================================================================
// Tests
// ============================================================================
