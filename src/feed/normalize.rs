//! Turns raw feed bytes into a fully indexed [`FeedDocument`].
//!
//! Normalization derives a description for every entry, builds the "all"
//! bucket (honoring per-source exclusion), announces sources to the UI in
//! display order, and indexes entries per source title. Data-quality
//! problems — unknown source keys, missing titles, out-of-range entry
//! indices — are logged and skipped, never fatal.

use crate::feed::model::{FeedDocument, FeedEntry, FeedProvider};
use serde_json::Value;

/// Deserialize the decompressed feed payload.
///
/// Any schema mismatch fails the whole cycle; there is no partial document.
pub fn parse_document(bytes: &[u8]) -> Result<FeedDocument, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Derive descriptions and rebuild every bucket of `items_by_source`.
///
/// `all_label` keys the synthetic bucket of entries from all non-excluded
/// sources — the caller supplies it already localized. `provider` is told
/// about each valid source title, in `sorted_sources` order, exactly once.
pub fn normalize(doc: &mut FeedDocument, all_label: &str, provider: &mut dyn FeedProvider) {
    tracing::debug!(entries = doc.entries.len(), "Normalizing feed document");

    for entry in &mut doc.entries {
        entry.description = derive_description(entry);
    }

    doc.items_by_source.clear();

    // The "all" bucket: every entry whose source is known and not excluded,
    // in arrival order. An unknown source key counts as excluded.
    let all: Vec<usize> = doc
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| {
            doc.sources
                .get(&entry.source_key)
                .is_some_and(|source| !source.exclude_from_all)
        })
        .map(|(idx, _)| idx)
        .collect();
    doc.items_by_source.insert(all_label.to_string(), all);

    // Announce sources to the UI in display order
    for key in &doc.sorted_sources {
        match doc.sources.get(key) {
            Some(source) if !source.title.is_empty() => {
                tracing::debug!(source = %source.title, "Adding feed source");
                provider.add_source(&source.title);
            }
            Some(_) => {
                tracing::warn!(source = %key, "Skipping feed source: missing title");
            }
            None => {
                tracing::warn!(source = %key, "Skipping feed source: missing from sources map");
            }
        }
    }

    // Per-source buckets keyed by title, preserving each source's stored
    // entry order. Indices that do not land inside `entries` are dropped
    // here so every stored index is valid from now on.
    for source in doc.sources.values() {
        let bucket = doc.items_by_source.entry(source.title.clone()).or_default();
        for &raw_idx in &source.entry_indices {
            match usize::try_from(raw_idx)
                .ok()
                .filter(|&idx| idx < doc.entries.len())
            {
                Some(idx) => bucket.push(idx),
                None => {
                    tracing::warn!(
                        source = %source.title,
                        index = raw_idx,
                        entries = doc.entries.len(),
                        "Entry index out of range, skipping"
                    );
                }
            }
        }
    }
}

/// Description precedence: trimmed `meta["description"]` when it is a
/// non-empty string, the raw content snippet otherwise. Empty is legal.
fn derive_description(entry: &FeedEntry) -> String {
    let meta_desc = entry
        .meta
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");

    if meta_desc.is_empty() {
        entry.content.clone()
    } else {
        meta_desc.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
