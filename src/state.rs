//! Shared ownership of the most recently fetched feed document.
//!
//! One writer (the refresh pipeline) and any number of readers (UI-driven
//! accessor calls) share a single slot. Publication is replace-by-reference
//! under a momentary write lock, so a reader sees either the previous
//! document or the new one in full — never a half-built value — and no lock
//! is ever held across I/O.

use crate::feed::FeedDocument;
use std::sync::{Arc, PoisonError, RwLock};

/// Cheaply clonable handle to the current feed document slot.
///
/// Starts absent. A failed refresh puts it back to absent: the pipeline is
/// deliberately fail-fast, and stale data never outlives the fetch cycle
/// that produced it.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    inner: Arc<RwLock<Option<Arc<FeedDocument>>>>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the current document with a fully built one.
    pub fn publish(&self, doc: FeedDocument) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(doc));
    }

    /// Reset the slot to absent.
    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Reference-counted snapshot of the current document, no copying.
    pub fn snapshot(&self) -> Option<Arc<FeedDocument>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedEntry;

    fn doc_with_entries(n: usize) -> FeedDocument {
        FeedDocument {
            entries: (0..n)
                .map(|i| FeedEntry {
                    title: format!("entry {i}"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_absent() {
        assert!(FeedState::new().snapshot().is_none());
    }

    #[test]
    fn test_publish_then_snapshot() {
        let state = FeedState::new();
        state.publish(doc_with_entries(3));

        let snap = state.snapshot().unwrap();
        assert_eq!(snap.entries.len(), 3);
    }

    #[test]
    fn test_publish_replaces_previous() {
        let state = FeedState::new();
        state.publish(doc_with_entries(5));
        state.publish(doc_with_entries(1));

        assert_eq!(state.snapshot().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_clear_resets_to_absent() {
        let state = FeedState::new();
        state.publish(doc_with_entries(5));
        state.clear();

        assert!(state.snapshot().is_none());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let writer = FeedState::new();
        let reader = writer.clone();

        writer.publish(doc_with_entries(2));
        assert_eq!(reader.snapshot().unwrap().entries.len(), 2);

        writer.clear();
        assert!(reader.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_outlives_replacement() {
        let state = FeedState::new();
        state.publish(doc_with_entries(4));

        let held = state.snapshot().unwrap();
        state.publish(doc_with_entries(9));

        // The old snapshot is still intact; new readers see the replacement
        assert_eq!(held.entries.len(), 4);
        assert_eq!(state.snapshot().unwrap().entries.len(), 9);
    }
}
