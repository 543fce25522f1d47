//! Localized feed retrieval and normalization.
//!
//! One [`FeedService`] owns the pipeline: it resolves the effective locale
//! (geolocation can override an `en_US` default), substitutes it into the
//! endpoint template, fetches and gunzips the document, normalizes it into
//! per-source buckets, and publishes it to a process-shared slot that
//! accessor queries read concurrently.

mod config;
mod feed;
mod locale;
mod service;
mod state;

pub use config::{ConfigError, FeedConfig, DEFAULT_ENDPOINT};
pub use feed::{
    fetch_feed, normalize, parse_document, FeedDocument, FeedEntry, FeedProvider, FeedRetriever,
    FetchError, Source,
};
pub use locale::{
    determine_locale, supported_or_default, GeoLookup, NoLookup, DEFAULT_LOCALE, SUPPORTED_LOCALES,
};
pub use service::{FeedService, RefreshError};
pub use state::FeedState;
