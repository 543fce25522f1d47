//! Feed retrieval and normalization.
//!
//! This module owns everything between the wire and the published document:
//!
//! - **Model**: the deserialized feed document, its sources and entries,
//!   and the collaborator traits the UI layer implements
//! - **Fetching**: a single-attempt HTTP GET (optionally proxied) that
//!   returns the gzip-decompressed body bytes
//! - **Normalization**: description derivation, exclusion filtering, and
//!   per-source indexing of entries
//!
//! The module is organized into three submodules:
//!
//! - [`model`] - Wire/data types and the `FeedProvider`/`FeedRetriever` seams
//! - [`fetcher`] - HTTP retrieval and gzip decompression
//! - [`normalize`] - Parsing and the bucket-building transform

mod fetcher;
mod model;
mod normalize;

pub use fetcher::{fetch_feed, FetchError};
pub use model::{FeedDocument, FeedEntry, FeedProvider, FeedRetriever, Source};
pub use normalize::{normalize, parse_document};
