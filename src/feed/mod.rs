//! Feed fetching, merging, and the configured feed list.
//!
//! This module is the core of the service:
//!
//! - [`fetcher`] - single-feed fetch/parse, the concurrent fan-out
//!   aggregator, and validation of candidate feed URLs
//! - [`store`] - the on-disk list of configured feeds
//!
//! The aggregator is the only place concurrency is introduced; everything
//! else is a plain async call that resolves when its own network I/O does.

mod fetcher;
mod store;

pub use fetcher::{fetch_all, fetch_feed, validate_feed, FeedFailure, FetchError, Post};
pub use store::{add_feed, load_feeds, save_feeds, Feed, StoreError};
