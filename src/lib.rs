//! rivulet aggregates RSS/Atom feeds into one time-ordered stream.
//!
//! The service fetches every configured feed concurrently under independent
//! per-feed timeouts, merges whatever succeeded into a single list sorted by
//! publish time (newest first), and serves it over a small HTTP API filtered
//! by date range. A feed that fails is reported, never fatal: one aggregation
//! pass always returns everything that was obtainable plus one structured
//! failure per feed that was not.

pub mod api;
pub mod config;
pub mod feed;
