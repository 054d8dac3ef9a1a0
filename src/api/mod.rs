//! HTTP surface: a single `/rss` resource.
//!
//! `GET /rss` runs one aggregation pass over the configured feeds and
//! returns the merged posts filtered by a date window; `PUT /rss` validates
//! and registers a new feed. Everything else about the service lives in
//! [`crate::feed`].

mod handlers;

use crate::config::Config;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, client: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/rss", get(handlers::get_posts).put(handlers::add_feed))
        .layer(cors)
        .with_state(state)
}
