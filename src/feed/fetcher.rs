use crate::feed::store::Feed;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// One article extracted from a feed.
///
/// `feed_name` starts out as the title the document reports about itself;
/// [`fetch_all`] overwrites it with the operator-configured name before
/// merging. `published_at` is `None` when the source supplies neither a
/// publish nor an update date, and serializes as `null`; consumers must
/// treat that as "unknown", not as a real date.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub feed_name: String,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Errors that can occur while fetching and parsing a single feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The per-feed timeout elapsed before fetch and parse completed
    #[error("request timed out")]
    Timeout,
    /// Response body could not be parsed as RSS or Atom
    #[error("parse error: {0}")]
    Parse(String),
}

/// A single feed's failure within one aggregation pass.
///
/// Carries the configured feed identity so callers can log the failure
/// without losing track of which feed produced it.
#[derive(Debug, Error)]
#[error("feed {feed_name:?} ({url}): {error}")]
pub struct FeedFailure {
    pub feed_name: String,
    pub url: String,
    pub error: FetchError,
}

/// Fetches one feed URL and projects its items into posts.
///
/// Performs a single GET bounded by `timeout`; the body must parse as an
/// RSS or Atom document. Items are taken in document order, truncated to
/// `max_posts` (0 means take none). Per item the publish date wins, the
/// update date is the fallback, and a post with neither keeps
/// `published_at: None`. All timestamps are UTC.
///
/// The standalone fetcher does not know the configured display name, so
/// `feed_name` is filled from the document's own title (empty when the
/// document has none).
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    max_posts: usize,
    timeout: Duration,
) -> Result<Vec<Post>, FetchError> {
    let request = async {
        let response = client.get(url).send().await.map_err(FetchError::Network)?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        response.bytes().await.map_err(FetchError::Network)
    };
    let bytes = tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| FetchError::Timeout)??;

    let parsed =
        feed_rs::parser::parse(bytes.as_ref()).map_err(|e| FetchError::Parse(e.to_string()))?;
    let feed_title = parsed.title.map(|t| t.content).unwrap_or_default();

    let posts = parsed
        .entries
        .into_iter()
        .take(max_posts)
        .map(|entry| Post {
            feed_name: feed_title.clone(),
            title: entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string()),
            url: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            published_at: entry.published.or(entry.updated),
        })
        .collect();

    Ok(posts)
}

/// Confirms that `url` resolves to a parseable RSS/Atom document.
///
/// A feed with zero items still validates; only fetch or parse failures are
/// errors. Callers must not persist a feed that fails this check.
pub async fn validate_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<(), FetchError> {
    fetch_feed(client, url, 1, timeout).await.map(|_| ())
}

/// Fetches every configured feed concurrently and merges the results.
///
/// One in-flight fetch per feed, all started immediately, each under its own
/// independent `timeout`. The stream is an all-complete barrier: no early
/// exit on first success or failure, and dropping the returned future
/// cancels every fetch still in flight. Every feed resolves to exactly one
/// outcome, either a batch of posts or one [`FeedFailure`], so
/// `contributing feeds + failures == feeds.len()`.
///
/// Successful posts have `feed_name` overwritten with the configured name,
/// then the combined list is sorted by `published_at`, most recent first.
/// Failures are returned in completion order, not input order.
///
/// This layer imposes no limit on the number of feeds and performs no
/// retries; admission control is the caller's problem.
pub async fn fetch_all(
    client: &reqwest::Client,
    feeds: &[Feed],
    max_posts_per_feed: usize,
    timeout: Duration,
) -> (Vec<Post>, Vec<FeedFailure>) {
    if feeds.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let outcomes: Vec<Result<Vec<Post>, FeedFailure>> = stream::iter(feeds.iter().cloned())
        .map(|feed| {
            let client = client.clone();
            async move {
                match fetch_feed(&client, &feed.url, max_posts_per_feed, timeout).await {
                    Ok(mut posts) => {
                        // The configured name wins over whatever title the
                        // document reports about itself.
                        for post in &mut posts {
                            post.feed_name = feed.name.clone();
                        }
                        Ok(posts)
                    }
                    Err(error) => Err(FeedFailure {
                        feed_name: feed.name,
                        url: feed.url,
                        error,
                    }),
                }
            }
        })
        .buffer_unordered(feeds.len())
        .collect()
        .await;

    let mut posts = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(batch) => posts.extend(batch),
            Err(failure) => failures.push(failure),
        }
    }

    // None sorts as the earliest possible value, so undated posts sink to
    // the end of the merged stream.
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    (posts, failures)
}
