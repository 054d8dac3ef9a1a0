use crate::api::AppState;
use crate::feed::{self, Feed, Post, StoreError};
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Days, Months, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use url::Url;

/// Marker header set when every configured feed failed in one pass.
const FEED_ERRORS_HEADER: &str = "x-feed-errors";

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    range: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

/// An inclusive `[from, to]` filter over post publish times. An absent
/// bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateWindow {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl DateWindow {
    const UNBOUNDED: DateWindow = DateWindow {
        from: None,
        to: None,
    };

    fn contains(&self, published: Option<DateTime<Utc>>) -> bool {
        if let Some(from) = self.from {
            // An unknown timestamp falls below any lower bound
            match published {
                None => return false,
                Some(t) if t < from => return false,
                Some(_) => {}
            }
        }
        if let (Some(to), Some(t)) = (self.to, published) {
            if t > to {
                return false;
            }
        }
        true
    }
}

/// GET /rss: one aggregation pass over the configured feeds, filtered to
/// the requested date window, newest first.
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Response {
    let window = match resolve_window(&query, &state.config.default_range, Utc::now()) {
        Ok(w) => w,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };

    let feeds = match feed::load_feeds(&state.config.data_file) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(path = %state.config.data_file.display(), error = %e, "Failed to read feeds file");
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response();
        }
    };

    let (posts, failures) = feed::fetch_all(
        &state.client,
        &feeds,
        state.config.max_posts_per_feed,
        state.config.fetch_timeout(),
    )
    .await;

    for failure in &failures {
        tracing::error!(
            feed = %failure.feed_name,
            url = %failure.url,
            error = %failure.error,
            "Feed fetch failed"
        );
    }

    let all_failed = !feeds.is_empty() && failures.len() == feeds.len();

    let filtered: Vec<Post> = posts
        .into_iter()
        .filter(|p| window.contains(p.published_at))
        .collect();

    // Vec serializes as [] when empty, never null
    let mut response = Json(filtered).into_response();
    if all_failed {
        response.headers_mut().insert(
            FEED_ERRORS_HEADER,
            HeaderValue::from_static("all-feeds-failed"),
        );
    }
    response
}

#[derive(Debug, Deserialize)]
pub struct AddFeedRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

/// PUT /rss: validate a candidate feed and persist it. Nothing is stored
/// unless the URL fetches and parses as a feed.
pub async fn add_feed(
    State(state): State<AppState>,
    Json(req): Json<AddFeedRequest>,
) -> Response {
    if req.name.is_empty() || req.url.is_empty() {
        return (StatusCode::BAD_REQUEST, "name and url are required").into_response();
    }
    if let Err(e) = Url::parse(&req.url) {
        return (StatusCode::BAD_REQUEST, format!("invalid url: {e}")).into_response();
    }

    if let Err(e) = feed::validate_feed(&state.client, &req.url, state.config.fetch_timeout()).await
    {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("URL is not a valid RSS/Atom feed: {e}"),
        )
            .into_response();
    }

    let new_feed = Feed {
        name: req.name,
        url: req.url,
    };
    match feed::add_feed(&state.config.data_file, new_feed.clone()) {
        Ok(()) => {
            tracing::info!(name = %new_feed.name, url = %new_feed.url, "Feed added");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Feed added successfully",
                    "feed": new_feed,
                })),
            )
                .into_response()
        }
        Err(StoreError::DuplicateUrl) => {
            tracing::warn!(url = %new_feed.url, "Duplicate feed URL rejected");
            (StatusCode::CONFLICT, "feed URL already exists").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add feed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

/// Resolves query parameters into a date window.
///
/// Explicit `from`/`to` (RFC 3339) take precedence over any preset. With
/// neither given, the `range` preset applies: absent means the configured
/// default, while a present-but-empty value means unbounded "all time",
/// the one escape hatch from the default window.
fn resolve_window(
    query: &PostsQuery,
    default_range: &str,
    now: DateTime<Utc>,
) -> Result<DateWindow, String> {
    if query.from.is_some() || query.to.is_some() {
        let from = query
            .from
            .as_deref()
            .map(|s| parse_rfc3339(s, "from"))
            .transpose()?;
        let to = query
            .to
            .as_deref()
            .map(|s| parse_rfc3339(s, "to"))
            .transpose()?;
        return Ok(DateWindow { from, to });
    }

    let preset = match query.range.as_deref() {
        None => default_range,
        Some("") => return Ok(DateWindow::UNBOUNDED),
        Some(r) => r,
    };

    let start_of_today = now.with_time(NaiveTime::MIN).single().unwrap_or(now);
    let from = match preset {
        "today" => start_of_today,
        "last_week" => back_days(start_of_today, 7),
        "last_month" => back_months(start_of_today, 1),
        "last_3_months" => back_months(start_of_today, 3),
        "last_6_months" => back_months(start_of_today, 6),
        "last_year" => back_months(start_of_today, 12),
        other => return Err(format!("invalid range: {other:?}")),
    };

    Ok(DateWindow {
        from: Some(from),
        to: None,
    })
}

fn parse_rfc3339(value: &str, param: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid '{param}' parameter: {e}"))
}

fn back_days(start: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    start.checked_sub_days(Days::new(days)).unwrap_or(start)
}

fn back_months(start: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    start
        .checked_sub_months(Months::new(months))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn query(range: Option<&str>, from: Option<&str>, to: Option<&str>) -> PostsQuery {
        PostsQuery {
            range: range.map(String::from),
            from: from.map(String::from),
            to: to.map(String::from),
        }
    }

    const NOW: &str = "2026-02-16T15:30:00Z";

    #[test]
    fn test_explicit_bounds_take_precedence_over_preset() {
        let q = query(Some("today"), Some("2026-01-01T00:00:00Z"), None);
        let w = resolve_window(&q, "last_month", at(NOW)).unwrap();
        assert_eq!(w.from, Some(at("2026-01-01T00:00:00Z")));
        assert_eq!(w.to, None);
    }

    #[test]
    fn test_invalid_from_is_rejected() {
        let q = query(None, Some("yesterday-ish"), None);
        let err = resolve_window(&q, "last_month", at(NOW)).unwrap_err();
        assert!(err.contains("'from'"));
    }

    #[test]
    fn test_absent_range_uses_default_preset() {
        let q = query(None, None, None);
        let w = resolve_window(&q, "last_week", at(NOW)).unwrap();
        assert_eq!(w.from, Some(at("2026-02-09T00:00:00Z")));
        assert_eq!(w.to, None);
    }

    #[test]
    fn test_empty_range_means_unbounded() {
        let q = query(Some(""), None, None);
        let w = resolve_window(&q, "last_month", at(NOW)).unwrap();
        assert_eq!(w, DateWindow::UNBOUNDED);
    }

    #[test]
    fn test_today_starts_at_utc_midnight() {
        let q = query(Some("today"), None, None);
        let w = resolve_window(&q, "last_month", at(NOW)).unwrap();
        assert_eq!(w.from, Some(at("2026-02-16T00:00:00Z")));
    }

    #[test]
    fn test_month_presets() {
        for (preset, expected) in [
            ("last_month", "2026-01-16T00:00:00Z"),
            ("last_3_months", "2025-11-16T00:00:00Z"),
            ("last_6_months", "2025-08-16T00:00:00Z"),
            ("last_year", "2025-02-16T00:00:00Z"),
        ] {
            let q = query(Some(preset), None, None);
            let w = resolve_window(&q, "last_month", at(NOW)).unwrap();
            assert_eq!(w.from, Some(at(expected)), "preset {preset}");
        }
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        let q = query(Some("fortnight"), None, None);
        assert!(resolve_window(&q, "last_month", at(NOW)).is_err());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = DateWindow {
            from: Some(at("2026-02-01T00:00:00Z")),
            to: Some(at("2026-02-10T00:00:00Z")),
        };
        assert!(w.contains(Some(at("2026-02-01T00:00:00Z"))));
        assert!(w.contains(Some(at("2026-02-10T00:00:00Z"))));
        assert!(!w.contains(Some(at("2026-01-31T23:59:59Z"))));
        assert!(!w.contains(Some(at("2026-02-10T00:00:01Z"))));
    }

    #[test]
    fn test_undated_posts_drop_below_a_lower_bound() {
        let bounded = DateWindow {
            from: Some(at("2026-02-01T00:00:00Z")),
            to: None,
        };
        assert!(!bounded.contains(None));
        assert!(DateWindow::UNBOUNDED.contains(None));
    }
}
