//! On-disk store for the configured feed list.
//!
//! Feeds live in a small TOML file (`feeds = [{ name, url }]`). The URL is
//! the unique key; names are free-form display labels. A missing or empty
//! file reads as an empty list so a fresh install needs no setup step.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A configured feed source: an operator-assigned display name plus the URL
/// that uniquely identifies it (case-sensitive exact match).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("feed URL already exists")]
    DuplicateUrl,

    #[error("failed to access feeds file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in feeds file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize feeds: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedsFile {
    #[serde(default)]
    feeds: Vec<Feed>,
}

/// Loads the feed list. Missing or empty file → empty list.
pub fn load_feeds(path: &Path) -> Result<Vec<Feed>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::Io(e)),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: FeedsFile = toml::from_str(&content)?;
    Ok(file.feeds)
}

/// Writes the full feed list, creating parent directories as needed.
pub fn save_feeds(path: &Path, feeds: &[Feed]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = FeedsFile {
        feeds: feeds.to_vec(),
    };
    let content = toml::to_string_pretty(&file)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Appends a feed, rejecting a URL that is already configured.
pub fn add_feed(path: &Path, feed: Feed) -> Result<(), StoreError> {
    let mut feeds = load_feeds(path)?;
    if feeds.iter().any(|f| f.url == feed.url) {
        return Err(StoreError::DuplicateUrl);
    }
    feeds.push(feed);
    save_feeds(path, &feeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn temp_store(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rivulet_store_test_{name}"));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("feeds.toml")
    }

    fn feed(name: &str, url: &str) -> Feed {
        Feed {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let path = temp_store("missing");
        let feeds = load_feeds(&path).unwrap();
        assert!(feeds.is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let path = temp_store("empty");
        std::fs::write(&path, "").unwrap();
        let feeds = load_feeds(&path).unwrap();
        assert!(feeds.is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let path = temp_store("roundtrip");
        let feeds = vec![
            feed("Hacker News", "https://news.ycombinator.com/rss"),
            feed("Lobsters", "https://lobste.rs/rss"),
        ];
        save_feeds(&path, &feeds).unwrap();
        assert_eq!(load_feeds(&path).unwrap(), feeds);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = std::env::temp_dir().join("rivulet_store_test_nested");
        std::fs::remove_dir_all(&dir).ok();
        let path = dir.join("deep").join("feeds.toml");
        save_feeds(&path, &[feed("A", "https://a.example/rss")]).unwrap();
        assert_eq!(load_feeds(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_add_feed_appends() {
        let path = temp_store("append");
        add_feed(&path, feed("A", "https://a.example/rss")).unwrap();
        add_feed(&path, feed("B", "https://b.example/rss")).unwrap();
        let feeds = load_feeds(&path).unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[1].name, "B");
    }

    #[test]
    fn test_add_feed_rejects_duplicate_url() {
        let path = temp_store("duplicate");
        add_feed(&path, feed("A", "https://a.example/rss")).unwrap();
        let err = add_feed(&path, feed("A Again", "https://a.example/rss")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUrl));
        // The store is untouched by the rejected add
        assert_eq!(load_feeds(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_check_is_case_sensitive() {
        let path = temp_store("case");
        add_feed(&path, feed("A", "https://a.example/rss")).unwrap();
        add_feed(&path, feed("B", "https://a.example/RSS")).unwrap();
        assert_eq!(load_feeds(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let path = temp_store("malformed");
        std::fs::write(&path, "feeds = [not valid").unwrap();
        assert!(matches!(load_feeds(&path), Err(StoreError::Parse(_))));
    }
}
