//! Feed entries and the per-fetch result that wraps them.
//!
//! Counting is the only thing the tracker does with entries, so the fields
//! here are kept for logging and for hosts that want to show more than a
//! number.

use std::fmt;

use chrono::{DateTime, Utc};

/// One `<item>` from a game-list feed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedEntry {
    /// Display title, usually the game name.
    pub title: String,

    /// Link to the game page.
    pub link: Option<String>,

    /// Publication timestamp, when the feed provides a parseable one.
    pub published: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            published: None,
        }
    }
}

impl fmt::Display for FeedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        if let Some(link) = &self.link {
            write!(f, " <{link}>")?;
        }
        if let Some(published) = &self.published {
            write!(f, " ({})", published.format("%Y-%m-%d %H:%M UTC"))?;
        }
        Ok(())
    }
}

/// The outcome of fetching one feed.
///
/// Failed fetches are substituted with [`FeedResult::empty`] so counting can
/// proceed; the failure itself is reported through the error hook.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FeedResult {
    pub items: Vec<FeedEntry>,
}

impl FeedResult {
    pub fn new(items: Vec<FeedEntry>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_no_items() {
        let result = FeedResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert_eq!(result, FeedResult { items: vec![] });
    }

    #[test]
    fn new_entry_has_no_link_or_date() {
        let entry = FeedEntry::new("Battle of Midway");
        assert_eq!(entry.title, "Battle of Midway");
        assert!(entry.link.is_none());
        assert!(entry.published.is_none());
    }

    #[test]
    fn display_includes_link_and_date_when_present() {
        assert_eq!(FeedEntry::new("Classic Risk").to_string(), "Classic Risk");

        let entry = FeedEntry {
            title: "Europe 1914".into(),
            link: Some("http://warfish.net/war/play/game?gid=101".into()),
            published: DateTime::parse_from_rfc3339("2024-01-01T09:30:00Z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        assert_eq!(
            entry.to_string(),
            "Europe 1914 <http://warfish.net/war/play/game?gid=101> (2024-01-01 09:30 UTC)"
        );
    }
}
