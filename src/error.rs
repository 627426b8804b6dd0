//! Failure taxonomy for the tracker.
//!
//! The callback-style API never surfaces these to the host; they exist so
//! every failure path has an inspectable value before it is translated into
//! a hook invocation (see [`TrackerError::is_not_logged_in`]).

use thiserror::Error;

/// Which of the two discovered feeds an operation refers to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FeedKind {
    /// Every game in progress.
    Active,
    /// Games waiting on the tracked player.
    Turn,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedKind::Active => f.write_str("active"),
            FeedKind::Turn => f.write_str("turn"),
        }
    }
}

/// Everything that can go wrong while discovering or fetching feeds.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The game list page exposed fewer than two feed links, which is what
    /// the site serves to anonymous visitors.
    #[error("not logged in: found {found} feed link(s), need 2")]
    NotLoggedIn { found: usize },

    /// A feed was requested before discovery stored the URL pair.
    #[error("feed URLs have not been discovered yet")]
    UrlsNotDiscovered,

    /// A fetch was attempted without a URL. `feed` names the discovered
    /// slot that was empty, or is `None` for a bare fetch.
    #[error("no {}feed URL to fetch", slot_prefix(.feed))]
    MissingFeedUrl { feed: Option<FeedKind> },

    /// Network failure or non-success HTTP status.
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// The response arrived but could not be read as a feed.
    #[error("failed to parse feed at {url}: {message}")]
    Parse { url: String, message: String },
}

impl TrackerError {
    /// `true` for the one failure routed to `on_not_logged_in`; every other
    /// variant is routed to `on_error`.
    pub fn is_not_logged_in(&self) -> bool {
        matches!(self, TrackerError::NotLoggedIn { .. })
    }
}

fn slot_prefix(feed: &Option<FeedKind>) -> String {
    feed.map(|kind| format!("{kind} ")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, TrackerError>;
