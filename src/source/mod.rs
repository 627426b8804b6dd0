//! Outbound collaborators: everything that touches the network.
//!
//! The tracker never talks HTTP directly. It goes through the [`Transport`]
//! trait, which has two operations matching the two kinds of document the
//! site serves: the HTML game list scraped during discovery, and the RSS
//! feeds counted on every polling cycle.
//!
//! ## For contributors
//!
//! [`HttpTransport`] is the only production implementation. Tests use an
//! in-memory fake (see `tracker.rs`), so any new transport only has to
//! implement the two methods below.

mod feed_item;
mod rss;

pub use feed_item::{FeedEntry, FeedResult};
pub use self::rss::{parse_channel, HttpTransport};

use anyhow::Result;

/// Fetches documents on behalf of the tracker.
///
/// Calls block the current thread; the polling loop runs them on its own
/// background thread, so implementations must be [`Send`] and [`Sync`].
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text.
    fn get_text(&self, url: &str) -> Result<String>;

    /// GET `url` and parse it as a feed, in document order.
    fn get_feed(&self, url: &str) -> Result<Vec<FeedEntry>>;
}
