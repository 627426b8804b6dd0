//! The turn tracker: one instance per embedding host.
//!
//! A [`TurnTracker`] owns its [`Config`], a [`Transport`], and the
//! [`FeedUrls`] pair found by discovery. It moves through three states:
//!
//! ```text
//! Uninitialized ──discover──► UrlsDiscovered ──start polling──► Polling ─┐
//!                                                                  ▲     │ tick
//!                                                                  └─────┘
//! ```
//!
//! Each operation comes in two forms. The `try_*` methods return a
//! [`TrackerError`] describing exactly what went wrong. The plain methods
//! translate that error into the matching hook (`on_not_logged_in` or
//! `on_error`) and substitute a safe value, so a host that only wants
//! callbacks never sees an error.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::discovery::{feed_urls_from_links, find_feed_links, FeedUrls};
use crate::error::{FeedKind, Result, TrackerError};
use crate::source::{FeedResult, Transport};

/// Entries at the top of every game feed that are not games.
///
/// The your-turn and active feeds both open with one summary item. Counts
/// subtract it; a feed with no items at all is reported as an error.
pub const HEADER_ENTRIES: usize = 1;

/// The number reported for a feed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TurnCount {
    /// Number of games, header entry excluded.
    Games(usize),
    /// The feed had fewer entries than its header; displayed as `E`.
    Error,
}

impl TurnCount {
    /// Count for a feed with `entries` items.
    pub fn from_entries(entries: usize) -> Self {
        entries
            .checked_sub(HEADER_ENTRIES)
            .map_or(TurnCount::Error, TurnCount::Games)
    }

    pub fn games(self) -> Option<usize> {
        match self {
            TurnCount::Games(n) => Some(n),
            TurnCount::Error => None,
        }
    }

    pub fn is_error(self) -> bool {
        self == TurnCount::Error
    }
}

impl fmt::Display for TurnCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnCount::Games(n) => write!(f, "{n}"),
            TurnCount::Error => f.write_str("E"),
        }
    }
}

/// What a call to [`TurnTracker::update_turn_count`] did.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum UpdateOutcome {
    /// The turn feed was fetched and `on_turn_update` fired with this count.
    Updated(TurnCount),
    /// Another update was still running; nothing was fetched or fired.
    Skipped,
}

/// Resets the single-flight latch when an update finishes, even by panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TurnTracker {
    config: Config,
    transport: Box<dyn Transport>,
    urls: OnceLock<FeedUrls>,
    updating: AtomicBool,
}

impl TurnTracker {
    /// Create a tracker. Does no I/O; call
    /// [`discover_feed_urls`](Self::discover_feed_urls) or
    /// [`poll::spawn`](crate::poll::spawn) to get going.
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            urls: OnceLock::new(),
            updating: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The discovered feed pair, or `None` until discovery succeeds.
    pub fn feed_urls(&self) -> Option<&FeedUrls> {
        self.urls.get()
    }

    // -- discovery -----------------------------------------------------------

    /// Scrape the reference page and store the feed pair.
    ///
    /// The pair is written once; a later successful discovery returns the
    /// stored pair unchanged.
    pub fn try_discover_feed_urls(&self) -> Result<FeedUrls> {
        let url = &self.config.rss_reference_url;
        let markup = self
            .transport
            .get_text(url)
            .map_err(|e| fetch_error(url, e))?;

        let links = find_feed_links(&markup);
        debug!(url, found = links.len(), "scraped feed links");

        let urls = feed_urls_from_links(url, &links)?;
        Ok(self.urls.get_or_init(|| urls).clone())
    }

    /// Callback form of [`try_discover_feed_urls`](Self::try_discover_feed_urls).
    ///
    /// Fires `on_ready` on success, otherwise `on_not_logged_in` or
    /// `on_error`; nothing is stored on failure.
    pub fn discover_feed_urls(&self) -> Option<FeedUrls> {
        match self.try_discover_feed_urls() {
            Ok(urls) => {
                info!(active = ?urls.active, turn = ?urls.turn, "discovered feed URLs");
                self.config.hooks.ready(&urls);
                Some(urls)
            }
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    // -- fetching ------------------------------------------------------------

    pub fn try_fetch_feed(&self, url: Option<&str>) -> Result<FeedResult> {
        let url = url.ok_or(TrackerError::MissingFeedUrl { feed: None })?;
        self.fetch_from(url)
    }

    fn fetch_from(&self, url: &str) -> Result<FeedResult> {
        let items = self
            .transport
            .get_feed(url)
            .map_err(|e| fetch_error(url, e))?;
        debug!(url, entries = items.len(), "fetched feed");
        for entry in &items {
            trace!(url, %entry, "feed entry");
        }
        Ok(FeedResult::new(items))
    }

    /// Fetch the feed at `url`. A missing URL or failed fetch fires
    /// `on_error` and yields an empty result.
    pub fn fetch_feed(&self, url: Option<&str>) -> FeedResult {
        self.try_fetch_feed(url).unwrap_or_else(|e| {
            self.report(&e);
            FeedResult::empty()
        })
    }

    /// Fetch one of the discovered feeds. Fails without touching the
    /// network if discovery has not succeeded or the slot has no URL.
    pub fn try_games(&self, kind: FeedKind) -> Result<FeedResult> {
        let urls = self.urls.get().ok_or(TrackerError::UrlsNotDiscovered)?;
        let url = match kind {
            FeedKind::Active => urls.active.as_deref(),
            FeedKind::Turn => urls.turn.as_deref(),
        };
        let url = url.ok_or(TrackerError::MissingFeedUrl { feed: Some(kind) })?;
        self.fetch_from(url)
    }

    fn games(&self, kind: FeedKind) -> FeedResult {
        self.try_games(kind).unwrap_or_else(|e| {
            debug!(feed = %kind, "feed unavailable");
            self.report(&e);
            FeedResult::empty()
        })
    }

    pub fn get_turn_games(&self) -> FeedResult {
        self.games(FeedKind::Turn)
    }

    pub fn get_active_games(&self) -> FeedResult {
        self.games(FeedKind::Active)
    }

    pub fn get_turn_games_count(&self) -> TurnCount {
        TurnCount::from_entries(self.get_turn_games().len())
    }

    pub fn get_active_games_count(&self) -> TurnCount {
        TurnCount::from_entries(self.get_active_games().len())
    }

    // -- polling cycle -------------------------------------------------------

    /// Run one polling cycle: count the turn feed and fire `on_turn_update`.
    ///
    /// Only one cycle runs at a time. A call made while another is in
    /// progress returns [`UpdateOutcome::Skipped`] without fetching.
    pub fn update_turn_count(&self) -> UpdateOutcome {
        if self
            .updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("update already in progress; skipping");
            return UpdateOutcome::Skipped;
        }
        let _latch = InFlight(&self.updating);

        let count = self.get_turn_games_count();
        self.config.hooks.turn_update(count);
        UpdateOutcome::Updated(count)
    }

    fn report(&self, err: &TrackerError) {
        warn!(error = %err, "tracker operation failed");
        if err.is_not_logged_in() {
            self.config.hooks.not_logged_in();
        } else {
            self.config.hooks.error();
        }
    }
}

/// Keep typed errors raised below the transport seam, wrap everything else.
fn fetch_error(url: &str, err: anyhow::Error) -> TrackerError {
    match err.downcast::<TrackerError>() {
        Ok(typed) => typed,
        Err(err) => TrackerError::Fetch {
            url: url.to_string(),
            message: format!("{err:#}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
