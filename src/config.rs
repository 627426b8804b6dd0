//! Tracker configuration: defaults, partial overrides, and the callback
//! hooks fired on state changes.
//!
//! A [`Config`] is built once per tracker by merging a [`ConfigOverrides`]
//! over the built-in defaults and is never mutated afterwards. Overrides can
//! come from a TOML file, from code, or both (see
//! [`ConfigOverrides::overlay`]).

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::discovery::FeedUrls;
use crate::tracker::TurnCount;

/// Page that lists the player's games and links to both feeds.
pub const DEFAULT_RSS_REFERENCE_URL: &str = "http://warfish.net/war/play/gamelist?rss=1";

/// Where a host should send a player whose session has expired.
pub const DEFAULT_LOGIN_URL: &str = "http://warfish.net/war/login";

/// Milliseconds between polling cycles.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 60_000;

/// Zero-argument notification.
pub type NotifyFn = Arc<dyn Fn() + Send + Sync>;

/// Receives the count computed by each polling cycle.
pub type TurnCountFn = Arc<dyn Fn(TurnCount) + Send + Sync>;

/// Receives the feed URLs once discovery succeeds.
pub type ReadyFn = Arc<dyn Fn(&FeedUrls) + Send + Sync>;

/// Errors raised while loading overrides from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {message}")]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// The callbacks a tracker fires. Each one defaults to a log line.
#[derive(Clone)]
pub struct Hooks {
    on_not_logged_in: NotifyFn,
    on_error: NotifyFn,
    on_turn_update: TurnCountFn,
    on_ready: ReadyFn,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            on_not_logged_in: Arc::new(|| info!("Not logged in")),
            on_error: Arc::new(|| warn!("Error in fetching data")),
            on_turn_update: Arc::new(|count: TurnCount| info!(%count, "Updating")),
            on_ready: Arc::new(|urls: &FeedUrls| {
                debug!(active = ?urls.active, turn = ?urls.turn, "feeds ready")
            }),
        }
    }
}

impl Hooks {
    pub(crate) fn not_logged_in(&self) {
        (self.on_not_logged_in)()
    }

    pub(crate) fn error(&self) {
        (self.on_error)()
    }

    pub(crate) fn turn_update(&self, count: TurnCount) {
        (self.on_turn_update)(count)
    }

    pub(crate) fn ready(&self, urls: &FeedUrls) {
        (self.on_ready)(urls)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// A partial configuration. Anything left as `None` falls back to the
/// default when merged.
///
/// Deserializes from TOML with `polling_interval` in milliseconds. Unknown
/// keys are ignored. `session_cookie` is sent verbatim as the `Cookie`
/// header, which lets a logged-in browser session be reused. Hooks cannot come from a file and are set in code with
/// the builder methods.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub rss_reference_url: Option<String>,
    pub login_url: Option<String>,
    pub polling_interval: Option<u64>,
    pub session_cookie: Option<String>,

    #[serde(skip)]
    pub on_not_logged_in: Option<NotifyFn>,
    #[serde(skip)]
    pub on_error: Option<NotifyFn>,
    #[serde(skip)]
    pub on_turn_update: Option<TurnCountFn>,
    #[serde(skip)]
    pub on_ready: Option<ReadyFn>,
}

impl ConfigOverrides {
    /// Load overrides from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse overrides from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Layer `other` on top of `self`: every field `other` sets wins.
    pub fn overlay(self, other: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            rss_reference_url: other.rss_reference_url.or(self.rss_reference_url),
            login_url: other.login_url.or(self.login_url),
            polling_interval: other.polling_interval.or(self.polling_interval),
            session_cookie: other.session_cookie.or(self.session_cookie),
            on_not_logged_in: other.on_not_logged_in.or(self.on_not_logged_in),
            on_error: other.on_error.or(self.on_error),
            on_turn_update: other.on_turn_update.or(self.on_turn_update),
            on_ready: other.on_ready.or(self.on_ready),
        }
    }

    pub fn rss_reference_url(mut self, url: impl Into<String>) -> Self {
        self.rss_reference_url = Some(url.into());
        self
    }

    pub fn login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    /// Interval between polling cycles, in milliseconds.
    pub fn polling_interval(mut self, millis: u64) -> Self {
        self.polling_interval = Some(millis);
        self
    }

    /// Raw `Cookie` header value, e.g. `"SESSID=abc123"`.
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn on_not_logged_in(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_not_logged_in = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_turn_update(mut self, f: impl Fn(TurnCount) + Send + Sync + 'static) -> Self {
        self.on_turn_update = Some(Arc::new(f));
        self
    }

    /// Older name for [`on_turn_update`](Self::on_turn_update).
    pub fn on_update_turn_count(self, f: impl Fn(TurnCount) + Send + Sync + 'static) -> Self {
        self.on_turn_update(f)
    }

    pub fn on_ready(mut self, f: impl Fn(&FeedUrls) + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("rss_reference_url", &self.rss_reference_url)
            .field("login_url", &self.login_url)
            .field("polling_interval", &self.polling_interval)
            .field("session_cookie", &redacted(&self.session_cookie))
            .field("on_not_logged_in", &self.on_not_logged_in.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_turn_update", &self.on_turn_update.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

/// Complete, immutable tracker configuration.
#[derive(Clone)]
pub struct Config {
    pub rss_reference_url: String,
    pub login_url: String,
    pub polling_interval: Duration,
    /// Sent as the `Cookie` header when set; see [`HttpTransport::from_config`](crate::HttpTransport::from_config).
    pub session_cookie: Option<String>,
    pub hooks: Hooks,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rss_reference_url", &self.rss_reference_url)
            .field("login_url", &self.login_url)
            .field("polling_interval", &self.polling_interval)
            .field("session_cookie", &redacted(&self.session_cookie))
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::merged(ConfigOverrides::default())
    }
}

impl Config {
    /// Fill every field `overrides` leaves unset from the defaults.
    ///
    /// Values are taken as given; nothing is range-checked.
    pub fn merged(overrides: ConfigOverrides) -> Self {
        let defaults = Hooks::default();
        let polling_interval = overrides
            .polling_interval
            .unwrap_or(DEFAULT_POLLING_INTERVAL_MS);

        if polling_interval == 0 {
            warn!("polling_interval is 0; the tracker will poll continuously");
        }

        Self {
            rss_reference_url: overrides
                .rss_reference_url
                .unwrap_or_else(|| DEFAULT_RSS_REFERENCE_URL.to_string()),
            login_url: overrides
                .login_url
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            polling_interval: Duration::from_millis(polling_interval),
            session_cookie: overrides.session_cookie,
            hooks: Hooks {
                on_not_logged_in: overrides.on_not_logged_in.unwrap_or(defaults.on_not_logged_in),
                on_error: overrides.on_error.unwrap_or(defaults.on_error),
                on_turn_update: overrides.on_turn_update.unwrap_or(defaults.on_turn_update),
                on_ready: overrides.on_ready.unwrap_or(defaults.on_ready),
            },
        }
    }
}
