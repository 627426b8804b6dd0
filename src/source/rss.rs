//! HTTP transport backed by `reqwest`, with feed bodies parsed by the
//! [`rss`](::rss) crate.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use tracing::debug;

use super::{FeedEntry, Transport};
use crate::config::Config;
use crate::error::TrackerError;

/// Connect timeout for every request.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total timeout for every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of redirects to follow (the game list redirects to the
/// login page for anonymous visitors).
const MAX_REDIRECTS: usize = 5;

const USER_AGENT: &str = concat!("warfish-turns/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP transport.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a transport with bounded timeouts and redirects.
    ///
    /// It sends no cookies, so the site treats it as an anonymous visitor.
    pub fn new() -> Result<Self> {
        Self::build(HeaderMap::new())
    }

    /// Build a transport that sends `cookie` verbatim as the `Cookie` header
    /// on every request.
    pub fn with_session_cookie(cookie: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(cookie).context("invalid session cookie")?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, value);
        Self::build(headers)
    }

    /// Build the transport `config` asks for.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.session_cookie.as_deref() {
            Some(cookie) => Self::with_session_cookie(cookie),
            None => Self::new(),
        }
    }

    fn build(headers: HeaderMap) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?;
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, url: &str) -> Result<String> {
        let body = self
            .get(url)?
            .text()
            .with_context(|| format!("failed to read body of {url}"))?;
        Ok(body)
    }

    fn get_feed(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let body = self
            .get(url)?
            .bytes()
            .with_context(|| format!("failed to read body of {url}"))?;

        let channel = ::rss::Channel::read_from(body.as_ref()).map_err(|e| TrackerError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(parse_channel(&channel))
    }
}

/// Convert an already-parsed channel into [`FeedEntry`]s, in document order.
///
/// No I/O, so tests can exercise it without the network.
pub fn parse_channel(channel: &::rss::Channel) -> Vec<FeedEntry> {
    channel
        .items()
        .iter()
        .map(|item| {
            // Bad dates degrade to None rather than dropping the entry.
            let published = item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                .map(|dt| dt.with_timezone(&Utc));

            FeedEntry {
                title: item.title().unwrap_or("(untitled)").to_string(),
                link: item.link().map(String::from),
                published,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;

    fn channel(xml: &str) -> ::rss::Channel {
        ::rss::Channel::read_from(xml.as_bytes()).unwrap()
    }

    #[test]
    fn parse_channel_keeps_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Warfish - Your Turn</title>
    <item>
      <title>Your Turn Games</title>
      <link>http://warfish.net/war/play/gamelist</link>
    </item>
    <item>
      <title>Europe 1914</title>
      <link>http://warfish.net/war/play/game?gid=101</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Classic Risk</title>
      <link>http://warfish.net/war/play/game?gid=102</link>
    </item>
  </channel>
</rss>"#;

        let entries = parse_channel(&channel(xml));

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Your Turn Games");
        assert_eq!(entries[1].title, "Europe 1914");
        assert_eq!(
            entries[1].link.as_deref(),
            Some("http://warfish.net/war/play/game?gid=101")
        );
        assert!(entries[1].published.is_some());
        assert_eq!(entries[2].title, "Classic Risk");
        assert!(entries[2].published.is_none());
    }

    #[test]
    fn empty_channel_yields_no_entries() {
        let xml = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        assert!(parse_channel(&channel(xml)).is_empty());
    }

    #[test]
    fn handles_missing_title() {
        let xml = r#"<rss version="2.0"><channel><title>T</title><item><guid>g1</guid></item></channel></rss>"#;
        let entries = parse_channel(&channel(xml));
        assert_eq!(entries[0].title, "(untitled)");
    }

    #[test]
    fn handles_invalid_date() {
        let xml = r#"<rss version="2.0"><channel><title>T</title>
<item><title>Bad Date</title><pubDate>not-a-real-date</pubDate></item>
</channel></rss>"#;
        let entries = parse_channel(&channel(xml));
        assert!(entries[0].published.is_none());
    }

    #[test]
    fn transport_builds() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn transport_builds_with_session_cookie() {
        assert!(HttpTransport::with_session_cookie("SESSID=abc123; lang=en").is_ok());

        let config = Config::merged(ConfigOverrides::default().session_cookie("SESSID=abc123"));
        assert!(HttpTransport::from_config(&config).is_ok());
    }

    #[test]
    fn cookie_with_newline_is_rejected() {
        let err = HttpTransport::with_session_cookie("SESSID=abc\r\nX-Evil: 1").unwrap_err();
        assert!(err.to_string().contains("invalid session cookie"));
    }
}
