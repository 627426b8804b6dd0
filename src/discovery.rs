//! Feed-URL discovery: scraping the game list page for its two RSS links.
//!
//! The site's game list advertises its feeds as anchors carrying
//! `type="application/rss+xml"`. Logged-in players get two of them, the
//! active-games feed first and the your-turn feed second. Anonymous visitors
//! get fewer, which is how a missing login is detected.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{Result, TrackerError};

/// The `type` attribute value that marks an anchor as a feed link.
pub const RSS_LINK_TYPE: &str = "application/rss+xml";

/// The two feed URLs found during discovery.
///
/// A slot is `None` when its anchor carried no `href`; fetching that feed
/// then reports an error instead of falling through to the next anchor.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedUrls {
    /// Every game in progress.
    pub active: Option<String>,
    /// Games waiting on the tracked player.
    pub turn: Option<String>,
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Quoted values may contain `>`.
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("anchor pattern is valid")
    })
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
            .expect("attribute pattern is valid")
    })
}

/// Return one entry per feed-typed anchor in `markup`, in document order,
/// holding its `href` if it has one.
///
/// Tag and attribute names match case-insensitively; the `type` value must
/// match exactly.
pub fn find_feed_links(markup: &str) -> Vec<Option<String>> {
    anchor_re()
        .captures_iter(markup)
        .filter_map(|anchor| {
            let attrs = anchor.get(1).map_or("", |m| m.as_str());
            let mut kind = None;
            let mut href = None;

            for attr in attr_re().captures_iter(attrs) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map_or("", |m| m.as_str());

                let name = &attr[1];
                if name.eq_ignore_ascii_case("type") && kind.is_none() {
                    kind = Some(decode_entities(value));
                } else if name.eq_ignore_ascii_case("href") && href.is_none() {
                    href = Some(decode_entities(value));
                }
            }

            match kind {
                Some(kind) if kind == RSS_LINK_TYPE => Some(href),
                _ => None,
            }
        })
        .collect()
}

/// Turn scraped anchors into a [`FeedUrls`] pair by position.
///
/// Fewer than two anchors means the page was served to an anonymous
/// visitor. Anchors past the second are ignored. Relative links resolve
/// against `base`, the page they were scraped from.
pub fn feed_urls_from_links(base: &str, links: &[Option<String>]) -> Result<FeedUrls> {
    match links {
        [active, turn, ..] => Ok(FeedUrls {
            active: active.as_deref().map(|href| resolve(base, href)),
            turn: turn.as_deref().map(|href| resolve(base, href)),
        }),
        _ => Err(TrackerError::NotLoggedIn { found: links.len() }),
    }
}

fn resolve(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Decode the handful of entities that show up in attribute values.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://warfish.net/war/play/gamelist?rss=1";

    const LOGGED_IN_PAGE: &str = r#"<html><head><title>Games</title></head>
<body>
  <a href="/war/play/gamelist">Games</a>
  <A TYPE="application/rss+xml" HREF="http://warfish.net/war/services/rss?rssid=active&amp;uid=7">Active</A>
  <a href='http://warfish.net/war/services/rss?rssid=turn&amp;uid=7' type='application/rss+xml'>Your turn</a>
  <a type="application/rss+xml" href="http://warfish.net/war/services/rss?rssid=chat">Chat</a>
</body></html>"#;

    fn links(urls: &[&str]) -> Vec<Option<String>> {
        urls.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn finds_feed_anchors_in_document_order() {
        let found = find_feed_links(LOGGED_IN_PAGE);
        assert_eq!(
            found,
            links(&[
                "http://warfish.net/war/services/rss?rssid=active&uid=7",
                "http://warfish.net/war/services/rss?rssid=turn&uid=7",
                "http://warfish.net/war/services/rss?rssid=chat",
            ])
        );
    }

    #[test]
    fn ignores_other_link_types_and_abbr_tags() {
        let markup = r#"<abbr type="application/rss+xml" href="nope">x</abbr>
<a type="application/atom+xml" href="atom">atom</a>
<a type="text/html" href="page">page</a>
<a type=application/rss+xml href=bare>bare</a>"#;
        assert_eq!(find_feed_links(markup), links(&["bare"]));
    }

    #[test]
    fn feed_anchor_without_href_keeps_its_slot() {
        let markup = r#"<a type="application/rss+xml">no link</a>"#;
        assert_eq!(find_feed_links(markup), vec![None]);
    }

    #[test]
    fn quoted_gt_does_not_end_the_tag() {
        let markup = r#"<a title="a > b" type="application/rss+xml" href="http://x/A">A</a>
<a type='application/rss+xml' data-note='1 > 0' href="http://x/B">B</a>"#;
        assert_eq!(find_feed_links(markup), links(&["http://x/A", "http://x/B"]));
    }

    #[test]
    fn login_page_has_no_feed_links() {
        let markup = r#"<form action="/war/login"><input name="user"></form>"#;
        assert!(find_feed_links(markup).is_empty());
    }

    #[test]
    fn two_links_become_active_then_turn() {
        let urls = feed_urls_from_links(BASE, &links(&["http://a.example/A", "http://b.example/B"])).unwrap();
        assert_eq!(
            urls,
            FeedUrls {
                active: Some("http://a.example/A".into()),
                turn: Some("http://b.example/B".into()),
            }
        );
    }

    #[test]
    fn hrefless_first_anchor_leaves_active_unset() {
        let markup = r#"<a type="application/rss+xml">broken</a>
<a type="application/rss+xml" href="http://x/B">B</a>
<a type="application/rss+xml" href="http://x/C">C</a>"#;
        let urls = feed_urls_from_links(BASE, &find_feed_links(markup)).unwrap();
        assert_eq!(
            urls,
            FeedUrls {
                active: None,
                turn: Some("http://x/B".into()),
            }
        );
    }

    #[test]
    fn extra_links_are_ignored() {
        let urls = feed_urls_from_links(BASE, &links(&["http://x/1", "http://x/2", "http://x/3"])).unwrap();
        assert_eq!(urls.active.as_deref(), Some("http://x/1"));
        assert_eq!(urls.turn.as_deref(), Some("http://x/2"));
    }

    #[test]
    fn fewer_than_two_links_is_not_logged_in() {
        for found in [links(&[]), links(&["http://x/1"]), vec![None]] {
            let err = feed_urls_from_links(BASE, &found).unwrap_err();
            assert!(matches!(err, TrackerError::NotLoggedIn { found: n } if n == found.len()));
        }
    }

    #[test]
    fn relative_links_resolve_against_the_page() {
        let urls = feed_urls_from_links(BASE, &links(&["/war/rss/active", "turn"])).unwrap();
        assert_eq!(urls.active.as_deref(), Some("http://warfish.net/war/rss/active"));
        assert_eq!(urls.turn.as_deref(), Some("http://warfish.net/war/play/turn"));
    }

    #[test]
    fn unparseable_base_keeps_raw_href() {
        let urls = feed_urls_from_links("not a url", &links(&["A", "B"])).unwrap();
        assert_eq!(
            urls,
            FeedUrls {
                active: Some("A".into()),
                turn: Some("B".into()),
            }
        );
    }
}
