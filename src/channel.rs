//! Telegram channels fetched through RSS-Bridge.
//!
//! A [`ChannelSource`] turns a channel identifier into a bridge URL, fetches
//! and decodes the feed, then maps every entry through the content
//! normalizer. One post per entry, in feed order; nothing is filtered here.

use url::Url;

use crate::config::Config;
use crate::content::{extract_images, normalize_text};
use crate::feed::{fetch_feed, FeedError, FetchError};
use crate::model::{DecodedFeed, NormalizedPost, RawPost};
use crate::util::validate_bridge_url;

/// Builds the HTTP client used for feed fetches, honoring the configured timeout.
pub fn http_client(config: &Config) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Fetches Telegram channels from a configured RSS-Bridge instance.
#[derive(Debug, Clone)]
pub struct ChannelSource {
    client: reqwest::Client,
    base_url: Url,
    bridge: String,
    format: String,
    max_feed_bytes: usize,
}

impl ChannelSource {
    /// Creates a source for the bridge described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidAddress`] if `config.bridge_url` fails validation.
    pub fn new(client: reqwest::Client, config: &Config) -> Result<Self, FeedError> {
        let base_url = validate_bridge_url(&config.bridge_url)
            .map_err(|e| FeedError::InvalidAddress(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            bridge: config.bridge.clone(),
            format: config.format.clone(),
            max_feed_bytes: config.max_feed_bytes,
        })
    }

    /// The bridge URL for `identifier`:
    /// `<base>?action=display&username=<identifier>&bridge=<bridge>&format=<format>`.
    ///
    /// Any query already present on the base URL is replaced; the identifier
    /// is form-encoded.
    pub fn feed_url(&self, identifier: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("action", "display")
            .append_pair("username", identifier)
            .append_pair("bridge", &self.bridge)
            .append_pair("format", &self.format);
        url
    }

    async fn fetch_decoded(&self, identifier: &str) -> Result<DecodedFeed, FeedError> {
        let url = self.feed_url(identifier);
        tracing::debug!(channel = %identifier, url = %url, "Fetching channel");

        let feed = fetch_feed(&self.client, url.as_str(), self.max_feed_bytes)
            .await
            .inspect_err(|e| {
                tracing::warn!(channel = %identifier, error = %e, "Channel fetch failed");
            })?;
        Ok(feed)
    }

    /// Fetches a channel and returns one [`NormalizedPost`] per feed entry.
    ///
    /// # Errors
    ///
    /// Propagates [`FeedError`] from the fetch or decode unchanged. There is
    /// no retry and no partial result.
    pub async fn fetch_channel(&self, identifier: &str) -> Result<Vec<NormalizedPost>, FeedError> {
        let feed = self.fetch_decoded(identifier).await?;
        let posts = posts_from_feed(identifier, &feed);
        tracing::info!(channel = %identifier, posts = posts.len(), "Channel normalized");
        Ok(posts)
    }

    /// Like [`fetch_channel`](Self::fetch_channel) but skips image extraction.
    pub async fn fetch_raw(&self, identifier: &str) -> Result<Vec<RawPost>, FeedError> {
        let feed = self.fetch_decoded(identifier).await?;
        let posts = raw_posts_from_feed(&feed);
        tracing::info!(channel = %identifier, posts = posts.len(), "Channel normalized");
        Ok(posts)
    }
}

/// Maps decoded entries to posts, one per entry, preserving order.
///
/// Entries with an empty body or an unparsed date are kept.
pub fn posts_from_feed(identifier: &str, feed: &DecodedFeed) -> Vec<NormalizedPost> {
    feed.entries
        .iter()
        .map(|entry| NormalizedPost {
            source_link: entry.link.clone(),
            plain_text: normalize_text(&entry.raw_description),
            images: extract_images(&entry.raw_description),
            published_at: entry.publish_date,
            channel: identifier.to_owned(),
        })
        .collect()
}

/// Maps decoded entries to [`RawPost`]s, one per entry, preserving order.
pub fn raw_posts_from_feed(feed: &DecodedFeed) -> Vec<RawPost> {
    feed.entries
        .iter()
        .map(|entry| RawPost {
            link: entry.link.clone(),
            text: normalize_text(&entry.raw_description),
            published_at: entry.publish_date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parse_pub_date;
    use crate::model::FeedEntry;
    use pretty_assertions::assert_eq;

    fn source(bridge_url: &str) -> ChannelSource {
        let config = Config {
            bridge_url: bridge_url.to_string(),
            ..Config::default()
        };
        ChannelSource::new(reqwest::Client::new(), &config).unwrap()
    }

    fn entry(link: &str, body: &str, date: &str) -> FeedEntry {
        FeedEntry {
            title: String::new(),
            link: link.to_string(),
            guid: None,
            raw_description: body.to_string(),
            publish_date_raw: date.to_string(),
            publish_date: parse_pub_date(date),
        }
    }

    #[test]
    fn test_feed_url_default_bridge() {
        let url = source("https://rss-bridge.org/bridge01/").feed_url("mediarzn");
        assert_eq!(
            url.as_str(),
            "https://rss-bridge.org/bridge01/?action=display&username=mediarzn&bridge=TelegramBridge&format=Mrss"
        );
    }

    #[test]
    fn test_feed_url_encodes_identifier_and_replaces_query() {
        let url = source("https://bridge.example.com/?stale=1").feed_url("a b&c");
        assert_eq!(
            url.as_str(),
            "https://bridge.example.com/?action=display&username=a+b%26c&bridge=TelegramBridge&format=Mrss"
        );
    }

    #[test]
    fn test_invalid_bridge_rejected() {
        let config = Config {
            bridge_url: "ftp://bridge.example.com/".to_string(),
            ..Config::default()
        };
        let err = ChannelSource::new(reqwest::Client::new(), &config).unwrap_err();
        assert!(matches!(err, FeedError::InvalidAddress(_)));
    }

    #[test]
    fn test_posts_map_one_to_one_in_order() {
        let feed = DecodedFeed {
            entries: vec![
                entry(
                    "https://t.me/s/chan/3",
                    r#"<a href="x"><img src="https://cdn/1.jpg"/></a><br><b>Hello</b>"#,
                    "Sat, 01 Nov 2025 11:39:35 +0000",
                ),
                entry("https://t.me/s/chan/2", "", ""),
                entry("https://t.me/s/chan/1", "plain &amp; simple", "garbage"),
            ],
            ..DecodedFeed::default()
        };

        let posts = posts_from_feed("chan", &feed);
        assert_eq!(posts.len(), 3);

        assert_eq!(posts[0].source_link, "https://t.me/s/chan/3");
        assert_eq!(posts[0].plain_text, "Hello");
        assert_eq!(posts[0].images, vec!["https://cdn/1.jpg"]);
        assert!(posts[0].published_at.is_some());
        assert_eq!(posts[0].channel, "chan");

        assert_eq!(posts[1].plain_text, "");
        assert!(posts[1].images.is_empty());
        assert!(posts[1].published_at.is_none());

        assert_eq!(posts[2].plain_text, "plain & simple");
        assert!(posts[2].published_at.is_none());
    }

    #[test]
    fn test_raw_posts_match_full_posts() {
        let feed = DecodedFeed {
            entries: vec![
                entry("l1", "<p>one</p>", "Sat, 01 Nov 2025 11:39:35 +0000"),
                entry("l2", "two<br>lines", ""),
            ],
            ..DecodedFeed::default()
        };

        let full = posts_from_feed("chan", &feed);
        let raw = raw_posts_from_feed(&feed);
        assert_eq!(raw.len(), full.len());
        for (r, f) in raw.iter().zip(&full) {
            assert_eq!(r.link, f.source_link);
            assert_eq!(r.text, f.plain_text);
            assert_eq!(r.published_at, f.published_at);
        }
        assert_eq!(raw[1].text, "two\nlines");
    }

    #[test]
    fn test_empty_feed_yields_no_posts() {
        assert!(posts_from_feed("chan", &DecodedFeed::default()).is_empty());
        assert!(raw_posts_from_feed(&DecodedFeed::default()).is_empty());
    }
}
