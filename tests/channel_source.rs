//! Integration tests for fetching a channel end-to-end against a mock bridge.
//!
//! Each test starts its own `wiremock` server and points a `ChannelSource`
//! at it, exercising URL building, HTTP handling, decoding and normalization
//! together.

use pretty_assertions::assert_eq;
use tgsift::channel::{http_client, ChannelSource};
use tgsift::config::Config;
use tgsift::feed::{FeedError, FetchError};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BRIDGE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:atom="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/" version="2.0">
  <channel>
    <title>Media Ryazan - Telegram</title>
    <description>Media Ryazan - Telegram</description>
    <link>https://t.me/s/mediarzn</link>
    <item>
      <title>Бонджорно, читатели!</title>
      <link>https://t.me/s/mediarzn/7052</link>
      <guid isPermaLink="true">https://t.me/s/mediarzn/7052</guid>
      <pubDate>Sat, 01 Nov 2025 11:39:35 +0000</pubDate>
      <description>&lt;div class="message_media_not_supported"&gt;&lt;div class="message_media_not_supported_label"&gt;Please open Telegram to view this post&lt;/div&gt;&lt;a href="https://t.me/mediarzn/7051?single" class="message_media_view_in_telegram"&gt;VIEW IN TELEGRAM&lt;/a&gt;&lt;/div&gt; &lt;a href="https://t.me/mediarzn/7051?single"&gt;&lt;img src="https://cdn4.telesco.pe/file/one.jpg"/&gt;&lt;/a&gt;&lt;br&gt;&lt;a href="https://t.me/mediarzn/7052?single"&gt;&lt;img src="https://cdn4.telesco.pe/file/two.jpg"/&gt;&lt;/a&gt;&lt;br&gt;&lt;div class="tgme_widget_message_text js-message_text" dir="auto"&gt;&lt;b&gt;Бонджорно, читатели&amp;#33;&lt;/b&gt;&lt;br/&gt;Viva l&amp;#39;Italia &lt;tg-emoji emoji-id="5"&gt;&lt;i class="emoji"&gt;&lt;b&gt;🇮🇹&lt;/b&gt;&lt;/i&gt;&lt;/tg-emoji&gt;&lt;/div&gt;</description>
    </item>
    <item>
      <title>Escaped markup</title>
      <link>https://t.me/s/mediarzn/7050</link>
      <pubDate>not a date</pubDate>
      <description>&lt;div&gt;&amp;lt;div&amp;gt;Test&amp;lt;/div&amp;gt; &amp;amp; &amp;quot;quotes&amp;quot;&lt;/div&gt;</description>
    </item>
    <item>
      <title>Empty</title>
      <link>https://t.me/s/mediarzn/7049</link>
      <description></description>
    </item>
  </channel>
</rss>"#;

async fn bridge_with(template: ResponseTemplate) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "display"))
        .and(query_param("username", "mediarzn"))
        .and(query_param("bridge", "TelegramBridge"))
        .and(query_param("format", "Mrss"))
        .respond_with(template)
        .mount(&mock_server)
        .await;
    mock_server
}

fn source_for(server: &MockServer) -> ChannelSource {
    let config = Config {
        bridge_url: format!("{}/bridge01/", server.uri()),
        ..Config::default()
    };
    ChannelSource::new(http_client(&config).unwrap(), &config).unwrap()
}

#[tokio::test]
async fn test_fetch_channel_normalizes_every_entry() {
    let server = bridge_with(
        ResponseTemplate::new(200)
            .set_body_string(BRIDGE_FEED)
            .insert_header("Content-Type", "application/rss+xml"),
    )
    .await;

    let posts = source_for(&server).fetch_channel("mediarzn").await.unwrap();
    assert_eq!(posts.len(), 3);

    let first = &posts[0];
    assert_eq!(first.source_link, "https://t.me/s/mediarzn/7052");
    assert_eq!(first.channel, "mediarzn");
    assert_eq!(
        first.images,
        vec![
            "https://cdn4.telesco.pe/file/one.jpg",
            "https://cdn4.telesco.pe/file/two.jpg"
        ]
    );
    assert_eq!(first.plain_text, "Бонджорно, читатели!\nViva l'Italia 🇮🇹");
    assert_eq!(
        first.published_at.map(|d| d.to_rfc3339()).as_deref(),
        Some("2025-11-01T11:39:35+00:00")
    );

    let second = &posts[1];
    assert!(second.published_at.is_none());
    assert!(second.plain_text.contains(r#"<div>Test</div> & "quotes""#));
    assert!(second.images.is_empty());

    let third = &posts[2];
    assert_eq!(third.plain_text, "");
    assert_eq!(third.source_link, "https://t.me/s/mediarzn/7049");
}

#[tokio::test]
async fn test_fetch_raw_matches_full_variant() {
    let server = bridge_with(ResponseTemplate::new(200).set_body_string(BRIDGE_FEED)).await;
    let source = source_for(&server);

    let raw = source.fetch_raw("mediarzn").await.unwrap();
    let full = source.fetch_channel("mediarzn").await.unwrap();

    assert_eq!(raw.len(), full.len());
    for (r, f) in raw.iter().zip(&full) {
        assert_eq!(r.link, f.source_link);
        assert_eq!(r.text, f.plain_text);
        assert_eq!(r.published_at, f.published_at);
    }
}

#[tokio::test]
async fn test_http_error_propagates_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = source_for(&server)
        .fetch_channel("mediarzn")
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Fetch(FetchError::HttpStatus(503))));
}

#[tokio::test]
async fn test_malformed_feed_is_decode_error() {
    let unclosed = r#"<?xml version="1.0"?>
<rss>
  <channel>
    <title>Test</title>
    <item><title>lost</title></item>
</rss>"#;
    let server = bridge_with(ResponseTemplate::new(200).set_body_string(unclosed)).await;

    let err = source_for(&server)
        .fetch_channel("mediarzn")
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_channel_returns_no_posts() {
    let empty = r#"<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;
    let server = bridge_with(ResponseTemplate::new(200).set_body_string(empty)).await;

    let posts = source_for(&server).fetch_channel("mediarzn").await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_slow_bridge_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(BRIDGE_FEED)
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = Config {
        bridge_url: server.uri(),
        timeout_secs: 1,
        ..Config::default()
    };
    let source = ChannelSource::new(http_client(&config).unwrap(), &config).unwrap();

    let err = source.fetch_channel("mediarzn").await.unwrap_err();
    assert!(matches!(err, FeedError::Fetch(FetchError::Timeout)), "got {:?}", err);
}
