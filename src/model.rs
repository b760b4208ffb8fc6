//! Plain records passed between the decoder, the normalizer and callers.
//!
//! Nothing here has behavior. A [`DecodedFeed`] lives for one fetch; posts
//! live for the call that produced them.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One `<item>` of a decoded feed, before any content cleanup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    /// Post permalink. Kept as received, never validated.
    pub link: String,
    /// `<guid>` text, when the item carries one.
    pub guid: Option<String>,
    /// HTML body with one level of XML escaping already removed. May be empty.
    pub raw_description: String,
    /// `<pubDate>` exactly as it appeared in the document.
    pub publish_date_raw: String,
    /// `None` when `publish_date_raw` is empty or not in RFC 1123 form.
    pub publish_date: Option<DateTime<FixedOffset>>,
}

/// The `<channel>` of a syndication document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Items in document order.
    pub entries: Vec<FeedEntry>,
}

/// A feed entry after normalization, with image references split out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPost {
    pub source_link: String,
    pub plain_text: String,
    pub images: Vec<String>,
    pub published_at: Option<DateTime<FixedOffset>>,
    /// Channel identifier the fetch address was built from.
    pub channel: String,
}

/// Normalized post without image extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawPost {
    pub link: String,
    pub text: String,
    pub published_at: Option<DateTime<FixedOffset>>,
}
