//! Feed decoding for RSS 2.0 documents produced by RSS-Bridge.
//!
//! - [`parser`] - event-driven XML decoding into [`DecodedFeed`](crate::model::DecodedFeed),
//!   including fixed-format `pubDate` parsing
//! - [`fetcher`] - a single HTTP GET with body size limits, then decoding
//!
//! # Example
//!
//! ```ignore
//! use tgsift::feed::{decode_bytes, fetch_feed, MAX_FEED_SIZE};
//!
//! let feed = fetch_feed(&client, url, MAX_FEED_SIZE).await?;
//! let same = decode_bytes(bytes_on_disk)?;
//! ```

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, FeedError, FetchError, MAX_FEED_SIZE};
pub use parser::{decode_bytes, decode_reader, parse_pub_date, DecodeError, PUB_DATE_FORMAT};
