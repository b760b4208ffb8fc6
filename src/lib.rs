//! Ingests Telegram channels mirrored as RSS by RSS-Bridge and turns each
//! post into plain text plus a list of image URLs.
//!
//! - [`feed`] decodes RSS 2.0 documents (from HTTP or any byte source)
//! - [`content`] normalizes post HTML and extracts media references
//! - [`channel`] ties both together for a named channel
//! - [`model`] holds the plain records passed between them
//!
//! ```ignore
//! use tgsift::channel::{http_client, ChannelSource};
//! use tgsift::config::Config;
//!
//! let config = Config::default();
//! let source = ChannelSource::new(http_client(&config)?, &config)?;
//! for post in source.fetch_channel("mediarzn").await? {
//!     println!("{}: {}", post.source_link, post.plain_text);
//! }
//! ```

pub mod channel;
pub mod config;
pub mod content;
pub mod feed;
pub mod model;
pub mod util;
