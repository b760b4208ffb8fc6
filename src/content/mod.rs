//! Content cleanup for Telegram post bodies rendered by RSS-Bridge.
//!
//! Everything here is pure: no I/O and no mutable shared state. The regex
//! patterns are compiled once per process and only read afterwards, so
//! entries can be normalized from any number of threads.
//!
//! - [`normalize_text`] - the ordered rewrite pipeline ([`STAGES`]) producing plain text
//! - [`extract_images`] - `<img src>` URLs, document order, duplicates kept
//! - [`extract_media`] - images plus video posters, de-duplicated
//!
//! Both extraction and normalization read the same raw HTML independently,
//! so callers can use either one alone.

mod media;
mod normalize;

pub use media::{extract_images, extract_media};
pub use normalize::{normalize_text, Stage, STAGES};
