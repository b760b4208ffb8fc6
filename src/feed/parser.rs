use std::io::BufRead;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;

use crate::model::{DecodedFeed, FeedEntry};

/// RFC 1123 with a numeric offset, e.g. `Sat, 01 Nov 2025 11:39:35 +0000`.
/// The bridge emits exactly this layout; nothing else is attempted.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Exact layout of [`PUB_DATE_FORMAT`]: two-digit day, four-digit offset
/// without a colon. The weekday name is required but not checked against
/// the date. Group 1 is everything after the weekday.
static PUB_DATE_LAYOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i:mon|tue|wed|thu|fri|sat|sun), (\d{2} [A-Za-z]{3} \d{4} \d{1,2}:\d{2}:\d{2} [+-]\d{4})$",
    )
    .expect("static pattern compiles")
});

/// [`PUB_DATE_FORMAT`] without the weekday.
const PUB_DATE_BODY_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// The document could not be read as an RSS channel.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Ill-formed XML: mismatched tags, bad entity references, invalid encoding.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unexpected root element <{0}>, expected <rss>")]
    UnexpectedRoot(String),

    #[error("Document contains no root element")]
    EmptyDocument,

    #[error("Feed has no <channel> element")]
    MissingChannel,

    /// Input ended while elements were still open.
    #[error("Unexpected end of document, {0} element(s) left open")]
    UnexpectedEof(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    ChannelDescription,
    ChannelLink,
    ItemTitle,
    ItemLink,
    ItemGuid,
    ItemDescription,
    ItemPubDate,
}

/// Incremental builder fed by the event loop in [`decode_reader`].
///
/// Elements are tracked by qualified name, so `atom:link` or `media:title`
/// never land in `link` or `title`.
#[derive(Default)]
struct DecodeState {
    stack: Vec<Vec<u8>>,
    root_seen: bool,
    channels: usize,
    feed: DecodedFeed,
    entry: Option<FeedEntry>,
    /// Field being captured and the stack depth of its element.
    field: Option<(Field, usize)>,
    text: String,
}

impl DecodeState {
    fn in_primary_channel(&self) -> bool {
        self.channels == 1 && self.stack.get(1).is_some_and(|n| n == b"channel")
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), DecodeError> {
        let name = e.name().as_ref().to_vec();

        match self.stack.len() {
            0 if !self.root_seen => {
                if name != b"rss" {
                    return Err(DecodeError::UnexpectedRoot(
                        String::from_utf8_lossy(&name).into_owned(),
                    ));
                }
                self.root_seen = true;
            }
            1 if name == b"channel" => {
                self.channels += 1;
                if self.channels > 1 {
                    tracing::warn!(
                        channel = self.channels,
                        "Ignoring additional <channel> element"
                    );
                }
            }
            2 if name == b"item" && self.in_primary_channel() => {
                self.entry = Some(FeedEntry::default());
            }
            _ => {}
        }

        self.stack.push(name);

        if self.field.is_none() {
            if let Some(field) = self.field_at_top() {
                self.field = Some((field, self.stack.len()));
                self.text.clear();
            }
        }
        Ok(())
    }

    fn field_at_top(&self) -> Option<Field> {
        if !self.in_primary_channel() {
            return None;
        }
        let name = self.stack.last()?.as_slice();
        match self.stack.len() {
            3 => match name {
                b"title" => Some(Field::ChannelTitle),
                b"description" => Some(Field::ChannelDescription),
                b"link" => Some(Field::ChannelLink),
                _ => None,
            },
            4 if self.entry.is_some() && self.stack[2] == b"item" => match name {
                b"title" => Some(Field::ItemTitle),
                b"link" => Some(Field::ItemLink),
                b"guid" => Some(Field::ItemGuid),
                b"description" => Some(Field::ItemDescription),
                b"pubDate" => Some(Field::ItemPubDate),
                _ => None,
            },
            _ => None,
        }
    }

    fn capturing(&self) -> bool {
        self.field.is_some()
    }

    fn close(&mut self) {
        let depth = self.stack.len();

        if let Some((field, at)) = self.field {
            if at == depth {
                self.commit(field);
                self.field = None;
            }
        }

        let closing_item = depth == 3 && self.entry.is_some();
        self.stack.pop();
        if closing_item {
            if let Some(entry) = self.entry.take() {
                self.feed.entries.push(entry);
            }
        }
    }

    fn commit(&mut self, field: Field) {
        let text = std::mem::take(&mut self.text);
        match field {
            Field::ChannelTitle => self.feed.title = text,
            Field::ChannelDescription => self.feed.description = text,
            Field::ChannelLink => self.feed.link = text,
            item_field => {
                let Some(entry) = self.entry.as_mut() else {
                    return;
                };
                match item_field {
                    Field::ItemTitle => entry.title = text,
                    Field::ItemLink => entry.link = text,
                    Field::ItemGuid => entry.guid = Some(text),
                    Field::ItemDescription => entry.raw_description = text,
                    Field::ItemPubDate => {
                        entry.publish_date = parse_pub_date(&text);
                        entry.publish_date_raw = text;
                    }
                    _ => {}
                }
            }
        }
    }

    fn finish(self) -> Result<DecodedFeed, DecodeError> {
        if !self.stack.is_empty() {
            return Err(DecodeError::UnexpectedEof(self.stack.len()));
        }
        if !self.root_seen {
            return Err(DecodeError::EmptyDocument);
        }
        if self.channels == 0 {
            return Err(DecodeError::MissingChannel);
        }
        Ok(self.feed)
    }
}

/// Decodes an RSS 2.0 document from any buffered byte source.
///
/// Entries come back in document order. A `pubDate` that is empty or not in
/// [`PUB_DATE_FORMAT`] leaves `publish_date` as `None`; it never fails the
/// decode.
///
/// # Errors
///
/// Returns [`DecodeError`] for ill-formed XML, a root other than `<rss>`,
/// a missing `<channel>`, or a truncated document.
pub fn decode_reader<R: BufRead>(source: R) -> Result<DecodedFeed, DecodeError> {
    // quick-xml 0.37 only resolves the five predefined XML entities and
    // character references; DOCTYPE entity declarations are never expanded.
    let mut reader = Reader::from_reader(source);
    let mut state = DecodeState::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.open(&e)?,
            Event::Empty(e) => {
                state.open(&e)?;
                state.close();
            }
            Event::End(_) => state.close(),
            Event::Text(e) if state.capturing() => {
                let text = e.unescape().map_err(quick_xml::Error::from)?;
                state.text.push_str(&text);
            }
            Event::CData(e) if state.capturing() => {
                let text = e.decode().map_err(quick_xml::Error::from)?;
                state.text.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    state.finish()
}

/// Decodes an RSS 2.0 document held in memory. See [`decode_reader`].
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedFeed, DecodeError> {
    decode_reader(bytes)
}

/// Parses a `pubDate` value in the bridge's fixed format.
///
/// Surrounding whitespace is ignored. Anything else that does not match
/// [`PUB_DATE_FORMAT`] yields `None`, including a one-digit day or an
/// offset written as `+00:00`. A weekday that disagrees with the date is
/// accepted.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(caps) = PUB_DATE_LAYOUT.captures(trimmed) else {
        tracing::debug!(pub_date = %trimmed, "pubDate does not match layout, leaving timestamp empty");
        return None;
    };

    match DateTime::parse_from_str(&caps[1], PUB_DATE_BODY_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(pub_date = %trimmed, error = %e, "Unparseable pubDate, leaving timestamp empty");
            None
        }
    }
}
