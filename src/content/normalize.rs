use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern compiles")
}

/// Opening tag of the "media is not supported in your browser" placeholder.
/// The `_label` child class is deliberately not matched here.
static UNSUPPORTED_MEDIA_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"(?i)<div\b[^>]*\bclass="message_media_not_supported"[^>]*>"#)
});

static DIV_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<(/?)div\b[^>]*>"));

/// Placeholder label that sometimes appears outside its wrapper block.
static MEDIA_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"(?is)<span\b[^>]*\bclass="message_media_not_supported_label"[^>]*>.*?</span\s*>"#)
});

/// "VIEW IN TELEGRAM" buttons, rendered as either an anchor or a span.
static ACTION_LINK: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r#"(?is)<(?:a|span)\b[^>]*\bclass="message_media_view_in_telegram"[^>]*>.*?</(?:a|span)\s*>"#,
    )
});

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<br\s*/?>"));

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<img\b[^>]*>"));

static ANCHOR_OPEN: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<a\b[^>]*>"));

static ANCHOR_CLOSE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)</a\s*>"));

/// Custom emoji wrapper, matched up to its own closing tag.
static EMOJI: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<tg-emoji\b[^>]*>(.*?)</tg-emoji\s*>"));

/// Glyph inside an emoji wrapper, next to the fallback image.
static EMOJI_GLYPH: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<b>([^<]*)</b>"));

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]+>"));

/// Runs of two or more blanks, or any tab. A lone space is already normal.
static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[ \t]{2,}|\t"));

/// One rewrite step of [`normalize_text`].
///
/// `apply` returns `Cow::Borrowed` only when its input is left unchanged.
pub struct Stage {
    pub name: &'static str,
    pub apply: for<'a> fn(&'a str) -> Cow<'a, str>,
}

/// The normalization pipeline, applied strictly in this order.
///
/// Line breaks become newlines before tags are stripped so they survive,
/// and entities are unescaped after tags are stripped so escaped markup in
/// the text stays visible.
pub const STAGES: [Stage; 10] = [
    Stage {
        name: "unsupported_media",
        apply: strip_unsupported_media,
    },
    Stage {
        name: "action_links",
        apply: strip_action_links,
    },
    Stage {
        name: "line_breaks",
        apply: convert_line_breaks,
    },
    Stage {
        name: "images",
        apply: strip_images,
    },
    Stage {
        name: "anchors",
        apply: unwrap_anchors,
    },
    Stage {
        name: "emoji",
        apply: unwrap_emoji,
    },
    Stage {
        name: "tags",
        apply: strip_tags,
    },
    Stage {
        name: "entities",
        apply: unescape_entities,
    },
    Stage {
        name: "whitespace",
        apply: collapse_whitespace,
    },
    Stage {
        name: "trim",
        apply: trim,
    },
];

/// Converts a Telegram post body as rendered by RSS-Bridge into plain text.
///
/// Never fails: stages that find nothing to rewrite pass their input
/// through unchanged. Entity-escaped markup in the body (`&lt;div&gt;`)
/// comes out as literal `<div>`.
///
/// # Examples
///
/// ```
/// use tgsift::content::normalize_text;
///
/// assert_eq!(normalize_text("<div>First<br/>Second<br>Third</div>"), "First\nSecond\nThird");
/// assert_eq!(normalize_text("<b>1 &lt; 2</b>"), "1 < 2");
/// ```
pub fn normalize_text(html: &str) -> String {
    let mut text = html.to_owned();
    for stage in &STAGES {
        let next = match (stage.apply)(&text) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(next) => next,
        };
        text = next;
    }
    text
}

/// Applies `re` to an already-rewritten text, keeping it as-is when nothing matches.
fn replace_all<'a>(text: Cow<'a, str>, re: &Regex, rep: &str) -> Cow<'a, str> {
    let replaced = match re.replace_all(&text, rep) {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    };
    replaced.map_or(text, Cow::Owned)
}

fn strip_unsupported_media(s: &str) -> Cow<'_, str> {
    let without_blocks = remove_div_blocks(s, &UNSUPPORTED_MEDIA_OPEN);
    replace_all(without_blocks, &MEDIA_LABEL, "")
}

/// Removes every `<div>` matched by `opener` together with its subtree.
///
/// Nested divs are balanced. A block that never balances is cut at its first
/// `</div>`; a block with no closing tag at all is left in place.
fn remove_div_blocks<'a>(s: &'a str, opener: &Regex) -> Cow<'a, str> {
    let mut out: Option<String> = None;
    let mut cursor = 0;

    while let Some(open) = opener.find_at(s, cursor) {
        let Some(end) = div_block_end(s, open.end()) else {
            break;
        };
        out.get_or_insert_with(|| String::with_capacity(s.len()))
            .push_str(&s[cursor..open.start()]);
        cursor = end;
    }

    match out {
        None => Cow::Borrowed(s),
        Some(mut out) => {
            out.push_str(&s[cursor..]);
            Cow::Owned(out)
        }
    }
}

/// Byte offset just past the `</div>` closing a div opened right before `from`.
fn div_block_end(s: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut first_close = None;

    for caps in DIV_TAG.captures_iter(&s[from..]) {
        let tag = caps.get(0)?;
        let closing = caps.get(1).is_some_and(|m| !m.is_empty());
        if closing {
            let end = from + tag.end();
            first_close.get_or_insert(end);
            depth -= 1;
            if depth == 0 {
                return Some(end);
            }
        } else if !tag.as_str().ends_with("/>") {
            depth += 1;
        }
    }

    first_close
}

fn strip_action_links(s: &str) -> Cow<'_, str> {
    ACTION_LINK.replace_all(s, "")
}

fn convert_line_breaks(s: &str) -> Cow<'_, str> {
    LINE_BREAK.replace_all(s, "\n")
}

fn strip_images(s: &str) -> Cow<'_, str> {
    IMG_TAG.replace_all(s, "")
}

fn unwrap_anchors(s: &str) -> Cow<'_, str> {
    let opened = ANCHOR_OPEN.replace_all(s, "");
    replace_all(opened, &ANCHOR_CLOSE, "")
}

/// Replaces each wrapper with its `<b>` glyph. A wrapper without one keeps
/// its inner content for the later stages.
fn unwrap_emoji(s: &str) -> Cow<'_, str> {
    EMOJI.replace_all(s, |caps: &regex::Captures<'_>| {
        let inner = &caps[1];
        match EMOJI_GLYPH.captures(inner) {
            Some(glyph) => glyph[1].to_owned(),
            None => inner.to_owned(),
        }
    })
}

fn strip_tags(s: &str) -> Cow<'_, str> {
    ANY_TAG.replace_all(s, "")
}

fn unescape_entities(s: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(s)
}

fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    HORIZONTAL_SPACE.replace_all(s, " ")
}

fn trim(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    if trimmed.len() == s.len() {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(trimmed.to_owned())
    }
}
