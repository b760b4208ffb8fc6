use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]+)"|'([^']+)')"#)
        .expect("static pattern compiles")
});

static VIDEO_POSTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<video\b[^>]*?\sposter\s*=\s*(?:"([^"]+)"|'([^']+)')"#)
        .expect("static pattern compiles")
});

fn quoted_values<'a>(re: &'a Regex, html: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    re.captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
}

/// Returns the `src` of every `<img>` in `html`, in document order.
///
/// Duplicates are kept and values are returned exactly as written
/// (no entity decoding, no URL validation).
///
/// # Examples
///
/// ```
/// use tgsift::content::extract_images;
///
/// let html = r#"<a href="/1"><img src="https://cdn/a.jpg"/></a><img src="https://cdn/b.jpg">"#;
/// assert_eq!(extract_images(html), vec!["https://cdn/a.jpg", "https://cdn/b.jpg"]);
/// assert!(extract_images("<p>text only</p>").is_empty());
/// ```
pub fn extract_images(html: &str) -> Vec<String> {
    quoted_values(&IMG_SRC, html).map(str::to_owned).collect()
}

/// Returns every image source followed by every video poster frame,
/// keeping only the first occurrence of each URL.
///
/// Entities are decoded before matching, so the body may be passed
/// still escaped and `&amp;` in a URL comes back as `&`. Images always
/// precede posters regardless of where they sit in the document.
pub fn extract_media(html: &str) -> Vec<String> {
    let content = html_escape::decode_html_entities(html);
    let mut seen = HashSet::new();
    quoted_values(&IMG_SRC, &content)
        .chain(quoted_values(&VIDEO_POSTER, &content))
        .filter(|url| seen.insert(*url))
        .map(str::to_owned)
        .collect()
}
