// src/text.rs
//! Plain-text helpers: HTML stripping for content-length scoring and the
//! title → search-term fragment used to match query signals.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Number of leading title words kept in a query fragment.
pub const QUERY_FRAGMENT_WORDS: usize = 3;

/// Strip tags, decode entities, collapse whitespace.
pub fn strip_html(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]*>").expect("tag regex"));
    let without_tags = re_tags.replace_all(s, " ");

    let decoded = html_escape::decode_html_entities(&without_tags).to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Character count (not bytes) of the stripped content.
pub fn stripped_char_len(s: &str) -> usize {
    strip_html(s).chars().count()
}

/// Lowercased, punctuation-free first words of a title.
pub fn query_fragment(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    cleaned
        .split_whitespace()
        .take(QUERY_FRAGMENT_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}
