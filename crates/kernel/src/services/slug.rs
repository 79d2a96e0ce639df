//! Slug and shareable link derivation.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

#[allow(clippy::expect_used)]
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_ ]+").expect("DISALLOWED is a valid regex pattern"));

#[allow(clippy::expect_used)]
static SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("SPACES is a valid regex pattern"));

/// Convert a title into a URL slug.
///
/// Lowercases, strips everything except ASCII word characters and spaces,
/// trims, then turns each run of spaces into one hyphen. May return an empty
/// string when the title has no usable characters.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    SPACES.replace_all(stripped.trim(), "-").into_owned()
}

/// Render a non-negative integer in lowercase base 36.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Public link for a post published at `at`: `<slug>-<base36 millis>`.
pub fn shareable_link(slug: &str, at: DateTime<Utc>) -> String {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    format!("{slug}-{}", to_base36(millis))
}
