//! Plain-text projection of section HTML.
//!
//! Best effort only: line-breaking tags become newlines, every other tag is
//! dropped and the five basic entities are decoded. Malformed markup yields
//! whatever text survives rather than an error.

use std::sync::LazyLock;

use regex::Regex;

static BR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static P_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</p\s*>").unwrap());
static P_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<p(\s[^>]*)?>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Strip HTML to trimmed plain text, keeping line structure.
pub fn strip_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let text = BR.replace_all(html, "\n");
    let text = P_CLOSE.replace_all(&text, "\n");
    let text = P_OPEN.replace_all(&text, "");
    let text = ANY_TAG.replace_all(&text, "");

    // `&amp;` last so that `&amp;lt;` decodes to `&lt;`, not `<`.
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Non-empty, trimmed lines of the plain-text projection.
pub fn content_lines(html: &str) -> Vec<String> {
    strip_html(html)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
