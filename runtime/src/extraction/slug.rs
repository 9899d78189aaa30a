//! Entity name → lookup URL.
//!
//! The site addresses entities by a lower-cased slug: punctuation other
//! than hyphens is dropped and each whitespace run becomes one hyphen.
//! Nothing is trimmed, so leading or trailing whitespace yields a leading
//! or trailing hyphen.

use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Slug for an entity display name.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = DISALLOWED_RE.replace_all(&lower, "");
    WHITESPACE_RE.replace_all(&stripped, "-").into_owned()
}

/// Full lookup URL under `base` (which should end in `/`).
pub fn entity_url(base: &str, name: &str) -> String {
    format!("{base}{}/", slugify(name))
}
