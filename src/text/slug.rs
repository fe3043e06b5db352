//! Slug canonicalization.
//!
//! Slugs are lowercase `a-z0-9-` with single separators and no leading or
//! trailing hyphen. The numeric record id stays authoritative; the slug is a
//! cosmetic suffix that read handlers re-derive and compare.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Characters removed outright, without leaving a separator behind.
const DENYLIST: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '_', '`', '~', '(',
    ')', '"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{061F}', '\u{060C}',
];

/// Dash-like characters treated the same as whitespace.
const SEPARATORS: &[char] = &['-', '\u{2010}', '\u{2013}', '\u{2014}'];

/// Letters with no canonical decomposition that still have an obvious ASCII
/// spelling.
fn ligature(ch: char) -> Option<&'static str> {
    match ch {
        'ß' => Some("ss"),
        'æ' => Some("ae"),
        'œ' => Some("oe"),
        'ø' => Some("o"),
        'đ' | 'ð' => Some("d"),
        'ł' => Some("l"),
        'þ' => Some("th"),
        'ı' => Some("i"),
        _ => None,
    }
}

/// Derives the URL-safe slug for a free-text title.
///
/// Diacritics are removed via NFD, the punctuation denylist is dropped,
/// whitespace and dash runs become a single hyphen, and anything that does not
/// fold into `[a-z0-9]` is discarded. Returns an empty string when nothing
/// survives; callers decide the fallback.
#[must_use]
pub fn compute_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;
    let mut buf = [0_u8; 4];

    for ch in title.nfd() {
        if is_combining_mark(ch) || DENYLIST.contains(&ch) {
            continue;
        }

        if ch.is_whitespace() || SEPARATORS.contains(&ch) {
            pending_separator = true;
            continue;
        }

        for lower in ch.to_lowercase() {
            let piece = if lower.is_ascii_alphanumeric() {
                Some(&*lower.encode_utf8(&mut buf))
            } else {
                ligature(lower)
            };

            let Some(piece) = piece else {
                continue;
            };

            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push_str(piece);
        }
    }

    slug
}

/// Slug of the first candidate that produces a non-empty one.
///
/// Multi-variant records list their titles in precedence order; write and
/// read paths both go through here so they always agree.
pub fn slug_from_candidates<'a, I>(candidates: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(compute_slug)
        .find(|slug| !slug.is_empty())
        .unwrap_or_default()
}

/// Canonical slug of a stored record. A stored slug wins, explicit ones
/// included; records stored without one fall back to their titles.
pub fn record_slug<'a, I>(stored: Option<&str>, titles: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    stored
        .map(compute_slug)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slug_from_candidates(titles))
}

/// Outcome of comparing a requested slug with the canonical one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugCheck {
    pub record_id: i64,
    pub canonical: String,
    pub matches: bool,
}

impl SlugCheck {
    /// Canonical path for the record under `resource_type`, e.g.
    /// `/article/7/al-fatiha`. Titles without a usable slug resolve to the
    /// bare id path.
    #[must_use]
    pub fn location(&self, resource_type: &str) -> String {
        if self.canonical.is_empty() {
            format!("/{resource_type}/{}", self.record_id)
        } else {
            format!("/{resource_type}/{}/{}", self.record_id, self.canonical)
        }
    }
}

/// Checks `requested` against the slug derived from `stored_title`.
///
/// An absent slug never matches a non-empty canonical slug. When the title
/// has no usable slug the bare id path is canonical, so an absent or empty
/// request matches and no redirect loop is possible.
#[must_use]
pub fn validate_slug(record_id: i64, stored_title: &str, requested: Option<&str>) -> SlugCheck {
    let canonical = compute_slug(stored_title);
    let matches = match requested {
        Some(requested) => requested == canonical,
        None => canonical.is_empty(),
    };

    SlugCheck {
        record_id,
        canonical,
        matches,
    }
}
