//! Text canonicalization shared by the REST handlers and the site renderer.
//!
//! Everything here is pure and synchronous: no I/O, no shared state. The API
//! layer runs it at write time (slug persisted next to the record) and the
//! site layer runs it again at read time, so both sides must agree on the
//! exact same rules.
//!
//! - [`slug`] turns free-text titles into `[a-z0-9-]` identifiers and checks
//!   requested slugs against the canonical one.
//! - [`html`] holds the markup primitives: tag stripping, entity decoding, the
//!   render sanitizer and length clamping.
//! - [`lang`] models the four parallel language variants and the precedence
//!   used to pick a representative value.

pub mod html;
pub mod lang;
pub mod slug;

pub use self::html::{clamp, decode_entities, sanitize_for_render, strip_html};
pub use self::lang::{
    detect_direction, first_non_empty, Language, Localized, Precedence, TextDirection,
};
pub use self::slug::{
    compute_slug, record_slug, slug_from_candidates, validate_slug, SlugCheck,
};

/// Default length for meta descriptions and list previews.
pub const PREVIEW_LENGTH: usize = 160;

/// Plain text of an HTML-bearing string: tags stripped, entities decoded and
/// whitespace collapsed.
#[must_use]
pub fn plain_text(html: &str) -> String {
    // Decoding can produce `&nbsp;` runs, so collapse once more.
    html::collapse_whitespace(&decode_entities(&strip_html(html)))
}

/// [`plain_text`] clamped to `max` characters.
#[must_use]
pub fn preview(html: &str, max: usize) -> String {
    clamp(&plain_text(html), max)
}
