//! # Minara (Content backend and rendered site)
//!
//! `minara` serves the Minara Masjid content: a JSON REST API under `/api`
//! for articles, events, books, questions, writers and the smaller
//! taxonomies, and a server-rendered public site built on top of that API.
//!
//! ## Multilingual records
//!
//! Every piece of content can carry up to four parallel language variants
//! (English, Urdu, Roman Urdu, Hindi). Which variant represents a record is
//! decided by an explicit [`text::Precedence`]; the rendered home page prefers
//! Urdu, everything else English first.
//!
//! ## Slugs
//!
//! - **Canonical slug:** derived from the first title variant that produces a
//!   non-empty `[a-z0-9-]` slug and stored next to the record on write.
//! - **Redirects:** detail pages resolve by id; a missing or stale slug is a
//!   `301` to the canonical path, never a `404`.
//!
//! ## Storage
//!
//! Handlers go through the [`storage::ContentStore`] trait. `PostgreSQL` is the
//! production store (schema in `sql/schema.sql`). Most tables soft delete;
//! translators, languages and galleries are removed for real.

pub mod api;
pub mod cli;
pub mod site;
pub mod storage;
pub mod text;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
