//! Home and detail pages.

use super::Site;
use crate::{
    storage::{
        schema::{ARTICLES, BOOKS, EVENTS, QUESTIONS},
        Record, Table,
    },
    text::{
        detect_direction, preview, record_slug, sanitize_for_render, strip_html, validate_slug,
        Language, Localized, Precedence, SlugCheck, PREVIEW_LENGTH,
    },
};
use axum::{
    extract::{Extension, Path},
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, instrument, warn};

pub const PLACEHOLDER_IMAGE: &str = "/assets/image/default/articles.svg";
pub const PLACEHOLDER_WRITER: &str = "/assets/image/default/writer.svg";

const HOME_ARTICLES: usize = 4;
const HOME_WRITERS: usize = 4;
const HOME_BOOKS: usize = 4;
const HOME_EVENTS: usize = 3;
const RELATED: usize = 3;

/// Content types with a detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Article,
    Event,
    Book,
    Question,
}

impl Kind {
    /// Path segment of the detail page, e.g. `article`.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Event => "event",
            Self::Book => "book",
            Self::Question => "question",
        }
    }

    #[must_use]
    pub const fn table(self) -> &'static Table {
        match self {
            Self::Article => &ARTICLES,
            Self::Event => &EVENTS,
            Self::Book => &BOOKS,
            Self::Question => &QUESTIONS,
        }
    }

    const fn date_field(self) -> &'static str {
        match self {
            Self::Event => "eventDate",
            Self::Book => "bookDate",
            Self::Article | Self::Question => "date",
        }
    }

    /// Record field naming the writer(s), comma separated.
    const fn writer_field(self) -> &'static str {
        match self {
            Self::Article | Self::Event => "writers",
            Self::Book => "author",
            Self::Question => "writer",
        }
    }

    /// Proxied image path. Questions have no proxy route.
    fn image(self, id: i64) -> String {
        match self {
            Self::Question => PLACEHOLDER_IMAGE.to_string(),
            _ => format!("/media/{}/{id}", self.table().resource),
        }
    }

    fn titles(self, record: &Record) -> Localized<String> {
        match self {
            Self::Article | Self::Event => {
                let mut titles =
                    Localized::from_fn(|language| field(record, &language.key("Title")));
                if titles.english.is_none() {
                    titles.english = field(record, "title");
                }
                titles
            }
            Self::Book => Localized {
                english: field(record, "title"),
                ..Localized::default()
            },
            Self::Question => Localized::from_fn(|language| {
                field(record, &format!("question{}", question_suffix(language)))
            }),
        }
    }

    fn bodies(self, record: &Record) -> Localized<String> {
        match self {
            Self::Article | Self::Event => {
                Localized::from_fn(|language| field(record, &language.key("Description")))
            }
            Self::Book => Localized {
                english: field(record, "description"),
                ..Localized::default()
            },
            Self::Question => Localized::from_fn(|language| {
                field(record, &format!("answer{}", question_suffix(language)))
            }),
        }
    }
}

const fn question_suffix(language: Language) -> &'static str {
    match language {
        Language::English => "English",
        Language::Urdu => "Urdu",
        Language::RomanUrdu => "Roman",
        Language::Hindi => "Hindi",
    }
}

fn field(record: &Record, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(serde_json::Value::as_i64)
}

/// `2024-01-02` or an RFC 3339 timestamp as `02 Jan 2024`; empty otherwise.
#[must_use]
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive()))
        .map(|date| date.format("%d %b %Y").to_string())
        .unwrap_or_default()
}

/// Slug check against the stored slug, or the stored titles in the order
/// slugs are written with when the record carries none.
fn slug_check(kind: Kind, id: i64, record: &Record, requested: Option<&str>) -> SlugCheck {
    let stored = record.get("slug").and_then(serde_json::Value::as_str);
    let titles = kind
        .table()
        .title_fields
        .iter()
        .filter_map(|key| record.get(*key).and_then(serde_json::Value::as_str));
    validate_slug(id, &record_slug(stored, titles), requested)
}

/// First body variant with visible text; markup-only variants are skipped.
fn pick_body(kind: Kind, record: &Record, precedence: Precedence) -> Option<String> {
    let bodies = kind.bodies(record);
    precedence
        .order()
        .iter()
        .filter_map(|language| bodies.get(*language))
        .find(|body| !strip_html(body).is_empty())
        .cloned()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub summary: String,
    pub date: String,
    pub image: String,
    pub href: String,
    pub dir: &'static str,
}

impl Card {
    #[must_use]
    pub fn from_record(kind: Kind, record: &Record, precedence: Precedence) -> Option<Self> {
        let id = record_id(record)?;
        let titles = kind.titles(record);
        let title = titles
            .pick(precedence)
            .map(|(_, title)| title.to_string())
            .unwrap_or_default();
        let summary = pick_body(kind, record, precedence)
            .map(|body| preview(&body, PREVIEW_LENGTH))
            .unwrap_or_default();
        let date = field(record, kind.date_field())
            .map(|raw| format_date(&raw))
            .unwrap_or_default();

        Some(Self {
            dir: detect_direction(&title).as_str(),
            href: slug_check(kind, id, record, None).location(kind.segment()),
            image: kind.image(id),
            title,
            summary,
            date,
        })
    }

    fn writer(record: &Record) -> Option<Self> {
        let id = record_id(record)?;
        let name = field(record, "name").unwrap_or_default();
        let summary = field(record, "urduDescription")
            .or_else(|| field(record, "englishDescription"))
            .map(|text| preview(&text, PREVIEW_LENGTH))
            .unwrap_or_default();

        Some(Self {
            dir: detect_direction(&name).as_str(),
            title: name,
            summary,
            date: String::new(),
            image: format!("/media/writers/{id}"),
            href: "/#writers".to_string(),
        })
    }
}

fn published(record: &Record) -> bool {
    record
        .get("isPublished")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(true)
}

fn cards(kind: Kind, rows: &[Record], precedence: Precedence, limit: usize) -> Vec<Card> {
    rows.iter()
        .filter(|row| published(row))
        .filter_map(|row| Card::from_record(kind, row, precedence))
        .take(limit)
        .collect()
}

fn or_empty<T: Default, E: std::fmt::Display>(branch: &str, result: Result<T, E>) -> T {
    result.unwrap_or_else(|err| {
        warn!("{branch} unavailable: {err}");
        T::default()
    })
}

#[instrument(skip(site))]
pub async fn home(Extension(site): Extension<Arc<Site>>) -> Response {
    let upstream = &site.upstream;
    let (articles, writers, books, events) = tokio::join!(
        upstream.list(ARTICLES.resource),
        upstream.list("writers"),
        upstream.list(BOOKS.resource),
        upstream.list(EVENTS.resource),
    );

    let precedence = Precedence::URDU_FIRST;
    let writers: Vec<Card> = or_empty("writers", writers)
        .iter()
        .filter_map(Card::writer)
        .take(HOME_WRITERS)
        .collect();
    let data = json!({
        "page_title": "Home",
        "articles": cards(Kind::Article, &or_empty("articles", articles), precedence, HOME_ARTICLES),
        "writers": writers,
        "books": cards(Kind::Book, &or_empty("books", books), precedence, HOME_BOOKS),
        "events": cards(Kind::Event, &or_empty("events", events), precedence, HOME_EVENTS),
    });

    site.page(StatusCode::OK, "home.html", &data)
}

#[derive(Debug, Serialize)]
struct WriterRef {
    name: String,
    image: String,
}

/// Writers named in `record`, matched case-insensitively against the list.
fn named_writers(kind: Kind, record: &Record, writers: &[Record]) -> Vec<WriterRef> {
    let Some(names) = field(record, kind.writer_field()) else {
        return Vec::new();
    };

    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let image = writers
                .iter()
                .find(|writer| {
                    field(writer, "name").is_some_and(|known| known.eq_ignore_ascii_case(name))
                })
                .and_then(record_id)
                .map_or_else(|| PLACEHOLDER_WRITER.to_string(), |id| format!("/media/writers/{id}"));
            WriterRef {
                name: name.to_string(),
                image,
            }
        })
        .collect()
}

/// `301 Moved Permanently` to `location`.
fn moved(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(LOCATION, value)]).into_response(),
        Err(err) => {
            warn!("Invalid redirect target {location}: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Renders the 404 page.
pub fn not_found(site: &Site) -> Response {
    site.page(
        StatusCode::NOT_FOUND,
        "not_found.html",
        &json!({
            "page_title": "Page not found",
            "message": "The page you are looking for does not exist or was removed.",
        }),
    )
}

/// Renders the error page for a content API that failed to answer.
fn unavailable(site: &Site) -> Response {
    site.page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "not_found.html",
        &json!({
            "page_title": "Something went wrong",
            "message": "This page is temporarily unavailable. Please try again shortly.",
        }),
    )
}

async fn detail(site: &Site, kind: Kind, params: &HashMap<String, String>) -> Response {
    let Some(id) = params
        .get("id")
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
    else {
        return not_found(site);
    };
    let requested = params.get("slug").map(String::as_str);
    let resource = kind.table().resource;

    let (record, writers, related) = tokio::join!(
        site.upstream.get(resource, id),
        site.upstream.list("writers"),
        site.upstream.list(resource),
    );

    let record = match record {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(site),
        Err(err) => {
            error!("{resource} {id} unavailable: {err}");
            return unavailable(site);
        }
    };

    let check = slug_check(kind, id, &record, requested);
    if !check.matches {
        return moved(&check.location(kind.segment()));
    }

    let precedence = Precedence::DEFAULT;
    let title = kind
        .titles(&record)
        .pick(precedence)
        .map(|(_, title)| title.to_string())
        .unwrap_or_default();
    let body = pick_body(kind, &record, precedence).unwrap_or_default();

    let related: Vec<Card> = or_empty("related", related)
        .iter()
        .filter(|row| record_id(row) != Some(id) && published(row))
        .filter_map(|row| Card::from_record(kind, row, precedence))
        .take(RELATED)
        .collect();

    let data = json!({
        "page_title": if title.is_empty() { kind.table().label.to_string() } else { title.clone() },
        "kind": kind.segment(),
        "dir": detect_direction(&title).as_str(),
        "description": preview(&body, PREVIEW_LENGTH),
        "canonical": format!("{}{}", site.frontend_url, check.location(kind.segment())),
        "title": title,
        "date": field(&record, kind.date_field()).map(|raw| format_date(&raw)).unwrap_or_default(),
        "image": kind.image(id),
        "body": sanitize_for_render(&body),
        "writers": named_writers(kind, &record, &or_empty("writers", writers)),
        "related": related,
    });

    site.page(StatusCode::OK, "detail.html", &data)
}

#[instrument(skip(site))]
pub async fn article(
    Extension(site): Extension<Arc<Site>>,
    Path(params): Path<HashMap<String, String>>,
) -> Response {
    detail(&site, Kind::Article, &params).await
}

#[instrument(skip(site))]
pub async fn event(
    Extension(site): Extension<Arc<Site>>,
    Path(params): Path<HashMap<String, String>>,
) -> Response {
    detail(&site, Kind::Event, &params).await
}

#[instrument(skip(site))]
pub async fn book(
    Extension(site): Extension<Arc<Site>>,
    Path(params): Path<HashMap<String, String>>,
) -> Response {
    detail(&site, Kind::Book, &params).await
}

#[instrument(skip(site))]
pub async fn question(
    Extension(site): Extension<Arc<Site>>,
    Path(params): Path<HashMap<String, String>>,
) -> Response {
    detail(&site, Kind::Question, &params).await
}
