//! Link previews for social sharing.
//!
//! Crawlers do not run the front end, so shared links point here. The page
//! carries Open Graph and Twitter meta tags for the record and sends humans
//! on to the canonical front-end URL after three seconds.

use super::{canonical_slug, parse_id};
use crate::{
    api::error::{ApiError, ErrorBody},
    site::Site,
    storage::{
        schema::{ARTICLES, BOOKS, EVENTS},
        Table,
    },
    text::{preview, PREVIEW_LENGTH},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Clone, Copy)]
struct ShareKind {
    table: &'static Table,
    /// Front-end path segment.
    segment: &'static str,
    /// Image endpoint below the record, e.g. `image` or `cover`.
    image: &'static str,
    label: &'static str,
    default_title: &'static str,
}

impl ShareKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "article" => Some(Self {
                table: &ARTICLES,
                segment: "article",
                image: "image",
                label: "article",
                default_title: "Islamic Article",
            }),
            "event" | "newsandevent" => Some(Self {
                table: &EVENTS,
                segment: "event",
                image: "image",
                label: "event",
                default_title: "Islamic Event",
            }),
            "book" => Some(Self {
                table: &BOOKS,
                segment: "book",
                image: "cover",
                label: "book",
                default_title: "Islamic Book",
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SharePage {
    title: String,
    description: String,
    image: String,
    url: String,
    kind: &'static str,
    /// `url` as a JavaScript string literal.
    redirect: String,
}

/// JSON string literal safe to embed in an inline `<script>`.
fn script_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace("</", "<\\/")
}

#[utoipa::path(
    get,
    path = "/api/share/{type}/{id}/{slug}",
    params(
        ("type" = String, Path, description = "`article`, `event` (or `newsandevent`) or `book`"),
        ("id" = i64, Path, description = "Record id"),
        ("slug" = String, Path, description = "Slug as shared; the redirect always uses the canonical one"),
    ),
    responses(
        (status = 200, description = "HTML document with Open Graph tags", content_type = "text/html"),
        (status = 404, description = "Unknown type or record", body = ErrorBody),
        (status = 500, description = "Content API unavailable", body = ErrorBody),
    ),
    tag = "share"
)]
#[instrument(skip(site))]
pub async fn share(
    Extension(site): Extension<Arc<Site>>,
    Path((kind, id, _slug)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let share = ShareKind::parse(&kind)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown content type: {kind}")))?;
    let id = parse_id(&id)?;

    let record = site
        .public
        .get(share.table.resource, id)
        .await
        .map_err(|err| {
            error!("share fetch failed: {err}");
            ApiError::Server(format!("Error fetching content: {err}"))
        })?
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", share.table.label)))?;

    let text = |key: &str| {
        record
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    let title = text("title")
        .or_else(|| text("englishTitle"))
        .unwrap_or(share.default_title)
        .to_string();
    let description = text("description")
        .or_else(|| text("englishDescription"))
        .map(|body| preview(body, PREVIEW_LENGTH))
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| format!("Explore this {} on Minaramasjid.com", share.label));

    let slug = canonical_slug(share.table, &record);
    let url = if slug.is_empty() {
        format!("{}/{}/{id}", site.frontend_url, share.segment)
    } else {
        format!("{}/{}/{id}/{slug}", site.frontend_url, share.segment)
    };

    let page = SharePage {
        title,
        description,
        image: site
            .public
            .url(&format!("{}/{id}/{}", share.table.resource, share.image)),
        redirect: script_string(&url),
        url,
        kind: share.label,
    };

    let html = site
        .templates
        .render("share.html", &page)
        .map_err(|err| ApiError::Server(format!("render share page: {err}")))?;
    Ok((StatusCode::OK, Html(html)).into_response())
}
