//! Stylesheet and placeholder images, embedded at compile time.

use super::{pages::not_found, Site};
use axum::{
    extract::{Extension, Path},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

/// `(path under /assets, content type, body)`.
const ASSETS: [(&str, &str, &str); 3] = [
    (
        "css/site.css",
        "text/css; charset=utf-8",
        include_str!("../../assets/css/site.css"),
    ),
    (
        "image/default/articles.svg",
        "image/svg+xml",
        include_str!("../../assets/image/default/articles.svg"),
    ),
    (
        "image/default/writer.svg",
        "image/svg+xml",
        include_str!("../../assets/image/default/writer.svg"),
    ),
];

fn lookup(path: &str) -> Option<(&'static str, &'static str)> {
    ASSETS
        .iter()
        .find(|(name, _, _)| *name == path)
        .map(|(_, content_type, body)| (*content_type, *body))
}

#[instrument(skip(site))]
pub async fn asset(Extension(site): Extension<Arc<Site>>, Path(path): Path<String>) -> Response {
    let Some((content_type, body)) = lookup(&path) else {
        return not_found(&site);
    };

    (
        [
            (CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
        ],
        body,
    )
        .into_response()
}
