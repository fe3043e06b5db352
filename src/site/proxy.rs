use super::{
    pages::{not_found, PLACEHOLDER_IMAGE, PLACEHOLDER_WRITER},
    Site,
};
use axum::{
    extract::{Extension, Path},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Upstream path of the image for `resource`, and the placeholder used when
/// it is missing.
fn source(resource: &str, id: i64) -> Option<(String, &'static str)> {
    match resource {
        "articles" | "events" => Some((format!("{resource}/{id}/image"), PLACEHOLDER_IMAGE)),
        "writers" => Some((format!("writers/{id}/image"), PLACEHOLDER_WRITER)),
        "books" => Some((format!("books/{id}/cover"), PLACEHOLDER_IMAGE)),
        _ => None,
    }
}

fn placeholder(location: &'static str) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, HeaderValue::from_static(location))],
    )
        .into_response()
}

/// Streams an upstream image with a short public cache lifetime, or
/// redirects to a placeholder.
#[instrument(skip(site))]
pub async fn media(
    Extension(site): Extension<Arc<Site>>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    let Some(id) = id.parse::<i64>().ok().filter(|id| *id > 0) else {
        return not_found(&site);
    };
    let Some((path, fallback)) = source(&resource, id) else {
        return not_found(&site);
    };

    match site.upstream.bytes(&path).await {
        Ok(Some(fetched)) if !fetched.bytes.is_empty() => {
            let content_type = fetched
                .content_type
                .as_deref()
                .and_then(|value| HeaderValue::from_str(value).ok())
                .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
            (
                [
                    (CONTENT_TYPE, content_type),
                    (CACHE_CONTROL, HeaderValue::from_static("public, max-age=600")),
                ],
                fetched.bytes,
            )
                .into_response()
        }
        Ok(_) => placeholder(fallback),
        Err(err) => {
            debug!("media fallback for {path}: {err}");
            placeholder(fallback)
        }
    }
}
