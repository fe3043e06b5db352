//! Photo galleries.
//!
//! A gallery is a parent row plus one `gallery_images` row per uploaded
//! picture. Parent and images are always written in one store call so a
//! failed upload never leaves a gallery without its images.

use super::{fetch, list, not_found, parse_id, remove, Created, Document, Message};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::{parse_date, FormPayload, Upload},
    },
    storage::{
        schema::{GALLERIES, GALLERY_IMAGES},
        Assignment, ListFilter, Store, Value,
    },
};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::IntoParams;

pub const MAX_IMAGES: usize = 50;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GalleryQuery {
    /// Page size, default 10, capped at 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Case-insensitive title substring.
    pub title: Option<String>,
    /// Exact event date, `YYYY-MM-DD`.
    pub date: Option<String>,
}

impl GalleryQuery {
    fn filter(&self) -> Result<ListFilter, ApiError> {
        let limit = self
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let offset = self.offset.unwrap_or_default().max(0);
        let mut filter = ListFilter::new().page(limit, offset);

        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(column) = GALLERIES.column("title") {
                filter = filter.contains(column, title);
            }
        }
        if let Some(raw) = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            let date = parse_date(raw)
                .ok_or_else(|| ApiError::Validation(format!("Invalid date: {raw}")))?;
            if let Some(column) = GALLERIES.column("eventDate") {
                filter = filter.equals(column, Value::Date(Some(date)));
            }
        }
        Ok(filter)
    }
}

/// Uploaded images, accepting both the `images` and `image` field names.
fn uploads(payload: &FormPayload) -> Vec<&Upload> {
    payload
        .files("images")
        .iter()
        .chain(payload.files("image"))
        .collect()
}

/// One child row per upload. Every upload must be an image.
fn image_rows(uploads: &[&Upload]) -> Result<Vec<Vec<Assignment>>, ApiError> {
    if uploads.len() > MAX_IMAGES {
        return Err(ApiError::Validation(format!(
            "At most {MAX_IMAGES} images per gallery"
        )));
    }
    let slot = GALLERY_IMAGES
        .blob("image")
        .ok_or_else(|| ApiError::Server("gallery_images has no image slot".to_string()))?;
    let name = GALLERY_IMAGES.column("imageName");
    let kind = GALLERY_IMAGES.column("imageType");

    uploads
        .iter()
        .map(|upload| {
            let media_type = upload.media_type();
            if !media_type
                .as_deref()
                .is_some_and(|media_type| media_type.starts_with("image/"))
            {
                return Err(ApiError::Validation(
                    "Only image files are allowed".to_string(),
                ));
            }
            let mut row = vec![Assignment::blob(slot, Some(upload.bytes.clone()))];
            if let Some(column) = name {
                row.push(Assignment::column(
                    column,
                    Value::Text(upload.file_name.clone()),
                ));
            }
            if let Some(column) = kind {
                row.push(Assignment::column(column, Value::Text(media_type)));
            }
            Ok(row)
        })
        .collect()
}

/// Gallery columns from the payload, with `date` accepted for `eventDate`.
fn gallery_values(payload: &FormPayload) -> Result<Vec<Assignment>, ApiError> {
    let mut values = payload.assignments(&GALLERIES)?;
    if !payload.contains("eventDate") {
        if let Some(raw) = payload.text("date") {
            let date = parse_date(raw)
                .ok_or_else(|| ApiError::Validation(format!("Invalid date: {raw}")))?;
            if let Some(column) = GALLERIES.column("eventDate") {
                values.push(Assignment::column(column, Value::Date(Some(date))));
            }
        }
    }
    Ok(values)
}

#[utoipa::path(
    post,
    path = "/api/galleries",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Gallery created", body = Created),
        (status = 400, description = "Missing fields or non-image upload", body = ErrorBody),
    ),
    tag = "galleries"
)]
#[instrument(skip(store, payload))]
pub async fn create_gallery(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&["title"])?;
    if payload.text("eventDate").is_none() && payload.text("date").is_none() {
        return Err(ApiError::Validation("Required fields: eventDate".to_string()));
    }
    let uploads = uploads(&payload);
    if uploads.is_empty() {
        return Err(ApiError::Validation(
            "Please upload at least one image".to_string(),
        ));
    }

    let children = image_rows(&uploads)?;
    let values = gallery_values(&payload)?;
    debug!(images = children.len(), "creating gallery");
    let id = store
        .insert_with_children(&GALLERIES, values, children)
        .await
        .map_err(ApiError::store("create gallery"))?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Gallery created successfully".to_string(),
            id,
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/galleries",
    params(GalleryQuery),
    responses(
        (status = 200, description = "Galleries, newest first", body = [Document]),
        (status = 400, description = "Invalid date", body = ErrorBody),
    ),
    tag = "galleries"
)]
#[instrument(skip(store))]
pub async fn list_galleries(
    store: Extension<Store>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &GALLERIES, &query.filter()?).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/galleries/{id}",
    params(("id" = i64, Path, description = "Gallery id")),
    responses(
        (status = 200, description = "Gallery with its image list", body = Document),
        (status = 404, description = "Gallery not found", body = ErrorBody),
    ),
    tag = "galleries"
)]
#[instrument(skip(store))]
pub async fn get_gallery(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let mut gallery = fetch(&store, &GALLERIES, &id).await?;
    let gallery_id = gallery
        .get("id")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or_default();

    let filter = match GALLERY_IMAGES.column("galleryId") {
        Some(column) => ListFilter::new().equals(column, Value::Int(gallery_id)),
        None => return Err(ApiError::Server("gallery_images has no galleryId".to_string())),
    };
    let mut images = list(&store, &GALLERY_IMAGES, &filter).await?;
    images.reverse();
    for image in &mut images {
        if let Some(image_id) = image.get("id").and_then(serde_json::Value::as_i64) {
            image.insert(
                "url".to_string(),
                serde_json::Value::String(format!("/api/galleries/images/{image_id}")),
            );
        }
    }

    gallery.insert(
        "images".to_string(),
        serde_json::Value::Array(images.into_iter().map(serde_json::Value::Object).collect()),
    );
    Ok(Json(Document(gallery)))
}

#[utoipa::path(
    get,
    path = "/api/galleries/images/{id}",
    params(("id" = i64, Path, description = "Gallery image id")),
    responses(
        (status = 200, description = "Image bytes, served inline"),
        (status = 404, description = "Image not found", body = ErrorBody),
    ),
    tag = "galleries"
)]
#[instrument(skip(store))]
pub async fn gallery_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &GALLERY_IMAGES, "image", &id).await
}

/// Updates metadata. Sending images replaces the whole image set.
#[utoipa::path(
    put,
    path = "/api/galleries/{id}",
    params(("id" = i64, Path, description = "Gallery id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Gallery updated", body = Message),
        (status = 400, description = "Nothing to update or non-image upload", body = ErrorBody),
        (status = 404, description = "Gallery not found", body = ErrorBody),
    ),
    tag = "galleries"
)]
#[instrument(skip(store, payload))]
pub async fn update_gallery(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    if payload.contains("title") && payload.text("title").is_none() {
        return Err(ApiError::Validation("title cannot be empty".to_string()));
    }
    let values = gallery_values(&payload)?;
    let uploads = uploads(&payload);

    if uploads.is_empty() {
        return super::update(&store, &GALLERIES, id, values).await;
    }

    let children = image_rows(&uploads)?;
    let affected = store
        .update_with_children(&GALLERIES, id, values, children)
        .await
        .map_err(ApiError::store("update gallery"))?;
    if affected == 0 {
        return Err(not_found(&GALLERIES));
    }

    Ok(Json(Message {
        message: "Gallery updated successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/galleries/{id}",
    params(("id" = i64, Path, description = "Gallery id")),
    responses(
        (status = 200, description = "Gallery and its images deleted", body = Message),
        (status = 404, description = "Gallery not found", body = ErrorBody),
    ),
    tag = "galleries"
)]
#[instrument(skip(store))]
pub async fn delete_gallery(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &GALLERIES, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::testing::{app, created_id, delete, get, multipart, send, store};
    use anyhow::Result;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request},
    };
    use tower::ServiceExt;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A];

    #[test]
    fn page_size_is_clamped() -> Result<()> {
        let query = GalleryQuery {
            limit: Some(500),
            offset: Some(-4),
            ..GalleryQuery::default()
        };
        let filter = query.filter()?;
        assert_eq!(filter.limit, Some(MAX_LIMIT));
        assert_eq!(filter.offset, Some(0));

        let filter = GalleryQuery::default().filter()?;
        assert_eq!(filter.limit, Some(DEFAULT_LIMIT));

        let query = GalleryQuery {
            date: Some("yesterday".to_string()),
            ..GalleryQuery::default()
        };
        assert!(query.filter().is_err());
        Ok(())
    }

    #[test]
    fn rejects_non_images() {
        let text = Upload {
            file_name: Some("notes.txt".to_string()),
            content_type: Some("text/plain".to_string()),
            bytes: b"hello".to_vec(),
        };
        assert!(matches!(image_rows(&[&text]), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn gallery_lifecycle() -> Result<()> {
        let store = store();
        let app = app(&store)?;

        let request = multipart(
            Method::POST,
            "/api/galleries",
            &[("title", "Eid Milad 2024"), ("date", "2024-09-16")],
            &[],
        )?;
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please upload at least one image");

        let request = multipart(
            Method::POST,
            "/api/galleries",
            &[("title", "Eid Milad 2024"), ("date", "2024-09-16")],
            &[
                ("images", "procession.png", "image/png", PNG),
                ("images", "stage.jpg", "image/jpeg", &[0xFF_u8, 0xD8, 0xFF][..]),
            ],
        )?;
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::CREATED);
        let id = created_id(&body);

        let (_, body) = get(&app, "/api/galleries?title=milad&date=2024-09-16").await?;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        let (_, body) = get(&app, "/api/galleries?title=ramadan").await?;
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        let (status, body) = get(&app, &format!("/api/galleries/{id}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["eventDate"], "2024-09-16");
        let images = body["images"].as_array().cloned().unwrap_or_default();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["imageName"], "procession.png");
        let url = images[0]["url"].as_str().unwrap_or_default().to_string();

        let response = app
            .clone()
            .oneshot(Request::builder().uri(&url).body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&bytes[..], PNG);

        let request = multipart(
            Method::PUT,
            &format!("/api/galleries/{id}"),
            &[("description", "Annual procession")],
            &[("images", "crowd.png", "image/png", PNG)],
        )?;
        let (status, _) = send(&app, request).await?;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = get(&app, &format!("/api/galleries/{id}")).await?;
        assert_eq!(body["description"], "Annual procession");
        assert_eq!(body["images"].as_array().map(Vec::len), Some(1));

        let (status, _) = delete(&app, &format!("/api/galleries/{id}")).await?;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(&app, &url).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
