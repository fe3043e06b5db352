pub mod about;
pub mod admin;
pub mod articles;
pub mod book_requests;
pub mod books;
pub mod events;
pub mod feedback;
pub mod galleries;
pub mod health;
pub mod home_book_slider;
pub mod languages;
pub mod questions;
pub mod share;
pub mod stats;
pub mod tags;
pub mod topics;
pub mod translators;
pub mod writers;

// common functions for the handlers
use super::{error::ApiError, payload::FormPayload};
use crate::{
    storage::{Assignment, Blob, ListFilter, Record, Store, Table, Value},
    text::{compute_slug, record_slug, slug_from_candidates},
};
use axum::{
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

#[must_use]
pub fn valid_email(email: &str) -> bool {
    EMAIL
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()))
}

/// Parses a path id; anything but a positive integer is a validation error.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Validation(format!("Invalid id: {raw}")))
}

/// A stored record as returned by the API.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Document(pub Record);

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub message: String,
    pub id: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

pub(crate) async fn create(
    store: &Store,
    table: &'static Table,
    values: Vec<Assignment>,
) -> Result<Response, ApiError> {
    let id = store
        .insert(table, values)
        .await
        .map_err(ApiError::store("create record"))?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: format!("{} created successfully", table.label),
            id,
        }),
    )
        .into_response())
}

pub(crate) async fn list(
    store: &Store,
    table: &'static Table,
    filter: &ListFilter,
) -> Result<Vec<Record>, ApiError> {
    store
        .list(table, filter)
        .await
        .map_err(ApiError::store("list records"))
}

pub(crate) async fn fetch(
    store: &Store,
    table: &'static Table,
    id: &str,
) -> Result<Record, ApiError> {
    let id = parse_id(id)?;
    store
        .fetch(table, id)
        .await
        .map_err(ApiError::store("fetch record"))?
        .ok_or_else(|| not_found(table))
}

pub(crate) async fn update(
    store: &Store,
    table: &'static Table,
    id: i64,
    values: Vec<Assignment>,
) -> Result<Json<Message>, ApiError> {
    if values.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let affected = store
        .update(table, id, values)
        .await
        .map_err(ApiError::store("update record"))?;
    if affected == 0 {
        return Err(not_found(table));
    }

    Ok(Message::new(format!("{} updated successfully", table.label)))
}

pub(crate) async fn remove(
    store: &Store,
    table: &'static Table,
    id: &str,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(id)?;
    let affected = store
        .remove(table, id)
        .await
        .map_err(ApiError::store("delete record"))?;
    if affected == 0 {
        return Err(not_found(table));
    }

    Ok(Message::new(format!("{} deleted successfully", table.label)))
}

pub(crate) fn not_found(table: &Table) -> ApiError {
    ApiError::NotFound(format!("{} not found", table.label))
}

/// Clears a stored file and its companion columns.
pub(crate) fn clear_blob(table: &'static Table, field: &str) -> Vec<Assignment> {
    let Some(slot) = table.blob(field) else {
        return Vec::new();
    };
    let mut values = vec![Assignment::blob(slot, None)];
    for companion in [slot.type_field, slot.name_field].into_iter().flatten() {
        if let Some(column) = table.column(companion) {
            values.push(Assignment::column(column, Value::Text(None)));
        }
    }
    values
}

fn record_titles<'a>(table: &Table, record: &'a Record) -> Vec<&'a str> {
    table
        .title_fields
        .iter()
        .filter_map(|field| record.get(*field).and_then(serde_json::Value::as_str))
        .collect()
}

/// Canonical slug of a stored record: the stored `slug`, else the one its
/// titles yield.
#[must_use]
pub fn canonical_slug(table: &Table, record: &Record) -> String {
    let stored = record.get("slug").and_then(serde_json::Value::as_str);
    record_slug(stored, record_titles(table, record))
}

/// Fills `slug` on list rows that were stored without one.
pub(crate) fn fill_slugs(table: &Table, rows: &mut [Record]) {
    for row in rows {
        let stored = row
            .get("slug")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|slug| !slug.is_empty());
        if !stored {
            let slug = canonical_slug(table, row);
            row.insert("slug".to_string(), serde_json::Value::String(slug));
        }
    }
}

/// Slug assignment for a write.
///
/// On create `existing` is `None` and at least one title is required. On
/// update the payload's titles are merged over the stored ones and the slug
/// is only rewritten when a title (or the explicit `slug`) was sent.
/// `explicit` enables the client-supplied `slug` field.
pub(crate) fn slug_assignment(
    table: &'static Table,
    payload: &FormPayload,
    existing: Option<&Record>,
    explicit: bool,
) -> Result<Option<Assignment>, ApiError> {
    let Some(column) = table.column("slug") else {
        return Ok(None);
    };

    let touched = table
        .title_fields
        .iter()
        .any(|field| payload.contains(field))
        || (explicit && payload.contains("slug"));
    if existing.is_some() && !touched {
        return Ok(None);
    }

    let titles: Vec<&str> = table
        .title_fields
        .iter()
        .filter_map(|field| {
            if payload.contains(field) {
                payload.text(field)
            } else {
                existing
                    .and_then(|record| record.get(*field))
                    .and_then(serde_json::Value::as_str)
            }
        })
        .filter(|title| !title.trim().is_empty())
        .collect();

    let requested = explicit
        .then(|| payload.text("slug"))
        .flatten()
        .map(compute_slug)
        .filter(|slug| !slug.is_empty());

    if titles.is_empty() && requested.is_none() {
        return Err(ApiError::Validation(format!(
            "At least one of {} is required",
            table.title_fields.join(", ")
        )));
    }

    let slug = requested.unwrap_or_else(|| slug_from_candidates(titles));
    Ok(Some(Assignment::column(
        column,
        Value::Text((!slug.is_empty()).then_some(slug)),
    )))
}

/// Resolves the media type of a stored file: the recorded type, a guess from
/// the file name, a magic-byte sniff, then the slot default.
#[must_use]
pub fn media_type(blob: &Blob, default_type: &str) -> String {
    blob.content_type
        .as_deref()
        .map(str::trim)
        .filter(|declared| !declared.is_empty())
        .map(str::to_string)
        .or_else(|| {
            blob.file_name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first_raw())
                .map(str::to_string)
        })
        .or_else(|| sniff(&blob.bytes).map(str::to_string))
        .unwrap_or_else(|| default_type.to_string())
}

fn sniff(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'%', b'P', b'D', b'F', ..] => Some("application/pdf"),
        _ => None,
    }
}

fn disposition(file_name: Option<&str>) -> HeaderValue {
    let safe = file_name.map(|name| {
        name.chars()
            .filter(|ch| !ch.is_control() && *ch != '"' && *ch != '\\')
            .collect::<String>()
    });
    safe.filter(|name| !name.is_empty())
        .and_then(|name| HeaderValue::from_str(&format!("inline; filename=\"{name}\"")).ok())
        .unwrap_or_else(|| HeaderValue::from_static("inline"))
}

/// Streams one stored file with its resolved media type.
pub(crate) async fn blob(
    store: &Store,
    table: &'static Table,
    field: &str,
    id: &str,
) -> Result<Response, ApiError> {
    let id = parse_id(id)?;
    let slot = table
        .blob(field)
        .ok_or_else(|| ApiError::Server(format!("{} has no {field} slot", table.name)))?;
    let blob = store
        .blob(table, slot, id)
        .await
        .map_err(ApiError::store("read file"))?
        .ok_or_else(|| ApiError::NotFound(format!("{} {field} not found", table.label)))?;

    let content_type = HeaderValue::from_str(&media_type(&blob, slot.default_type))
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition(blob.file_name.as_deref())),
            (CACHE_CONTROL, HeaderValue::from_static("public, max-age=600")),
        ],
        blob.bytes,
    )
        .into_response())
}
