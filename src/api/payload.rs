//! Request body extractor shared by every write endpoint.
//!
//! The admin panel posts `multipart/form-data` when files are attached and
//! JSON or urlencoded bodies otherwise. [`FormPayload`] accepts all three and
//! exposes a flat string map plus uploaded files, which
//! [`FormPayload::assignments`] turns into typed column values.

use super::error::ApiError;
use crate::storage::{schema::ColumnType, Assignment, Column, Table, Value};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::{HashMap, HashSet};

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Declared content type, else one guessed from the file name.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .clone()
            .filter(|declared| !declared.is_empty() && declared != "application/octet-stream")
            .or_else(|| {
                self.file_name
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first_raw())
                    .map(str::to_string)
            })
    }
}

#[derive(Debug, Default, Clone)]
pub struct FormPayload {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<Upload>>,
}

#[async_trait]
impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let Json(value) = Json::<serde_json::Value>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
            Self::from_json(value)
        } else {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
            Ok(Self::from_urlencoded(&bytes))
        }
    }
}

fn json_to_text(value: serde_json::Value) -> String {
    use serde_json::Value as Json;

    match value {
        Json::Null => String::new(),
        Json::String(text) => text,
        Json::Array(items) if items.iter().all(Json::is_string) => items
            .into_iter()
            .filter_map(|item| match item {
                Json::String(text) => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// `1`, `true`, `yes`, `y` and `on`, case-insensitive.
#[must_use]
pub fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|| parse_date(raw).map(|date| date.and_time(NaiveTime::MIN).and_utc()))
}

fn parse_value(column: &Column, raw: &str) -> Result<Value, ApiError> {
    let raw = raw.trim();
    let value = match column.kind {
        ColumnType::Text => Value::Text((!raw.is_empty()).then(|| raw.to_string())),
        ColumnType::Bool => Value::Bool(truthy(raw)),
        ColumnType::Int if raw.is_empty() => Value::Int(0),
        ColumnType::Int => raw.parse().map(Value::Int).map_err(|_| {
            ApiError::Validation(format!("{} must be an integer", column.field))
        })?,
        ColumnType::Date if raw.is_empty() => Value::Date(None),
        ColumnType::Date => Value::Date(Some(parse_date(raw).ok_or_else(|| {
            ApiError::Validation(format!("{} must be a date (YYYY-MM-DD)", column.field))
        })?)),
        ColumnType::Timestamp if raw.is_empty() => Value::Timestamp(None),
        ColumnType::Timestamp => Value::Timestamp(Some(parse_timestamp(raw).ok_or_else(
            || ApiError::Validation(format!("{} must be an RFC 3339 timestamp", column.field)),
        )?)),
    };
    Ok(value)
}

impl FormPayload {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut payload = Self::default();
        let invalid = |err: axum::extract::multipart::MultipartError| {
            ApiError::Validation(format!("Invalid multipart body: {err}"))
        };

        while let Some(field) = multipart.next_field().await.map_err(invalid)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_some() {
                let bytes = field.bytes().await.map_err(invalid)?;
                // Browsers send an empty part for an untouched file input.
                if bytes.is_empty() {
                    continue;
                }
                payload.files.entry(name).or_default().push(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let text = field.text().await.map_err(invalid)?;
                payload.fields.insert(name, text);
            }
        }

        Ok(payload)
    }

    fn from_json(value: serde_json::Value) -> Result<Self, ApiError> {
        let serde_json::Value::Object(map) = value else {
            return Err(ApiError::Validation(
                "Expected a JSON object body".to_string(),
            ));
        };

        Ok(Self {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, json_to_text(value)))
                .collect(),
            files: HashMap::new(),
        })
    }

    fn from_urlencoded(bytes: &[u8]) -> Self {
        Self {
            fields: url::form_urlencoded::parse(bytes).into_owned().collect(),
            files: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_file(mut self, name: &str, upload: Upload) -> Self {
        self.files.entry(name.to_string()).or_default().push(upload);
        self
    }

    /// Raw field value, if the field was sent at all.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Trimmed field value, `None` when absent or blank.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key) || self.files.contains_key(key)
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(truthy)
    }

    #[must_use]
    pub fn file(&self, key: &str) -> Option<&Upload> {
        self.files.get(key).and_then(|uploads| uploads.first())
    }

    #[must_use]
    pub fn files(&self, key: &str) -> &[Upload] {
        self.files.get(key).map_or(&[], Vec::as_slice)
    }

    /// Fails with every missing key listed when any of `keys` is absent or
    /// blank. A key is satisfied by either a text field or a file.
    pub fn require(&self, keys: &[&str]) -> Result<(), ApiError> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| self.text(key).is_none() && self.file(key).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "Required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Typed assignments for every column of `table` present in the payload,
    /// plus uploaded files and their companion columns. The `slug` column
    /// is left to the caller.
    pub fn assignments(&self, table: &'static Table) -> Result<Vec<Assignment>, ApiError> {
        let companions: HashSet<&str> = table
            .blobs
            .iter()
            .flat_map(|slot| [slot.type_field, slot.name_field])
            .flatten()
            .collect();

        let mut values = Vec::new();
        for column in table.columns {
            if column.field == "slug" || companions.contains(column.field) {
                continue;
            }
            if let Some(raw) = self.get(column.field) {
                values.push(Assignment::column(column, parse_value(column, raw)?));
            }
        }

        for slot in table.blobs {
            let Some(upload) = self.file(slot.field) else {
                continue;
            };
            values.push(Assignment::blob(slot, Some(upload.bytes.clone())));
            if let Some(column) = slot.type_field.and_then(|field| table.column(field)) {
                values.push(Assignment::column(column, Value::Text(upload.media_type())));
            }
            if let Some(column) = slot.name_field.and_then(|field| table.column(field)) {
                values.push(Assignment::column(
                    column,
                    Value::Text(upload.file_name.clone()),
                ));
            }
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{ARTICLES, BOOKS, QUESTIONS};
    use anyhow::Result;
    use axum::body::Body;

    fn value_of<'a>(values: &'a [Assignment], field: &str) -> Option<&'a Value> {
        values
            .iter()
            .find(|assignment| assignment.field == field)
            .map(|assignment| &assignment.value)
    }

    #[test]
    fn require_lists_every_missing_field() {
        let payload = FormPayload::from_pairs([("title", "Eid"), ("topic", "  ")]);
        let result = payload.require(&["title", "topic", "language"]);
        assert!(
            matches!(result, Err(ApiError::Validation(message)) if message == "Required fields: topic, language")
        );
        assert!(payload.require(&["title"]).is_ok());
    }

    #[test]
    fn typed_columns_are_parsed() -> Result<()> {
        let payload = FormPayload::from_pairs([
            ("title", " Eid Mubarak "),
            ("isPublished", "true"),
            ("views", "12"),
            ("date", "2024-04-10"),
            ("translator", ""),
            ("slug", "ignored"),
            ("unknown", "x"),
        ]);
        let values = payload.assignments(&ARTICLES).map_err(|err| anyhow::anyhow!("{err}"))?;

        assert_eq!(
            value_of(&values, "title"),
            Some(&Value::Text(Some("Eid Mubarak".to_string())))
        );
        assert_eq!(value_of(&values, "isPublished"), Some(&Value::Bool(true)));
        assert_eq!(value_of(&values, "views"), Some(&Value::Int(12)));
        assert_eq!(
            value_of(&values, "date"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 4, 10)))
        );
        assert_eq!(value_of(&values, "translator"), Some(&Value::Text(None)));
        assert!(value_of(&values, "slug").is_none());
        assert!(value_of(&values, "unknown").is_none());
        Ok(())
    }

    #[test]
    fn invalid_values_are_validation_errors() {
        let payload = FormPayload::from_pairs([("date", "10/04/2024")]);
        assert!(matches!(
            payload.assignments(&ARTICLES),
            Err(ApiError::Validation(message)) if message.contains("date")
        ));

        let payload = FormPayload::from_pairs([("views", "many")]);
        assert!(payload.assignments(&ARTICLES).is_err());
    }

    #[test]
    fn uploads_fill_companion_columns() -> Result<()> {
        let payload = FormPayload::default()
            .with_file(
                "coverImage",
                Upload {
                    file_name: Some("cover.png".to_string()),
                    content_type: None,
                    bytes: vec![1, 2, 3],
                },
            )
            .with_file(
                "attachment",
                Upload {
                    file_name: Some("book.pdf".to_string()),
                    content_type: Some("application/pdf".to_string()),
                    bytes: vec![4],
                },
            );
        let values = payload.assignments(&BOOKS).map_err(|err| anyhow::anyhow!("{err}"))?;

        assert_eq!(
            value_of(&values, "coverImage"),
            Some(&Value::Bytes(Some(vec![1, 2, 3])))
        );
        assert_eq!(
            value_of(&values, "coverImageType"),
            Some(&Value::Text(Some("image/png".to_string())))
        );
        assert_eq!(
            value_of(&values, "attachmentName"),
            Some(&Value::Text(Some("book.pdf".to_string())))
        );
        Ok(())
    }

    #[test]
    fn companion_columns_cannot_be_set_directly() -> Result<()> {
        let payload = FormPayload::from_pairs([("imageName", "x.jpg"), ("writer", "Ali")]);
        let values = payload
            .assignments(&QUESTIONS)
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        assert!(value_of(&values, "imageName").is_none());
        assert!(value_of(&values, "writer").is_some());
        Ok(())
    }

    #[test]
    fn truthy_values() {
        for raw in ["1", "true", "TRUE", "yes", "y", "on"] {
            assert!(truthy(raw), "{raw}");
        }
        for raw in ["0", "false", "no", "", "published"] {
            assert!(!truthy(raw), "{raw}");
        }
    }

    #[test]
    fn dates_accept_timestamps() {
        assert_eq!(
            parse_date("2024-01-02T10:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(parse_date("not a date"), None);
    }

    #[tokio::test]
    async fn json_bodies_flatten_to_strings() -> Result<()> {
        let request = axum::http::Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"title":"Eid","isPublished":true,"views":3,"tags":["a","b"],"translator":null}"#,
            ))?;
        let payload = FormPayload::from_request(request, &())
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;

        assert_eq!(payload.get("title"), Some("Eid"));
        assert_eq!(payload.get("isPublished"), Some("true"));
        assert_eq!(payload.get("views"), Some("3"));
        assert_eq!(payload.get("tags"), Some("a,b"));
        assert_eq!(payload.get("translator"), Some(""));
        Ok(())
    }

    #[tokio::test]
    async fn urlencoded_bodies() -> Result<()> {
        let request = axum::http::Request::builder()
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("tag=fiqh+%26+usul&x=1"))?;
        let payload = FormPayload::from_request(request, &())
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        assert_eq!(payload.text("tag"), Some("fiqh & usul"));
        Ok(())
    }

    #[tokio::test]
    async fn multipart_bodies_split_fields_and_files() -> Result<()> {
        let body = concat!(
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "Eid\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"eid.jpg\"\r\n",
            "Content-Type: image/jpeg\r\n\r\n",
            "JPEGDATA\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"empty\"; filename=\"\"\r\n",
            "Content-Type: application/octet-stream\r\n\r\n",
            "\r\n",
            "--XYZ--\r\n",
        );
        let request = axum::http::Request::builder()
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))?;
        let payload = FormPayload::from_request(request, &())
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;

        assert_eq!(payload.text("title"), Some("Eid"));
        let image = payload.file("image");
        assert_eq!(image.map(|upload| upload.bytes.as_slice()), Some(&b"JPEGDATA"[..]));
        assert_eq!(
            image.and_then(Upload::media_type).as_deref(),
            Some("image/jpeg")
        );
        assert!(payload.file("empty").is_none());
        Ok(())
    }
}
