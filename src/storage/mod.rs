//! Persistence seam for content records.
//!
//! Handlers talk to a [`ContentStore`] and never to SQL directly. The
//! production implementation is [`postgres::PgStore`]; tests run the same
//! handlers against an in-memory store.

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::sync::Arc;

pub use self::schema::{BlobSlot, Column, ColumnType, Table};

/// A record as returned to clients: camelCase keys, JSON values.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Shared handle injected into handlers.
pub type Store = Arc<dyn ContentStore>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{table} has no column {field}")]
    UnknownColumn {
        table: &'static str,
        field: &'static str,
    },
    #[error("{0} has no child table")]
    NoChildren(&'static str),
}

/// Typed column value. `None` variants bind a typed SQL `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(Option<String>),
    Bool(bool),
    Int(i64),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
    Bytes(Option<Vec<u8>>),
}

impl Value {
    /// The JSON form the database projection produces for this value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Text(Some(text)) => Json::String(text.clone()),
            Self::Bool(flag) => Json::Bool(*flag),
            Self::Int(number) => Json::from(*number),
            Self::Date(Some(date)) => Json::String(date.format("%Y-%m-%d").to_string()),
            Self::Timestamp(Some(ts)) => {
                Json::String(ts.to_rfc3339_opts(SecondsFormat::Micros, false))
            }
            Self::Text(None) | Self::Date(None) | Self::Timestamp(None) | Self::Bytes(_) => {
                Json::Null
            }
        }
    }
}

/// One `column = value` pair of an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: &'static str,
    pub sql: &'static str,
    pub value: Value,
}

impl Assignment {
    #[must_use]
    pub const fn column(column: &'static Column, value: Value) -> Self {
        Self {
            field: column.field,
            sql: column.sql,
            value,
        }
    }

    #[must_use]
    pub const fn blob(slot: &'static BlobSlot, bytes: Option<Vec<u8>>) -> Self {
        Self {
            field: slot.field,
            sql: slot.sql,
            value: Value::Bytes(bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Condition {
    Equals(&'static Column, Value),
    /// Case-insensitive substring match.
    Contains(&'static Column, String),
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub conditions: Vec<Condition>,
    pub include_deleted: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, column: &'static Column, value: Value) -> Self {
        self.conditions.push(Condition::Equals(column, value));
        self
    }

    #[must_use]
    pub fn contains(mut self, column: &'static Column, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains(column, needle.into()));
        self
    }

    #[must_use]
    pub const fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub const fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// Stored file plus whatever metadata was recorded with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Round-trips the backing store.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a row and returns its generated id.
    async fn insert(&self, table: &'static Table, values: Vec<Assignment>)
        -> Result<i64, StoreError>;

    /// Inserts a parent row and its child rows atomically.
    async fn insert_with_children(
        &self,
        table: &'static Table,
        values: Vec<Assignment>,
        children: Vec<Vec<Assignment>>,
    ) -> Result<i64, StoreError>;

    /// Lists rows, newest first, with the listed columns only.
    async fn list(&self, table: &'static Table, filter: &ListFilter)
        -> Result<Vec<Record>, StoreError>;

    /// Fetches one live row with every column.
    async fn fetch(&self, table: &'static Table, id: i64) -> Result<Option<Record>, StoreError>;

    /// Updates the supplied columns of a live row and bumps `modifiedOn`.
    /// Returns the affected row count.
    async fn update(
        &self,
        table: &'static Table,
        id: i64,
        values: Vec<Assignment>,
    ) -> Result<u64, StoreError>;

    /// Updates a parent row and atomically replaces all of its child rows.
    async fn update_with_children(
        &self,
        table: &'static Table,
        id: i64,
        values: Vec<Assignment>,
        children: Vec<Vec<Assignment>>,
    ) -> Result<u64, StoreError>;

    /// Soft or hard deletes according to the table's policy.
    async fn remove(&self, table: &'static Table, id: i64) -> Result<u64, StoreError>;

    /// Reads a stored file from a live row.
    async fn blob(
        &self,
        table: &'static Table,
        slot: &'static BlobSlot,
        id: i64,
    ) -> Result<Option<Blob>, StoreError>;

    /// Number of live rows.
    async fn count(&self, table: &'static Table) -> Result<i64, StoreError>;
}
