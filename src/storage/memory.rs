//! In-memory stores for handler tests.

use super::{
    schema::{ColumnType, Table},
    Assignment, Blob, BlobSlot, Condition, ContentStore, ListFilter, Record, Store, StoreError,
    Value,
};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value as Json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug)]
struct Row {
    id: i64,
    record: Record,
    blobs: HashMap<&'static str, Vec<u8>>,
    created_on: String,
    modified_on: String,
    deleted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<&'static str, Vec<Row>>,
    next_id: i64,
}

/// Mirrors the Postgres store semantics closely enough for router tests:
/// live-row filtering, newest-first ordering, list projections and blob
/// presence flags.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn default_value(kind: ColumnType) -> Json {
    match kind {
        ColumnType::Bool => Json::Bool(false),
        ColumnType::Int => Json::from(0),
        ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => Json::Null,
    }
}

fn apply(row: &mut Row, values: Vec<Assignment>) {
    for assignment in values {
        match assignment.value {
            Value::Bytes(Some(bytes)) => {
                row.blobs.insert(assignment.field, bytes);
            }
            Value::Bytes(None) => {
                row.blobs.remove(assignment.field);
            }
            value => {
                row.record
                    .insert(assignment.field.to_string(), value.to_json());
            }
        }
    }
}

fn project(table: &Table, row: &Row, full: bool) -> Record {
    let mut out = Record::new();
    out.insert("id".to_string(), Json::from(row.id));
    out.insert("createdOn".to_string(), Json::from(row.created_on.clone()));
    out.insert("modifiedOn".to_string(), Json::from(row.modified_on.clone()));
    if table.is_soft_deleted() {
        out.insert("isDeleted".to_string(), Json::Bool(row.deleted));
    }
    for column in table.columns.iter().filter(|column| full || column.listed) {
        let value = row.record.get(column.field).cloned().unwrap_or(Json::Null);
        out.insert(column.field.to_string(), value);
    }
    for slot in table.blobs {
        out.insert(
            slot.flag.to_string(),
            Json::Bool(row.blobs.contains_key(slot.field)),
        );
    }
    out
}

fn matches(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::Equals(column, value) => {
            row.record.get(column.field).unwrap_or(&Json::Null) == &value.to_json()
        }
        Condition::Contains(column, needle) => row
            .record
            .get(column.field)
            .and_then(Json::as_str)
            .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
    }
}

impl MemoryStore {
    #[must_use]
    pub fn shared() -> Store {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn insert_row(&mut self, table: &'static Table, values: Vec<Assignment>) -> i64 {
        self.next_id += 1;
        let stamp = now();
        let mut row = Row {
            id: self.next_id,
            record: table
                .columns
                .iter()
                .map(|column| (column.field.to_string(), default_value(column.kind)))
                .collect(),
            blobs: HashMap::new(),
            created_on: stamp.clone(),
            modified_on: stamp,
            deleted: false,
        };
        apply(&mut row, values);
        let id = row.id;
        self.tables.entry(table.name).or_default().push(row);
        id
    }

    fn live_row(&mut self, table: &'static Table, id: i64) -> Option<&mut Row> {
        self.tables
            .get_mut(table.name)?
            .iter_mut()
            .find(|row| row.id == id && !row.deleted)
    }

    fn insert_children(
        &mut self,
        table: &'static Table,
        parent_id: i64,
        children: Vec<Vec<Assignment>>,
    ) -> Result<(), StoreError> {
        let link = table
            .children
            .as_ref()
            .ok_or(StoreError::NoChildren(table.name))?;
        let foreign_key =
            link.table
                .column(link.foreign_key)
                .ok_or(StoreError::UnknownColumn {
                    table: link.table.name,
                    field: link.foreign_key,
                })?;
        for mut child in children {
            child.push(Assignment::column(foreign_key, Value::Int(parent_id)));
            self.insert_row(link.table, child);
        }
        Ok(())
    }

    fn drop_children(&mut self, table: &'static Table, parent_id: i64) {
        if let Some(link) = table.children.as_ref() {
            if let Some(rows) = self.tables.get_mut(link.table.name) {
                rows.retain(|row| {
                    row.record.get(link.foreign_key) != Some(&Json::from(parent_id))
                });
            }
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(
        &self,
        table: &'static Table,
        values: Vec<Assignment>,
    ) -> Result<i64, StoreError> {
        Ok(self.lock().insert_row(table, values))
    }

    async fn insert_with_children(
        &self,
        table: &'static Table,
        values: Vec<Assignment>,
        children: Vec<Vec<Assignment>>,
    ) -> Result<i64, StoreError> {
        let mut inner = self.lock();
        let id = inner.insert_row(table, values);
        inner.insert_children(table, id, children)?;
        Ok(id)
    }

    async fn list(
        &self,
        table: &'static Table,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let inner = self.lock();
        let Some(rows) = inner.tables.get(table.name) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<&Row> = rows
            .iter()
            .filter(|row| filter.include_deleted || !row.deleted)
            .filter(|row| {
                filter
                    .conditions
                    .iter()
                    .all(|condition| matches(row, condition))
            })
            .collect();
        selected.sort_by(|a, b| b.id.cmp(&a.id));

        let offset = usize::try_from(filter.offset.unwrap_or(0)).unwrap_or(0);
        let limit = filter
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);

        Ok(selected
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(table, row, false))
            .collect())
    }

    async fn fetch(&self, table: &'static Table, id: i64) -> Result<Option<Record>, StoreError> {
        let mut inner = self.lock();
        Ok(inner.live_row(table, id).map(|row| project(table, row, true)))
    }

    async fn update(
        &self,
        table: &'static Table,
        id: i64,
        values: Vec<Assignment>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let Some(row) = inner.live_row(table, id) else {
            return Ok(0);
        };
        apply(row, values);
        row.modified_on = now();
        Ok(1)
    }

    async fn update_with_children(
        &self,
        table: &'static Table,
        id: i64,
        values: Vec<Assignment>,
        children: Vec<Vec<Assignment>>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let Some(row) = inner.live_row(table, id) else {
            return Ok(0);
        };
        apply(row, values);
        row.modified_on = now();
        inner.drop_children(table, id);
        inner.insert_children(table, id, children)?;
        Ok(1)
    }

    async fn remove(&self, table: &'static Table, id: i64) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        if table.is_soft_deleted() {
            let Some(row) = inner.live_row(table, id) else {
                return Ok(0);
            };
            row.deleted = true;
            row.modified_on = now();
            return Ok(1);
        }

        let Some(rows) = inner.tables.get_mut(table.name) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Ok(0);
        }
        inner.drop_children(table, id);
        Ok(1)
    }

    async fn blob(
        &self,
        table: &'static Table,
        slot: &'static BlobSlot,
        id: i64,
    ) -> Result<Option<Blob>, StoreError> {
        let mut inner = self.lock();
        let Some(row) = inner.live_row(table, id) else {
            return Ok(None);
        };
        let companion = |field: Option<&'static str>| {
            field
                .and_then(|field| row.record.get(field))
                .and_then(Json::as_str)
                .map(str::to_string)
        };
        Ok(row.blobs.get(slot.field).map(|bytes| Blob {
            bytes: bytes.clone(),
            content_type: companion(slot.type_field),
            file_name: companion(slot.name_field),
        }))
    }

    async fn count(&self, table: &'static Table) -> Result<i64, StoreError> {
        let inner = self.lock();
        let live = inner
            .tables
            .get(table.name)
            .map_or(0, |rows| rows.iter().filter(|row| !row.deleted).count());
        Ok(i64::try_from(live).unwrap_or(i64::MAX))
    }
}

/// Store whose every call fails like an unreachable database.
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    #[must_use]
    pub fn shared() -> Store {
        Arc::new(Self)
    }
}

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Database(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl ContentStore for FailingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        unavailable()
    }

    async fn insert(&self, _: &'static Table, _: Vec<Assignment>) -> Result<i64, StoreError> {
        unavailable()
    }

    async fn insert_with_children(
        &self,
        _: &'static Table,
        _: Vec<Assignment>,
        _: Vec<Vec<Assignment>>,
    ) -> Result<i64, StoreError> {
        unavailable()
    }

    async fn list(&self, _: &'static Table, _: &ListFilter) -> Result<Vec<Record>, StoreError> {
        unavailable()
    }

    async fn fetch(&self, _: &'static Table, _: i64) -> Result<Option<Record>, StoreError> {
        unavailable()
    }

    async fn update(
        &self,
        _: &'static Table,
        _: i64,
        _: Vec<Assignment>,
    ) -> Result<u64, StoreError> {
        unavailable()
    }

    async fn update_with_children(
        &self,
        _: &'static Table,
        _: i64,
        _: Vec<Assignment>,
        _: Vec<Vec<Assignment>>,
    ) -> Result<u64, StoreError> {
        unavailable()
    }

    async fn remove(&self, _: &'static Table, _: i64) -> Result<u64, StoreError> {
        unavailable()
    }

    async fn blob(
        &self,
        _: &'static Table,
        _: &'static BlobSlot,
        _: i64,
    ) -> Result<Option<Blob>, StoreError> {
        unavailable()
    }

    async fn count(&self, _: &'static Table) -> Result<i64, StoreError> {
        unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{GALLERIES, GALLERY_IMAGES, TAGS, TOPICS};

    fn text(table: &'static Table, field: &str, value: &str) -> Assignment {
        let column = table.column(field).unwrap();
        Assignment::column(column, Value::Text(Some(value.to_string())))
    }

    #[tokio::test]
    async fn soft_delete_hides_rows_except_admin_listing() {
        let store = MemoryStore::default();
        let id = store.insert(&TAGS, vec![text(&TAGS, "tag", "fiqh")]).await.unwrap();
        assert_eq!(store.remove(&TAGS, id).await.unwrap(), 1);
        assert_eq!(store.remove(&TAGS, id).await.unwrap(), 0);

        assert!(store.fetch(&TAGS, id).await.unwrap().is_none());
        assert!(store.list(&TAGS, &ListFilter::new()).await.unwrap().is_empty());
        let all = store
            .list(&TAGS, &ListFilter::new().with_deleted())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["isDeleted"], Json::Bool(true));
        assert_eq!(store.count(&TAGS).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blobs_and_flags() {
        let store = MemoryStore::default();
        let slot = TOPICS.blob("image").unwrap();
        let id = store
            .insert(
                &TOPICS,
                vec![
                    text(&TOPICS, "topic", "Salah"),
                    text(&TOPICS, "imageType", "image/png"),
                    Assignment::blob(slot, Some(vec![1, 2, 3])),
                ],
            )
            .await
            .unwrap();

        let record = store.fetch(&TOPICS, id).await.unwrap().unwrap();
        assert_eq!(record["hasImage"], Json::Bool(true));

        let blob = store.blob(&TOPICS, slot, id).await.unwrap().unwrap();
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.content_type.as_deref(), Some("image/png"));

        store
            .update(&TOPICS, id, vec![Assignment::blob(slot, None)])
            .await
            .unwrap();
        assert!(store.blob(&TOPICS, slot, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn children_are_replaced_and_cascade() {
        let store = MemoryStore::default();
        let image = |name: &str| vec![text(&GALLERY_IMAGES, "imageName", name)];
        let id = store
            .insert_with_children(
                &GALLERIES,
                vec![text(&GALLERIES, "title", "Eid")],
                vec![image("a.jpg"), image("b.jpg")],
            )
            .await
            .unwrap();

        let fk = GALLERY_IMAGES.column("galleryId").unwrap();
        let filter = ListFilter::new().equals(fk, Value::Int(id));
        assert_eq!(store.list(&GALLERY_IMAGES, &filter).await.unwrap().len(), 2);

        store
            .update_with_children(&GALLERIES, id, vec![], vec![image("c.jpg")])
            .await
            .unwrap();
        let images = store.list(&GALLERY_IMAGES, &filter).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["imageName"], Json::from("c.jpg"));

        assert_eq!(store.remove(&GALLERIES, id).await.unwrap(), 1);
        assert!(store.list(&GALLERY_IMAGES, &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_store_reports_database_errors() {
        let store = FailingStore;
        assert!(matches!(
            store.ping().await,
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        ));
    }
}
