use super::{
    schema::Table, Assignment, Blob, BlobSlot, Condition, ContentStore, ListFilter, Record,
    StoreError, Value,
};
use async_trait::async_trait;
use sqlx::{types::Json, Connection, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info_span, Instrument, Span};

/// `ContentStore` backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_span(operation: &'static str, table: &'static Table) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.sql.table = table.name
    )
}

/// `jsonb_build_object(...)` expression producing the record for one row.
/// Bodies (`listed = false`) are only part of `full` projections.
fn projection(table: &Table, full: bool) -> String {
    let mut pairs = vec![
        "'id', t.id".to_string(),
        "'createdOn', t.created_on".to_string(),
        "'modifiedOn', t.modified_on".to_string(),
    ];
    if table.is_soft_deleted() {
        pairs.push("'isDeleted', t.is_deleted".to_string());
    }
    for column in table.columns.iter().filter(|column| full || column.listed) {
        pairs.push(format!("'{}', t.{}", column.field, column.sql));
    }
    for slot in table.blobs {
        pairs.push(format!("'{}', t.{} IS NOT NULL", slot.flag, slot.sql));
    }
    format!("jsonb_build_object({})", pairs.join(", "))
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Text(text) => builder.push_bind(text),
        Value::Bool(flag) => builder.push_bind(flag),
        Value::Int(number) => builder.push_bind(number),
        Value::Date(date) => builder.push_bind(date),
        Value::Timestamp(ts) => builder.push_bind(ts),
        Value::Bytes(bytes) => builder.push_bind(bytes),
    };
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn live_clause(table: &Table) -> &'static str {
    if table.is_soft_deleted() {
        " AND is_deleted = false"
    } else {
        ""
    }
}

async fn insert_row(
    conn: &mut PgConnection,
    table: &'static Table,
    values: Vec<Assignment>,
) -> Result<i64, StoreError> {
    if values.is_empty() {
        let sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING id", table.name);
        let id = sqlx::query_scalar::<_, i64>(&sql).fetch_one(conn).await?;
        return Ok(id);
    }

    let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", table.name));
    let columns: Vec<&str> = values.iter().map(|assignment| assignment.sql).collect();
    builder.push(columns.join(", "));
    builder.push(") VALUES (");
    for (index, assignment) in values.into_iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, assignment.value);
    }
    builder.push(") RETURNING id");

    let id = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(id)
}

async fn update_row(
    conn: &mut PgConnection,
    table: &'static Table,
    id: i64,
    values: Vec<Assignment>,
) -> Result<u64, StoreError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", table.name));
    for assignment in values {
        builder.push(assignment.sql);
        builder.push(" = ");
        push_value(&mut builder, assignment.value);
        builder.push(", ");
    }
    builder.push("modified_on = now() WHERE id = ");
    builder.push_bind(id);
    builder.push(live_clause(table));

    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

async fn insert_children(
    conn: &mut PgConnection,
    table: &'static Table,
    parent_id: i64,
    children: Vec<Vec<Assignment>>,
) -> Result<(), StoreError> {
    let link = table
        .children
        .as_ref()
        .ok_or(StoreError::NoChildren(table.name))?;
    let foreign_key = link
        .table
        .column(link.foreign_key)
        .ok_or(StoreError::UnknownColumn {
            table: link.table.name,
            field: link.foreign_key,
        })?;

    for mut child in children {
        child.push(Assignment::column(foreign_key, Value::Int(parent_id)));
        insert_row(&mut *conn, link.table, child).await?;
    }
    Ok(())
}

#[async_trait]
impl ContentStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }

    async fn insert(
        &self,
        table: &'static Table,
        values: Vec<Assignment>,
    ) -> Result<i64, StoreError> {
        async {
            let mut conn = self.pool.acquire().await?;
            insert_row(&mut *conn, table, values).await
        }
        .instrument(db_span("INSERT", table))
        .await
    }

    async fn insert_with_children(
        &self,
        table: &'static Table,
        values: Vec<Assignment>,
        children: Vec<Vec<Assignment>>,
    ) -> Result<i64, StoreError> {
        async {
            let mut tx = self.pool.begin().await?;
            let id = insert_row(&mut *tx, table, values).await?;
            insert_children(&mut *tx, table, id, children).await?;
            tx.commit().await?;
            Ok::<_, StoreError>(id)
        }
        .instrument(db_span("INSERT", table))
        .await
    }

    async fn list(
        &self,
        table: &'static Table,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} t WHERE true",
            projection(table, false),
            table.name
        ));
        if table.is_soft_deleted() && !filter.include_deleted {
            builder.push(" AND t.is_deleted = false");
        }
        for condition in &filter.conditions {
            match condition {
                Condition::Equals(column, value) => {
                    builder.push(format!(" AND t.{} = ", column.sql));
                    push_value(&mut builder, value.clone());
                }
                Condition::Contains(column, needle) => {
                    builder.push(format!(" AND t.{} ILIKE ", column.sql));
                    builder.push_bind(format!("%{}%", escape_like(needle)));
                }
            }
        }
        builder.push(" ORDER BY t.created_on DESC, t.id DESC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }

        let rows = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", table))
            .await?;

        Ok(rows.into_iter().map(|Json(record)| record).collect())
    }

    async fn fetch(&self, table: &'static Table, id: i64) -> Result<Option<Record>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} t WHERE t.id = $1{}",
            projection(table, true),
            table.name,
            live_clause(table)
        );

        let row = sqlx::query_scalar::<_, Json<Record>>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", table))
            .await?;

        Ok(row.map(|Json(record)| record))
    }

    async fn update(
        &self,
        table: &'static Table,
        id: i64,
        values: Vec<Assignment>,
    ) -> Result<u64, StoreError> {
        async {
            let mut conn = self.pool.acquire().await?;
            update_row(&mut *conn, table, id, values).await
        }
        .instrument(db_span("UPDATE", table))
        .await
    }

    async fn update_with_children(
        &self,
        table: &'static Table,
        id: i64,
        values: Vec<Assignment>,
        children: Vec<Vec<Assignment>>,
    ) -> Result<u64, StoreError> {
        async {
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

            let mut tx = self.pool.begin().await?;
            let affected = update_row(&mut *tx, table, id, values).await?;
            if affected == 0 {
                // nothing to replace; dropping the transaction rolls back
                return Ok(0);
            }

            let sql = format!(
                "DELETE FROM {} WHERE {} = $1",
                link.table.name, foreign_key.sql
            );
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
            insert_children(&mut *tx, table, id, children).await?;
            tx.commit().await?;
            Ok::<_, StoreError>(affected)
        }
        .instrument(db_span("UPDATE", table))
        .await
    }

    async fn remove(&self, table: &'static Table, id: i64) -> Result<u64, StoreError> {
        let sql = if table.is_soft_deleted() {
            format!(
                "UPDATE {} SET is_deleted = true, modified_on = now() WHERE id = $1 AND is_deleted = false",
                table.name
            )
        } else {
            format!("DELETE FROM {} WHERE id = $1", table.name)
        };

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("DELETE", table))
            .await?;

        Ok(result.rows_affected())
    }

    async fn blob(
        &self,
        table: &'static Table,
        slot: &'static BlobSlot,
        id: i64,
    ) -> Result<Option<Blob>, StoreError> {
        let companion = |field: Option<&'static str>| {
            field
                .and_then(|field| table.column(field))
                .map_or_else(|| "NULL::text".to_string(), |column| column.sql.to_string())
        };
        let sql = format!(
            "SELECT {}, {}, {} FROM {} WHERE id = $1{}",
            slot.sql,
            companion(slot.type_field),
            companion(slot.name_field),
            table.name,
            live_clause(table)
        );

        let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>, Option<String>)>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", table))
            .await?;

        Ok(row.and_then(|(bytes, content_type, file_name)| {
            bytes.map(|bytes| Blob {
                bytes,
                content_type,
                file_name,
            })
        }))
    }

    async fn count(&self, table: &'static Table) -> Result<i64, StoreError> {
        let sql = if table.is_soft_deleted() {
            format!("SELECT COUNT(*) FROM {} WHERE is_deleted = false", table.name)
        } else {
            format!("SELECT COUNT(*) FROM {}", table.name)
        };

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .instrument(db_span("SELECT", table))
            .await?;

        Ok(count)
    }
}
