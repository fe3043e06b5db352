use super::{list, Document};
use crate::{
    api::error::{ApiError, ErrorBody},
    storage::{schema::by_resource, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    Json,
};
use tracing::instrument;

/// Administrative listing. The only read path that returns soft-deleted rows.
#[utoipa::path(
    get,
    path = "/api/admin/content/{resource}",
    params(("resource" = String, Path, description = "Resource name, e.g. `articles`")),
    responses(
        (status = 200, description = "Every row, soft-deleted ones included", body = [Document]),
        (status = 404, description = "Unknown resource", body = ErrorBody),
    ),
    tag = "admin"
)]
#[instrument(skip(store))]
pub async fn list_content(
    store: Extension<Store>,
    Path(resource): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let table = by_resource(&resource)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown resource: {resource}")))?;
    let rows = list(&store, table, &ListFilter::new().with_deleted()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}
