//! Admin directory handlers. All routes sit behind [`crate::api::auth::admin_auth`].
//!
//! GET    /admin/website-directory           merged view incl. inactive rows
//! POST   /admin/website-directory           create entry
//! PATCH  /admin/website-directory/:id       update supplied fields
//! DELETE /admin/website-directory/:id       delete entry
//! POST   /admin/website-directory/seed      create or refresh the default entry
//! GET    /admin/website-directory/external  partner feed preview

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::error::AppError;
use crate::error::DirectoryError;
use crate::service::{AdminDirectory, DirectoryService, ExternalPreview};
use crate::types::AdminIdentity;
use crate::validate::EntryDraft;

pub async fn list_entries(
    Extension(service): Extension<Arc<DirectoryService>>,
) -> Result<Json<AdminDirectory>, AppError> {
    Ok(Json(service.admin_directory().await?))
}

pub async fn create_entry(
    Extension(identity): Extension<AdminIdentity>,
    Extension(service): Extension<Arc<DirectoryService>>,
    body: Result<Json<EntryDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(draft) = body.map_err(DirectoryError::from)?;
    let id = service.create(draft, &identity).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update_entry(
    Extension(identity): Extension<AdminIdentity>,
    Extension(service): Extension<Arc<DirectoryService>>,
    Path(id): Path<String>,
    body: Result<Json<EntryDraft>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    if id.trim().is_empty() {
        return Err(DirectoryError::validation("Missing document id").into());
    }
    let Json(draft) = body.map_err(DirectoryError::from)?;
    service.update(&id, draft, &identity).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn delete_entry(
    Extension(identity): Extension<AdminIdentity>,
    Extension(service): Extension<Arc<DirectoryService>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if id.trim().is_empty() {
        return Err(DirectoryError::validation("Missing document id").into());
    }
    service.delete(&id, &identity).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn seed_default(
    Extension(identity): Extension<AdminIdentity>,
    Extension(service): Extension<Arc<DirectoryService>>,
) -> Result<Json<Value>, AppError> {
    let status = service.seed_default(&identity).await?;
    Ok(Json(json!({ "status": status })))
}

/// Feed failures stay 200 with an `error` field.
pub async fn external_preview(
    Extension(service): Extension<Arc<DirectoryService>>,
) -> Json<ExternalPreview> {
    Json(service.external_preview().await)
}
