//! Unauthenticated directory reads.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use crate::api::error::AppError;
use crate::service::{DirectoryService, PublicDirectory};

/// Merged, active-only view. Partner feed problems surface as `externalError`.
pub async fn directory(
    Extension(service): Extension<Arc<DirectoryService>>,
) -> Result<Json<PublicDirectory>, AppError> {
    Ok(Json(service.public_directory().await?))
}

pub async fn internal_directory(
    Extension(service): Extension<Arc<DirectoryService>>,
) -> Result<Json<Value>, AppError> {
    let entries = service.internal_directory().await?;
    Ok(Json(json!({ "entries": entries })))
}
