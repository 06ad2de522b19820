//! Admin bearer-token middleware.
//!
//! Runs the [`IdentityVerifier`] before any admin handler and stores the
//! resulting [`AdminIdentity`] as a request extension. Requests that fail
//! never reach a handler, so no write is attempted for them.

use std::sync::Arc;

use axum::extract::{Extension, Request};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::AppError;
use crate::identity::IdentityVerifier;

pub async fn admin_auth(
    Extension(verifier): Extension<Arc<IdentityVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Owned: no borrow of the request may live across the lookup await.
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let identity = verifier
        .authenticate(header.as_deref())
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, path = %request.uri().path(), "admin auth rejected");
            e
        })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
