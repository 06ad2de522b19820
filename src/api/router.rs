//! Router construction for the directory server.

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, patch, post},
    Extension, Router,
};

use crate::api::auth::admin_auth;
use crate::api::error::method_not_allowed;
use crate::api::handlers;
use crate::identity::IdentityVerifier;
use crate::service::DirectoryService;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<DirectoryService>, verifier: Arc<IdentityVerifier>) -> Router {
    // Routes that require an admin bearer token. The static `seed` and
    // `external` segments take precedence over `:id`, so neither is a usable
    // entry id.
    let admin = Router::new()
        .route(
            "/admin/website-directory",
            get(handlers::admin::list_entries)
                .post(handlers::admin::create_entry)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/website-directory/seed",
            post(handlers::admin::seed_default).fallback(method_not_allowed),
        )
        .route(
            "/admin/website-directory/external",
            get(handlers::admin::external_preview).fallback(method_not_allowed),
        )
        .route(
            "/admin/website-directory/:id",
            patch(handlers::admin::update_entry)
                .delete(handlers::admin::delete_entry)
                .fallback(method_not_allowed),
        )
        .layer(axum_mw::from_fn(admin_auth))
        .layer(Extension(verifier));

    // Public routes (no auth)
    let public = Router::new()
        .route(
            "/health",
            get(handlers::health::health).fallback(method_not_allowed),
        )
        .route(
            "/website-directory",
            get(handlers::public::directory).fallback(method_not_allowed),
        )
        .route(
            "/website-directory/internal",
            get(handlers::public::internal_directory).fallback(method_not_allowed),
        );

    public.merge(admin).layer(Extension(service))
}
