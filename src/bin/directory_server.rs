//! directory_server: REST server for the website directory.
//!
//! See [`site_directory::config`] for the environment variables it reads.

use std::sync::Arc;

use anyhow::{Context, Result};
use site_directory::api::build_router;
use site_directory::config::{DirectoryConfig, StoreKind};
use site_directory::feed::{FeedSource, PartnerFeedClient};
use site_directory::identity::{IdentityLookup, IdentityToolkitLookup, IdentityVerifier};
use site_directory::store::{DocumentBackend, DocumentStore, FirestoreBackend, MemoryBackend};
use site_directory::DirectoryService;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,site_directory=debug".into()),
        )
        .init();

    let config = DirectoryConfig::from_env()?;

    let backend: Arc<dyn DocumentBackend> = match config.store {
        StoreKind::Firestore => {
            let firestore = config
                .firestore()
                .context("FIREBASE_PROJECT_ID must be set for the firestore store")?;
            tracing::info!(
                project = %firestore.project_id,
                collection = %firestore.collection,
                "Using Firestore document store"
            );
            Arc::new(FirestoreBackend::new(firestore)?)
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory document store; entries are lost on restart");
            Arc::new(MemoryBackend::new())
        }
    };

    let feed_client = PartnerFeedClient::new(config.feed.clone())?;
    tracing::info!(
        endpoint = %feed_client.config().endpoint(),
        "Partner feed configured"
    );
    let feed: Arc<dyn FeedSource> = Arc::new(feed_client);

    let lookup: Arc<dyn IdentityLookup> = Arc::new(IdentityToolkitLookup::new(config.identity())?);
    let verifier = Arc::new(IdentityVerifier::new(lookup, config.policy));
    tracing::info!(policy = ?verifier.policy(), "Admin privilege policy");

    let service = Arc::new(DirectoryService::new(DocumentStore::new(backend), feed));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(service, verifier)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("directory_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
