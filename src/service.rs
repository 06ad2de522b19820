//! Directory read and write paths.
//!
//! Reads fetch the internal list and the partner feed concurrently; a feed
//! failure only empties the external half and is reported as a warning string.
//! Writes validate first, then issue exactly one store commit.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DirectoryError;
use crate::feed::{FeedError, FeedResult, FeedSource};
use crate::merge::{merge, sort_entries, DirectoryView};
use crate::store::DocumentStore;
use crate::types::{
    AdminIdentity, DirectoryEntry, DirectoryInput, DirectoryPatch, SeedStatus, DEFAULT_SEED_ID,
};
use crate::validate::EntryDraft;

/// Public merged view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDirectory {
    pub entries: Vec<DirectoryEntry>,
    pub external_error: Option<String>,
}

/// Admin merged view: inactive rows included, plus feed statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDirectory {
    pub entries: Vec<DirectoryEntry>,
    pub external_error: Option<String>,
    pub total_clients: usize,
    pub skipped_invalid_url: usize,
}

/// Feed preview for admins; `error` replaces a failed fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPreview {
    #[serde(flatten)]
    pub result: FeedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct DirectoryService {
    store: DocumentStore,
    feed: Arc<dyn FeedSource>,
}

impl DirectoryService {
    pub fn new(store: DocumentStore, feed: Arc<dyn FeedSource>) -> Self {
        Self { store, feed }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Fold a feed outcome into (result, warning).
    fn settle_feed(outcome: Result<FeedResult, FeedError>) -> (FeedResult, Option<String>) {
        match outcome {
            Ok(result) => (result, None),
            Err(e) => {
                warn!(error = %e, "partner feed unavailable; serving internal entries only");
                (FeedResult::default(), Some(e.to_string()))
            }
        }
    }

    async fn load_both(
        &self,
    ) -> Result<(Vec<DirectoryEntry>, FeedResult, Option<String>), DirectoryError> {
        let (internal, external) = tokio::join!(self.store.list(), self.feed.fetch());
        let internal = internal?;
        let (external, external_error) = Self::settle_feed(external);
        Ok((internal, external, external_error))
    }

    pub async fn public_directory(&self) -> Result<PublicDirectory, DirectoryError> {
        let (internal, external, external_error) = self.load_both().await?;
        Ok(PublicDirectory {
            entries: merge(internal, external.entries, DirectoryView::Public),
            external_error,
        })
    }

    /// Active internal entries only; the feed is not consulted.
    pub async fn internal_directory(&self) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let mut entries: Vec<DirectoryEntry> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|entry| entry.is_active)
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    pub async fn admin_directory(&self) -> Result<AdminDirectory, DirectoryError> {
        let (internal, external, external_error) = self.load_both().await?;
        Ok(AdminDirectory {
            total_clients: external.total_clients,
            skipped_invalid_url: external.skipped_invalid_url,
            entries: merge(internal, external.entries, DirectoryView::Admin),
            external_error,
        })
    }

    pub async fn external_preview(&self) -> ExternalPreview {
        let (result, error) = Self::settle_feed(self.feed.fetch().await);
        ExternalPreview { result, error }
    }

    /// Validate and persist a new entry under a fresh id.
    pub async fn create(
        &self,
        draft: EntryDraft,
        actor: &AdminIdentity,
    ) -> Result<String, DirectoryError> {
        let input = draft.into_input()?;
        let id = Uuid::new_v4().to_string();
        self.store.create(&id, &input, actor).await?;
        Ok(id)
    }

    pub async fn update(
        &self,
        id: &str,
        draft: EntryDraft,
        actor: &AdminIdentity,
    ) -> Result<(), DirectoryError> {
        let patch: DirectoryPatch = draft.into_patch()?;
        self.store.update(id, &patch, actor).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str, actor: &AdminIdentity) -> Result<(), DirectoryError> {
        self.store.delete(id, actor).await?;
        Ok(())
    }

    /// Write the bootstrap entry.
    pub async fn seed_default(&self, actor: &AdminIdentity) -> Result<SeedStatus, DirectoryError> {
        let status = self
            .store
            .seed(DEFAULT_SEED_ID, &DirectoryInput::default_seed(), actor)
            .await?;
        info!(id = DEFAULT_SEED_ID, ?status, "default entry seeded");
        Ok(status)
    }
}
