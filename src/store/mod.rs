//! Internal directory records.
//!
//! Every mutation is expressed as a list of [`Write`]s that the backend applies
//! as one atomic commit: either all writes land or none do. Existence
//! preconditions give optimistic concurrency against create/delete races;
//! field-level races resolve last-write-wins in the backend.

pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreBackend, FirestoreConfig};
pub use memory::MemoryBackend;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::preview::{resolve_preview_url, screenshot_url};
use crate::types::{
    AdminIdentity, DirectoryEntry, DirectoryInput, DirectoryPatch, EntrySource, SeedStatus,
};

/// Field names of a stored directory document.
pub mod field {
    pub const LABEL: &str = "label";
    pub const TITLE: &str = "title";
    pub const SUBTITLE: &str = "subtitle";
    pub const URL: &str = "url";
    pub const PREVIEW_IMAGE_URL: &str = "previewImageUrl";
    pub const SORT_ORDER: &str = "sortOrder";
    pub const IS_ACTIVE: &str = "isActive";
    pub const CREATED_BY: &str = "createdBy";
    pub const UPDATED_BY: &str = "updatedBy";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("document backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("document backend response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid document URL: {0}")]
    InvalidUrl(String),
}

/// A typed document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

pub type Fields = BTreeMap<String, FieldValue>;

/// Write-time existence assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The document must already exist.
    Exists,
    /// The document must not exist yet.
    Missing,
}

/// Values computed by the backend at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerValue {
    RequestTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTransform {
    pub field_path: String,
    pub value: ServerValue,
}

impl FieldTransform {
    pub fn request_time(field_path: &str) -> Self {
        Self {
            field_path: field_path.to_string(),
            value: ServerValue::RequestTime,
        }
    }
}

/// One element of an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Set fields. Without a mask the document is replaced; with a mask only
    /// the listed paths change.
    Update {
        id: String,
        fields: Fields,
        mask: Option<Vec<String>>,
        precondition: Option<Precondition>,
    },
    Transform {
        id: String,
        transforms: Vec<FieldTransform>,
    },
    Delete {
        id: String,
        precondition: Option<Precondition>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

/// Backend holding the directory collection.
///
/// `credential` is the caller's bearer token for backends that authorize each
/// request as the signed-in admin; reads on the public path pass `None`.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Apply every write or none of them.
    async fn commit(&self, writes: Vec<Write>, credential: Option<&str>) -> Result<(), StoreError>;

    async fn get(
        &self,
        id: &str,
        credential: Option<&str>,
    ) -> Result<Option<StoredDocument>, StoreError>;

    async fn list(&self) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Directory operations on top of a [`DocumentBackend`].
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn DocumentBackend>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Write a new entry. Fails with [`StoreError::AlreadyExists`] if `id` is taken.
    pub async fn create(
        &self,
        id: &str,
        input: &DirectoryInput,
        actor: &AdminIdentity,
    ) -> Result<(), StoreError> {
        let mut fields = full_fields(input, actor.actor());
        fields.insert(
            field::CREATED_BY.to_string(),
            FieldValue::String(actor.actor().to_string()),
        );

        let writes = vec![
            Write::Update {
                id: id.to_string(),
                fields,
                mask: None,
                precondition: Some(Precondition::Missing),
            },
            Write::Transform {
                id: id.to_string(),
                transforms: vec![
                    FieldTransform::request_time(field::CREATED_AT),
                    FieldTransform::request_time(field::UPDATED_AT),
                ],
            },
        ];
        self.backend.commit(writes, Some(&actor.id_token)).await?;
        info!(id, actor = actor.actor(), "directory entry created");
        Ok(())
    }

    /// Write only the supplied fields of an existing entry. Fails with
    /// [`StoreError::NotFound`] if `id` is absent.
    pub async fn update(
        &self,
        id: &str,
        patch: &DirectoryPatch,
        actor: &AdminIdentity,
    ) -> Result<(), StoreError> {
        let fields = patch_fields(patch, actor.actor());
        let mask = fields.keys().cloned().collect();

        let writes = vec![
            Write::Update {
                id: id.to_string(),
                fields,
                mask: Some(mask),
                precondition: Some(Precondition::Exists),
            },
            Write::Transform {
                id: id.to_string(),
                transforms: vec![FieldTransform::request_time(field::UPDATED_AT)],
            },
        ];
        self.backend.commit(writes, Some(&actor.id_token)).await?;
        info!(id, actor = actor.actor(), "directory entry updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str, actor: &AdminIdentity) -> Result<(), StoreError> {
        let writes = vec![Write::Delete {
            id: id.to_string(),
            precondition: Some(Precondition::Exists),
        }];
        self.backend.commit(writes, Some(&actor.id_token)).await?;
        info!(id, actor = actor.actor(), "directory entry deleted");
        Ok(())
    }

    /// Create the entry if absent, otherwise overwrite it with `input`.
    ///
    /// The read and the write are separate round trips. Two racing seeds can
    /// both observe "absent"; the loser then fails its create precondition and
    /// the entry still ends up holding `input`.
    pub async fn seed(
        &self,
        id: &str,
        input: &DirectoryInput,
        actor: &AdminIdentity,
    ) -> Result<SeedStatus, StoreError> {
        let existing = self.backend.get(id, Some(&actor.id_token)).await?;
        debug!(id, exists = existing.is_some(), "seed lookup");
        match existing {
            None => {
                self.create(id, input, actor).await?;
                Ok(SeedStatus::Created)
            }
            Some(_) => {
                self.update(id, &DirectoryPatch::from(input.clone()), actor)
                    .await?;
                Ok(SeedStatus::Updated)
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<DirectoryEntry>, StoreError> {
        Ok(self.backend.get(id, None).await?.map(entry_from_document))
    }

    /// Every internal entry, active or not, in backend order.
    pub async fn list(&self) -> Result<Vec<DirectoryEntry>, StoreError> {
        let documents = self.backend.list().await?;
        Ok(documents.into_iter().map(entry_from_document).collect())
    }
}

fn full_fields(input: &DirectoryInput, actor: &str) -> Fields {
    let preview = resolve_preview_url(&input.url, Some(&input.preview_image_url));
    Fields::from([
        (field::LABEL.to_string(), FieldValue::String(input.label.clone())),
        (field::TITLE.to_string(), FieldValue::String(input.title.clone())),
        (
            field::SUBTITLE.to_string(),
            FieldValue::String(input.subtitle.clone()),
        ),
        (field::URL.to_string(), FieldValue::String(input.url.clone())),
        (
            field::PREVIEW_IMAGE_URL.to_string(),
            FieldValue::String(preview),
        ),
        (
            field::SORT_ORDER.to_string(),
            FieldValue::Integer(input.sort_order),
        ),
        (
            field::IS_ACTIVE.to_string(),
            FieldValue::Boolean(input.is_active),
        ),
        (
            field::UPDATED_BY.to_string(),
            FieldValue::String(actor.to_string()),
        ),
    ])
}

fn patch_fields(patch: &DirectoryPatch, actor: &str) -> Fields {
    let mut fields = Fields::new();
    let mut set_string = |name: &str, value: &Option<String>| {
        if let Some(value) = value {
            fields.insert(name.to_string(), FieldValue::String(value.clone()));
        }
    };
    set_string(field::LABEL, &patch.label);
    set_string(field::TITLE, &patch.title);
    set_string(field::SUBTITLE, &patch.subtitle);
    set_string(field::URL, &patch.url);

    // A new url re-derives the preview unless an override comes with it. A bare
    // override is stored as given; an empty one is derived again on read.
    match (&patch.url, &patch.preview_image_url) {
        (Some(url), preview) => {
            fields.insert(
                field::PREVIEW_IMAGE_URL.to_string(),
                FieldValue::String(resolve_preview_url(url, preview.as_deref())),
            );
        }
        (None, Some(preview)) => {
            fields.insert(
                field::PREVIEW_IMAGE_URL.to_string(),
                FieldValue::String(preview.clone()),
            );
        }
        (None, None) => {}
    }

    if let Some(sort_order) = patch.sort_order {
        fields.insert(
            field::SORT_ORDER.to_string(),
            FieldValue::Integer(sort_order),
        );
    }
    if let Some(is_active) = patch.is_active {
        fields.insert(field::IS_ACTIVE.to_string(), FieldValue::Boolean(is_active));
    }
    fields.insert(
        field::UPDATED_BY.to_string(),
        FieldValue::String(actor.to_string()),
    );
    fields
}

fn read_string(fields: &Fields, name: &str) -> String {
    match fields.get(name) {
        Some(FieldValue::String(value)) => value.clone(),
        _ => String::new(),
    }
}

fn read_integer(fields: &Fields, name: &str) -> i64 {
    match fields.get(name) {
        Some(FieldValue::Integer(value)) => *value,
        _ => 0,
    }
}

fn read_boolean(fields: &Fields, name: &str) -> bool {
    matches!(fields.get(name), Some(FieldValue::Boolean(true)))
}

fn read_timestamp(fields: &Fields, name: &str) -> Option<DateTime<Utc>> {
    match fields.get(name) {
        Some(FieldValue::Timestamp(value)) => Some(*value),
        _ => None,
    }
}

/// Project a stored document onto the canonical entry shape.
pub fn entry_from_document(document: StoredDocument) -> DirectoryEntry {
    let fields = &document.fields;
    let url = read_string(fields, field::URL);
    let stored_preview = read_string(fields, field::PREVIEW_IMAGE_URL);
    let preview_image_url = if stored_preview.is_empty() {
        screenshot_url(&url)
    } else {
        stored_preview
    };

    DirectoryEntry {
        label: read_string(fields, field::LABEL),
        title: read_string(fields, field::TITLE),
        subtitle: read_string(fields, field::SUBTITLE),
        preview_image_url,
        sort_order: read_integer(fields, field::SORT_ORDER),
        is_active: read_boolean(fields, field::IS_ACTIVE),
        created_by: read_string(fields, field::CREATED_BY),
        updated_by: read_string(fields, field::UPDATED_BY),
        created_at: read_timestamp(fields, field::CREATED_AT),
        updated_at: read_timestamp(fields, field::UPDATED_AT),
        source: EntrySource::Internal,
        url,
        id: document.id,
    }
}
