//! Canonical directory types shared by the internal store and the partner feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document id of the bootstrap entry written by the seed operation.
pub const DEFAULT_SEED_ID: &str = "beam-home-site";

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Internal,
    External,
}

/// One website listing, internal or external.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: String,
    pub label: String,
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub preview_image_url: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_by: String,
    pub updated_by: String,
    pub source: EntrySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A validated, trimmed full field set for create and seed.
///
/// An empty `preview_image_url` means "derive from `url`"; the store resolves
/// it when the entry is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInput {
    pub label: String,
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub preview_image_url: String,
    pub sort_order: i64,
    pub is_active: bool,
}

impl DirectoryInput {
    /// Defaults written by `POST /admin/website-directory/seed`.
    pub fn default_seed() -> Self {
        Self {
            label: "BEAM Home Site".to_string(),
            title: "BEAM Home Site".to_string(),
            subtitle: "Explore the primary BEAM platform and ecosystem updates.".to_string(),
            url: "https://beamthinktank.space".to_string(),
            preview_image_url: String::new(),
            sort_order: 0,
            is_active: true,
        }
    }
}

/// A validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryPatch {
    pub label: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub preview_image_url: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

impl DirectoryPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<DirectoryInput> for DirectoryPatch {
    fn from(input: DirectoryInput) -> Self {
        Self {
            label: Some(input.label),
            title: Some(input.title),
            subtitle: Some(input.subtitle),
            url: Some(input.url),
            preview_image_url: Some(input.preview_image_url),
            sort_order: Some(input.sort_order),
            is_active: Some(input.is_active),
        }
    }
}

/// Which branch a seed call executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedStatus {
    Created,
    Updated,
}

/// The authenticated caller of an admin operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub uid: String,
    pub email: Option<String>,
    /// The verified bearer token, forwarded to backends that authorize per caller.
    pub id_token: String,
}

impl AdminIdentity {
    /// Actor recorded in `createdBy`/`updatedBy`: email when known, else uid.
    pub fn actor(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.uid)
    }
}
