//! Server configuration from environment variables.
//!
//!   DIRECTORY_BIND_ADDR          listen address (default: 0.0.0.0:4200)
//!   DIRECTORY_STORE              `firestore` or `memory` (default: firestore)
//!   FIREBASE_PROJECT_ID          required for the firestore store
//!   FIREBASE_API_KEY             identity lookup key (required)
//!   DIRECTORY_COLLECTION         collection name (default: beamWebsiteDirectory)
//!   READYAIMGO_API_BASE_URL      partner feed base (default: https://www.readyaimgo.biz)
//!   READYAIMGO_CLIENTS_ENDPOINT  partner feed path (default: /api/clients?limit=1000)
//!   READYAIMGO_API_KEY           optional partner bearer key
//!   DIRECTORY_RELAXED_ADMIN      treat any verified user as admin (default: false)
//!   DIRECTORY_HTTP_TIMEOUT_SECS  outbound request timeout, at least 1 (default: 30)

use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::feed::FeedConfig;
use crate::identity::{IdentityToolkitConfig, PrivilegePolicy};
use crate::store::FirestoreConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4200";
pub const DEFAULT_COLLECTION: &str = "beamWebsiteDirectory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Firestore,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub bind_addr: String,
    pub store: StoreKind,
    pub project_id: Option<String>,
    pub collection: String,
    pub firebase_api_key: String,
    pub feed: FeedConfig,
    pub policy: PrivilegePolicy,
    pub http_timeout: Duration,
}

impl DirectoryConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let store = match var("DIRECTORY_STORE").as_deref() {
            None | Some("firestore") => StoreKind::Firestore,
            Some("memory") => StoreKind::Memory,
            Some(other) => bail!("DIRECTORY_STORE must be `firestore` or `memory`, got `{other}`"),
        };

        let project_id = var("FIREBASE_PROJECT_ID");
        if store == StoreKind::Firestore && project_id.is_none() {
            bail!("FIREBASE_PROJECT_ID must be set for the firestore store");
        }

        let firebase_api_key =
            var("FIREBASE_API_KEY").ok_or_else(|| anyhow!("FIREBASE_API_KEY must be set"))?;

        let relaxed = match var("DIRECTORY_RELAXED_ADMIN") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("DIRECTORY_RELAXED_ADMIN must be a boolean, got `{raw}`"))?,
            None => false,
        };

        let http_timeout = match var("DIRECTORY_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => bail!("DIRECTORY_HTTP_TIMEOUT_SECS must be a positive whole number, got `{raw}`"),
            },
            None => Duration::from_secs(30),
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            base_url: var("READYAIMGO_API_BASE_URL").unwrap_or(defaults.base_url),
            clients_path: var("READYAIMGO_CLIENTS_ENDPOINT").unwrap_or(defaults.clients_path),
            api_key: var("READYAIMGO_API_KEY"),
            actor: defaults.actor,
            timeout: http_timeout,
        };

        Ok(Self {
            bind_addr: var("DIRECTORY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            store,
            project_id,
            collection: var("DIRECTORY_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            firebase_api_key,
            feed,
            policy: if relaxed {
                PrivilegePolicy::Relaxed
            } else {
                PrivilegePolicy::RequireAdminClaim
            },
            http_timeout,
        })
    }

    pub fn firestore(&self) -> Option<FirestoreConfig> {
        self.project_id.as_ref().map(|project_id| {
            FirestoreConfig::new(project_id.clone(), self.collection.clone())
                .with_timeout(self.http_timeout)
        })
    }

    pub fn identity(&self) -> IdentityToolkitConfig {
        let mut config = IdentityToolkitConfig::new(self.firebase_api_key.clone());
        config.timeout = self.http_timeout;
        config
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
