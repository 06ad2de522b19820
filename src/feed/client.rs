//! Partner feed HTTP client
//!
//! Fetches the partner's client list and normalizes it into external entries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::types::{normalize_clients, FeedResult};
use super::{FeedError, FeedSource};

const DEFAULT_BASE_URL: &str = "https://www.readyaimgo.biz";
const DEFAULT_CLIENTS_PATH: &str = "/api/clients?limit=1000";
const DEFAULT_ACTOR: &str = "readyaimgo";

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub clients_path: String,
    pub api_key: Option<String>,
    /// Recorded as `createdBy`/`updatedBy` on every partner entry.
    pub actor: String,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            clients_path: DEFAULT_CLIENTS_PATH.to_string(),
            api_key: None,
            actor: DEFAULT_ACTOR.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl FeedConfig {
    /// Base URL without trailing slashes joined to the path with exactly one slash.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.clients_path.starts_with('/') {
            format!("{base}{}", self.clients_path)
        } else {
            format!("{base}/{}", self.clients_path)
        }
    }
}

pub struct PartnerFeedClient {
    client: Client,
    config: FeedConfig,
}

impl PartnerFeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create partner feed HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[async_trait]
impl FeedSource for PartnerFeedClient {
    async fn fetch(&self) -> Result<FeedResult, FeedError> {
        let endpoint = self.config.endpoint();
        debug!(endpoint = %endpoint, "fetching partner clients");

        let mut request = self.client.get(&endpoint);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let payload: Value =
            serde_json::from_str(&text).map_err(|e| FeedError::Decode(e.to_string()))?;

        let result = normalize_clients(&payload, &self.config.actor);
        info!(
            total_clients = result.total_clients,
            entries = result.entries.len(),
            skipped_invalid_url = result.skipped_invalid_url,
            "partner feed normalized"
        );
        Ok(result)
    }
}
