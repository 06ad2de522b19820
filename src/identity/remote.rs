//! Identity Toolkit `accounts:lookup` client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{AuthError, IdentityLookup, VerifiedUser};

const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl IdentityToolkitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: IDENTITY_TOOLKIT_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

pub struct IdentityToolkitLookup {
    client: Client,
    config: IdentityToolkitConfig,
}

impl IdentityToolkitLookup {
    pub fn new(config: IdentityToolkitConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create identity HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl IdentityLookup for IdentityToolkitLookup {
    async fn lookup(&self, id_token: &str) -> Result<VerifiedUser, AuthError> {
        let url = format!(
            "{}/accounts:lookup",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "identity lookup rejected token");
            return Err(AuthError::InvalidCredential);
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|_| AuthError::InvalidCredential)?;

        let user = body
            .users
            .into_iter()
            .next()
            .ok_or(AuthError::InvalidCredential)?;
        match user.local_id {
            Some(uid) if !uid.is_empty() => Ok(VerifiedUser {
                uid,
                email: user.email,
            }),
            _ => Err(AuthError::InvalidCredential),
        }
    }
}
