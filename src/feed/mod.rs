//! Partner feed integration
//!
//! This module provides:
//! - Envelope and record normalization for the partner's client list
//! - An HTTP client that fetches the list and normalizes it into directory entries
//! - The [`FeedSource`] seam the read path depends on

pub mod client;
pub mod types;

pub use client::{FeedConfig, PartnerFeedClient};
pub use types::{normalize_clients, ClientEnvelope, FeedResult};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to fetch partner clients ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to reach partner feed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse partner clients response: {0}")]
    Decode(String),
}

/// Anything that can produce the external half of the directory.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedResult, FeedError>;
}
