//! Admin authentication.
//!
//! A bearer token is accepted when the remote identity service resolves it to
//! a user. The remote lookup is the only trust boundary: the `admin` claim is
//! read from the token payload without checking its signature, which is safe
//! only because a forged token never survives the lookup.

pub mod claims;
pub mod remote;

pub use claims::{decode_payload, PrivilegeClaims};
pub use remote::{IdentityToolkitConfig, IdentityToolkitLookup};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::AdminIdentity;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Bearer token")]
    MissingCredential,

    #[error("Invalid ID token")]
    InvalidCredential,

    #[error("Admin privileges are required")]
    InsufficientPrivilege,

    #[error("Identity service unavailable: {0}")]
    Upstream(String),
}

/// A user the identity service vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Remote credential check.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Resolve `id_token` to its user. Rejected or unknown tokens are
    /// [`AuthError::InvalidCredential`].
    async fn lookup(&self, id_token: &str) -> Result<VerifiedUser, AuthError>;
}

/// How the `admin` claim is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivilegePolicy {
    /// The token payload must carry `"admin": true`.
    #[default]
    RequireAdminClaim,
    /// Any verified user is treated as an admin. Development only.
    Relaxed,
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredential)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

pub struct IdentityVerifier {
    lookup: Arc<dyn IdentityLookup>,
    policy: PrivilegePolicy,
}

impl IdentityVerifier {
    pub fn new(lookup: Arc<dyn IdentityLookup>, policy: PrivilegePolicy) -> Self {
        if policy == PrivilegePolicy::Relaxed {
            warn!("relaxed admin policy enabled: every verified identity is treated as an admin");
        }
        Self { lookup, policy }
    }

    pub fn policy(&self) -> PrivilegePolicy {
        self.policy
    }

    /// Authenticate an `Authorization` header and enforce admin privilege.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<AdminIdentity, AuthError> {
        let token = bearer_token(header)?;
        let user = self.lookup.lookup(token).await?;

        let claimed_admin = decode_payload(token)
            .map(|claims| claims.is_admin())
            .unwrap_or(false);

        match (claimed_admin, self.policy) {
            (true, _) => {}
            (false, PrivilegePolicy::Relaxed) => {
                warn!(uid = %user.uid, "granting admin without admin claim (relaxed policy)");
            }
            (false, PrivilegePolicy::RequireAdminClaim) => {
                debug!(uid = %user.uid, "admin claim missing");
                return Err(AuthError::InsufficientPrivilege);
            }
        }

        Ok(AdminIdentity {
            uid: user.uid,
            email: user.email,
            id_token: token.to_string(),
        })
    }
}
