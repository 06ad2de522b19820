//! Error taxonomy for the directory service.
//!
//! Each component owns a `thiserror` enum; [`DirectoryError`] gathers them and
//! maps every variant onto the HTTP status the API boundary reports. Partner
//! feed errors are absent: reads fold them into a warning string.

use thiserror::Error;

use crate::identity::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// One message per failed field rule, in rule order.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl DirectoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Auth(AuthError::Upstream(_)) => 500,
            Self::Auth(_) => 403,
            Self::Store(StoreError::NotFound(_)) => 404,
            Self::Store(StoreError::AlreadyExists(_)) => 409,
            Self::Store(_) => 500,
            Self::MethodNotAllowed => 405,
        }
    }
}
