//! HTTP surface: admin and public directory routes.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;

pub use router::build_router;
