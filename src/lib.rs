//! Website directory service.
//!
//! Curated entries live in a document collection and are edited by admins
//! holding a verified `admin` claim. Public reads merge them with entries
//! adapted from the partner client feed.

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod identity;
pub mod merge;
pub mod preview;
pub mod service;
pub mod store;
pub mod types;
pub mod validate;

pub use error::DirectoryError;
pub use service::DirectoryService;
pub use types::{DirectoryEntry, EntrySource};
