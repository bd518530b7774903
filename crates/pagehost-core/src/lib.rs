//! pagehost Core Library
//!
//! This crate provides the client side of the pagehost project hosting
//! service:
//! - REST API client (list, upload, toggle, delete)
//! - Observable project list and message stores
//! - Date, URL and clipboard helpers
//! - Configuration and error types

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod store;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{ApiClient, Project, ProjectApi};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::store::{MessageKind, MessageStore, ProjectStore, ProjectsState};
}
