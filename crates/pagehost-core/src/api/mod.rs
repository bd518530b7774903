//! pagehost REST API
//!
//! This module provides:
//! - The [`ProjectApi`] trait the stores are written against
//! - A reqwest implementation, [`ApiClient`]
//! - Wire types for projects, uploads, toggles and deletions
//! - API base URL selection

mod base;
mod client;
mod types;

pub use base::{DEFAULT_API_BASE, normalize_api_base, resolve_api_base};
pub use client::{ApiClient, ApiClientBuilder, ProjectApi};
pub use types::{
    ApiResponse, DeleteResponse, Project, ToggleResponse, UploadForm, UploadResponse,
};
