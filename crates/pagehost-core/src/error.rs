//! Error types for pagehost

use thiserror::Error;

/// Result type alias using pagehost's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback message when a failed response carries no `error` field
pub const GENERIC_REQUEST_FAILURE: &str = "Request failed";

/// Message shown to the user when the clipboard cannot be written
pub const CLIPBOARD_FAILURE: &str = "Copy failed, please copy the link manually";

/// pagehost error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Project '{0}' not found. Run `pagehost list` to see all projects.")]
    ProjectNotFound(String),

    // Network errors (E100-E199)
    #[error("Network error: {0}. Check that the pagehost server is reachable.")]
    Network(#[from] reqwest::Error),

    /// Non-success status. Displays only the server's reason (or the fallback)
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // Clipboard errors (E300-E399)
    #[error("{}", CLIPBOARD_FAILURE)]
    Clipboard,

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an API error from a status and the optional server-supplied reason
    pub fn api(status: u16, reason: Option<String>) -> Self {
        Self::Api {
            status,
            message: reason.unwrap_or_else(|| GENERIC_REQUEST_FAILURE.to_string()),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) => "E001",
            Self::Network(_) => "E100",
            Self::Api { .. } => "E101",
            Self::InvalidResponse(_) => "E102",
            Self::Clipboard => "E300",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// HTTP status of a failed API call, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ProjectNotFound(_) => Some("pagehost list".to_string()),
            Self::Network(_) => Some("pagehost config get api.base_url".to_string()),
            Self::Api { status: 404, .. } => Some("pagehost list".to_string()),
            Self::ConfigError(_) => Some("pagehost config list".to_string()),
            _ => None,
        }
    }
}
