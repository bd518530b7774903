//! Request and response types for the pagehost REST API
//!
//! Field names follow the server's camelCase JSON.

use serde::{Deserialize, Serialize};

/// A hosted project as returned by `GET /projects`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    /// URL-safe unique key used in project URLs
    pub slug: String,
    pub name: String,
    /// File served at the project root
    pub entry_point: String,
    pub is_active: bool,
    /// Server timestamp string, see [`crate::format::format_date`]
    pub uploaded_at: String,
}

/// Generic response envelope
///
/// Failed responses carry their reason in `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    /// Extract the `error` field from an arbitrary JSON body
    pub fn error_from(body: &serde_json::Value) -> Option<String> {
        body.get("error")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Response to `POST /upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub message: String,
    pub url: String,
}

/// Response to `PATCH /projects/{slug}/toggle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub message: String,
    /// State after the toggle
    pub is_active: bool,
}

/// Response to `DELETE /projects/{slug}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Multipart payload for `POST /upload`
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Display name; the server derives one from the file when absent
    pub name: Option<String>,
}

impl UploadForm {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read an archive from disk, keeping its file name
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                crate::Error::InvalidInput(format!("'{}' is not a file path", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }

    pub(crate) fn into_multipart(self) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(self.bytes).file_name(self.file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        match self.name {
            Some(name) => form.text("name", name),
            None => form,
        }
    }
}
