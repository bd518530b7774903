//! API base URL selection

use reqwest::Url;

use crate::error::{Error, Result};

/// Backend address used during local development
pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api";

/// Host name treated as local development
const LOCAL_HOST: &str = "localhost";

/// Pick the API base for the origin the client is served from.
///
/// Deployed origins reach the backend through the reverse proxy at `/api`;
/// a missing or `localhost` origin talks to the backend directly.
pub fn resolve_api_base(origin: Option<&str>) -> Result<String> {
    let Some(origin) = origin.map(str::trim).filter(|o| !o.is_empty()) else {
        return Ok(DEFAULT_API_BASE.to_string());
    };

    let url = Url::parse(origin)
        .map_err(|e| Error::InvalidInput(format!("Invalid origin '{}': {}", origin, e)))?;

    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidInput(format!("Origin '{}' has no host", origin)))?;

    if host == LOCAL_HOST {
        return Ok(DEFAULT_API_BASE.to_string());
    }

    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(format!("{}://{}/api", url.scheme(), authority))
}

/// Normalize a configured base: must be http(s), trailing slash removed
pub fn normalize_api_base(base: &str) -> Result<String> {
    let trimmed = base.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("Invalid API base URL '{}': {}", base, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(Error::InvalidInput(format!(
            "API base URL must use http or https, got '{}'",
            other
        ))),
    }
}
