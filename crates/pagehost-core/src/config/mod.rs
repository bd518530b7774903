//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{normalize_api_base, resolve_api_base};
use crate::format::Locale;
use crate::store::ClearPolicy;

/// Environment variable overriding the API base for one process
pub const API_BASE_ENV: &str = "PAGEHOST_API_BASE";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "PAGEHOST_CONFIG_DIR";

/// pagehost configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub message: MessageConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Explicit API base; wins over `origin`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Origin the client is served from, used to derive the API base
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Auto-clear delay; zero or negative keeps messages until replaced
    pub duration_ms: i64,
    pub clear_policy: ClearPolicy,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            clear_policy: ClearPolicy::CancelPrevious,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub locale: Locale,
}

impl ApiConfig {
    /// Pick the API base: env override, then `base_url`, then `origin`
    pub fn resolved_base(&self) -> anyhow::Result<String> {
        self.resolved_base_with(env::var(API_BASE_ENV).ok().as_deref())
    }

    /// Resolve with an explicit env override; a blank override is ignored
    pub fn resolved_base_with(&self, env_base: Option<&str>) -> anyhow::Result<String> {
        if let Some(base) = env_base.filter(|b| !b.trim().is_empty()) {
            return normalize_api_base(base)
                .with_context(|| format!("Invalid {} value", API_BASE_ENV));
        }

        if let Some(base) = &self.base_url {
            return Ok(normalize_api_base(base)?);
        }

        Ok(resolve_api_base(self.origin.as_deref())?)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("pagehost")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(base) = &self.api.base_url {
            normalize_api_base(base)?;
        }
        if let Some(origin) = &self.api.origin {
            resolve_api_base(Some(origin))?;
        }
        Ok(())
    }

    /// API base for this process, see [`ApiConfig::resolved_base`]
    pub fn resolved_api_base(&self) -> anyhow::Result<String> {
        self.api.resolved_base()
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "api.base_url" => Ok(self
                .api
                .base_url
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),
            "api.origin" => Ok(self
                .api
                .origin
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),

            "message.duration_ms" => Ok(self.message.duration_ms.to_string()),
            "message.clear_policy" => Ok(self.message.clear_policy.as_str().to_string()),

            "display.locale" => Ok(self.display.locale.as_str().to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `pagehost config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key. An empty value unsets optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "api.base_url" => {
                self.api.base_url = if value.is_empty() {
                    None
                } else {
                    Some(normalize_api_base(value)?)
                };
            }
            "api.origin" => {
                self.api.origin = if value.is_empty() {
                    None
                } else {
                    resolve_api_base(Some(value))?;
                    Some(value.to_string())
                };
            }

            "message.duration_ms" => {
                self.message.duration_ms = value
                    .parse()
                    .with_context(|| format!("Invalid duration_ms value: {}", value))?;
            }
            "message.clear_policy" => {
                self.message.clear_policy = value.parse().map_err(|e: String| anyhow!(e))?;
            }

            "display.locale" => {
                self.display.locale = value.parse().map_err(|e: String| anyhow!(e))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `pagehost config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "api.base_url",
            "api.origin",
            "message.duration_ms",
            "message.clear_policy",
            "display.locale",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
