//! Client configuration
//!
//! Values come from (highest first) command-line flags and environment
//! variables handled by the binary, then `config.toml` in the platform
//! config directory, then the defaults below.

use crate::error::CoreError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir
pub const APP_DIR: &str = "bookkeep";

/// Upper bound on the refresh margin; access tokens live well under a day
pub const MAX_REFRESH_MARGIN: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the authenticated client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://books.example.com/api`
    pub base_url: String,

    /// Per-call timeout (a timeout is a transport failure, not an auth failure)
    pub request_timeout: Duration,

    /// Access tokens expiring within this window are refreshed before use
    pub refresh_margin: Duration,

    /// Session file; `None` keeps tokens in memory only
    pub session_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout: Duration::from_secs(30),
            refresh_margin: Duration::from_secs(300),
            session_path: default_session_path(),
        }
    }
}

impl ClientConfig {
    /// Apply a parsed config file on top of the defaults
    pub fn from_file(file: ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            base_url: file.api_base.unwrap_or(defaults.base_url),
            request_timeout: file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            refresh_margin: file
                .refresh_margin_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_margin),
            session_path: file.session_file.or(defaults.session_path),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_session_path(mut self, path: Option<PathBuf>) -> Self {
        self.session_path = path;
        self
    }

    /// Reject configurations the client cannot work with
    pub fn validate(&self) -> Result<(), CoreError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "API base URL is not set (use --api-base or BOOKKEEP_API_BASE)"
                    .to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::InvalidConfig {
                message: format!("API base URL must start with http:// or https://: {base}"),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        if self.refresh_margin > MAX_REFRESH_MARGIN {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "refresh margin of {}s exceeds the {}s limit",
                    self.refresh_margin.as_secs(),
                    MAX_REFRESH_MARGIN.as_secs()
                ),
            });
        }
        Ok(())
    }

    /// Absolute URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    pub fn refresh_margin_secs(&self) -> i64 {
        i64::try_from(self.refresh_margin.as_secs()).unwrap_or(i64::MAX)
    }
}

/// On-disk `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub refresh_margin_secs: Option<u64>,
    pub session_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Load from `path`; a missing file yields the empty config
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// `<config_dir>/bookkeep/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }
}

/// `<config_dir>/bookkeep/session.json`
pub fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("session.json"))
}
