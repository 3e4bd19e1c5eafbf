/// Session configuration.
///
/// Every field has a default, so an empty JSON object (or no file at all)
/// yields the stock behaviour.
use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Number of listing rows shown before "show more" is needed.
pub const DEFAULT_DISPLAY_LIMIT: usize = 200;

/// Rows added by each "show more".
pub const DEFAULT_DISPLAY_STEP: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub display_limit: usize,
    pub display_step: usize,
    pub cache_capacity: usize,
    /// `None` waits forever for a backend response.
    pub request_timeout_secs: Option<u64>,
    /// Re-issues of a timed-out size request before giving up.
    pub max_retries: u32,
    /// Each retry waits this many times longer than the previous attempt.
    pub retry_backoff_factor: u32,
    pub max_notices: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_limit: DEFAULT_DISPLAY_LIMIT,
            display_step: DEFAULT_DISPLAY_STEP,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            request_timeout_secs: Some(300),
            max_retries: 2,
            retry_backoff_factor: 2,
            max_notices: 16,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
