//! Configuration-related functionality for flexboard.

use std::path::Path;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{load_from_file, Error};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// flexboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the server we fetch the dataset from.
    pub server_url: String,
    pub request_timeout_secs: u64,
    /// Glob patterns matching view definition files.
    pub views: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            views: vec![
                "views/*.yml".to_string(),
                "views/*.json".to_string(),
                "views/*.toml".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from the given JSON, YAML or TOML file. If the
    /// file doesn't exist, the default configuration is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "No such configuration file, using defaults: {}",
                path.display()
            );
            return Ok(Self::default());
        }
        let value = load_from_file(path)
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        let config = serde_json::from_value(value)
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Convenience method for overriding a single configuration parameter.
    pub fn with<K, V>(self, key: K, value: V) -> Result<Self>
    where
        K: AsRef<str>,
        V: Serialize,
    {
        let key = key.as_ref();
        let mut fields = serde_json::to_value(&self)?;
        match fields.get_mut(key) {
            Some(field) => *field = serde_json::to_value(value)?,
            None => {
                return Err(
                    Error::InvalidConfig(key.to_string(), "unknown parameter".to_string()).into(),
                )
            }
        }
        serde_json::from_value(fields)
            .map_err(|e| Error::InvalidConfig(key.to_string(), e.to_string()).into())
    }
}
