//! Loader configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid loader configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("concatenation is enabled but `concat_endpoint` is empty")]
    EmptyConcatEndpoint,
}

/// Settings shared by every print pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Prefix for relative sources.
    pub base_url: String,

    /// Version appended to handles registered without an explicit one.
    pub default_version: Option<String>,

    /// Merge adjacent blocking handles into bundle requests.
    pub concatenate: bool,

    /// Source prefixes that may be bundled. Empty allows every relative source.
    pub default_dirs: Vec<String>,

    /// URL bundles are requested from.
    pub concat_endpoint: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_version: None,
            concatenate: false,
            default_dirs: Vec::new(),
            concat_endpoint: "/load-scripts.php".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that parse but cannot work together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concatenate && self.concat_endpoint.is_empty() {
            return Err(ConfigError::EmptyConcatEndpoint);
        }
        Ok(())
    }
}
