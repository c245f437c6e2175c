//! Document configuration.

use crate::debounce::DEFAULT_QUIESCENCE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Name given to documents that are not backed by a file.
pub const DEFAULT_DOCUMENT_NAME: &str = "Untitled";

/// Errors produced while loading a [`DocumentConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration JSON could not be parsed.
    #[error("invalid document config: {0}")]
    Json(#[from] serde_json::Error),

    /// A quiescence interval of zero would reload on every keystroke.
    #[error("quiescence interval must be greater than zero")]
    ZeroQuiescence,
}

/// Tunables shared by every document a host opens.
///
/// Missing fields fall back to their defaults when deserializing:
///
/// ```rust
/// use document_core::DocumentConfig;
///
/// let config = DocumentConfig::from_json_str(r#"{ "quiescence_ms": 250 }"#).unwrap();
/// assert_eq!(config.quiescence().as_millis(), 250);
/// assert_eq!(config.default_name, "Untitled");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Delay between accepting a reload trigger and running the load step, in milliseconds.
    pub quiescence_ms: u64,
    /// Name of a document before it is associated with a file.
    pub default_name: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            quiescence_ms: DEFAULT_QUIESCENCE.as_millis() as u64,
            default_name: DEFAULT_DOCUMENT_NAME.to_string(),
        }
    }
}

impl DocumentConfig {
    /// Parse and validate a JSON configuration blob.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the reload pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quiescence_ms == 0 {
            return Err(ConfigError::ZeroQuiescence);
        }
        Ok(())
    }

    /// The quiescence interval.
    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }

    /// Set the quiescence interval (rounded down to whole milliseconds).
    pub fn with_quiescence(mut self, quiescence: Duration) -> Self {
        self.quiescence_ms = u64::try_from(quiescence.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the name used for documents without a file.
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }
}
