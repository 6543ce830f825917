//! Dispatcher configuration
//!
//! | Key / Env | Default | Description |
//! |-----------|---------|-------------|
//! | `event_naming` / `LEX_EVENT_NAMING` | `plain` | `plain`, `stage_suffixed` or `both` |
//! | `routes` | `[]` | Handler sets mapping event names to library function names |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::errors::ConfigError;
use crate::routing::EventNaming;

/// Environment variable overriding the naming policy
pub const EVENT_NAMING_ENV: &str = "LEX_EVENT_NAMING";

/// Configuration for building dispatchers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// How `execute()` derives event names
    #[serde(default)]
    pub event_naming: EventNaming,
    /// Routing tables for `Dispatcher::register_routes`
    #[serde(default)]
    pub routes: Vec<Value>,
}

impl DispatchConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Defaults, with the naming policy taken from `LEX_EVENT_NAMING` if set
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from the environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(EVENT_NAMING_ENV) {
            self.event_naming = value.parse()?;
        }
        Ok(())
    }
}
