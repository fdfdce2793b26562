//! Library configuration

use crate::error::{BulkError, Result};
use serde::{Deserialize, Serialize};

/// Configuration shared by every collection a `Bulker` builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkerConfig {
    /// Methods whose calls are recorded and replayed on elements added later
    pub shareable_methods: Vec<String>,
    /// Prefix of the property that marks event support (`on` + `click`)
    pub event_property_prefix: String,
}

impl Default for BulkerConfig {
    fn default() -> Self {
        Self {
            shareable_methods: vec!["addEventListener".to_string()],
            event_property_prefix: "on".to_string(),
        }
    }
}

impl BulkerConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| BulkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_property_prefix.is_empty() {
            return Err(BulkError::Config(
                "event_property_prefix must not be empty".to_string(),
            ));
        }
        if self.shareable_methods.iter().any(|m| m.is_empty()) {
            return Err(BulkError::Config(
                "shareable method names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_shareable(&self, method: &str) -> bool {
        self.shareable_methods.iter().any(|m| m == method)
    }

    /// Property whose presence means the element supports `event`
    pub fn event_property(&self, event: &str) -> String {
        format!("{}{}", self.event_property_prefix, event)
    }
}
