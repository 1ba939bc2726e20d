// Codeplug configuration

use crate::core::DEFAULT_MAX_PASSES;
use serde::{Deserialize, Serialize};

/// Tunables for loading, storing and saving a codeplug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeplugConfig {
    /// Cap on deferred-reference resolution passes
    pub max_resolve_passes: usize,

    /// Refuse to save while `valid()` reports warnings
    pub block_save_on_warnings: bool,

    /// Byte for record slots without loaded contents, unless the record type sets its own
    pub fill_new_records: u8,
}

impl Default for CodeplugConfig {
    fn default() -> Self {
        Self {
            max_resolve_passes: DEFAULT_MAX_PASSES,
            block_save_on_warnings: false,
            fill_new_records: 0xFF,
        }
    }
}

impl CodeplugConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_resolve_passes(mut self, passes: usize) -> Self {
        self.max_resolve_passes = passes;
        self
    }

    /// Make warnings block `save()`
    pub fn with_block_save_on_warnings(mut self, block: bool) -> Self {
        self.block_save_on_warnings = block;
        self
    }

    pub fn with_fill(mut self, fill: u8) -> Self {
        self.fill_new_records = fill;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodeplugConfig::default();
        assert_eq!(config.max_resolve_passes, 10);
        assert!(!config.block_save_on_warnings);
        assert_eq!(config.fill_new_records, 0xFF);
    }

    #[test]
    fn test_json_fills_missing_keys() {
        let config = CodeplugConfig::from_json(r#"{"block_save_on_warnings": true}"#).unwrap();
        assert_eq!(config, CodeplugConfig::new().with_block_save_on_warnings(true));

        let json = config.with_max_resolve_passes(3).to_json().unwrap();
        assert_eq!(CodeplugConfig::from_json(&json).unwrap().max_resolve_passes, 3);
    }
}
