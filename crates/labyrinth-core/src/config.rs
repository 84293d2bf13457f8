//! Mapper configuration
//!
//! Settings are loaded from, in increasing precedence:
//! - Default values
//! - A JSON configuration file
//! - Environment variables (`LABYRINTH_*`)
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Diagnostics switches for mapping compilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Log every compiled plan at debug level
    pub log_plans: bool,

    /// Log auto-map fields without a target match at debug instead of trace
    pub report_skipped_fields: bool,

    /// Warn when more than one rule writes the same target field
    pub warn_on_overrides: bool,
}

impl MapperConfig {
    /// Parse configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration {
            message: format!("Invalid mapper configuration: {}", e),
            source: Some(e.into()),
        })
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Configuration {
            message: format!("Failed to read {}", path.display()),
            source: Some(e.into()),
        })?;
        Self::from_json_str(&content)
    }

    /// Apply `LABYRINTH_*` environment overrides
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    fn merge_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let switches: [(&str, &mut bool); 3] = [
            ("LABYRINTH_LOG_PLANS", &mut self.log_plans),
            ("LABYRINTH_REPORT_SKIPPED_FIELDS", &mut self.report_skipped_fields),
            ("LABYRINTH_WARN_ON_OVERRIDES", &mut self.warn_on_overrides),
        ];

        for (key, slot) in switches {
            let Some(raw) = lookup(key) else { continue };
            match parse_switch(&raw) {
                Some(value) => *slot = value,
                None => log::warn!("Invalid value for {}: {}, keeping {}", key, raw, slot),
            }
        }
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_quiet() {
        let config = MapperConfig::default();
        assert!(!config.log_plans);
        assert!(!config.report_skipped_fields);
        assert!(!config.warn_on_overrides);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapperConfig::from_json_str(r#"{ "warn_on_overrides": true }"#).unwrap();
        assert!(config.warn_on_overrides);
        assert!(!config.log_plans);
    }

    #[test]
    fn test_invalid_json_is_a_configuration_error() {
        let err = MapperConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Configuration { source: Some(_), .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "log_plans": true, "report_skipped_fields": true }}"#).unwrap();

        let config = MapperConfig::from_file(file.path()).unwrap();
        assert!(config.log_plans);
        assert!(config.report_skipped_fields);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MapperConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LABYRINTH_LOG_PLANS", "yes"),
            ("LABYRINTH_WARN_ON_OVERRIDES", "maybe"),
        ]
        .into_iter()
        .collect();

        let mut config = MapperConfig {
            warn_on_overrides: true,
            ..Default::default()
        };
        config.merge_with(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.log_plans);
        // Unparseable values leave the previous setting alone.
        assert!(config.warn_on_overrides);
        assert!(!config.report_skipped_fields);
    }
}
