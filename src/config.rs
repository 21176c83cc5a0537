// ⚙️ Rule Configuration - embedded defaults + optional user overrides
// Top-level keys from the user file replace the default keys wholesale

use crate::aliases::{AliasTable, RemappingTable};
use crate::catalog::PatternCatalog;
use crate::error::ConfigError;
use crate::normalize::Normalizer;
use crate::rules::RuleEngine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Built-in configuration shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default_rules.json");

/// One alias or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasList {
    One(String),
    Many(Vec<String>),
}

impl AliasList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            AliasList::One(alias) => vec![alias.clone()],
            AliasList::Many(aliases) => aliases.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Canonical printer → aliases
    #[serde(default)]
    pub printer_names: BTreeMap<String, AliasList>,

    /// Canonical brand → aliases
    #[serde(default)]
    pub brand_name_mappings: BTreeMap<String, AliasList>,

    /// Extra brand names recognised as-is
    #[serde(default)]
    pub paper_brands: Vec<String>,

    /// Canonical printer → canonical printer
    #[serde(default)]
    pub printer_remappings: BTreeMap<String, String>,

    /// Raw rule entries; validated one by one when the catalog is built
    #[serde(default)]
    pub filename_patterns: Vec<Value>,
}

impl RuleConfig {
    /// The embedded default configuration.
    pub fn defaults() -> Self {
        RuleConfig::from_json(DEFAULT_CONFIG, "built-in defaults")
            .expect("embedded default configuration is valid JSON")
    }

    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Defaults, overridden key by key by the user file when it exists.
    pub fn load(user_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = parse_object(DEFAULT_CONFIG, "built-in defaults")?;

        match user_path {
            Some(path) if path.exists() => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let user = parse_object(&text, &path.display().to_string())?;
                let keys: Vec<&str> = user.keys().map(String::as_str).collect();
                info!(path = %path.display(), overridden = ?keys, "applying user configuration");
                merge_top_level(&mut merged, user);
            }
            Some(path) => info!(path = %path.display(), "no user configuration; using defaults"),
            None => {}
        }

        serde_json::from_value(Value::Object(merged)).map_err(|source| ConfigError::Parse {
            origin: "merged configuration".to_string(),
            source,
        })
    }

    /// Build the immutable tables and the catalog.
    ///
    /// Malformed rules are dropped with a warning; no usable rule at all is
    /// an error.
    pub fn build_engine(&self) -> Result<RuleEngine, ConfigError> {
        let printers = AliasTable::new(
            self.printer_names
                .iter()
                .map(|(canonical, aliases)| (canonical.clone(), aliases.to_vec())),
        );
        let brands = AliasTable::new(
            self.brand_name_mappings
                .iter()
                .map(|(canonical, aliases)| (canonical.clone(), aliases.to_vec())),
        );
        let remappings = RemappingTable::new(self.printer_remappings.clone());

        let (catalog, _rejected) = PatternCatalog::from_values(&self.filename_patterns);
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        info!(
            printers = printers.len(),
            brands = brands.len(),
            remappings = remappings.len(),
            rules = catalog.len(),
            "rule configuration ready"
        );

        let normalizer = Normalizer::new(printers, brands, self.paper_brands.clone(), remappings);
        Ok(RuleEngine::new(catalog, normalizer))
    }
}

fn parse_object(text: &str, origin: &str) -> Result<Map<String, Value>, ConfigError> {
    serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// A null user value means "not set" and keeps the default.
fn merge_top_level(base: &mut Map<String, Value>, user: Map<String, Value>) {
    for (key, value) in user {
        if !value.is_null() {
            base.insert(key, value);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn user_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_build() {
        let config = RuleConfig::defaults();
        assert_eq!(config.filename_patterns.len(), 6);
        assert_eq!(config.printer_remappings.get("Epson P700").map(String::as_str), Some("Epson P900"));

        let engine = config.build_engine().unwrap();
        let names: Vec<&str> = engine.catalog().rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "moab_profiles",
                "epson_sc_files",
                "hfa_profiles",
                "cifa_profiles",
                "red_river_profiles",
                "fallback_printer_detection"
            ]
        );
    }

    #[test]
    fn test_missing_user_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuleConfig::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, RuleConfig::defaults());
    }

    #[test]
    fn test_user_keys_replace_defaults_wholesale() {
        let file = user_file(
            r#"{
                "printer_names": {"Canon PRO-1000": ["PRO-1000", "pro1000"]},
                "paper_brands": null
            }"#,
        );
        let config = RuleConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.printer_names.len(), 1);
        assert!(config.printer_names.contains_key("Canon PRO-1000"));
        // untouched keys keep their defaults
        assert_eq!(config.paper_brands, vec!["Moab", "Canson", "Hahnemuehle"]);
        assert_eq!(config.filename_patterns.len(), 6);
    }

    #[test]
    fn test_single_alias_string_accepted() {
        let config = RuleConfig::from_json(
            r#"{"brand_name_mappings": {"Ilford": "ILF"}, "filename_patterns": []}"#,
            "test",
        )
        .unwrap();
        assert_eq!(config.brand_name_mappings["Ilford"].to_vec(), vec!["ILF"]);
    }

    #[test]
    fn test_invalid_user_file() {
        let file = user_file("printer_names: [");
        assert!(matches!(RuleConfig::load(Some(file.path())), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_all_rules_rejected_is_empty_catalog() {
        let config = RuleConfig::from_json(
            r#"{"filename_patterns": [{"name": "no_priority", "prefix": "X"}]}"#,
            "test",
        )
        .unwrap();
        assert!(matches!(config.build_engine(), Err(ConfigError::EmptyCatalog)));
    }
}
