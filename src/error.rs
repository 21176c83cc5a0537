// ⚠️ Error Types - configuration and preference persistence failures
// Per-file problems are statuses on ClassificationResult, never errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the merged rule configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config document is not valid JSON or has the wrong shape.
    #[error("failed to parse config {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Every rule in `filename_patterns` was rejected (or none were given).
    #[error("no usable filename patterns after loading configuration")]
    EmptyCatalog,
}

/// Errors from the durable combo preference store.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid preferences JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single rule definition was rejected at catalog load time.
///
/// Rejections are logged and the rest of the catalog loads normally.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule #{index}: not a valid rule object: {source}")]
    Shape {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("rule #{index}: missing required field 'name'")]
    MissingName { index: usize },

    #[error("rule '{name}': missing required field 'priority'")]
    MissingPriority { name: String },

    #[error("rule '{name}': duplicate rule name")]
    DuplicateName { name: String },

    #[error("rule '{name}': delimiter must not be empty")]
    EmptyDelimiter { name: String },

    #[error("rule '{name}': unrecognized field '{field}'")]
    UnknownField { name: String, field: String },

    #[error("rule '{name}': unrecognized position '{value}'")]
    UnknownPosition { name: String, value: String },

    #[error("rule '{name}': unrecognized match_type '{value}'")]
    UnknownMatchType { name: String, value: String },

    #[error("rule '{name}': field '{field}' has neither position nor match_type")]
    MissingLocator { name: String, field: String },

    #[error("rule '{name}': variant #{index} has no prefix")]
    VariantWithoutPrefix { name: String, index: usize },
}
