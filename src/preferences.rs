// 💾 Preference Store - combo key → chosen printer, durable across runs
// Flat JSON object on disk, rewritten after every new answer

use crate::error::PreferenceError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default preferences filename, placed next to the profiles being sorted.
pub const DEFAULT_PREFERENCES_FILE: &str = ".profile_preferences.json";

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Durable mapping from combo key to canonical printer.
pub trait PreferenceStore {
    fn get(&self, combo_key: &str) -> Option<String>;

    /// Insert and persist a new answer.
    ///
    /// The in-memory entry is kept even when persisting fails.
    fn record(&mut self, combo_key: &str, printer: &str) -> Result<(), PreferenceError>;

    /// Snapshot of every entry
    fn entries(&self) -> BTreeMap<String, String>;

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Non-persistent store, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    entries: BTreeMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, combo_key: impl Into<String>, printer: impl Into<String>) -> Self {
        self.entries.insert(combo_key.into(), printer.into());
        self
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, combo_key: &str) -> Option<String> {
        self.entries.get(combo_key).cloned()
    }

    fn record(&mut self, combo_key: &str, printer: &str) -> Result<(), PreferenceError> {
        self.entries.insert(combo_key.to_string(), printer.to_string());
        Ok(())
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonPreferenceStore {
    /// Open the store, falling back to an empty one if the file cannot be
    /// read or parsed (every combo will then be asked again).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_open(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!("{}; starting with empty preferences", e);
                JsonPreferenceStore {
                    path,
                    entries: BTreeMap::new(),
                }
            }
        }
    }

    /// Open the store, reporting read and parse failures. A missing file is
    /// an empty store.
    pub fn try_open(path: &Path) -> Result<Self, PreferenceError> {
        let entries: BTreeMap<String, String> = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| PreferenceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), entries = entries.len(), "loaded printer preferences");
        Ok(JsonPreferenceStore {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file, retrying once on failure.
    pub fn flush(&self) -> Result<(), PreferenceError> {
        match self.write_file() {
            Ok(()) => Ok(()),
            Err(first) => {
                debug!("retrying preference write after: {}", first);
                self.write_file()
            }
        }
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn write_file(&self) -> Result<(), PreferenceError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let write_err = |source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, combo_key: &str) -> Option<String> {
        self.entries.get(combo_key).cloned()
    }

    fn record(&mut self, combo_key: &str, printer: &str) -> Result<(), PreferenceError> {
        self.entries.insert(combo_key.to_string(), printer.to_string());
        self.flush()
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
