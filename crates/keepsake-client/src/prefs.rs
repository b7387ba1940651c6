// SPDX-License-Identifier: Apache-2.0

//! Client-local preferences persisted in a small key/value store.
//!
//! Each preference owns one key and reads tolerantly: a missing or corrupt
//! value yields the preference's defaults instead of an error.

use crate::error::{ClientError, ClientErrorCode};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub const THEME_KEY: &str = "keepsake-theme";
pub const FILTER_LABELS_KEY: &str = "keepsake-filter-labels";
pub const HIDDEN_DEFAULTS_KEY: &str = "keepsake-default-hidden";

/// String-valued key/value persistence.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }
}

/// All keys in one JSON object file, replaced atomically on every write.
#[derive(Debug)]
pub struct FileKvStore {
    path: PathBuf,
    gate: Mutex<()>,
}

impl FileKvStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), "preference file unreadable: {e}");
                }
                return BTreeMap::new();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "preference file is not a string map: {e}");
            BTreeMap::new()
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::storage("create preference directory", &e))?;
        }
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| ClientError::new(ClientErrorCode::Storage, e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).map_err(|e| ClientError::storage("write preference file", &e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ClientError::storage("replace preference file", &e))
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), ClientError> {
        let _guard = self.gate.lock();
        let mut entries = self.read_all();
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let _guard = self.gate.lock();
        Ok(self.read_all().remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

pub struct ThemePreference<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> ThemePreference<'a> {
    #[must_use]
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    /// Only the literal `light` selects the light theme.
    pub fn load(&self) -> Result<ThemeMode, ClientError> {
        Ok(match self.kv.get(THEME_KEY)?.as_deref() {
            Some("light") => ThemeMode::Light,
            _ => ThemeMode::Dark,
        })
    }

    pub fn save(&self, mode: ThemeMode) -> Result<(), ClientError> {
        self.kv.set(THEME_KEY, mode.as_str())
    }

    pub fn toggle(&self) -> Result<ThemeMode, ClientError> {
        let next = self.load()?.toggled();
        self.save(next)?;
        Ok(next)
    }
}

pub const DEFAULT_FILTER_LABELS: [(&str, &str); 4] = [
    ("all", "All"),
    ("nature", "Us"),
    ("city", "Adventures"),
    ("abstract", "Dreams"),
];

fn default_label(tag: &str) -> Option<&'static str> {
    DEFAULT_FILTER_LABELS
        .iter()
        .find(|(key, _)| *key == tag)
        .map(|(_, label)| *label)
}

/// Display names for filter tags, stored as overrides merged over defaults.
pub struct FilterLabels<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> FilterLabels<'a> {
    #[must_use]
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    #[must_use]
    pub fn defaults() -> BTreeMap<String, String> {
        DEFAULT_FILTER_LABELS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    pub fn load(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let mut labels = Self::defaults();
        let Some(raw) = self.kv.get(FILTER_LABELS_KEY)? else {
            return Ok(labels);
        };
        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(stored) => {
                for (tag, value) in stored {
                    if let Some(label) = keepsake_model::lenient_string::from_value(&value) {
                        labels.insert(tag, label);
                    }
                }
            }
            Err(e) => warn!("stored filter labels are corrupt, using defaults: {e}"),
        }
        Ok(labels)
    }

    pub fn label(&self, tag: &str) -> Result<String, ClientError> {
        Ok(self
            .load()?
            .remove(tag)
            .unwrap_or_else(|| tag.to_string()))
    }

    /// Stores `label` for `tag`; an empty label restores the default, or the tag itself.
    pub fn set(&self, tag: &str, label: &str) -> Result<String, ClientError> {
        let mut labels = self.load()?;
        let label = if label.is_empty() {
            default_label(tag).unwrap_or(tag).to_string()
        } else {
            label.to_string()
        };
        labels.insert(tag.to_string(), label.clone());
        let raw = serde_json::to_string(&labels)
            .map_err(|e| ClientError::new(ClientErrorCode::Storage, e.to_string()))?;
        self.kv.set(FILTER_LABELS_KEY, &raw)?;
        Ok(label)
    }
}

/// `src` values of built-in cards the user removed.
pub struct HiddenDefaults<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> HiddenDefaults<'a> {
    #[must_use]
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> Result<BTreeSet<String>, ClientError> {
        let Some(raw) = self.kv.get(HIDDEN_DEFAULTS_KEY)? else {
            return Ok(BTreeSet::new());
        };
        Ok(serde_json::from_str::<Vec<String>>(&raw)
            .map(|srcs| srcs.into_iter().collect())
            .unwrap_or_else(|e| {
                warn!("stored hidden defaults are corrupt, ignoring: {e}");
                BTreeSet::new()
            }))
    }

    pub fn contains(&self, src: &str) -> Result<bool, ClientError> {
        Ok(self.load()?.contains(src))
    }

    pub fn add(&self, src: &str) -> Result<(), ClientError> {
        let mut hidden = self.load()?;
        if !hidden.insert(src.to_string()) {
            return Ok(());
        }
        let raw = serde_json::to_string(&hidden)
            .map_err(|e| ClientError::new(ClientErrorCode::Storage, e.to_string()))?;
        self.kv.set(HIDDEN_DEFAULTS_KEY, &raw)
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        self.kv.remove(HIDDEN_DEFAULTS_KEY)
    }
}
