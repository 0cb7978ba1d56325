//! Durable client-side storage: a small JSON-file-backed key-value store
//! holding the last selected template, per-template form state, and the
//! last artifact URL — the only state that survives client restarts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::StorageError;
use crate::form::FormState;

const KEY_LAST_TEMPLATE: &str = "last_selected_template";
const KEY_LAST_ARTIFACT: &str = "last_artifact_url";

/// JSON-serialized key-value entries persisted to a single file.
///
/// Every mutation writes the whole file; the store is small (a handful of
/// scalar and mapping entries) and written from a single thread.
#[derive(Debug)]
pub struct ClientStore {
    path: PathBuf,
    entries: BTreeMap<String, JsonValue>,
}

impl ClientStore {
    /// Opens the store at `path`, creating an empty one if the file does
    /// not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                StorageError::Corrupt {
                    path: path.display().to_string(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value).map_err(|source| StorageError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    pub fn last_template(&self) -> Option<String> {
        self.get(KEY_LAST_TEMPLATE)
    }

    pub fn set_last_template(&mut self, name: &str) -> Result<(), StorageError> {
        self.set(KEY_LAST_TEMPLATE, &name)
    }

    pub fn last_artifact_url(&self) -> Option<String> {
        self.get(KEY_LAST_ARTIFACT)
    }

    pub fn set_last_artifact_url(&mut self, url: &str) -> Result<(), StorageError> {
        self.set(KEY_LAST_ARTIFACT, &url)
    }

    /// Loads the stored form state for a template, empty if none was saved.
    pub fn load_form(&self, template: &str) -> FormState {
        FormState {
            values: self.get(&format!("{template}_form_values")).unwrap_or_default(),
            randomize: self.get(&format!("{template}_randomize")).unwrap_or_default(),
            bypassed: self.get(&format!("{template}_bypassed")).unwrap_or_default(),
        }
    }

    /// Persists a template's form state under its three keyed entries.
    pub fn save_form(&mut self, template: &str, form: &FormState) -> Result<(), StorageError> {
        self.set(&format!("{template}_form_values"), &form.values)?;
        self.set(&format!("{template}_randomize"), &form.randomize)?;
        self.set(&format!("{template}_bypassed"), &form.bypassed)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StorageError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}
