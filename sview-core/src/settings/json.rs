//! Settings stored in a JSON file per set.

use super::{SettingsError, SettingsStore};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// `<config_dir>/sView/<set>.json`, written on every save.
pub struct JsonSettings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonSettings {
    pub fn open(set: &str) -> Result<Self, SettingsError> {
        let mut path = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        path.push("sView");
        path.push(format!("{}.json", set));
        Self::open_at(path)
    }

    /// Open a specific file; a missing file starts empty.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    tracing::warn!("Settings file {} is not an object, ignoring it", path.display());
                    Map::new()
                }
                Err(source) => return Err(SettingsError::Parse { path, source }),
            }
        } else {
            Map::new()
        };
        tracing::debug!("Settings {} ({} values)", path.display(), values.len());
        Ok(Self { path, values })
    }

    /// Start from nothing at `path`; the file is replaced on first save.
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            values: Map::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(&self.values).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, content).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonSettings {
    fn load_int32(&self, key: &str) -> Option<i32> {
        self.values
            .get(key)?
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
    }

    fn save_int32(&mut self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::from(value));
        self.write()
    }

    fn load_string(&self, key: &str) -> Option<String> {
        self.values.get(key)?.as_str().map(str::to_string)
    }

    fn save_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::from(value));
        self.write()
    }

    fn flush(&mut self) -> Result<(), SettingsError> {
        self.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsExt;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sView").join("StImageViewer.json");

        let mut store = JsonSettings::open_at(&path).unwrap();
        assert_eq!(store.load_int32("srcFormat"), None);
        store.save_int32("srcFormat", 3).unwrap();
        store.save_string("lastFolder", "/home/user/Pictures").unwrap();
        store.save_bool("fullscreen", false).unwrap();

        let reopened = JsonSettings::open_at(&path).unwrap();
        assert_eq!(reopened.load_int32("srcFormat"), Some(3));
        assert_eq!(reopened.load_string("lastFolder").as_deref(), Some("/home/user/Pictures"));
        assert_eq!(reopened.load_bool("fullscreen"), Some(false));
    }

    #[test]
    fn test_type_mismatch_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.json");
        std::fs::write(&path, r#"{"a": "text", "b": 5000000000, "c": 7}"#).unwrap();

        let store = JsonSettings::open_at(&path).unwrap();
        assert_eq!(store.load_int32("a"), None);
        assert_eq!(store.load_int32("b"), None);
        assert_eq!(store.load_string("c"), None);
        assert_eq!(store.load_int32("c"), Some(7));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonSettings::open_at(&path), Err(SettingsError::Parse { .. })));
    }
}
