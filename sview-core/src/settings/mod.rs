//! # Settings
//!
//! Integer and string values keyed by name, scoped by a settings set
//! (usually the module name, e.g. `sview` or `StImageViewer`).
//!
//! ```text
//! ┌─────────────┐   load_*/save_*   ┌──────────────────────────────┐
//! │ SettingsExt │──────────────────►│ dyn SettingsStore            │
//! │ bool / rect │                   │  ├─ JsonSettings  (any OS)   │
//! │ float/param │                   │  ├─ RegistrySettings (win)   │
//! └─────────────┘                   │  └─ PluginSettings (StConfig)│
//!                                   └──────────────────────────────┘
//! ```
//!
//! Missing or malformed values load as `None` and callers keep their
//! defaults.

pub mod json;
pub mod memory;
pub mod plugin;
#[cfg(windows)]
pub mod registry;

pub use json::JsonSettings;
pub use memory::MemorySettings;
pub use plugin::PluginSettings;
#[cfg(windows)]
pub use registry::RegistrySettings;

use crate::geometry::RectI;
use crate::params::{BoolParam, Float32Param, Int32Param};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A store shared between the application root and its helpers.
pub type SharedSettings = Arc<Mutex<Box<dyn SettingsStore>>>;

pub fn shared(store: Box<dyn SettingsStore>) -> SharedSettings {
    Arc::new(Mutex::new(store))
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No configuration directory available")]
    NoConfigDir,
    #[error("Registry error: {0}")]
    Registry(String),
    #[error(transparent)]
    Plugin(#[from] crate::plugin::PluginError),
}

/// Raw key/value backend.
pub trait SettingsStore: Send {
    fn load_int32(&self, key: &str) -> Option<i32>;
    fn save_int32(&mut self, key: &str, value: i32) -> Result<(), SettingsError>;
    fn load_string(&self, key: &str) -> Option<String>;
    fn save_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Persist pending changes; stores writing through are no-ops.
    fn flush(&mut self) -> Result<(), SettingsError> {
        Ok(())
    }
}

/// Typed helpers built on the raw int / string values.
pub trait SettingsExt: SettingsStore {
    /// Stored as 1 / 0.
    fn load_bool(&self, key: &str) -> Option<bool> {
        self.load_int32(key).map(|v| v == 1)
    }

    fn save_bool(&mut self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.save_int32(key, i32::from(value))
    }

    /// Floats are kept as strings so every backend can store them.
    fn load_float(&self, key: &str) -> Option<f32> {
        self.load_string(key)?.trim().parse().ok()
    }

    fn save_float(&mut self, key: &str, value: f32) -> Result<(), SettingsError> {
        self.save_string(key, &value.to_string())
    }

    /// Rectangle stored as `key.left`, `key.right`, `key.top`, `key.bottom`.
    ///
    /// All four values must be present.
    fn load_rect(&self, key: &str) -> Option<RectI> {
        Some(RectI {
            left: self.load_int32(&format!("{}.left", key))?,
            right: self.load_int32(&format!("{}.right", key))?,
            top: self.load_int32(&format!("{}.top", key))?,
            bottom: self.load_int32(&format!("{}.bottom", key))?,
        })
    }

    fn save_rect(&mut self, key: &str, rect: &RectI) -> Result<(), SettingsError> {
        self.save_int32(&format!("{}.left", key), rect.left)?;
        self.save_int32(&format!("{}.right", key), rect.right)?;
        self.save_int32(&format!("{}.top", key), rect.top)?;
        self.save_int32(&format!("{}.bottom", key), rect.bottom)
    }

    /// Apply a stored value to `param`; returns false if none was stored.
    fn load_param<P: StoredParam + ?Sized>(&self, key: &str, param: &P) -> bool
    where
        Self: Sized,
    {
        param.load_from(self, key)
    }

    fn save_param<P: StoredParam + ?Sized>(&mut self, key: &str, param: &P) -> Result<(), SettingsError>
    where
        Self: Sized,
    {
        param.save_to(self, key)
    }
}

impl<S: SettingsStore + ?Sized> SettingsExt for S {}

/// Parameters that know how to persist themselves.
pub trait StoredParam {
    fn load_from(&self, store: &dyn SettingsStore, key: &str) -> bool;
    fn save_to(&self, store: &mut dyn SettingsStore, key: &str) -> Result<(), SettingsError>;
}

impl StoredParam for BoolParam {
    fn load_from(&self, store: &dyn SettingsStore, key: &str) -> bool {
        match store.load_bool(key) {
            Some(value) => {
                self.set_value(value);
                true
            }
            None => false,
        }
    }

    fn save_to(&self, store: &mut dyn SettingsStore, key: &str) -> Result<(), SettingsError> {
        store.save_bool(key, self.value())
    }
}

impl StoredParam for Int32Param {
    fn load_from(&self, store: &dyn SettingsStore, key: &str) -> bool {
        match store.load_int32(key) {
            Some(value) => {
                self.set_value(value);
                true
            }
            None => false,
        }
    }

    fn save_to(&self, store: &mut dyn SettingsStore, key: &str) -> Result<(), SettingsError> {
        store.save_int32(key, self.value())
    }
}

impl StoredParam for Float32Param {
    fn load_from(&self, store: &dyn SettingsStore, key: &str) -> bool {
        match store.load_float(key) {
            Some(value) => {
                self.set_value(value);
                true
            }
            None => false,
        }
    }

    fn save_to(&self, store: &mut dyn SettingsStore, key: &str) -> Result<(), SettingsError> {
        store.save_float(key, self.value())
    }
}

/// Platform default backend for `set`.
///
/// The registry on Windows, a JSON file under the user config directory
/// elsewhere (or when the registry key cannot be opened).
pub fn open_default(set: &str) -> Result<Box<dyn SettingsStore>, SettingsError> {
    #[cfg(windows)]
    {
        match RegistrySettings::open(set) {
            Ok(store) => return Ok(Box::new(store)),
            Err(e) => tracing::warn!("Registry settings unavailable ({}), using JSON file", e),
        }
    }
    match JsonSettings::open(set) {
        Ok(store) => Ok(Box::new(store)),
        Err(SettingsError::Parse { path, source }) => {
            tracing::warn!("Discarding unreadable settings {}: {}", path.display(), source);
            Ok(Box::new(JsonSettings::empty(path)))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_keys() {
        let mut store = MemorySettings::new();
        let rect = RectI::new(10, 400, 20, 620);
        store.save_rect("windowPos", &rect).unwrap();
        assert_eq!(store.load_int32("windowPos.left"), Some(20));
        assert_eq!(store.load_int32("windowPos.bottom"), Some(400));
        assert_eq!(store.load_rect("windowPos"), Some(rect));

        store.remove("windowPos.top");
        assert_eq!(store.load_rect("windowPos"), None);
    }

    #[test]
    fn test_bool_and_float() {
        let mut store = MemorySettings::new();
        store.save_bool("showFps", true).unwrap();
        assert_eq!(store.load_int32("showFps"), Some(1));
        assert_eq!(store.load_bool("showFps"), Some(true));
        // anything but 1 is false
        store.save_int32("showFps", 2).unwrap();
        assert_eq!(store.load_bool("showFps"), Some(false));

        store.save_float("gamma", 1.25).unwrap();
        assert_eq!(store.load_float("gamma"), Some(1.25));
        store.save_string("gamma", "garbage").unwrap();
        assert_eq!(store.load_float("gamma"), None);
    }

    #[test]
    fn test_params_round_trip_through_store() {
        let mut store = MemorySettings::new();
        let flag = BoolParam::new(true);
        let gamma = Float32Param::new(1.5, 0.0, 4.0, 1.0, 0.05);
        store.save_param("flag", &flag).unwrap();
        store.save_param("gamma", &gamma).unwrap();

        let flag2 = BoolParam::new(false);
        let gamma2 = Float32Param::new(1.0, 0.0, 4.0, 1.0, 0.05);
        assert!(store.load_param("flag", &flag2));
        assert!(store.load_param("gamma", &gamma2));
        assert!(flag2.value());
        assert!((gamma2.value() - 1.5).abs() < 1e-6);

        let missing = Int32Param::new(7);
        assert!(!store.load_param("absent", &missing));
        assert_eq!(missing.value(), 7);
    }
}
