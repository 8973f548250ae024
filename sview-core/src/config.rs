//! Viewer configuration.
//!
//! Stored as JSON in `<config_dir>/sView/sview.json`. Every field has a
//! default, so a partial file only overrides what it names.

use crate::geometry::RectI;
use crate::plugin::renderer::DEVICE_AUTO;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "sview.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory on this system")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Folder scanned for drawer / renderer / window plugins.
    pub plugin_dir: PathBuf,
    /// Root of the `<language>/<module>.lng` tree.
    pub lang_root: PathBuf,
    /// Settings set of the application module.
    pub settings_set: String,
    /// Default `tracing` filter, `RUST_LOG` wins when set.
    pub log_filter: String,
    pub renderer: Option<PathBuf>,
    pub drawer: Option<PathBuf>,
    /// Output device index, -1 picks automatically.
    pub device: i32,
    /// Initial window placement.
    pub window: RectI,
    /// Pixels the pointer may travel before a press becomes a drag.
    pub drag_tolerance: f64,
    pub target_fps: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let share = share_dir();
        Self {
            plugin_dir: share.clone(),
            lang_root: share.join("lang"),
            settings_set: "StImageViewer".to_string(),
            log_filter: "sview=debug".to_string(),
            renderer: None,
            drawer: None,
            device: DEVICE_AUTO,
            window: RectI::from_xywh(128, 128, 1280, 720),
            drag_tolerance: 4.0,
            target_fps: 60.0,
        }
    }
}

/// Folder of the running executable, or the working directory.
fn share_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl ViewerConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("sView");
        path.push(CONFIG_FILE);
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the default location when `None`.
    ///
    /// A missing file gives the defaults; a broken one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(_) => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(&path)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "device": 2, "log_filter": "sview=trace" }"#).unwrap();

        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.device, 2);
        assert_eq!(config.log_filter, "sview=trace");
        assert_eq!(config.target_fps, 60.0);
        assert_eq!(config.renderer, None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ViewerConfig {
            renderer: Some(PathBuf::from("/opt/sview/StOutAnaglyph.so")),
            window: RectI::from_xywh(0, 0, 640, 480),
            ..ViewerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert_eq!(
            ViewerConfig::load_or_default(Some(&missing)).unwrap(),
            ViewerConfig::default()
        );

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "[1, 2").unwrap();
        assert!(matches!(
            ViewerConfig::load_or_default(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
