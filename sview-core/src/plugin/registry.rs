//! Plugin discovery in a directory.

use super::drawer::DRAWER_SYMBOLS;
use super::renderer::RENDERER_SYMBOLS;
use super::PluginLibrary;
use std::path::{Path, PathBuf};

/// Exports every settings plugin provides.
pub const SETTINGS_SYMBOLS: &[&str] = &[
    "StConfig_new",
    "StConfig_del",
    "StConfig_loadInt32",
    "StConfig_saveInt32",
    "StConfig_loadString",
    "StConfig_saveString",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Drawer,
    Renderer,
    Settings,
}

impl PluginKind {
    fn required_symbols(self) -> &'static [&'static str] {
        match self {
            PluginKind::Drawer => DRAWER_SYMBOLS,
            PluginKind::Renderer => RENDERER_SYMBOLS,
            PluginKind::Settings => SETTINGS_SYMBOLS,
        }
    }
}

/// One library found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPlugin {
    pub path: PathBuf,
    pub kinds: Vec<PluginKind>,
}

/// Libraries that passed (or failed) the symbol check.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<ScannedPlugin>,
    broken: Vec<(PathBuf, String)>,
}

impl PluginRegistry {
    /// Check the exports of every shared library directly inside `dir`.
    ///
    /// A missing directory yields an empty registry.
    pub fn scan(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut registry = Self::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Plugin directory {} unreadable: {}", dir.display(), e);
                return registry;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_shared_library(p))
            .collect();
        paths.sort();

        for path in paths {
            registry.inspect(path);
        }
        tracing::info!(
            "Plugin scan of {}: {} usable, {} broken",
            dir.display(),
            registry.plugins.len(),
            registry.broken.len()
        );
        registry
    }

    fn inspect(&mut self, path: PathBuf) {
        let library = match PluginLibrary::open(&path) {
            Ok(library) => library,
            Err(e) => {
                tracing::warn!("Skipping plugin: {}", e);
                self.broken.push((path, e.to_string()));
                return;
            }
        };
        let kinds: Vec<PluginKind> = [PluginKind::Drawer, PluginKind::Renderer, PluginKind::Settings]
            .into_iter()
            .filter(|kind| library.has_symbols(kind.required_symbols()))
            .collect();
        if kinds.is_empty() {
            tracing::debug!("{} exports no known plugin interface", path.display());
            return;
        }
        tracing::debug!("Found {:?} plugin {}", kinds, path.display());
        self.plugins.push(ScannedPlugin { path, kinds });
    }

    pub fn plugins(&self) -> &[ScannedPlugin] {
        &self.plugins
    }

    /// Libraries that failed to load, with the reason.
    pub fn broken(&self) -> &[(PathBuf, String)] {
        &self.broken
    }

    pub fn of_kind(&self, kind: PluginKind) -> impl Iterator<Item = &Path> {
        self.plugins
            .iter()
            .filter(move |p| p.kinds.contains(&kind))
            .map(|p| p.path.as_path())
    }

    /// First plugin of `kind` whose file stem contains `name`.
    pub fn find(&self, kind: PluginKind, name: &str) -> Option<&Path> {
        let name = name.to_lowercase();
        self.of_kind(kind).find(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().to_lowercase().contains(&name))
                .unwrap_or(false)
        })
    }
}

pub fn is_shared_library(path: &Path) -> bool {
    let suffix = std::env::consts::DLL_EXTENSION;
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(suffix))
        .unwrap_or(false)
}
