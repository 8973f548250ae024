//! # Plugin Loader
//!
//! Drawers (applications), renderers (stereo outputs), windows and settings
//! stores are shipped as shared libraries exporting a fixed set of C
//! functions. Each kind gets a function table resolved all-or-nothing:
//!
//! ```text
//! PluginLibrary::open(path)
//!        │
//!        ▼
//! *Functions::resolve(&lib) ──── any symbol missing ───► PluginError::MissingSymbol
//!        │ (every pointer present)
//!        ▼
//! new() export  ──── returns NULL ────► PluginError::NullInstance
//!        │
//!        ▼
//! typed wrapper: calls go through the table, Drop calls del() once
//! ```
//!
//! A wrapper only exists once its table is complete, so there is no way to
//! call into a half-loaded plugin.

pub mod drawer;
pub mod ffi;
pub mod registry;
pub mod renderer;
pub mod window;

pub use drawer::{Drawer, DrawerInterface};
pub use ffi::{DrawView, OpenInfo, RawMessage};
pub use registry::{PluginKind, PluginRegistry, ScannedPlugin};
pub use renderer::{Renderer, RendererInterface};
pub use window::{Window, WindowFunctions, WindowLibrary, WindowPart};

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to load library {path}: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },
    #[error("Symbol {symbol} not found in {path}")]
    MissingSymbol { path: PathBuf, symbol: String },
    #[error("{0} returned a null instance")]
    NullInstance(String),
    #[error("Plugin call {0} failed")]
    CallFailed(&'static str),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// An opened shared library.
#[derive(Debug)]
pub struct PluginLibrary {
    path: PathBuf,
    library: libloading::Library,
}

impl PluginLibrary {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref().to_path_buf();
        // Library initializers run here; plugins are trusted code.
        let library = unsafe { libloading::Library::new(&path) }.map_err(|e| {
            PluginError::LibraryLoad {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!("Loaded plugin library {}", path.display());
        Ok(Self { path, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if every listed export is present.
    pub fn has_symbols(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.address(name).is_some())
    }
}

/// Where function tables get their exports from.
pub trait SymbolSource {
    /// Library path used in error messages.
    fn origin(&self) -> &Path;

    /// Address of the export `name`, `None` when it is missing.
    fn address(&self, name: &str) -> Option<*const c_void>;

    /// Resolve a required export.
    ///
    /// # Safety
    /// `T` must be the exact function pointer type of the export.
    unsafe fn required<T: Copy>(&self, name: &str) -> Result<T, PluginError> {
        self.optional(name).ok_or_else(|| PluginError::MissingSymbol {
            path: self.origin().to_path_buf(),
            symbol: name.to_string(),
        })
    }

    /// Resolve an export that older plugins may lack.
    ///
    /// # Safety
    /// Same contract as [`required`](Self::required).
    unsafe fn optional<T: Copy>(&self, name: &str) -> Option<T> {
        let address = self.address(name)?;
        debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*const c_void>());
        Some(std::mem::transmute_copy::<*const c_void, T>(&address))
    }
}

impl SymbolSource for PluginLibrary {
    fn origin(&self) -> &Path {
        &self.path
    }

    fn address(&self, name: &str) -> Option<*const c_void> {
        let mut symbol = Vec::with_capacity(name.len() + 1);
        symbol.extend_from_slice(name.as_bytes());
        symbol.push(0);
        // only the address is read, nothing is called
        unsafe { self.library.get::<*const c_void>(&symbol) }
            .ok()
            .map(|s| *s)
            .filter(|address| !address.is_null())
    }
}
