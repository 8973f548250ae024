//! # sView Core
//!
//! Shared infrastructure of the sView stereoscopic viewer: plugin loading,
//! settings, translations, thread-safe queues and the retained widget tree
//! drawn over the stereo picture.

// ============================================================================
// Basic Types
// ============================================================================
pub mod geometry;
pub mod keys;
pub mod params;
pub mod signal;

// ============================================================================
// Thread Bridges
// ============================================================================
pub mod queues;

// ============================================================================
// Plugins (drawers, renderers, windows)
// ============================================================================
pub mod plugin;

// ============================================================================
// Persistence / Localization
// ============================================================================
pub mod config;
pub mod settings;
pub mod translations;

// ============================================================================
// GUI
// ============================================================================
pub mod widgets;

// ============================================================================
// Application
// ============================================================================
pub mod context;

pub use config::ViewerConfig;
pub use context::AppContext;

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
