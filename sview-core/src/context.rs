//! # Application Context
//!
//! Everything the viewer modules share, created once by the binary and
//! handed down by reference.
//!
//! ```text
//! ViewerConfig ──► AppContext::new(config, module)
//!                    ├─ settings      global "sview" set (language, ...)
//!                    ├─ translations  <lang_root>/<language>/<module>.lng
//!                    ├─ messages      MsgQueue ──► RootWidget::show_messages
//!                    ├─ subtitles     SubQueue ──► SubtitlesView
//!                    ├─ keys          KeysState  ◄── KeyDown / KeyUp
//!                    ├─ window_messages MessageList
//!                    ├─ plugins       PluginRegistry::scan(plugin_dir)
//!                    └─ window_library (loaded on demand)
//! ```

use crate::config::ViewerConfig;
use crate::geometry::RectI;
use crate::keys::{KeysState, VirtKey};
use crate::plugin::{PluginError, PluginKind, PluginRegistry, WindowLibrary};
use crate::queues::{MessageList, MsgQueue, SubQueue, WindowMessage};
use crate::settings::{self, MemorySettings, SettingsError, SharedSettings};
use crate::translations::{Translations, GLOBAL_SETTINGS_SET};
use crate::widgets::RootWidget;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AppContext {
    config: ViewerConfig,
    settings: SharedSettings,
    translations: Translations,
    messages: Arc<MsgQueue>,
    subtitles: Arc<SubQueue>,
    keys: Arc<KeysState>,
    window_messages: Arc<MessageList>,
    plugins: PluginRegistry,
    window_library: Option<Arc<WindowLibrary>>,
}

impl AppContext {
    /// Open the global settings set and scan the plugin folder.
    ///
    /// Settings that cannot be opened are kept in memory for this run.
    pub fn new(config: ViewerConfig, module: &str) -> Self {
        let store = match settings::open_default(GLOBAL_SETTINGS_SET) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Global settings unavailable ({}), changes will not persist", e);
                Box::new(MemorySettings::new())
            }
        };
        Self::with_settings(config, module, settings::shared(store))
    }

    pub fn with_settings(config: ViewerConfig, module: &str, settings: SharedSettings) -> Self {
        let translations = Translations::new(&config.lang_root, module, Some(settings.clone()));
        let plugins = PluginRegistry::scan(&config.plugin_dir);
        tracing::info!(
            "Context for {}: {} plugin(s), language {:?}",
            module,
            plugins.plugins().len(),
            translations.language()
        );
        Self {
            config,
            settings,
            translations,
            messages: Arc::new(MsgQueue::new()),
            subtitles: Arc::new(SubQueue::new()),
            keys: Arc::new(KeysState::new()),
            window_messages: Arc::new(MessageList::new()),
            plugins,
            window_library: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn messages(&self) -> &Arc<MsgQueue> {
        &self.messages
    }

    pub fn subtitles(&self) -> &Arc<SubQueue> {
        &self.subtitles
    }

    pub fn keys(&self) -> &Arc<KeysState> {
        &self.keys
    }

    pub fn window_messages(&self) -> &Arc<MessageList> {
        &self.window_messages
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Settings set of the application module (`config.settings_set`).
    pub fn module_settings(&self) -> Result<SharedSettings, SettingsError> {
        settings::open_default(&self.config.settings_set).map(settings::shared)
    }

    pub fn load_window_library(&mut self, path: impl AsRef<Path>) -> Result<Arc<WindowLibrary>, PluginError> {
        let library = WindowLibrary::load(path)?;
        self.window_library = Some(library.clone());
        Ok(library)
    }

    pub fn window_library(&self) -> Option<&Arc<WindowLibrary>> {
        self.window_library.as_ref()
    }

    /// An existing path is used as is, anything else is looked up by file
    /// stem among the scanned plugins.
    pub fn resolve_plugin(&self, kind: PluginKind, name: &Path) -> Option<PathBuf> {
        if name.is_file() {
            return Some(name.to_path_buf());
        }
        let stem = name.file_stem()?.to_string_lossy();
        self.plugins.find(kind, &stem).map(Path::to_path_buf)
    }

    /// Root widget sized to the configured window.
    pub fn create_root(&self) -> RootWidget {
        let window = self.config.window;
        RootWidget::new(RectI::from_xywh(0, 0, window.width(), window.height()))
            .with_drag_tolerance(self.config.drag_tolerance)
    }

    /// Track key state and queue every message for the drawer.
    ///
    /// A key map reported by the window becomes `KeyDown` / `KeyUp` edges
    /// against the keys already known to be pressed.
    pub fn post_window_messages(&self, messages: &[WindowMessage], now: f64) {
        for message in messages {
            match message {
                WindowMessage::KeyDown(key) => self.keys.key_down(*key, now),
                WindowMessage::KeyUp(key) => self.keys.key_up(*key, now),
                WindowMessage::Keys(map) => {
                    for (index, down) in map.iter().enumerate() {
                        let key = VirtKey(index as u8);
                        if *down == self.keys.is_key_down(key) {
                            continue;
                        }
                        let edge = if *down {
                            self.keys.key_down(key, now);
                            WindowMessage::KeyDown(key)
                        } else {
                            self.keys.key_up(key, now);
                            WindowMessage::KeyUp(key)
                        };
                        self.queue_message(edge);
                    }
                }
                _ => {}
            }
            self.queue_message(message.clone());
        }
    }

    fn queue_message(&self, message: WindowMessage) {
        let code = message.code();
        if !self.window_messages.append(message) {
            tracing::debug!("Window message list full, dropped message {}", code);
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsExt;

    fn context(dir: &Path) -> AppContext {
        let config = ViewerConfig {
            plugin_dir: dir.join("plugins"),
            lang_root: dir.join("lang"),
            ..ViewerConfig::default()
        };
        AppContext::with_settings(config, "StImageViewer", settings::shared(Box::new(MemorySettings::new())))
    }

    #[test]
    fn test_empty_install() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(ctx.plugins().plugins().is_empty());
        assert!(ctx.window_library().is_none());
        // no language files, ids are shown by default
        assert_eq!(ctx.translations().text(1, "Open"), "[1]Open");
        assert!(ctx.resolve_plugin(PluginKind::Renderer, Path::new("StOutAnaglyph")).is_none());
    }

    #[test]
    fn test_root_matches_window() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let root = ctx.create_root();
        assert_eq!(root.rect(), RectI::from_xywh(0, 0, 1280, 720));
    }

    #[test]
    fn test_post_window_messages() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        ctx.post_window_messages(
            &[WindowMessage::KeyDown(VirtKey::ESCAPE), WindowMessage::Resize],
            1.0,
        );
        assert!(ctx.keys().is_key_down(VirtKey::ESCAPE));
        assert_eq!(ctx.window_messages().len(), 2);

        ctx.post_window_messages(&[WindowMessage::KeyUp(VirtKey::ESCAPE)], 2.0);
        assert!(!ctx.keys().is_key_down(VirtKey::ESCAPE));
    }

    #[test]
    fn test_window_key_map_becomes_key_edges() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut map = Box::new([false; 256]);
        map[VirtKey::ESCAPE.index()] = true;
        ctx.post_window_messages(&[WindowMessage::Keys(map)], 1.0);
        assert!(ctx.keys().is_key_down(VirtKey::ESCAPE));
        assert_eq!(ctx.keys().key_time(VirtKey::ESCAPE), 1.0);

        let drained = ctx.window_messages().drain(1.0);
        assert_eq!(drained.first(), Some(&WindowMessage::KeyDown(VirtKey::ESCAPE)));
        assert!(ctx.window_messages().keys_map()[VirtKey::ESCAPE.index()]);

        // same map again: no new edge
        let mut map = Box::new([false; 256]);
        map[VirtKey::ESCAPE.index()] = true;
        ctx.post_window_messages(&[WindowMessage::Keys(map)], 1.5);
        assert!(ctx.window_messages().is_empty());

        ctx.post_window_messages(&[WindowMessage::Keys(Box::new([false; 256]))], 2.0);
        assert!(!ctx.keys().is_key_down(VirtKey::ESCAPE));
        assert_eq!(ctx.window_messages().drain(2.0).first(), Some(&WindowMessage::KeyUp(VirtKey::ESCAPE)));
    }

    #[test]
    fn test_settings_are_shared() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        ctx.settings().lock().save_bool("showFps", true).unwrap();
        assert_eq!(ctx.settings().lock().load_bool("showFps"), Some(true));
    }
}
