//! # Translations
//!
//! Language files live in `<lang_root>/<language>/<module>.lng`:
//!
//! ```text
//! # sView translation, comments start with '#'
//! --------
//! 1000="Open file"
//! 1001="Show FPS\nin corner"
//! ```
//!
//! Everything before the optional `--------` line is a header. Ids are
//! numeric, values are quoted and may contain `\n` escapes.

use crate::params::Int32Param;
use crate::settings::{SettingsStore, SharedSettings};
use crate::signal::SlotId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;

pub const LANG_EXTENSION: &str = "lng";
pub const DEFAULT_LANGUAGE: &str = "english";

/// Settings set and key holding the chosen language name.
pub const GLOBAL_SETTINGS_SET: &str = "sview";
pub const LANGUAGE_KEY: &str = "language";

const HEADER_DELIMITER: &str = "--------";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Failed to read language file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Id → text table of one language file.
#[derive(Debug, Clone)]
pub struct LangMap {
    map: HashMap<usize, String>,
    show_id: bool,
}

impl Default for LangMap {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            show_id: true,
        }
    }
}

impl LangMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, TranslationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TranslationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse(&content);
        tracing::debug!("Loaded language file {} ({} strings)", path.display(), map.len());
        Ok(map)
    }

    pub fn parse(content: &str) -> Self {
        let mut result = Self::new();
        let has_header = content.lines().any(|l| l.trim_end_matches('\r') == HEADER_DELIMITER);
        let mut in_header = has_header;
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if in_header {
                in_header = line != HEADER_DELIMITER;
                continue;
            }
            result.parse_line(line);
        }
        result
    }

    fn parse_line(&mut self, line: &str) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }
        let Some((key, value)) = line.split_once('=') else {
            return;
        };
        let Ok(id) = key.trim().parse::<usize>() else {
            tracing::trace!("LangMap: skipping line with non-numeric id {:?}", key);
            return;
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        self.map.insert(id, value.replace("\\n", "\n"));
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn insert(&mut self, id: usize, value: impl Into<String>) {
        self.map.insert(id, value.into());
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.map.get(&id).map(String::as_str)
    }

    /// Prefix untranslated strings with their id, `[id]default`.
    pub fn set_show_id(&mut self, show_id: bool) {
        self.show_id = show_id;
    }

    /// Translated text, or the default when the id is missing or empty.
    pub fn text(&self, id: usize, default: &str) -> String {
        match self.get(id) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ if self.show_id => format!("[{}]{}", id, default),
            _ => default.to_string(),
        }
    }
}

/// Language folders under `root`, sorted; the built-in default if none.
pub fn discover_languages(root: &Path) -> Vec<String> {
    let mut languages: Vec<String> = std::fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    languages.sort();
    if languages.is_empty() {
        languages.push(DEFAULT_LANGUAGE.to_string());
    }
    languages
}

struct TranslationState {
    root: PathBuf,
    module: String,
    languages: Vec<String>,
    map: Mutex<LangMap>,
    settings: Option<SharedSettings>,
    reloaded: AtomicBool,
}

impl TranslationState {
    fn file_path(&self, language: &str) -> PathBuf {
        self.root
            .join(language)
            .join(format!("{}.{}", self.module, LANG_EXTENSION))
    }

    fn load(&self, language: &str) {
        let path = self.file_path(language);
        let loaded = match LangMap::open(&path) {
            Ok(map) => map,
            Err(e) => {
                tracing::debug!("{}", e);
                LangMap::new()
            }
        };
        let mut map = self.map.lock();
        let show_id = map.show_id;
        *map = loaded;
        map.show_id = show_id;
    }

    fn switch_to(&self, index: i32) {
        let Some(language) = usize::try_from(index).ok().and_then(|i| self.languages.get(i)) else {
            tracing::debug!("Translations: language index {} out of range", index);
            return;
        };
        if let Some(settings) = &self.settings {
            if let Err(e) = settings.lock().save_string(LANGUAGE_KEY, language) {
                tracing::warn!("Failed to store language choice: {}", e);
            }
        }
        tracing::info!("Switching {} to {}", self.module, language);
        self.load(language);
        self.reloaded.store(true, Ordering::SeqCst);
    }
}

/// Translation table of one module that follows the language parameter.
pub struct Translations {
    state: Arc<TranslationState>,
    language: Arc<Int32Param>,
    slot: SlotId,
}

impl Translations {
    /// Load `module` translations from `root`.
    ///
    /// `settings` is the global `sview` set: the stored language is picked
    /// up here and changes are written back to it.
    pub fn new(root: impl AsRef<Path>, module: &str, settings: Option<SharedSettings>) -> Self {
        let root = root.as_ref().to_path_buf();
        let languages = discover_languages(&root);
        let stored = settings
            .as_ref()
            .and_then(|s| s.lock().load_string(LANGUAGE_KEY))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let index = languages.iter().position(|l| *l == stored).unwrap_or(0);

        let state = Arc::new(TranslationState {
            root,
            module: module.to_string(),
            languages,
            map: Mutex::new(LangMap::new()),
            settings,
            reloaded: AtomicBool::new(false),
        });
        state.load(&state.languages[index]);

        let language = Arc::new(Int32Param::new(index as i32));
        let weak: Weak<TranslationState> = Arc::downgrade(&state);
        let slot = language.on_changed.connect(move |index| {
            if let Some(state) = weak.upgrade() {
                state.switch_to(*index);
            }
        });
        Self { state, language, slot }
    }

    /// Index into [`languages`](Self::languages), bind it to a radio menu.
    pub fn language_param(&self) -> &Arc<Int32Param> {
        &self.language
    }

    pub fn languages(&self) -> &[String] {
        &self.state.languages
    }

    pub fn language(&self) -> Option<&str> {
        usize::try_from(self.language.value())
            .ok()
            .and_then(|i| self.state.languages.get(i))
            .map(String::as_str)
    }

    pub fn text(&self, id: usize, default: &str) -> String {
        self.state.map.lock().text(id, default)
    }

    pub fn set_show_id(&self, show_id: bool) {
        self.state.map.lock().set_show_id(show_id);
    }

    /// True once after the language changed; labels should be rebuilt.
    pub fn take_reloaded(&self) -> bool {
        self.state.reloaded.swap(false, Ordering::SeqCst)
    }
}

impl Drop for Translations {
    fn drop(&mut self) {
        self.language.on_changed.disconnect(self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{self, MemorySettings};

    const SAMPLE: &str = "# header comment\r\n\
        author=\"ignored\"\r\n\
        --------\r\n\
        # Menu\r\n\
        1000=\"Open file\"\r\n\
        1001=\"Two\\nlines\"\r\n\
        garbage line\r\n\
        abc=\"not an id\"\r\n";

    #[test]
    fn test_parse_language_file() {
        let map = LangMap::parse(SAMPLE);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1000), Some("Open file"));
        assert_eq!(map.get(1001), Some("Two\nlines"));
    }

    #[test]
    fn test_missing_id_shows_default() {
        let mut map = LangMap::parse("1=\"One\"");
        assert_eq!(map.text(1, "x"), "One");
        assert_eq!(map.text(2, "Two"), "[2]Two");
        map.set_show_id(false);
        assert_eq!(map.text(2, "Two"), "Two");
    }

    #[test]
    fn test_language_switch_reloads_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        for (lang, text) in [("english", "Open"), ("russian", "Открыть")] {
            let folder = dir.path().join(lang);
            std::fs::create_dir_all(&folder).unwrap();
            std::fs::write(folder.join("StImageViewer.lng"), format!("10=\"{}\"\n", text)).unwrap();
        }

        let mut global = MemorySettings::new();
        global.save_string(LANGUAGE_KEY, "english").unwrap();
        let shared = settings::shared(Box::new(global));

        let tr = Translations::new(dir.path(), "StImageViewer", Some(shared.clone()));
        assert_eq!(tr.languages(), ["english".to_string(), "russian".to_string()]);
        assert_eq!(tr.language(), Some("english"));
        assert_eq!(tr.text(10, "Open file"), "Open");

        tr.language_param().set_value(1);
        assert!(tr.take_reloaded());
        assert!(!tr.take_reloaded());
        assert_eq!(tr.text(10, "Open file"), "Открыть");
        assert_eq!(shared.lock().load_string(LANGUAGE_KEY).as_deref(), Some("russian"));

        // out of range is ignored
        tr.language_param().set_value(7);
        assert_eq!(tr.text(10, "Open file"), "Открыть");
    }

    #[test]
    fn test_no_language_folders() {
        let dir = tempfile::tempdir().unwrap();
        let tr = Translations::new(dir.path(), "StMoviePlayer", None);
        assert_eq!(tr.languages(), [DEFAULT_LANGUAGE.to_string()]);
        assert_eq!(tr.text(5, "Play"), "[5]Play");
    }

    #[test]
    fn test_drop_disconnects_from_param() {
        let dir = tempfile::tempdir().unwrap();
        let tr = Translations::new(dir.path(), "StMoviePlayer", None);
        let param = tr.language_param().clone();
        assert!(param.on_changed.is_connected());
        drop(tr);
        assert!(!param.on_changed.is_connected());
    }
}
