//! Volatile settings, lost on exit.

use super::{SettingsError, SettingsStore};
use std::collections::HashMap;

/// In-memory store, used when persistence is disabled.
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    ints: HashMap<String, i32>,
    strings: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ints.len() + self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remove(&mut self, key: &str) {
        self.ints.remove(key);
        self.strings.remove(key);
    }
}

impl SettingsStore for MemorySettings {
    fn load_int32(&self, key: &str) -> Option<i32> {
        self.ints.get(key).copied()
    }

    fn save_int32(&mut self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.ints.insert(key.to_string(), value);
        Ok(())
    }

    fn load_string(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }

    fn save_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
