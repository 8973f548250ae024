//! Settings in the Windows registry under `HKCU\SOFTWARE\sView\<set>`.

use super::{SettingsError, SettingsStore};
use winreg::enums::*;
use winreg::RegKey;

pub struct RegistrySettings {
    key: RegKey,
    path: String,
}

impl RegistrySettings {
    pub fn open(set: &str) -> Result<Self, SettingsError> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let path = format!(r"SOFTWARE\sView\{}", set);
        let (key, _) = hkcu
            .create_subkey(&path)
            .map_err(|e| SettingsError::Registry(format!("Failed to open {}: {}", path, e)))?;
        Ok(Self { key, path })
    }
}

impl SettingsStore for RegistrySettings {
    fn load_int32(&self, key: &str) -> Option<i32> {
        // stored as REG_DWORD
        self.key.get_value::<u32, _>(key).ok().map(|v| v as i32)
    }

    fn save_int32(&mut self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.key
            .set_value(key, &(value as u32))
            .map_err(|e| SettingsError::Registry(format!("Failed to set {}\\{}: {}", self.path, key, e)))
    }

    fn load_string(&self, key: &str) -> Option<String> {
        self.key.get_value::<String, _>(key).ok()
    }

    fn save_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.key
            .set_value(key, &value.to_string())
            .map_err(|e| SettingsError::Registry(format!("Failed to set {}\\{}: {}", self.path, key, e)))
    }
}
