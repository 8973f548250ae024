//! Settings provided by an `StConfig` plugin library.

use super::{SettingsError, SettingsStore};
use crate::plugin::ffi::{RawInstance, StBool};
use crate::plugin::{PluginError, PluginLibrary, SymbolSource};
use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr::NonNull;

/// Size of the buffer `loadString` writes into, terminator included.
pub const STRING_BUFFER_SIZE: usize = 4096;

type ConfigNewFn = unsafe extern "C" fn(*const c_char) -> RawInstance;
type ConfigDelFn = unsafe extern "C" fn(RawInstance);
type ConfigLoadInt32Fn = unsafe extern "C" fn(RawInstance, *const c_char, *mut i32) -> StBool;
type ConfigSaveInt32Fn = unsafe extern "C" fn(RawInstance, *const c_char, *const i32) -> StBool;
type ConfigLoadStringFn = unsafe extern "C" fn(RawInstance, *const c_char, *mut c_char) -> StBool;
type ConfigSaveStringFn = unsafe extern "C" fn(RawInstance, *const c_char, *const c_char) -> StBool;

#[derive(Clone, Copy)]
struct ConfigFunctions {
    new: ConfigNewFn,
    del: ConfigDelFn,
    load_int32: ConfigLoadInt32Fn,
    save_int32: ConfigSaveInt32Fn,
    load_string: ConfigLoadStringFn,
    save_string: ConfigSaveStringFn,
}

pub struct PluginSettings {
    funcs: ConfigFunctions,
    instance: NonNull<std::ffi::c_void>,
    set: String,
    library: PluginLibrary,
}

// SAFETY: the instance is only reached through this owner.
unsafe impl Send for PluginSettings {}

impl PluginSettings {
    pub fn load(path: impl AsRef<Path>, set: &str) -> Result<Self, SettingsError> {
        let library = PluginLibrary::open(path)?;
        let funcs = unsafe {
            ConfigFunctions {
                new: library.required("StConfig_new")?,
                del: library.required("StConfig_del")?,
                load_int32: library.required("StConfig_loadInt32")?,
                save_int32: library.required("StConfig_saveInt32")?,
                load_string: library.required("StConfig_loadString")?,
                save_string: library.required("StConfig_saveString")?,
            }
        };
        let set_c = c_string(set)?;
        let instance = NonNull::new(unsafe { (funcs.new)(set_c.as_ptr()) })
            .ok_or_else(|| PluginError::NullInstance(format!("StConfig_new({})", set)))?;
        tracing::debug!("Settings plugin {} opened set {}", library.path().display(), set);
        Ok(Self {
            funcs,
            instance,
            set: set.to_string(),
            library,
        })
    }

    pub fn set_name(&self) -> &str {
        &self.set
    }
}

fn c_string(s: &str) -> Result<CString, SettingsError> {
    CString::new(s).map_err(|_| PluginError::InvalidArgument(format!("NUL in {:?}", s)).into())
}

impl SettingsStore for PluginSettings {
    fn load_int32(&self, key: &str) -> Option<i32> {
        let key = c_string(key).ok()?;
        let mut value = 0i32;
        unsafe { (self.funcs.load_int32)(self.instance.as_ptr(), key.as_ptr(), &mut value) }.then_some(value)
    }

    fn save_int32(&mut self, key: &str, value: i32) -> Result<(), SettingsError> {
        let key = c_string(key)?;
        if unsafe { (self.funcs.save_int32)(self.instance.as_ptr(), key.as_ptr(), &value) } {
            Ok(())
        } else {
            Err(PluginError::CallFailed("StConfig_saveInt32").into())
        }
    }

    fn load_string(&self, key: &str) -> Option<String> {
        let key = c_string(key).ok()?;
        let mut buffer = vec![0 as c_char; STRING_BUFFER_SIZE];
        let found = unsafe { (self.funcs.load_string)(self.instance.as_ptr(), key.as_ptr(), buffer.as_mut_ptr()) };
        if !found {
            return None;
        }
        // never trust the plugin to terminate the string
        buffer[STRING_BUFFER_SIZE - 1] = 0;
        let text = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        Some(text.to_string_lossy().into_owned())
    }

    fn save_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let key = c_string(key)?;
        let value = c_string(value)?;
        if unsafe { (self.funcs.save_string)(self.instance.as_ptr(), key.as_ptr(), value.as_ptr()) } {
            Ok(())
        } else {
            Err(PluginError::CallFailed("StConfig_saveString").into())
        }
    }
}

impl Drop for PluginSettings {
    fn drop(&mut self) {
        tracing::debug!("Closing settings set {} ({})", self.set, self.library.path().display());
        unsafe { (self.funcs.del)(self.instance.as_ptr()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_plugin() {
        let err = PluginSettings::load("/nonexistent/StSettings.so", "sview").err().unwrap();
        assert!(matches!(err, SettingsError::Plugin(PluginError::LibraryLoad { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_settings_library() {
        let err = PluginSettings::load("libc.so.6", "sview").err().unwrap();
        assert!(matches!(err, SettingsError::Plugin(PluginError::MissingSymbol { .. })));
    }
}
