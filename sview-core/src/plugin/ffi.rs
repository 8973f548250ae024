//! C structures crossing the plugin boundary.

use super::PluginError;
use crate::keys::VirtKey;
use crate::queues::message_list::{codes, KeyMap, WindowMessage};
use std::ffi::{c_char, c_void, CString};
use std::path::{Path, PathBuf};

/// `bool` as used by plugin exports.
pub type StBool = bool;

/// Opaque plugin instance.
pub type RawInstance = *mut c_void;

/// Native parent window handle (HWND / X11 Window / NSView).
pub type NativeWindow = *mut c_void;

/// Message passed to `callback` / `parseCallback` exports.
///
/// Lists are terminated by an entry with `uin == codes::NULL`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawMessage {
    pub uin: usize,
    pub data: *mut c_void,
}

impl RawMessage {
    pub const fn null() -> Self {
        Self {
            uin: codes::NULL,
            data: std::ptr::null_mut(),
        }
    }

    /// Raw form of `message`, `None` when the payload lives in memory the
    /// plugin cannot see (paths, resolved clicks).
    ///
    /// `Keys` points `data` at the map inside `message`; `KeyDown` and
    /// `KeyUp` carry the key code itself in `data`.
    pub fn from_message(message: &WindowMessage) -> Option<Self> {
        let data = match message {
            WindowMessage::Keys(map) => map.as_ptr() as *mut c_void,
            WindowMessage::KeyDown(key) | WindowMessage::KeyUp(key) => key.index() as *mut c_void,
            plain if WindowMessage::from_code(plain.code()).as_ref() == Some(plain) => std::ptr::null_mut(),
            _ => return None,
        };
        Some(Self {
            uin: message.code(),
            data,
        })
    }
}

/// Build a null-terminated list from typed messages, skipping messages
/// [`RawMessage::from_message`] cannot express.
///
/// Entries may point into `messages`, keep it alive while the plugin reads
/// the list.
pub fn raw_message_list(messages: &[WindowMessage]) -> Vec<RawMessage> {
    let mut list: Vec<RawMessage> = messages.iter().filter_map(RawMessage::from_message).collect();
    list.push(RawMessage::null());
    list
}

/// Decode a null-terminated list returned by a plugin.
///
/// # Safety
/// `list` must point to a valid array ending with a `NULL` message, and
/// every `Keys` entry must point to 256 readable `bool`s or be null.
pub unsafe fn messages_from_raw(list: *const RawMessage) -> Vec<WindowMessage> {
    let mut result = Vec::new();
    if list.is_null() {
        return result;
    }
    let mut cursor = list;
    while (*cursor).uin != codes::NULL {
        let raw = *cursor;
        let message = match raw.uin {
            codes::KEYS => key_map_from_raw(raw.data).map(WindowMessage::Keys),
            codes::KEY_DOWN_APPEND => key_from_raw(raw.data).map(WindowMessage::KeyDown),
            codes::KEY_UP_APPEND => key_from_raw(raw.data).map(WindowMessage::KeyUp),
            code => WindowMessage::from_code(code),
        };
        match message {
            Some(message) => result.push(message),
            None => tracing::trace!("Plugin message {} skipped", raw.uin),
        }
        cursor = cursor.add(1);
    }
    result
}

unsafe fn key_map_from_raw(data: *mut c_void) -> Option<KeyMap> {
    if data.is_null() {
        return None;
    }
    Some(Box::new(*(data as *const [bool; 256])))
}

fn key_from_raw(data: *mut c_void) -> Option<VirtKey> {
    u8::try_from(data as usize).ok().map(VirtKey)
}

#[repr(C)]
#[derive(Debug)]
pub struct RawOpenInfo {
    pub mime: *mut c_char,
    pub path: *mut c_char,
    pub args: *mut c_char,
}

/// What to open: a file (or URL) with optional MIME type and arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenInfo {
    pub mime: String,
    pub path: PathBuf,
    pub args: String,
}

impl OpenInfo {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Owned C strings; keep the result alive while the raw struct is in use.
    pub fn to_c_strings(&self) -> Result<OpenInfoStrings, PluginError> {
        let convert = |s: &str| {
            CString::new(s).map_err(|_| PluginError::InvalidArgument(format!("interior NUL in {:?}", s)))
        };
        Ok(OpenInfoStrings {
            mime: convert(&self.mime)?,
            path: convert(&self.path.to_string_lossy())?,
            args: convert(&self.args)?,
        })
    }
}

/// Backing storage for a [`RawOpenInfo`].
pub struct OpenInfoStrings {
    mime: CString,
    path: CString,
    args: CString,
}

impl OpenInfoStrings {
    /// The plugin only reads through these pointers.
    pub fn as_raw(&self) -> RawOpenInfo {
        RawOpenInfo {
            mime: self.mime.as_ptr() as *mut c_char,
            path: self.path.as_ptr() as *mut c_char,
            args: self.args.as_ptr() as *mut c_char,
        }
    }
}

/// View passed to `stglDraw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DrawView {
    Left = 0,
    Right = 1,
    Mono = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_list_is_null_terminated() {
        let list = raw_message_list(&[
            WindowMessage::Resize,
            WindowMessage::OpenFile(PathBuf::from("a.jps")),
            WindowMessage::Close,
        ]);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].uin, codes::RESIZE);
        assert_eq!(list[1].uin, codes::CLOSE);
        assert_eq!(list[2].uin, codes::NULL);

        let back = unsafe { messages_from_raw(list.as_ptr()) };
        assert_eq!(back, vec![WindowMessage::Resize, WindowMessage::Close]);
    }

    #[test]
    fn test_keys_reach_plugins_with_the_map() {
        let mut map = Box::new([false; 256]);
        map[VirtKey::ESCAPE.index()] = true;
        let messages = vec![WindowMessage::Keys(map), WindowMessage::KeyUp(VirtKey::SPACE)];
        let list = raw_message_list(&messages);

        assert_eq!(list[0].uin, codes::KEYS);
        assert!(!list[0].data.is_null());
        let seen = unsafe { &*(list[0].data as *const [bool; 256]) };
        assert!(seen[VirtKey::ESCAPE.index()]);
        assert!(!seen[VirtKey::SPACE.index()]);

        assert_eq!(list[1].uin, codes::KEY_UP_APPEND);
        assert_eq!(list[1].data as usize, VirtKey::SPACE.index());
    }

    #[test]
    fn test_key_payloads_from_plugins() {
        let mut window_keys = [false; 256];
        window_keys[VirtKey::RETURN.index()] = true;
        let list = [
            RawMessage {
                uin: codes::KEYS,
                data: window_keys.as_mut_ptr() as *mut c_void,
            },
            RawMessage {
                uin: codes::KEY_DOWN_APPEND,
                data: VirtKey::SPACE.index() as *mut c_void,
            },
            // a map the window failed to provide is dropped, not read
            RawMessage {
                uin: codes::KEYS,
                data: std::ptr::null_mut(),
            },
            RawMessage {
                uin: codes::MOUSE_DOWN,
                data: std::ptr::null_mut(),
            },
            RawMessage::null(),
        ];
        let messages = unsafe { messages_from_raw(list.as_ptr()) };
        assert_eq!(messages.len(), 3);
        match &messages[0] {
            WindowMessage::Keys(map) => {
                assert!(map[VirtKey::RETURN.index()]);
                assert!(!map[VirtKey::SPACE.index()]);
            }
            other => panic!("expected a key map, got {:?}", other),
        }
        assert_eq!(messages[1], WindowMessage::KeyDown(VirtKey::SPACE));
        assert_eq!(messages[2], WindowMessage::MouseDownQueued);
    }

    #[test]
    fn test_resolved_clicks_stay_on_the_host() {
        let click = WindowMessage::MouseDown {
            point: crate::geometry::PointD::new(0.5, 0.5),
            button: crate::keys::MouseButton::Left,
        };
        assert!(RawMessage::from_message(&click).is_none());
        let queued = RawMessage::from_message(&WindowMessage::MouseDownQueued).unwrap();
        assert_eq!(queued.uin, codes::MOUSE_DOWN);
        assert!(queued.data.is_null());
    }

    #[test]
    fn test_open_info_rejects_nul() {
        let mut info = OpenInfo::from_path("/tmp/photo.mpo");
        assert!(info.to_c_strings().is_ok());
        info.args = "bad\0arg".into();
        assert!(matches!(info.to_c_strings(), Err(PluginError::InvalidArgument(_))));
    }
}
