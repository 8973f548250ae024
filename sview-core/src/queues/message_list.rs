//! Window event buffer.
//!
//! The window thread appends events, the render loop drains them once per
//! frame. An exit request wipes everything queued before it.

use crate::geometry::PointD;
use crate::keys::{MouseButton, VirtKey};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Maximum number of pending events.
pub const MESSAGE_LIST_CAPACITY: usize = 2048;

/// Minimum interval between two synthesized `Keys` events (60 Hz).
const KEYS_INTERVAL: f64 = 1.0 / 60.0;

/// Pressed state indexed by virtual key code.
pub type KeyMap = Box<[bool; 256]>;

/// Numeric message ids shared with window plugins.
pub mod codes {
    pub const NULL: usize = 0;
    pub const NONE: usize = 1;
    pub const EXIT: usize = 2;
    pub const CLOSE: usize = 3;
    pub const INIT: usize = 4;
    pub const KEYS: usize = 5;
    pub const RESIZE: usize = 6;
    pub const DRAGNDROP_IN: usize = 7;
    pub const MOUSE_DOWN: usize = 8;
    pub const MOUSE_UP: usize = 9;
    pub const MOUSE_MOVE: usize = 10;
    pub const OPEN_FILE: usize = 11;
    pub const DEVICE_INFO: usize = 12;
    pub const DEVICE_OPTION: usize = 13;
    pub const WIN_ON_NEW_MONITOR: usize = 14;
    pub const FULLSCREEN_SWITCH: usize = 15;
    pub const MOUSE_DOWN_APPEND: usize = 40;
    pub const MOUSE_UP_APPEND: usize = 41;
    pub const KEY_DOWN_APPEND: usize = 42;
    pub const KEY_UP_APPEND: usize = 43;
    pub const GO_TOP: usize = 44;
    pub const GO_BOTTOM: usize = 45;
    pub const GO_BACKWARD: usize = 46;
    pub const GO_FORWARD: usize = 47;
}

/// Typed window event.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowMessage {
    Exit,
    Close,
    /// Snapshot of the pressed-key map.
    Keys(KeyMap),
    Resize,
    DragDropIn(PathBuf),
    MouseDown { point: PointD, button: MouseButton },
    MouseUp { point: PointD, button: MouseButton },
    MouseMove(PointD),
    /// A press waiting in the window's click queue, read it with
    /// `getMouseDown`.
    MouseDownQueued,
    MouseUpQueued,
    OpenFile(PathBuf),
    DeviceInfo,
    DeviceOption,
    WinOnNewMonitor,
    FullscreenSwitch,
    KeyDown(VirtKey),
    KeyUp(VirtKey),
    GoTop,
    GoBottom,
    GoBackward,
    GoForward,
}

impl WindowMessage {
    pub fn code(&self) -> usize {
        match self {
            WindowMessage::Exit => codes::EXIT,
            WindowMessage::Close => codes::CLOSE,
            WindowMessage::Keys(_) => codes::KEYS,
            WindowMessage::Resize => codes::RESIZE,
            WindowMessage::DragDropIn(_) => codes::DRAGNDROP_IN,
            WindowMessage::MouseDown { .. } => codes::MOUSE_DOWN,
            WindowMessage::MouseUp { .. } => codes::MOUSE_UP,
            WindowMessage::MouseMove(_) => codes::MOUSE_MOVE,
            WindowMessage::MouseDownQueued => codes::MOUSE_DOWN,
            WindowMessage::MouseUpQueued => codes::MOUSE_UP,
            WindowMessage::OpenFile(_) => codes::OPEN_FILE,
            WindowMessage::DeviceInfo => codes::DEVICE_INFO,
            WindowMessage::DeviceOption => codes::DEVICE_OPTION,
            WindowMessage::WinOnNewMonitor => codes::WIN_ON_NEW_MONITOR,
            WindowMessage::FullscreenSwitch => codes::FULLSCREEN_SWITCH,
            WindowMessage::KeyDown(_) => codes::KEY_DOWN_APPEND,
            WindowMessage::KeyUp(_) => codes::KEY_UP_APPEND,
            WindowMessage::GoTop => codes::GO_TOP,
            WindowMessage::GoBottom => codes::GO_BOTTOM,
            WindowMessage::GoBackward => codes::GO_BACKWARD,
            WindowMessage::GoForward => codes::GO_FORWARD,
        }
    }

    /// Messages that carry no payload, as reported by a window plugin.
    ///
    /// `NULL` and `NONE` as well as payload messages yield `None`.
    pub fn from_code(code: usize) -> Option<WindowMessage> {
        Some(match code {
            codes::EXIT => WindowMessage::Exit,
            codes::CLOSE => WindowMessage::Close,
            codes::MOUSE_DOWN => WindowMessage::MouseDownQueued,
            codes::MOUSE_UP => WindowMessage::MouseUpQueued,
            codes::RESIZE => WindowMessage::Resize,
            codes::DEVICE_INFO => WindowMessage::DeviceInfo,
            codes::DEVICE_OPTION => WindowMessage::DeviceOption,
            codes::WIN_ON_NEW_MONITOR => WindowMessage::WinOnNewMonitor,
            codes::FULLSCREEN_SWITCH => WindowMessage::FullscreenSwitch,
            codes::GO_TOP => WindowMessage::GoTop,
            codes::GO_BOTTOM => WindowMessage::GoBottom,
            codes::GO_BACKWARD => WindowMessage::GoBackward,
            codes::GO_FORWARD => WindowMessage::GoForward,
            _ => return None,
        })
    }
}

struct Pending {
    messages: Vec<WindowMessage>,
    keys: [bool; 256],
    last_keys_time: f64,
}

/// Bounded event buffer filled by the window thread.
pub struct MessageList {
    pending: Mutex<Pending>,
}

impl MessageList {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                messages: Vec::with_capacity(64),
                keys: [false; 256],
                last_keys_time: f64::NEG_INFINITY,
            }),
        }
    }

    /// Queue an event. Returns false when the buffer is full.
    ///
    /// `Exit` replaces whatever is pending and is always accepted.
    pub fn append(&self, message: WindowMessage) -> bool {
        let mut pending = self.pending.lock();
        match message {
            WindowMessage::Exit => {
                pending.messages.clear();
                pending.messages.push(WindowMessage::Exit);
                true
            }
            // the window's key map replaces ours; drain reports it
            WindowMessage::Keys(map) => {
                pending.keys = *map;
                true
            }
            _ if pending.messages.len() >= MESSAGE_LIST_CAPACITY => {
                tracing::trace!("MessageList full, message {} dropped", message.code());
                false
            }
            WindowMessage::KeyDown(key) => {
                pending.keys[key.index()] = true;
                pending.messages.push(message);
                true
            }
            WindowMessage::KeyUp(key) => {
                pending.keys[key.index()] = false;
                pending.messages.push(message);
                true
            }
            _ => {
                pending.messages.push(message);
                true
            }
        }
    }

    pub fn has_exit_message(&self) -> bool {
        matches!(self.pending.lock().messages.first(), Some(WindowMessage::Exit))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the pressed-key map.
    pub fn keys_map(&self) -> [bool; 256] {
        self.pending.lock().keys
    }

    pub fn reset_keys_map(&self) {
        self.pending.lock().keys = [false; 256];
    }

    /// Take every pending event.
    ///
    /// A `Keys` event is appended at most 60 times per second so the
    /// consumer can poll held keys. If the producer holds the lock the call
    /// returns nothing and the events wait for the next frame.
    pub fn drain(&self, now: f64) -> Vec<WindowMessage> {
        let Some(mut pending) = self.pending.try_lock() else {
            return Vec::new();
        };
        if now - pending.last_keys_time >= KEYS_INTERVAL
            && pending.messages.len() < MESSAGE_LIST_CAPACITY
            && !matches!(pending.messages.first(), Some(WindowMessage::Exit))
        {
            pending.last_keys_time = now;
            let keys = Box::new(pending.keys);
            pending.messages.push(WindowMessage::Keys(keys));
        }
        std::mem::take(&mut pending.messages)
    }
}

impl Default for MessageList {
    fn default() -> Self {
        Self::new()
    }
}
