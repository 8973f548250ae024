//! Virtual key codes, mouse buttons and the shared key-state table.

use parking_lot::Mutex;

/// Layout-independent virtual key code (Windows VK numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtKey(pub u8);

impl VirtKey {
    pub const NULL: VirtKey = VirtKey(0x00);
    pub const BACK: VirtKey = VirtKey(0x08);
    pub const TAB: VirtKey = VirtKey(0x09);
    pub const RETURN: VirtKey = VirtKey(0x0D);
    pub const SHIFT: VirtKey = VirtKey(0x10);
    pub const CONTROL: VirtKey = VirtKey(0x11);
    pub const MENU: VirtKey = VirtKey(0x12);
    pub const ESCAPE: VirtKey = VirtKey(0x1B);
    pub const SPACE: VirtKey = VirtKey(0x20);
    pub const PAGE_UP: VirtKey = VirtKey(0x21);
    pub const PAGE_DOWN: VirtKey = VirtKey(0x22);
    pub const END: VirtKey = VirtKey(0x23);
    pub const HOME: VirtKey = VirtKey(0x24);
    pub const LEFT: VirtKey = VirtKey(0x25);
    pub const UP: VirtKey = VirtKey(0x26);
    pub const RIGHT: VirtKey = VirtKey(0x27);
    pub const DOWN: VirtKey = VirtKey(0x28);
    pub const INSERT: VirtKey = VirtKey(0x2D);
    pub const DELETE: VirtKey = VirtKey(0x2E);
    pub const F1: VirtKey = VirtKey(0x70);
    pub const F12: VirtKey = VirtKey(0x7B);

    /// Digit key `0`..`9`.
    pub fn digit(n: u8) -> Option<VirtKey> {
        (n <= 9).then(|| VirtKey(0x30 + n))
    }

    /// Letter key, case-insensitive.
    pub fn letter(c: char) -> Option<VirtKey> {
        let upper = c.to_ascii_uppercase();
        upper.is_ascii_uppercase().then(|| VirtKey(upper as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Modifier flags combined with a key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyFlags(pub u32);

impl KeyFlags {
    pub const NONE: KeyFlags = KeyFlags(0);
    pub const SHIFT: KeyFlags = KeyFlags(1 << 8);
    pub const CONTROL: KeyFlags = KeyFlags(1 << 9);
    pub const MENU: KeyFlags = KeyFlags(1 << 10);
    pub const COMMAND: KeyFlags = KeyFlags(1 << 11);

    pub fn contains(self, other: KeyFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for KeyFlags {
    type Output = KeyFlags;

    fn bitor(self, rhs: Self) -> Self {
        KeyFlags(self.0 | rhs.0)
    }
}

/// Key press / release delivered to widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub key: VirtKey,
    pub flags: KeyFlags,
    /// Event timestamp in seconds.
    pub time: f64,
}

impl KeyEvent {
    pub fn new(key: VirtKey, time: f64) -> Self {
        Self { key, flags: KeyFlags::NONE, time }
    }
}

/// Mouse buttons, numbered as in the window plugin ABI.
///
/// Wheel steps are reported as pseudo-buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MouseButton {
    Left = 1,
    Right = 2,
    Middle = 3,
    X1 = 4,
    X2 = 5,
    ScrollUp = 6,
    ScrollDown = 7,
    ScrollLeft = 8,
    ScrollRight = 9,
}

/// Id reserved for "no mouse event".
pub const NO_MOUSE: i32 = 0;

/// Number of real buttons tracked per widget.
pub const MOUSE_BUTTONS: usize = 5;

impl MouseButton {
    pub fn from_id(id: i32) -> Option<MouseButton> {
        Some(match id {
            1 => MouseButton::Left,
            2 => MouseButton::Right,
            3 => MouseButton::Middle,
            4 => MouseButton::X1,
            5 => MouseButton::X2,
            6 => MouseButton::ScrollUp,
            7 => MouseButton::ScrollDown,
            8 => MouseButton::ScrollLeft,
            9 => MouseButton::ScrollRight,
            _ => return None,
        })
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn is_scroll(self) -> bool {
        self.id() > MOUSE_BUTTONS as i32
    }

    /// Slot in per-widget click state, `None` for wheel pseudo-buttons.
    pub fn slot(self) -> Option<usize> {
        (!self.is_scroll()).then(|| (self.id() - 1) as usize)
    }

    /// Vertical / horizontal wheel direction, +1 for up or left.
    pub fn scroll_steps(self) -> Option<ScrollDelta> {
        match self {
            MouseButton::ScrollUp => Some(ScrollDelta { dx: 0, dy: 1 }),
            MouseButton::ScrollDown => Some(ScrollDelta { dx: 0, dy: -1 }),
            MouseButton::ScrollLeft => Some(ScrollDelta { dx: 1, dy: 0 }),
            MouseButton::ScrollRight => Some(ScrollDelta { dx: -1, dy: 0 }),
            _ => None,
        }
    }
}

/// Wheel steps; positive `dy` scrolls up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollDelta {
    pub dx: i32,
    pub dy: i32,
}

const KEYS_COUNT: usize = 256;

struct KeyTable {
    down: [bool; KEYS_COUNT],
    times: [f64; KEYS_COUNT],
}

/// Pressed state and last-change timestamp per virtual key.
///
/// Written from the input thread, read from the render thread.
pub struct KeysState {
    table: Mutex<KeyTable>,
}

impl KeysState {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(KeyTable {
                down: [false; KEYS_COUNT],
                times: [0.0; KEYS_COUNT],
            }),
        }
    }

    /// Release every key (e.g. the window lost input focus).
    pub fn reset(&self) {
        let mut table = self.table.lock();
        table.down = [false; KEYS_COUNT];
        table.times = [0.0; KEYS_COUNT];
    }

    pub fn key_down(&self, key: VirtKey, time: f64) {
        let mut table = self.table.lock();
        // auto-repeat keeps the original press time
        if !table.down[key.index()] {
            table.down[key.index()] = true;
            table.times[key.index()] = time;
        }
    }

    pub fn key_up(&self, key: VirtKey, time: f64) {
        let mut table = self.table.lock();
        table.down[key.index()] = false;
        table.times[key.index()] = time;
    }

    pub fn is_key_down(&self, key: VirtKey) -> bool {
        self.table.lock().down[key.index()]
    }

    /// Timestamp of the last press or release.
    pub fn key_time(&self, key: VirtKey) -> f64 {
        self.table.lock().times[key.index()]
    }

    /// Seconds the key has been held at `now`, `None` when released.
    pub fn hold_duration(&self, key: VirtKey, now: f64) -> Option<f64> {
        let table = self.table.lock();
        table.down[key.index()].then(|| (now - table.times[key.index()]).max(0.0))
    }

    /// Snapshot of all currently pressed keys.
    pub fn pressed_keys(&self) -> Vec<VirtKey> {
        let table = self.table.lock();
        (0..KEYS_COUNT)
            .filter(|&i| table.down[i])
            .map(|i| VirtKey(i as u8))
            .collect()
    }
}

impl Default for KeysState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_duration() {
        let keys = KeysState::new();
        keys.key_down(VirtKey::SPACE, 1.0);
        // repeat should not restart the hold timer
        keys.key_down(VirtKey::SPACE, 1.5);
        assert!(keys.is_key_down(VirtKey::SPACE));
        assert_eq!(keys.hold_duration(VirtKey::SPACE, 3.0), Some(2.0));

        keys.key_up(VirtKey::SPACE, 3.5);
        assert!(!keys.is_key_down(VirtKey::SPACE));
        assert_eq!(keys.key_time(VirtKey::SPACE), 3.5);
        assert_eq!(keys.hold_duration(VirtKey::SPACE, 4.0), None);
    }

    #[test]
    fn test_reset_releases_all() {
        let keys = KeysState::new();
        keys.key_down(VirtKey::LEFT, 0.1);
        keys.key_down(VirtKey::letter('a').unwrap(), 0.2);
        assert_eq!(keys.pressed_keys().len(), 2);
        keys.reset();
        assert!(keys.pressed_keys().is_empty());
    }

    #[test]
    fn test_mouse_ids() {
        assert_eq!(MouseButton::from_id(1), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_id(NO_MOUSE), None);
        assert!(MouseButton::ScrollUp.is_scroll());
        assert_eq!(MouseButton::Middle.slot(), Some(2));
        assert_eq!(MouseButton::ScrollDown.slot(), None);
    }
}
