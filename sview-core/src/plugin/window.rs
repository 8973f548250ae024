//! Window function table exported by the core window library.
//!
//! Renderers create their window through the same library, so the table is
//! resolved once and shared (`Arc`) by every [`Window`].

use super::ffi::{self, RawInstance, RawMessage, StBool};
use super::{PluginError, PluginLibrary, SymbolSource};
use crate::geometry::{PointD, RectI};
use crate::keys::{MouseButton, NO_MOUSE};
use crate::queues::WindowMessage;
use std::ffi::{c_char, CString};
use std::path::Path;
use std::sync::Arc;

type WindowNewFn = unsafe extern "C" fn() -> RawInstance;
type WindowDelFn = unsafe extern "C" fn(RawInstance);
type WindowCloseFn = unsafe extern "C" fn(RawInstance);
type WindowSetTitleFn = unsafe extern "C" fn(RawInstance, *const c_char);
type WindowGetBoolFn = unsafe extern "C" fn(RawInstance) -> StBool;
type WindowSetBoolFn = unsafe extern "C" fn(RawInstance, StBool);
type WindowShowFn = unsafe extern "C" fn(RawInstance, *const i32, *const StBool);
type WindowGetPlacementFn = unsafe extern "C" fn(RawInstance, *mut RectI);
type WindowSetPlacementFn = unsafe extern "C" fn(RawInstance, *const RectI);
type WindowGetMousePosFn = unsafe extern "C" fn(RawInstance, *mut PointD);
type WindowGetMouseClickFn = unsafe extern "C" fn(RawInstance, *mut PointD) -> i32;
type WindowStglIntFn = unsafe extern "C" fn(RawInstance, *const i32);
type WindowGetFpsFn = unsafe extern "C" fn(RawInstance) -> f64;
type WindowSetFpsFn = unsafe extern "C" fn(RawInstance, *const f64);
type WindowCallbackFn = unsafe extern "C" fn(RawInstance, *mut RawMessage);
type WindowAppendMessageFn = unsafe extern "C" fn(RawInstance, *const RawMessage) -> StBool;

/// Which part of a window `show` / `stgl_swap` addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WindowPart {
    /// Both master and slave windows.
    All = -1,
    Master = 0,
    Slave = 1,
}

/// Resolved StWindow exports.
#[derive(Clone, Copy)]
pub struct WindowFunctions {
    new: WindowNewFn,
    del: WindowDelFn,
    close: WindowCloseFn,
    set_title: WindowSetTitleFn,
    is_active: WindowGetBoolFn,
    is_stereo_output: WindowGetBoolFn,
    set_stereo_output: WindowSetBoolFn,
    show: WindowShowFn,
    show_cursor: WindowSetBoolFn,
    is_fullscreen: WindowGetBoolFn,
    set_fullscreen: WindowSetBoolFn,
    get_placement: WindowGetPlacementFn,
    set_placement: WindowSetPlacementFn,
    get_mouse_pos: WindowGetMousePosFn,
    get_mouse_down: WindowGetMouseClickFn,
    get_mouse_up: WindowGetMouseClickFn,
    stgl_swap: WindowStglIntFn,
    stgl_make_current: WindowStglIntFn,
    stgl_get_target_fps: WindowGetFpsFn,
    stgl_set_target_fps: WindowSetFpsFn,
    callback: WindowCallbackFn,
    append_message: WindowAppendMessageFn,
}

/// The library providing the window table; kept alive with it.
pub struct WindowLibrary {
    pub funcs: WindowFunctions,
    library: PluginLibrary,
}

impl WindowLibrary {
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>, PluginError> {
        let library = PluginLibrary::open(path)?;
        let funcs = unsafe {
            WindowFunctions {
                new: library.required("StWindow_new")?,
                del: library.required("StWindow_del")?,
                close: library.required("StWindow_close")?,
                set_title: library.required("StWindow_setTitle")?,
                is_active: library.required("StWindow_isActive")?,
                is_stereo_output: library.required("StWindow_isStereoOutput")?,
                set_stereo_output: library.required("StWindow_setStereoOutput")?,
                show: library.required("StWindow_show")?,
                show_cursor: library.required("StWindow_showCursor")?,
                is_fullscreen: library.required("StWindow_isFullScreen")?,
                set_fullscreen: library.required("StWindow_setFullScreen")?,
                get_placement: library.required("StWindow_getPlacement")?,
                set_placement: library.required("StWindow_setPlacement")?,
                get_mouse_pos: library.required("StWindow_getMousePos")?,
                get_mouse_down: library.required("StWindow_getMouseDown")?,
                get_mouse_up: library.required("StWindow_getMouseUp")?,
                stgl_swap: library.required("StWindow_stglSwap")?,
                stgl_make_current: library.required("StWindow_stglMakeCurrent")?,
                stgl_get_target_fps: library.required("StWindow_stglGetTargetFps")?,
                stgl_set_target_fps: library.required("StWindow_stglSetTargetFps")?,
                callback: library.required("StWindow_callback")?,
                append_message: library.required("StWindow_appendMessage")?,
            }
        };
        tracing::debug!("Window functions resolved from {}", library.path().display());
        Ok(Arc::new(Self { funcs, library }))
    }

    pub fn path(&self) -> &Path {
        self.library.path()
    }
}

/// A window instance, either created here (owned) or handed out by a
/// renderer (borrowed).
pub struct Window {
    lib: Arc<WindowLibrary>,
    instance: RawInstance,
    owned: bool,
}

impl Window {
    /// Create a new window owned by the wrapper.
    pub fn create(lib: Arc<WindowLibrary>) -> Result<Self, PluginError> {
        let instance = unsafe { (lib.funcs.new)() };
        if instance.is_null() {
            return Err(PluginError::NullInstance("StWindow_new".into()));
        }
        Ok(Self { lib, instance, owned: true })
    }

    /// Wrap a window owned by someone else (typically a renderer).
    ///
    /// # Safety
    /// `instance` must be a live window created by the same library and
    /// outlive the wrapper.
    pub unsafe fn borrowed(lib: Arc<WindowLibrary>, instance: RawInstance) -> Result<Self, PluginError> {
        if instance.is_null() {
            return Err(PluginError::NullInstance("StRenderer_getStWindow".into()));
        }
        Ok(Self { lib, instance, owned: false })
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn raw(&self) -> RawInstance {
        self.instance
    }

    fn f(&self) -> &WindowFunctions {
        &self.lib.funcs
    }

    pub fn close(&self) {
        unsafe { (self.f().close)(self.instance) }
    }

    pub fn set_title(&self, title: &str) -> Result<(), PluginError> {
        let title = CString::new(title).map_err(|_| PluginError::InvalidArgument("title contains NUL".into()))?;
        unsafe { (self.f().set_title)(self.instance, title.as_ptr()) };
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        unsafe { (self.f().is_active)(self.instance) }
    }

    pub fn is_stereo_output(&self) -> bool {
        unsafe { (self.f().is_stereo_output)(self.instance) }
    }

    pub fn set_stereo_output(&self, stereo: bool) {
        unsafe { (self.f().set_stereo_output)(self.instance, stereo) }
    }

    pub fn show(&self, part: WindowPart, visible: bool) {
        let part = part as i32;
        unsafe { (self.f().show)(self.instance, &part, &visible) }
    }

    pub fn show_cursor(&self, visible: bool) {
        unsafe { (self.f().show_cursor)(self.instance, visible) }
    }

    pub fn is_fullscreen(&self) -> bool {
        unsafe { (self.f().is_fullscreen)(self.instance) }
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        unsafe { (self.f().set_fullscreen)(self.instance, fullscreen) }
    }

    pub fn placement(&self) -> RectI {
        let mut rect = RectI::default();
        unsafe { (self.f().get_placement)(self.instance, &mut rect) };
        rect
    }

    pub fn set_placement(&self, rect: &RectI) {
        unsafe { (self.f().set_placement)(self.instance, rect) }
    }

    /// Cursor in normalized window coordinates.
    pub fn mouse_pos(&self) -> PointD {
        let mut point = PointD::default();
        unsafe { (self.f().get_mouse_pos)(self.instance, &mut point) };
        point
    }

    /// Next buffered press, `None` when the window has none.
    pub fn mouse_down(&self) -> Option<(PointD, MouseButton)> {
        let mut point = PointD::default();
        let id = unsafe { (self.f().get_mouse_down)(self.instance, &mut point) };
        Self::click(id, point)
    }

    pub fn mouse_up(&self) -> Option<(PointD, MouseButton)> {
        let mut point = PointD::default();
        let id = unsafe { (self.f().get_mouse_up)(self.instance, &mut point) };
        Self::click(id, point)
    }

    fn click(id: i32, point: PointD) -> Option<(PointD, MouseButton)> {
        if id == NO_MOUSE {
            return None;
        }
        MouseButton::from_id(id).map(|button| (point, button))
    }

    pub fn stgl_swap(&self, part: WindowPart) {
        let part = part as i32;
        unsafe { (self.f().stgl_swap)(self.instance, &part) }
    }

    pub fn stgl_make_current(&self, part: WindowPart) {
        let part = part as i32;
        unsafe { (self.f().stgl_make_current)(self.instance, &part) }
    }

    pub fn target_fps(&self) -> f64 {
        unsafe { (self.f().stgl_get_target_fps)(self.instance) }
    }

    pub fn set_target_fps(&self, fps: f64) {
        unsafe { (self.f().stgl_set_target_fps)(self.instance, &fps) }
    }

    /// Pump the window's event loop and collect its messages.
    pub fn callback(&self) -> Vec<WindowMessage> {
        let mut list = vec![RawMessage::null(); crate::queues::message_list::MESSAGE_LIST_CAPACITY + 1];
        unsafe {
            (self.f().callback)(self.instance, list.as_mut_ptr());
            ffi::messages_from_raw(list.as_ptr())
        }
    }

    /// Post a message to the window.
    ///
    /// The window keeps `data` pointers past the call, so a key map is not
    /// forwarded; key codes and plain messages are.
    pub fn append_message(&self, message: &WindowMessage) -> bool {
        let raw = match message {
            WindowMessage::Keys(_) => None,
            other => RawMessage::from_message(other),
        };
        match raw {
            Some(raw) => unsafe { (self.f().append_message)(self.instance, &raw) },
            None => {
                tracing::debug!("Window: message {} carries data, not forwarded", message.code());
                false
            }
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.owned {
            unsafe { (self.lib.funcs.del)(self.instance) };
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("library", &self.lib.path())
            .field("owned", &self.owned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_window_table_is_all_or_nothing() {
        match WindowLibrary::load("libc.so.6") {
            Err(PluginError::MissingSymbol { symbol, .. }) => assert_eq!(symbol, "StWindow_new"),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("libc is not a window library"),
        }
    }

    #[test]
    fn test_click_decoding() {
        assert_eq!(Window::click(NO_MOUSE, PointD::default()), None);
        assert_eq!(
            Window::click(2, PointD::new(0.5, 0.5)),
            Some((PointD::new(0.5, 0.5), MouseButton::Right))
        );
        assert_eq!(Window::click(42, PointD::default()), None);
    }
}
