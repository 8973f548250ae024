//! Renderer plugins: stereo output devices that own the GL window.

use super::ffi::{self, DrawView, NativeWindow, OpenInfo, RawInstance, RawMessage, RawOpenInfo, StBool};
use super::{PluginError, PluginLibrary, SymbolSource};
use crate::queues::WindowMessage;
use std::ffi::{c_char, c_void, CStr, CString};
use std::path::Path;
use std::ptr::NonNull;

type RendererNewFn = unsafe extern "C" fn() -> RawInstance;
type RendererDelFn = unsafe extern "C" fn(RawInstance);
type RendererGetWindowFn = unsafe extern "C" fn(RawInstance) -> RawInstance;
type RendererInitFn = unsafe extern "C" fn(RawInstance, *const c_char, *const i32, NativeWindow) -> StBool;
type RendererOpenFn = unsafe extern "C" fn(RawInstance, *const RawOpenInfo) -> StBool;
type RendererCallbackFn = unsafe extern "C" fn(RawInstance, *mut RawMessage);
type RendererStglDrawFn = unsafe extern "C" fn(RawInstance, u32);
type GetAboutInfoFn = unsafe extern "C" fn() -> *const c_char;
type GetDevicesInfoFn = unsafe extern "C" fn(StBool) -> *const c_void;

/// Required renderer exports.
pub const RENDERER_SYMBOLS: &[&str] = &[
    "StRenderer_new",
    "StRenderer_del",
    "StRenderer_getStWindow",
    "StRenderer_init",
    "StRenderer_open",
    "StRenderer_callback",
    "StRenderer_stglDraw",
];

/// Let the renderer pick the device.
pub const DEVICE_AUTO: i32 = -1;

pub trait RendererInterface {
    /// Create the output window on `device` (or [`DEVICE_AUTO`]).
    fn init(&mut self, device: i32, parent: NativeWindow) -> Result<(), PluginError>;

    /// Raw window instance owned by the renderer, null before `init`.
    fn window_instance(&self) -> RawInstance;

    fn open(&mut self, info: &OpenInfo) -> Result<(), PluginError>;

    /// Pump window events; returns what the renderer reported back.
    fn callback(&mut self, messages: &[WindowMessage]) -> Vec<WindowMessage>;

    fn stgl_draw(&mut self, view: DrawView);
}

#[derive(Clone, Copy)]
struct RendererFunctions {
    new: RendererNewFn,
    del: RendererDelFn,
    get_window: RendererGetWindowFn,
    init: RendererInitFn,
    open: RendererOpenFn,
    callback: RendererCallbackFn,
    stgl_draw: RendererStglDrawFn,
    about_info: Option<GetAboutInfoFn>,
    devices_info: Option<GetDevicesInfoFn>,
}

impl RendererFunctions {
    fn resolve(lib: &impl SymbolSource) -> Result<Self, PluginError> {
        unsafe {
            Ok(Self {
                new: lib.required("StRenderer_new")?,
                del: lib.required("StRenderer_del")?,
                get_window: lib.required("StRenderer_getStWindow")?,
                init: lib.required("StRenderer_init")?,
                open: lib.required("StRenderer_open")?,
                callback: lib.required("StRenderer_callback")?,
                stgl_draw: lib.required("StRenderer_stglDraw")?,
                about_info: lib.optional("getAboutInfo"),
                devices_info: lib.optional("getDevicesInfo"),
            })
        }
    }
}

/// A loaded and instantiated renderer plugin.
pub struct Renderer {
    funcs: RendererFunctions,
    instance: NonNull<c_void>,
    library: PluginLibrary,
}

impl Renderer {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let library = PluginLibrary::open(path)?;
        let funcs = RendererFunctions::resolve(&library)?;
        let raw = unsafe { (funcs.new)() };
        let instance = NonNull::new(raw)
            .ok_or_else(|| PluginError::NullInstance(format!("{}: StRenderer_new", library.path().display())))?;
        tracing::info!("Renderer instantiated from {}", library.path().display());
        Ok(Self { funcs, instance, library })
    }

    pub fn path(&self) -> &Path {
        self.library.path()
    }

    pub fn about_info(&self) -> Option<String> {
        let f = self.funcs.about_info?;
        let ptr = unsafe { f() };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }

    /// Whether the plugin can enumerate its stereo devices.
    pub fn supports_device_detection(&self) -> bool {
        self.funcs.devices_info.is_some()
    }
}

impl RendererInterface for Renderer {
    fn init(&mut self, device: i32, parent: NativeWindow) -> Result<(), PluginError> {
        let path = CString::new(self.library.path().to_string_lossy().as_bytes())
            .map_err(|_| PluginError::InvalidArgument("renderer path contains NUL".into()))?;
        let ok = unsafe { (self.funcs.init)(self.instance.as_ptr(), path.as_ptr(), &device, parent) };
        if ok {
            tracing::debug!("Renderer initialized on device {}", device);
            Ok(())
        } else {
            Err(PluginError::CallFailed("StRenderer_init"))
        }
    }

    fn window_instance(&self) -> RawInstance {
        unsafe { (self.funcs.get_window)(self.instance.as_ptr()) }
    }

    fn open(&mut self, info: &OpenInfo) -> Result<(), PluginError> {
        let strings = info.to_c_strings()?;
        let raw = strings.as_raw();
        if unsafe { (self.funcs.open)(self.instance.as_ptr(), &raw) } {
            Ok(())
        } else {
            Err(PluginError::CallFailed("StRenderer_open"))
        }
    }

    fn callback(&mut self, messages: &[WindowMessage]) -> Vec<WindowMessage> {
        // the plugin fills the buffer in place, so leave room for its events
        let mut list = ffi::raw_message_list(messages);
        list.resize(crate::queues::message_list::MESSAGE_LIST_CAPACITY + 1, RawMessage::null());
        unsafe {
            (self.funcs.callback)(self.instance.as_ptr(), list.as_mut_ptr());
            ffi::messages_from_raw(list.as_ptr())
        }
    }

    fn stgl_draw(&mut self, view: DrawView) {
        unsafe { (self.funcs.stgl_draw)(self.instance.as_ptr(), view as u32) };
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        tracing::debug!("Destroying renderer from {}", self.library.path().display());
        unsafe { (self.funcs.del)(self.instance.as_ptr()) };
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").field("path", &self.library.path()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_no_partial_table() {
        match Renderer::load("libc.so.6") {
            Err(PluginError::MissingSymbol { symbol, .. }) => assert_eq!(symbol, "StRenderer_new"),
            other => panic!("expected missing symbol, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_partial_export_table_is_rejected() {
        use crate::plugin::test_support::FakeLibrary;

        for missing in RENDERER_SYMBOLS {
            let partial = FakeLibrary::new("StOutPartial.so").exporting(RENDERER_SYMBOLS, &[*missing]);
            match RendererFunctions::resolve(&partial) {
                Err(PluginError::MissingSymbol { symbol, .. }) => assert_eq!(symbol, *missing),
                other => panic!("expected {} to be missing, got {:?}", missing, other.map(|_| ())),
            }
        }

        let complete = FakeLibrary::new("StOutComplete.so").exporting(RENDERER_SYMBOLS, &[]);
        let funcs = RendererFunctions::resolve(&complete).unwrap();
        assert!(funcs.about_info.is_none());
        assert!(funcs.devices_info.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Renderer::load("/nonexistent/StOutAnaglyph.so"),
            Err(PluginError::LibraryLoad { .. })
        ));
    }
}
