//! Drawer plugins: the application logic that draws into a window.

use super::ffi::{self, DrawView, OpenInfo, RawInstance, RawMessage, RawOpenInfo, StBool};
use super::{PluginError, PluginLibrary, SymbolSource};
use crate::queues::WindowMessage;
use std::ffi::{c_char, CStr};
use std::path::Path;
use std::ptr::NonNull;

type DrawerNewFn = unsafe extern "C" fn() -> RawInstance;
type DrawerDelFn = unsafe extern "C" fn(RawInstance);
type DrawerInitFn = unsafe extern "C" fn(RawInstance, RawInstance) -> StBool;
type DrawerOpenFn = unsafe extern "C" fn(RawInstance, *const RawOpenInfo) -> StBool;
type DrawerParseCallbackFn = unsafe extern "C" fn(RawInstance, *mut RawMessage);
type DrawerStglDrawFn = unsafe extern "C" fn(RawInstance, u32);
type GetMimeDescriptionFn = unsafe extern "C" fn() -> *const c_char;

/// Required drawer exports.
pub const DRAWER_SYMBOLS: &[&str] = &[
    "StDrawer_new",
    "StDrawer_del",
    "StDrawer_init",
    "StDrawer_open",
    "StDrawer_parseCallback",
    "StDrawer_stglDraw",
];

/// What a drawer can do, whether backed by a plugin or built in.
pub trait DrawerInterface {
    /// Attach to a window; `window` is the raw window instance.
    fn init(&mut self, window: RawInstance) -> Result<(), PluginError>;

    fn open(&mut self, info: &OpenInfo) -> Result<(), PluginError>;

    /// Let the drawer consume window events.
    fn parse_callback(&mut self, messages: &[WindowMessage]);

    fn stgl_draw(&mut self, view: DrawView);
}

#[derive(Clone, Copy)]
struct DrawerFunctions {
    new: DrawerNewFn,
    del: DrawerDelFn,
    init: DrawerInitFn,
    open: DrawerOpenFn,
    parse_callback: DrawerParseCallbackFn,
    stgl_draw: DrawerStglDrawFn,
    mime_description: Option<GetMimeDescriptionFn>,
}

impl DrawerFunctions {
    fn resolve(lib: &impl SymbolSource) -> Result<Self, PluginError> {
        unsafe {
            Ok(Self {
                new: lib.required("StDrawer_new")?,
                del: lib.required("StDrawer_del")?,
                init: lib.required("StDrawer_init")?,
                open: lib.required("StDrawer_open")?,
                parse_callback: lib.required("StDrawer_parseCallback")?,
                stgl_draw: lib.required("StDrawer_stglDraw")?,
                mime_description: lib.optional("getMIMEDescription"),
            })
        }
    }
}

/// A loaded and instantiated drawer plugin.
pub struct Drawer {
    funcs: DrawerFunctions,
    instance: NonNull<std::ffi::c_void>,
    // dropped last so `del` still has code to run
    library: PluginLibrary,
}

impl Drawer {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let library = PluginLibrary::open(path)?;
        let funcs = DrawerFunctions::resolve(&library)?;
        let raw = unsafe { (funcs.new)() };
        let instance = NonNull::new(raw)
            .ok_or_else(|| PluginError::NullInstance(format!("{}: StDrawer_new", library.path().display())))?;
        tracing::info!("Drawer instantiated from {}", library.path().display());
        Ok(Self { funcs, instance, library })
    }

    pub fn path(&self) -> &Path {
        self.library.path()
    }

    /// MIME list advertised by the plugin (`mime:ext:description;...`).
    pub fn mime_description(&self) -> Option<String> {
        let f = self.funcs.mime_description?;
        let ptr = unsafe { f() };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

impl DrawerInterface for Drawer {
    fn init(&mut self, window: RawInstance) -> Result<(), PluginError> {
        if unsafe { (self.funcs.init)(self.instance.as_ptr(), window) } {
            Ok(())
        } else {
            Err(PluginError::CallFailed("StDrawer_init"))
        }
    }

    fn open(&mut self, info: &OpenInfo) -> Result<(), PluginError> {
        let strings = info.to_c_strings()?;
        let raw = strings.as_raw();
        if unsafe { (self.funcs.open)(self.instance.as_ptr(), &raw) } {
            Ok(())
        } else {
            Err(PluginError::CallFailed("StDrawer_open"))
        }
    }

    fn parse_callback(&mut self, messages: &[WindowMessage]) {
        let mut list = ffi::raw_message_list(messages);
        unsafe { (self.funcs.parse_callback)(self.instance.as_ptr(), list.as_mut_ptr()) };
    }

    fn stgl_draw(&mut self, view: DrawView) {
        unsafe { (self.funcs.stgl_draw)(self.instance.as_ptr(), view as u32) };
    }
}

impl Drop for Drawer {
    fn drop(&mut self) {
        tracing::debug!("Destroying drawer from {}", self.library.path().display());
        unsafe { (self.funcs.del)(self.instance.as_ptr()) };
    }
}

impl std::fmt::Debug for Drawer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawer").field("path", &self.library.path()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Drawer::load("/nonexistent/StImageViewer.so"),
            Err(PluginError::LibraryLoad { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_library_without_drawer_exports() {
        // libc loads fine but exports none of the drawer functions
        match Drawer::load("libc.so.6") {
            Err(PluginError::MissingSymbol { symbol, .. }) => assert_eq!(symbol, "StDrawer_new"),
            other => panic!("expected missing symbol, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_partial_export_table_is_rejected() {
        use crate::plugin::test_support::FakeLibrary;

        let partial = FakeLibrary::new("StPartial.so").exporting(DRAWER_SYMBOLS, &["StDrawer_parseCallback"]);
        match DrawerFunctions::resolve(&partial) {
            Err(PluginError::MissingSymbol { symbol, path }) => {
                assert_eq!(symbol, "StDrawer_parseCallback");
                assert_eq!(path, std::path::PathBuf::from("StPartial.so"));
            }
            other => panic!("expected missing symbol, got {:?}", other.map(|_| ())),
        }

        let complete = FakeLibrary::new("StComplete.so").exporting(DRAWER_SYMBOLS, &[]);
        let funcs = DrawerFunctions::resolve(&complete).unwrap();
        assert!(funcs.mime_description.is_none());
    }

    struct Recorder {
        opened: Vec<OpenInfo>,
        draws: Vec<DrawView>,
    }

    impl DrawerInterface for Recorder {
        fn init(&mut self, _window: RawInstance) -> Result<(), PluginError> {
            Ok(())
        }

        fn open(&mut self, info: &OpenInfo) -> Result<(), PluginError> {
            self.opened.push(info.clone());
            Ok(())
        }

        fn parse_callback(&mut self, _messages: &[WindowMessage]) {}

        fn stgl_draw(&mut self, view: DrawView) {
            self.draws.push(view);
        }
    }

    #[test]
    fn test_in_process_drawer_through_trait() {
        let mut recorder = Recorder { opened: Vec::new(), draws: Vec::new() };
        let drawer: &mut dyn DrawerInterface = &mut recorder;
        drawer.init(std::ptr::null_mut()).unwrap();
        drawer.open(&OpenInfo::from_path("left.jpg")).unwrap();
        drawer.stgl_draw(DrawView::Left);
        drawer.stgl_draw(DrawView::Right);
        assert_eq!(recorder.opened.len(), 1);
        assert_eq!(recorder.draws, vec![DrawView::Left, DrawView::Right]);
    }
}
