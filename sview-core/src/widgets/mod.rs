//! # Widgets
//!
//! Retained GUI drawn on top of the stereo picture.
//!
//! ```text
//! ┌─────────────────────────── RootWidget ───────────────────────────┐
//! │  MouseClickQueue ──► mouse_down / mouse_up ──► hit test           │
//! │  window messages ──► key_down / key_up     ──► focus chain        │
//! │                                                                   │
//! │  WidgetTree (arena)                                               │
//! │    root ─┬─ Menu ── MenuItem ── Menu ── MenuItem ...              │
//! │          ├─ ScrollArea ── content                                 │
//! │          ├─ SubtitlesView ◄── SubQueue                            │
//! │          └─ MessageBox ── TextArea, Button                        │
//! │                                                                   │
//! │  update(now): delayed destroys, fades, init, update               │
//! │  draw()     : DrawList ──► renderer                               │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

pub mod button;
pub mod draw;
pub mod list;
pub mod menu;
pub mod message_box;
pub mod root;
pub mod scroll_area;
pub mod subtitles_view;
pub mod text_area;
pub mod tree;
pub mod widget;

pub use button::Button;
pub use draw::{Color, DrawCommand, DrawList};
pub use list::WidgetList;
pub use menu::{Menu, MenuItem, MenuItemKind, MenuOrient};
pub use message_box::MessageBox;
pub use root::{ClickOutcome, Gesture, RootWidget};
pub use scroll_area::ScrollArea;
pub use subtitles_view::{PtsClock, SubtitlesView};
pub use text_area::TextArea;
pub use tree::{Destroyer, WidgetError, WidgetId, WidgetSignals, WidgetTree};
pub use widget::{DrawCtx, Panel, Widget, WidgetCtx};
