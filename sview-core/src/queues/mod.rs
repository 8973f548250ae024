//! # Thread Bridges
//!
//! Small mutex-guarded queues carrying input, messages and subtitles from
//! worker threads into the render loop.
//!
//! ```text
//! ┌──────────────┐   push    ┌────────────┐   pop (once per frame)  ┌────────────┐
//! │ input thread │──────────►│   queue    │────────────────────────►│ RootWidget │
//! │ decoder      │           │ (1 mutex)  │                         │ render loop│
//! └──────────────┘           └────────────┘                         └────────────┘
//! ```
//!
//! Producers never block on a full queue and no queue invokes callbacks while
//! holding its lock.

pub mod message_list;
pub mod messages;
pub mod mouse_clicks;
pub mod subtitles;

pub use message_list::{KeyMap, MessageList, WindowMessage};
pub use messages::{Msg, MsgLevel, MsgQueue};
pub use mouse_clicks::{MouseClick, MouseClickQueue};
pub use subtitles::{SubItem, SubQueue};
