//! Info / error messages posted by background threads for the UI.

use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msg {
    pub level: MsgLevel,
    pub text: String,
}

/// Unbounded FIFO of messages.
pub struct MsgQueue {
    queue: Mutex<VecDeque<Msg>>,
}

impl MsgQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_info(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("{}", text);
        self.push(Msg { level: MsgLevel::Info, text });
    }

    pub fn push_error(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::error!("{}", text);
        self.push(Msg { level: MsgLevel::Error, text });
    }

    fn push(&self, msg: Msg) {
        self.queue.lock().push_back(msg);
    }

    pub fn pop(&self) -> Option<Msg> {
        self.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Drain everything into a single message.
    ///
    /// Texts are joined with a blank line; the result is an error if any
    /// drained message was. Returns `None` when nothing non-empty was queued.
    pub fn pop_all(&self) -> Option<Msg> {
        let drained: Vec<Msg> = self.queue.lock().drain(..).collect();
        let mut text = String::new();
        let mut has_errors = false;
        for (i, msg) in drained.iter().enumerate() {
            if i > 0 {
                text.push_str("\n\n");
            }
            text.push_str(&msg.text);
            has_errors |= msg.level == MsgLevel::Error;
        }
        if text.is_empty() {
            return None;
        }
        Some(Msg {
            level: if has_errors { MsgLevel::Error } else { MsgLevel::Info },
            text,
        })
    }
}

impl Default for MsgQueue {
    fn default() -> Self {
        Self::new()
    }
}
