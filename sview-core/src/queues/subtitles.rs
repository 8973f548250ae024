//! Subtitle items gated by presentation timestamp.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One subtitle entry shown during `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubItem {
    pub text: String,
    /// PTS to show the item, seconds.
    pub start: f64,
    /// PTS to hide the item, seconds.
    pub end: f64,
}

impl SubItem {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn is_visible_at(&self, pts: f64) -> bool {
        pts >= self.start && pts < self.end
    }
}

/// FIFO of subtitle items.
///
/// Items must be pushed in non-decreasing `start` order: [`pop`](Self::pop)
/// only looks at the queue head, so an item pushed out of order may be
/// discarded before it was shown.
pub struct SubQueue {
    queue: Mutex<VecDeque<Arc<SubItem>>>,
}

impl SubQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn push(&self, item: SubItem) {
        let mut queue = self.queue.lock();
        if let Some(last) = queue.back() {
            if item.start < last.start {
                tracing::debug!(
                    "SubQueue: item at {:.3}s pushed after {:.3}s, may be dropped unseen",
                    item.start,
                    last.start
                );
            }
        }
        queue.push_back(Arc::new(item));
    }

    /// Return the item to show at `pts`, dropping outdated ones.
    ///
    /// Items whose `end <= pts` are discarded. If the new head covers `pts`
    /// it is removed and returned; an item that has not started yet stays
    /// queued.
    pub fn pop(&self, pts: f64) -> Option<Arc<SubItem>> {
        let mut queue = self.queue.lock();
        while let Some(front) = queue.front() {
            if front.end <= pts {
                queue.pop_front();
                continue;
            }
            if front.start <= pts {
                return queue.pop_front();
            }
            return None;
        }
        None
    }
}

impl Default for SubQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_respects_window() {
        let queue = SubQueue::new();
        queue.push(SubItem::new("one", 1.0, 2.0));
        queue.push(SubItem::new("two", 3.0, 4.0));

        assert!(queue.pop(0.5).is_none());
        assert_eq!(queue.pop(1.5).unwrap().text, "one");
        // already popped
        assert!(queue.pop(1.6).is_none());
        assert_eq!(queue.pop(3.0).unwrap().text, "two");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stale_items_are_discarded() {
        let queue = SubQueue::new();
        queue.push(SubItem::new("a", 0.0, 1.0));
        queue.push(SubItem::new("b", 1.0, 2.0));
        queue.push(SubItem::new("c", 2.0, 3.0));

        // jump past the first two
        assert_eq!(queue.pop(2.5).unwrap().text, "c");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_never_returns_expired_item() {
        let queue = SubQueue::new();
        for i in 0..20 {
            let start = i as f64 * 0.5;
            queue.push(SubItem::new(format!("{}", i), start, start + 0.7));
        }
        let mut pts = 0.0;
        while pts < 12.0 {
            if let Some(item) = queue.pop(pts) {
                assert!(item.end > pts);
                assert!(item.start <= pts);
            }
            pts += 0.3;
        }
    }

    #[test]
    fn test_end_is_exclusive() {
        let queue = SubQueue::new();
        queue.push(SubItem::new("x", 1.0, 2.0));
        assert!(queue.pop(2.0).is_none());
        assert!(queue.is_empty());
    }
}
