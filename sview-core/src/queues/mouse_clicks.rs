//! Fixed-capacity ring buffer of mouse clicks.

use crate::geometry::PointD;
use crate::keys::{MouseButton, NO_MOUSE};
use parking_lot::Mutex;

/// Number of clicks buffered between two frames.
pub const MOUSE_CLICK_CAPACITY: usize = 8;

/// One buffered click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseClick {
    /// Normalized cursor position.
    pub point: PointD,
    /// Raw button id, see [`MouseButton::from_id`].
    pub button: i32,
}

impl MouseClick {
    pub fn new(point: PointD, button: MouseButton) -> Self {
        Self { point, button: button.id() }
    }

    pub fn mouse_button(&self) -> Option<MouseButton> {
        MouseButton::from_id(self.button)
    }
}

struct Ring {
    slots: [MouseClick; MOUSE_CLICK_CAPACITY],
    front: usize,
    back: usize,
    size: usize,
}

/// Bounded FIFO: pushes onto a full queue are dropped.
pub struct MouseClickQueue {
    ring: Mutex<Ring>,
}

impl MouseClickQueue {
    pub fn new() -> Self {
        let empty = MouseClick {
            point: PointD::default(),
            button: NO_MOUSE,
        };
        Self {
            ring: Mutex::new(Ring {
                slots: [empty; MOUSE_CLICK_CAPACITY],
                front: 0,
                back: 0,
                size: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        MOUSE_CLICK_CAPACITY
    }

    pub fn len(&self) -> usize {
        self.ring.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a click. Returns false if the queue was full and the click
    /// was dropped.
    pub fn push(&self, point: PointD, button: i32) -> bool {
        let mut ring = self.ring.lock();
        if ring.size == MOUSE_CLICK_CAPACITY {
            tracing::trace!("MouseClickQueue full, click #{} dropped", button);
            return false;
        }
        let back = ring.back;
        ring.slots[back] = MouseClick { point, button };
        ring.back = (back + 1) % MOUSE_CLICK_CAPACITY;
        ring.size += 1;
        true
    }

    /// Take the oldest click, `None` meaning "no mouse".
    pub fn pop(&self) -> Option<MouseClick> {
        let mut ring = self.ring.lock();
        if ring.size == 0 {
            return None;
        }
        let front = ring.front;
        let click = ring.slots[front];
        ring.front = (front + 1) % MOUSE_CLICK_CAPACITY;
        ring.size -= 1;
        Some(click)
    }

    /// Raw form of [`pop`](Self::pop): button id or `NO_MOUSE`.
    pub fn pop_raw(&self, point: &mut PointD) -> i32 {
        match self.pop() {
            Some(click) => {
                *point = click.point;
                click.button
            }
            None => NO_MOUSE,
        }
    }

    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.front = ring.back;
        ring.size = 0;
    }
}

impl Default for MouseClickQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn pt(i: usize) -> PointD {
        PointD::new(i as f64 * 0.1, 0.5)
    }

    #[test]
    fn test_fifo_order() {
        let queue = MouseClickQueue::new();
        for i in 0..5 {
            assert!(queue.push(pt(i), MouseButton::Left.id()));
        }
        for i in 0..5 {
            let click = queue.pop().unwrap();
            assert_eq!(click.point, pt(i));
            assert_eq!(click.mouse_button(), Some(MouseButton::Left));
        }
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_overflow_drops_newest() {
        let queue = MouseClickQueue::new();
        for i in 0..9 {
            let accepted = queue.push(pt(i), (i % 3) as i32 + 1);
            assert_eq!(accepted, i < 8);
        }
        for i in 0..8 {
            let click = queue.pop().unwrap();
            assert_eq!(click.point, pt(i));
            assert_eq!(click.button, (i % 3) as i32 + 1);
        }
        let mut point = PointD::default();
        assert_eq!(queue.pop_raw(&mut point), NO_MOUSE);
    }

    #[test]
    fn test_wraps_around() {
        let queue = MouseClickQueue::new();
        for round in 0..3 {
            for i in 0..6 {
                queue.push(pt(round * 10 + i), 1);
            }
            for i in 0..6 {
                assert_eq!(queue.pop().unwrap().point, pt(round * 10 + i));
            }
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let queue = MouseClickQueue::new();
        queue.push(pt(1), 1);
        queue.push(pt(2), 2);
        queue.clear();
        assert!(queue.pop().is_none());
        queue.push(pt(3), 3);
        assert_eq!(queue.pop().unwrap().point, pt(3));
    }

    #[test]
    fn test_concurrent_producers_never_exceed_capacity() {
        let queue = Arc::new(MouseClickQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        queue.push(pt(t * 10 + i), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), MOUSE_CLICK_CAPACITY);
    }
}
