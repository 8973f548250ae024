//! Ordered sibling list.
//!
//! Doubly linked through widget ids: the list stores the prev / next links
//! of its members but owns none of the widgets. Draw order is front to
//! back, hit testing walks back to front.

use super::tree::WidgetId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<WidgetId>,
    next: Option<WidgetId>,
}

#[derive(Debug, Clone, Default)]
pub struct WidgetList {
    head: Option<WidgetId>,
    tail: Option<WidgetId>,
    links: HashMap<WidgetId, Link>,
}

impl WidgetList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn first(&self) -> Option<WidgetId> {
        self.head
    }

    pub fn last(&self) -> Option<WidgetId> {
        self.tail
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.links.contains_key(&id)
    }

    pub fn next(&self, id: WidgetId) -> Option<WidgetId> {
        self.links.get(&id).and_then(|l| l.next)
    }

    pub fn prev(&self, id: WidgetId) -> Option<WidgetId> {
        self.links.get(&id).and_then(|l| l.prev)
    }

    /// Append at the tail. Returns false if `id` is already a member.
    pub fn add(&mut self, id: WidgetId) -> bool {
        if self.links.contains_key(&id) {
            return false;
        }
        let link = Link { prev: self.tail, next: None };
        match self.tail {
            Some(tail) => {
                if let Some(tail_link) = self.links.get_mut(&tail) {
                    tail_link.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.links.insert(id, link);
        true
    }

    /// Unlink `id`; absent ids are ignored.
    pub fn remove(&mut self, id: WidgetId) -> bool {
        let Some(link) = self.links.remove(&id) else {
            return false;
        };
        match link.prev {
            Some(prev) => {
                if let Some(prev_link) = self.links.get_mut(&prev) {
                    prev_link.next = link.next;
                }
            }
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => {
                if let Some(next_link) = self.links.get_mut(&next) {
                    next_link.prev = link.prev;
                }
            }
            None => self.tail = link.prev,
        }
        true
    }

    /// Move `id` to the tail so it draws last (on top).
    pub fn move_to_top(&mut self, id: WidgetId) -> bool {
        self.remove(id) && self.add(id)
    }

    /// Front to back (draw order).
    pub fn iter(&self) -> Iter<'_> {
        Iter { list: self, cursor: self.head, forward: true }
    }

    /// Back to front (hit-test order).
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter { list: self, cursor: self.tail, forward: false }
    }

    pub fn to_vec(&self) -> Vec<WidgetId> {
        self.iter().collect()
    }
}

pub struct Iter<'a> {
    list: &'a WidgetList,
    cursor: Option<WidgetId>,
    forward: bool,
}

impl Iterator for Iter<'_> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<WidgetId> {
        let current = self.cursor?;
        self.cursor = if self.forward {
            self.list.next(current)
        } else {
            self.list.prev(current)
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<WidgetId> {
        (0..n).map(|i| WidgetId::new(i, 0)).collect()
    }

    #[test]
    fn test_add_keeps_fifo_order() {
        let w = ids(4);
        let mut list = WidgetList::new();
        for id in &w {
            assert!(list.add(*id));
        }
        assert!(!list.add(w[1]));
        assert_eq!(list.to_vec(), w);
        assert_eq!(list.iter_rev().collect::<Vec<_>>(), w.iter().rev().copied().collect::<Vec<_>>());
        assert_eq!(list.first(), Some(w[0]));
        assert_eq!(list.last(), Some(w[3]));
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let w = ids(5);
        let mut list = WidgetList::new();
        w.iter().for_each(|id| {
            list.add(*id);
        });

        assert!(list.remove(w[2]));
        assert_eq!(list.to_vec(), vec![w[0], w[1], w[3], w[4]]);
        assert!(list.remove(w[0]));
        assert_eq!(list.first(), Some(w[1]));
        assert!(list.remove(w[4]));
        assert_eq!(list.last(), Some(w[3]));
        assert_eq!(list.to_vec(), vec![w[1], w[3]]);
        assert_eq!(list.prev(w[3]), Some(w[1]));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let w = ids(3);
        let mut list = WidgetList::new();
        list.add(w[0]);
        list.add(w[1]);
        assert!(!list.remove(w[2]));
        assert_eq!(list.to_vec(), vec![w[0], w[1]]);

        list.remove(w[0]);
        list.remove(w[1]);
        assert!(list.is_empty());
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
        assert!(!list.remove(w[1]));
    }

    #[test]
    fn test_move_to_top() {
        let w = ids(3);
        let mut list = WidgetList::new();
        w.iter().for_each(|id| {
            list.add(*id);
        });
        assert!(list.move_to_top(w[0]));
        assert_eq!(list.to_vec(), vec![w[1], w[2], w[0]]);
        assert!(!list.move_to_top(WidgetId::new(99, 0)));
    }

    #[test]
    fn test_random_sequence_matches_vec_model() {
        // deterministic pseudo-random ops checked against a Vec
        let w = ids(16);
        let mut list = WidgetList::new();
        let mut model: Vec<WidgetId> = Vec::new();
        let mut seed: u32 = 12345;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let id = w[(seed >> 16) as usize % w.len()];
            if (seed >> 8) % 3 == 0 {
                list.remove(id);
                model.retain(|x| *x != id);
            } else if !model.contains(&id) {
                list.add(id);
                model.push(id);
            }
            assert_eq!(list.to_vec(), model);
            assert_eq!(list.len(), model.len());
        }
    }
}
