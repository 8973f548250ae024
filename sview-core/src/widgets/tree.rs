//! Widget arena.
//!
//! Nodes are stored in a slot vector and addressed by generation-checked
//! [`WidgetId`]s: a handle to a destroyed widget never aliases the widget
//! that reuses its slot.
//!
//! ```text
//!   slots:  [0: root] [1: menu] [2: item] [3: free] [4: button]
//!              │         ▲ │       ▲
//!              └─children┘ └─children┘      free list: [3]
//! ```

use super::list::WidgetList;
use super::widget::{Widget, WidgetCtx};
use crate::geometry::{compute_absolute, Corner, RectI};
use crate::keys::{MouseButton, MOUSE_BUTTONS};
use crate::signal::Signal;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Fade-in duration of [`WidgetTree::set_visibility`].
pub const FADE_IN_MS: f64 = 2500.0;
/// Fade-out duration.
pub const FADE_OUT_MS: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

impl WidgetId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Widget {0} no longer exists")]
    StaleHandle(WidgetId),

    #[error("Widget {0} cannot be moved into its own subtree")]
    Cycle(WidgetId),

    #[error("The root widget cannot be {0}")]
    RootWidget(&'static str),

    #[error("Widget {id} is not a {expected}")]
    WrongType { id: WidgetId, expected: &'static str },
}

/// Click signals of one widget.
#[derive(Debug, Default)]
pub struct WidgetSignals {
    /// Button pressed over the widget.
    pub on_mouse_click: Signal<MouseButton>,
    /// Button released after a matching press.
    pub on_mouse_unclick: Signal<MouseButton>,
}

impl WidgetSignals {
    pub fn is_connected(&self) -> bool {
        self.on_mouse_click.is_connected() || self.on_mouse_unclick.is_connected()
    }
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    opacity: f32,
    visible: bool,
}

impl Fade {
    fn step(&mut self, dt: f64) {
        let ms = dt * 1000.0;
        if self.visible {
            self.opacity = (self.opacity + (ms / FADE_IN_MS) as f32).min(1.0);
        } else {
            self.opacity = (self.opacity - (ms / FADE_OUT_MS) as f32).max(0.0);
        }
    }
}

pub struct WidgetNode {
    widget: Option<Box<dyn Widget>>,
    class_name: &'static str,
    parent: Option<WidgetId>,
    children: WidgetList,
    rect: RectI,
    corner: Corner,
    fade: Fade,
    clicked: [bool; MOUSE_BUTTONS],
    user_data: usize,
    signals: Arc<WidgetSignals>,
    initialized: bool,
    init_ok: bool,
}

impl WidgetNode {
    fn new(widget: Box<dyn Widget>, parent: Option<WidgetId>, rect: RectI, corner: Corner) -> Self {
        Self {
            class_name: widget.class_name(),
            widget: Some(widget),
            parent,
            children: WidgetList::new(),
            rect,
            corner,
            fade: Fade {
                opacity: 1.0,
                visible: true,
            },
            clicked: [false; MOUSE_BUTTONS],
            user_data: 0,
            signals: Arc::new(WidgetSignals::default()),
            initialized: false,
            init_ok: true,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn children(&self) -> &WidgetList {
        &self.children
    }

    /// Rectangle relative to the parent's anchor corner.
    pub fn rect(&self) -> RectI {
        self.rect
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn opacity(&self) -> f32 {
        self.fade.opacity
    }
}

struct Slot {
    generation: u32,
    node: Option<WidgetNode>,
}

/// Shared queue of widgets to destroy at the start of the next update.
///
/// Cloneable into signal slots, e.g. the OK button of a message box.
#[derive(Debug, Clone, Default)]
pub struct Destroyer {
    queue: Arc<Mutex<Vec<WidgetId>>>,
}

impl Destroyer {
    pub fn destroy_with_delay(&self, id: WidgetId) {
        let mut queue = self.queue.lock();
        if !queue.contains(&id) {
            queue.push(id);
        }
    }

    pub fn is_pending(&self, id: WidgetId) -> bool {
        self.queue.lock().contains(&id)
    }

    pub(crate) fn take(&self) -> Vec<WidgetId> {
        std::mem::take(&mut *self.queue.lock())
    }
}

/// Owner of all widgets of one window.
pub struct WidgetTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: WidgetId,
    focus: Option<WidgetId>,
    hovered: Option<WidgetId>,
    focus_requests: Vec<Option<WidgetId>>,
    destroyer: Destroyer,
}

/// Node backing the tree root, sized to the window.
struct RootNode;

impl Widget for RootNode {
    fn class_name(&self) -> &'static str {
        "StGLRootWidget"
    }
}

impl WidgetTree {
    pub fn new(window: RectI) -> Self {
        let root_node = WidgetNode::new(Box::new(RootNode), None, window, Corner::TOP_LEFT);
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root_node),
            }],
            free: Vec::new(),
            root: WidgetId::new(0, 0),
            focus: None,
            hovered: None,
            focus_requests: Vec::new(),
            destroyer: Destroyer::default(),
        }
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn destroyer(&self) -> Destroyer {
        self.destroyer.clone()
    }

    pub fn destroy_with_delay(&self, id: WidgetId) {
        self.destroyer.destroy_with_delay(id);
    }

    /// Live widgets, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: WidgetId) -> Option<&WidgetNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn live(&self, id: WidgetId) -> Result<&WidgetNode, WidgetError> {
        self.node(id).ok_or(WidgetError::StaleHandle(id))
    }

    fn live_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode, WidgetError> {
        self.node_mut(id).ok_or(WidgetError::StaleHandle(id))
    }

    /// Insert `widget` as the last (topmost) child of `parent`.
    pub fn create<W: Widget>(
        &mut self,
        parent: WidgetId,
        widget: W,
        rect: RectI,
        corner: Corner,
    ) -> Result<WidgetId, WidgetError> {
        self.create_boxed(parent, Box::new(widget), rect, corner)
    }

    pub fn create_boxed(
        &mut self,
        parent: WidgetId,
        widget: Box<dyn Widget>,
        rect: RectI,
        corner: Corner,
    ) -> Result<WidgetId, WidgetError> {
        self.live(parent)?;
        let node = WidgetNode::new(widget, Some(parent), rect, corner);
        let class_name = node.class_name;
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                WidgetId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                WidgetId::new((self.slots.len() - 1) as u32, 0)
            }
        };
        self.live_mut(parent)?.children.add(id);
        tracing::trace!("Created {} {} under {}", class_name, id, parent);
        Ok(id)
    }

    /// Destroy `id` and its whole subtree. Returns false for stale handles.
    ///
    /// The root cannot be destroyed.
    pub fn destroy(&mut self, id: WidgetId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.node(id).map(|n| n.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.remove(id);
        }
        let subtree = self.subtree(id);
        for dead in &subtree {
            if self.focus == Some(*dead) {
                self.focus = None;
            }
            if self.hovered == Some(*dead) {
                self.hovered = None;
            }
            let slot = &mut self.slots[dead.index as usize];
            if let Some(node) = slot.node.take() {
                tracing::trace!("Destroyed {} {}", node.class_name, dead);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(dead.index);
        }
        true
    }

    /// `id` followed by all descendants, pre-order.
    pub fn subtree(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            result.push(current);
            stack.extend(node.children.iter_rev());
        }
        result
    }

    /// Move `id` to the end of `new_parent`'s children.
    pub fn reparent(&mut self, id: WidgetId, new_parent: WidgetId) -> Result<(), WidgetError> {
        if id == self.root {
            return Err(WidgetError::RootWidget("reparented"));
        }
        self.live(new_parent)?;
        let old_parent = self.live(id)?.parent;
        if id == new_parent || self.is_child(id, new_parent, true) {
            return Err(WidgetError::Cycle(id));
        }
        if let Some(old) = old_parent.and_then(|p| self.node_mut(p)) {
            old.children.remove(id);
        }
        self.live_mut(new_parent)?.children.add(id);
        self.live_mut(id)?.parent = Some(new_parent);
        Ok(())
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.node(id)?.parent
    }

    /// Children front to back; empty for stale handles.
    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.node(id).map(|n| n.children.to_vec()).unwrap_or_default()
    }

    /// Whether `id` is a child of `parent`, or any descendant when
    /// `recursive`.
    pub fn is_child(&self, parent: WidgetId, id: WidgetId, recursive: bool) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == parent {
                return true;
            }
            if !recursive {
                return false;
            }
            current = self.parent(p);
        }
        false
    }

    pub fn class_name(&self, id: WidgetId) -> Option<&'static str> {
        self.node(id).map(|n| n.class_name)
    }

    pub fn rect(&self, id: WidgetId) -> Option<RectI> {
        self.node(id).map(|n| n.rect)
    }

    pub fn set_rect(&mut self, id: WidgetId, rect: RectI) -> Result<(), WidgetError> {
        self.live_mut(id)?.rect = rect;
        Ok(())
    }

    pub fn set_corner(&mut self, id: WidgetId, corner: Corner) -> Result<(), WidgetError> {
        self.live_mut(id)?.corner = corner;
        Ok(())
    }

    /// Window rectangle in pixels.
    pub fn root_rect(&self) -> RectI {
        self.rect(self.root).unwrap_or_default()
    }

    /// Rectangle in window pixels, following corner anchors up to the root.
    pub fn absolute_rect(&self, id: WidgetId) -> Option<RectI> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c)?;
            chain.push((node.rect, node.corner));
            current = node.parent;
        }
        let (mut abs, _) = chain.pop()?;
        while let Some((rect, corner)) = chain.pop() {
            abs = compute_absolute(&abs, &rect, corner);
        }
        Some(abs)
    }

    /// Show or hide `id`. Without `force` the opacity fades over
    /// [`FADE_IN_MS`] / [`FADE_OUT_MS`]; with it the change is immediate.
    pub fn set_visibility(&mut self, id: WidgetId, visible: bool, force: bool) {
        if let Some(node) = self.node_mut(id) {
            node.fade.visible = visible;
            if force {
                node.fade.opacity = if visible { 1.0 } else { 0.0 };
            }
        }
    }

    /// Drawn at all: opacity above zero.
    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.node(id).map(|n| n.fade.opacity > 0.0).unwrap_or(false)
    }

    /// Target state of the last [`set_visibility`](Self::set_visibility).
    pub fn is_shown(&self, id: WidgetId) -> bool {
        self.node(id).map(|n| n.fade.visible).unwrap_or(false)
    }

    pub fn opacity(&self, id: WidgetId) -> f32 {
        self.node(id).map(|n| n.fade.opacity).unwrap_or(0.0)
    }

    pub(crate) fn step_fades(&mut self, dt: f64) {
        for node in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            node.fade.step(dt);
        }
    }

    pub fn user_data(&self, id: WidgetId) -> usize {
        self.node(id).map(|n| n.user_data).unwrap_or(0)
    }

    pub fn set_user_data(&mut self, id: WidgetId, data: usize) {
        if let Some(node) = self.node_mut(id) {
            node.user_data = data;
        }
    }

    pub fn signals(&self, id: WidgetId) -> Option<Arc<WidgetSignals>> {
        self.node(id).map(|n| n.signals.clone())
    }

    pub fn is_clicked(&self, id: WidgetId, button: MouseButton) -> bool {
        match (self.node(id), button.slot()) {
            (Some(node), Some(slot)) => node.clicked[slot],
            _ => false,
        }
    }

    pub(crate) fn set_clicked(&mut self, id: WidgetId, button: MouseButton, clicked: bool) {
        if let (Some(node), Some(slot)) = (self.node_mut(id), button.slot()) {
            node.clicked[slot] = clicked;
        }
    }

    pub fn focus(&self) -> Option<WidgetId> {
        self.focus
    }

    pub(crate) fn replace_focus(&mut self, focus: Option<WidgetId>) {
        self.focus = focus;
    }

    /// Ask the root to move keyboard focus after the current handler.
    pub fn request_focus(&mut self, focus: Option<WidgetId>) {
        self.focus_requests.push(focus);
    }

    pub(crate) fn take_focus_requests(&mut self) -> Vec<Option<WidgetId>> {
        std::mem::take(&mut self.focus_requests)
    }

    /// Topmost widget under the cursor after the last pointer move.
    pub fn hovered(&self) -> Option<WidgetId> {
        self.hovered
    }

    pub(crate) fn set_hovered(&mut self, hovered: Option<WidgetId>) {
        self.hovered = hovered;
    }

    pub(crate) fn init_state(&self, id: WidgetId) -> Option<(bool, bool)> {
        self.node(id).map(|n| (n.initialized, n.init_ok))
    }

    pub(crate) fn mark_initialized(&mut self, id: WidgetId, ok: bool) {
        if let Some(node) = self.node_mut(id) {
            node.initialized = true;
            node.init_ok = ok;
        }
    }

    pub fn widget(&self, id: WidgetId) -> Option<&dyn Widget> {
        self.node(id)?.widget.as_deref()
    }

    pub fn widget_as<T: Widget>(&self, id: WidgetId) -> Option<&T> {
        self.widget(id)?.as_any().downcast_ref::<T>()
    }

    pub fn widget_as_mut<T: Widget>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.node_mut(id)?.widget.as_deref_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Run `f` on the widget of `id` with mutable access to the rest of
    /// the tree.
    ///
    /// The widget is detached for the duration of the call. If `f` destroys
    /// the node the widget is dropped afterwards.
    pub fn with_widget<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut WidgetCtx<'_>) -> R,
    ) -> Option<R> {
        let mut widget = self.node_mut(id)?.widget.take()?;
        let result = {
            let mut ctx = WidgetCtx { tree: self, id };
            f(&mut *widget, &mut ctx)
        };
        if let Some(node) = self.node_mut(id) {
            node.widget = Some(widget);
        }
        Some(result)
    }
}

impl std::fmt::Debug for WidgetTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetTree")
            .field("widgets", &self.len())
            .field("focus", &self.focus)
            .field("hovered", &self.hovered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{HCorner, VCorner};
    use crate::widgets::widget::Panel;

    fn window() -> WidgetTree {
        WidgetTree::new(RectI::from_xywh(0, 0, 800, 600))
    }

    #[test]
    fn test_create_and_destroy_subtree() {
        let mut tree = window();
        let root = tree.root();
        let a = tree.create(root, Panel, RectI::from_xywh(10, 10, 100, 100), Corner::TOP_LEFT).unwrap();
        let b = tree.create(a, Panel, RectI::from_xywh(0, 0, 10, 10), Corner::TOP_LEFT).unwrap();
        let c = tree.create(b, Panel, RectI::from_xywh(0, 0, 5, 5), Corner::TOP_LEFT).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree.is_child(a, c, true));
        assert!(!tree.is_child(a, c, false));
        assert_eq!(tree.subtree(a), vec![a, b, c]);

        assert!(tree.destroy(a));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(b));
        assert!(tree.children(root).is_empty());
        assert!(!tree.destroy(a));
        assert!(!tree.destroy(root));
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut tree = window();
        let root = tree.root();
        let old = tree.create(root, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        tree.destroy(old);
        let new = tree.create(root, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        assert_ne!(old, new);
        assert!(!tree.contains(old));
        assert!(matches!(
            tree.create(old, Panel, RectI::default(), Corner::TOP_LEFT),
            Err(WidgetError::StaleHandle(_))
        ));
    }

    #[test]
    fn test_absolute_rect_follows_corners() {
        let mut tree = window();
        let root = tree.root();
        let bottom_right = Corner::new(VCorner::Bottom, HCorner::Right);
        let panel = tree.create(root, Panel, RectI::from_xywh(-10, -10, 200, 100), bottom_right).unwrap();
        let inner = tree.create(panel, Panel, RectI::from_xywh(5, 5, 20, 20), Corner::TOP_LEFT).unwrap();
        assert_eq!(tree.absolute_rect(panel), Some(RectI::from_xywh(590, 490, 200, 100)));
        assert_eq!(tree.absolute_rect(inner), Some(RectI::from_xywh(595, 495, 20, 20)));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut tree = window();
        let root = tree.root();
        let a = tree.create(root, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        let b = tree.create(a, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        assert!(matches!(tree.reparent(a, b), Err(WidgetError::Cycle(_))));
        tree.reparent(b, root).unwrap();
        assert_eq!(tree.children(root), vec![a, b]);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.parent(b), Some(root));
    }

    #[test]
    fn test_visibility_fades() {
        let mut tree = window();
        let root = tree.root();
        let w = tree.create(root, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        assert!(tree.is_visible(w));

        tree.set_visibility(w, false, false);
        tree.step_fades(2.5);
        assert!((tree.opacity(w) - 0.5).abs() < 1e-4);
        assert!(tree.is_visible(w));
        tree.step_fades(2.5);
        assert!(!tree.is_visible(w));

        tree.set_visibility(w, true, false);
        tree.step_fades(1.25);
        assert!((tree.opacity(w) - 0.5).abs() < 1e-4);

        tree.set_visibility(w, false, true);
        assert_eq!(tree.opacity(w), 0.0);
        assert!(!tree.is_shown(w));
    }

    #[test]
    fn test_destroy_clears_focus_and_hover() {
        let mut tree = window();
        let root = tree.root();
        let a = tree.create(root, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        let b = tree.create(a, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        tree.replace_focus(Some(b));
        tree.set_hovered(Some(b));
        tree.destroy(a);
        assert_eq!(tree.focus(), None);
        assert_eq!(tree.hovered(), None);
    }

    #[test]
    fn test_with_widget_downcast() {
        let mut tree = window();
        let root = tree.root();
        let w = tree.create(root, Panel, RectI::default(), Corner::TOP_LEFT).unwrap();
        assert!(tree.widget_as::<Panel>(w).is_some());
        let seen = tree.with_widget(w, |widget, ctx| {
            assert!(ctx.tree.widget_as::<Panel>(ctx.id).is_none());
            widget.class_name()
        });
        assert_eq!(seen, Some("StGLWidget"));
        assert!(tree.widget_as::<Panel>(w).is_some());
    }

    #[test]
    fn test_destroyer_is_deduplicated() {
        let tree = window();
        let destroyer = tree.destroyer();
        let id = WidgetId::new(3, 0);
        destroyer.destroy_with_delay(id);
        tree.destroy_with_delay(id);
        assert!(destroyer.is_pending(id));
        assert_eq!(destroyer.take(), vec![id]);
        assert!(!destroyer.is_pending(id));
    }
}
