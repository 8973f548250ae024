//! # Root Widget
//!
//! Owns the widget tree of one window and turns raw input into widget
//! events.
//!
//! ```text
//!            mouse_down                 move > tolerance
//!   Idle ──► Hover ─────────► Pressed ──────────────────► Dragging
//!    ▲         ▲                 │ mouse_up                  │ mouse_up
//!    └─────────┴─────────────────┴─► Clicked (release hits W, or W captured)
//!                                    Cancelled (release elsewhere)
//! ```
//!
//! Cursor positions arrive normalized (0..1 over the window) and are
//! converted to pixels of the root rectangle before hit testing.

use super::draw::DrawList;
use super::message_box::MessageBox;
use super::tree::{Destroyer, WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget, WidgetCtx};
use crate::geometry::{PointD, RectI};
use crate::keys::{KeyEvent, MouseButton, ScrollDelta, MOUSE_BUTTONS};
use crate::queues::{MouseClickQueue, MsgQueue, WindowMessage};
use crate::signal::Signal;
use std::sync::Arc;

/// Pointer travel in pixels before a press turns into a drag.
pub const DEFAULT_DRAG_TOLERANCE: f64 = 4.0;

/// Focus changes requested from focus handlers that one `set_focus` follows.
pub const MAX_FOCUS_HOPS: usize = 8;

/// How a button release resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked(WidgetId),
    Cancelled(WidgetId),
}

/// Interaction state of one mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Hover(WidgetId),
    Pressed(WidgetId),
    Dragging(WidgetId),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    widget: WidgetId,
    origin: PointD,
    last: PointD,
    dragging: bool,
    captured: bool,
}

pub struct RootWidget {
    tree: WidgetTree,
    /// Normalized cursor position.
    cursor: PointD,
    pressed: [Option<Press>; MOUSE_BUTTONS],
    drag_tolerance: f64,
    last_update: Option<f64>,
    mouse_down_queue: Arc<MouseClickQueue>,
    mouse_up_queue: Arc<MouseClickQueue>,
    /// Keys nobody in the focus chain handled.
    pub on_key_down: Signal<KeyEvent>,
    pub on_key_up: Signal<KeyEvent>,
}

impl RootWidget {
    pub fn new(window: RectI) -> Self {
        Self {
            tree: WidgetTree::new(window),
            cursor: PointD::new(0.5, 0.5),
            pressed: [None; MOUSE_BUTTONS],
            drag_tolerance: DEFAULT_DRAG_TOLERANCE,
            last_update: None,
            mouse_down_queue: Arc::new(MouseClickQueue::new()),
            mouse_up_queue: Arc::new(MouseClickQueue::new()),
            on_key_down: Signal::new(),
            on_key_up: Signal::new(),
        }
    }

    pub fn with_drag_tolerance(mut self, pixels: f64) -> Self {
        self.drag_tolerance = pixels.max(0.0);
        self
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut WidgetTree {
        &mut self.tree
    }

    pub fn id(&self) -> WidgetId {
        self.tree.root()
    }

    pub fn rect(&self) -> RectI {
        self.tree.root_rect()
    }

    pub fn cursor(&self) -> PointD {
        self.cursor
    }

    /// Queue filled by the window thread with button presses.
    pub fn mouse_down_queue(&self) -> &Arc<MouseClickQueue> {
        &self.mouse_down_queue
    }

    pub fn mouse_up_queue(&self) -> &Arc<MouseClickQueue> {
        &self.mouse_up_queue
    }

    pub fn destroyer(&self) -> Destroyer {
        self.tree.destroyer()
    }

    pub fn destroy_with_delay(&self, id: WidgetId) {
        self.tree.destroy_with_delay(id);
    }

    fn to_pixels(&self, zo: PointD) -> PointD {
        let rect = self.rect();
        PointD::new(
            f64::from(rect.left) + zo.x * f64::from(rect.width()),
            f64::from(rect.top) + zo.y * f64::from(rect.height()),
        )
    }

    /// Call `f` on one widget, then apply focus requests it made.
    fn dispatch<R: Default>(&mut self, id: WidgetId, f: impl FnOnce(&mut dyn Widget, &mut WidgetCtx<'_>) -> R) -> R {
        let result = self.tree.with_widget(id, f).unwrap_or_default();
        self.apply_focus_requests();
        result
    }

    fn apply_focus_requests(&mut self) {
        for request in self.tree.take_focus_requests() {
            self.set_focus(request);
        }
    }

    /// Move keyboard focus, notifying the old owner first.
    ///
    /// Focus handlers may request another change; at most
    /// [`MAX_FOCUS_HOPS`] follow-ups are honoured per call.
    pub fn set_focus(&mut self, focus: Option<WidgetId>) {
        let mut next = Some(focus);
        let mut hops = 0;
        while let Some(focus) = next.take() {
            if hops > MAX_FOCUS_HOPS {
                tracing::warn!("Focus keeps moving after {} changes, stopped at {:?}", MAX_FOCUS_HOPS, self.tree.focus());
                self.tree.take_focus_requests();
                return;
            }
            hops += 1;

            let focus = focus.filter(|id| self.tree.contains(*id));
            let old = self.tree.focus();
            if old == focus {
                continue;
            }
            if let Some(old) = old {
                self.tree.with_widget(old, |w, ctx| w.on_focus_changed(ctx, false));
            }
            self.tree.replace_focus(focus);
            if let Some(new) = focus {
                self.tree.with_widget(new, |w, ctx| w.on_focus_changed(ctx, true));
            }
            next = self.tree.take_focus_requests().last().copied();
        }
    }

    pub fn focus(&self) -> Option<WidgetId> {
        self.tree.focus()
    }

    /// Resize the window and notify every widget.
    pub fn resize(&mut self, window: RectI) {
        let root = self.tree.root();
        if self.tree.set_rect(root, window).is_err() {
            return;
        }
        tracing::debug!("Root widget resized to {}x{}", window.width(), window.height());
        for id in self.tree.subtree(root) {
            self.dispatch(id, |w, ctx| w.resize(ctx));
        }
    }

    /// Topmost visible widget under the normalized point `zo`.
    pub fn hit_test(&self, zo: PointD) -> Option<WidgetId> {
        let px = self.to_pixels(zo);
        self.hit_node(self.tree.root(), px)
    }

    fn hit_node(&self, id: WidgetId, px: PointD) -> Option<WidgetId> {
        let node = self.tree.node(id)?;
        for child in node.children().iter_rev() {
            if !self.tree.is_shown(child) || !self.tree.is_visible(child) {
                continue;
            }
            if let Some(hit) = self.hit_node(child, px) {
                return Some(hit);
            }
        }
        if id != self.tree.root() && self.point_in(id, px) {
            return Some(id);
        }
        None
    }

    fn point_in(&self, id: WidgetId, px: PointD) -> bool {
        match (self.tree.widget(id), self.tree.absolute_rect(id)) {
            (Some(widget), Some(rect)) => widget.is_point_in(&rect, px.x, px.y),
            _ => false,
        }
    }

    /// Current state of `button`'s gesture.
    pub fn gesture(&self, button: MouseButton) -> Gesture {
        if let Some(press) = button.slot().and_then(|s| self.pressed[s]) {
            return if press.dragging {
                Gesture::Dragging(press.widget)
            } else {
                Gesture::Pressed(press.widget)
            };
        }
        match self.tree.hovered() {
            Some(id) => Gesture::Hover(id),
            None => Gesture::Idle,
        }
    }

    pub fn mouse_move(&mut self, zo: PointD) {
        self.cursor = zo;
        let hit = self.hit_test(zo);
        let old = self.tree.hovered();
        if hit != old {
            self.tree.set_hovered(hit);
            if let Some(old) = old {
                self.dispatch(old, |w, ctx| w.on_hover(ctx, false));
            }
            if let Some(new) = hit {
                self.dispatch(new, |w, ctx| w.on_hover(ctx, true));
            }
        }

        let px = self.to_pixels(zo);
        for slot in 0..MOUSE_BUTTONS {
            let Some(mut press) = self.pressed[slot] else {
                continue;
            };
            if !press.dragging {
                let (dx, dy) = (px.x - press.origin.x, px.y - press.origin.y);
                if (dx * dx + dy * dy).sqrt() > self.drag_tolerance {
                    press.dragging = true;
                    tracing::trace!("Drag started on {}", press.widget);
                }
            }
            if press.dragging {
                let delta = PointD::new(px.x - press.last.x, px.y - press.last.y);
                press.last = px;
                if delta != PointD::default() && self.dispatch(press.widget, |w, ctx| w.on_drag(ctx, delta)) {
                    press.captured = true;
                }
            }
            self.pressed[slot] = Some(press);
        }
    }

    /// Press `button` at `zo`. Returns the widget that took the press.
    pub fn mouse_down(&mut self, zo: PointD, button: MouseButton) -> Option<WidgetId> {
        self.mouse_move(zo);
        if let Some(delta) = button.scroll_steps() {
            return self.scroll(delta);
        }
        let slot = button.slot()?;
        // a press without its release (lost window event) is cancelled
        if let Some(stale) = self.pressed[slot].take() {
            if self.tree.contains(stale.widget) {
                self.tree.set_clicked(stale.widget, button, false);
                self.dispatch(stale.widget, |w, ctx| w.on_click_cancelled(ctx, button));
                tracing::trace!("Unreleased click on {} cancelled", stale.widget);
            }
        }
        let hit = self.hit_test(zo);

        let focus_target = hit.and_then(|id| self.focusable_ancestor(id));
        self.set_focus(focus_target);

        let hit = hit?;
        let root = self.tree.root();
        let mut handler = None;
        let mut current = Some(hit);
        while let Some(id) = current.filter(|id| *id != root) {
            let handled = self.dispatch(id, |w, ctx| w.on_click(ctx, button));
            let signals = self.tree.signals(id);
            let connected = signals.as_ref().map(|s| s.is_connected()).unwrap_or(false);
            if handled || connected {
                if let Some(signals) = signals {
                    signals.on_mouse_click.emit(&button);
                }
                handler = Some(id);
                break;
            }
            current = self.tree.parent(id);
        }

        let target = handler.unwrap_or(hit);
        if !self.tree.contains(target) {
            return None;
        }
        self.tree.set_clicked(target, button, true);
        let px = self.to_pixels(zo);
        self.pressed[slot] = Some(Press {
            widget: target,
            origin: px,
            last: px,
            dragging: false,
            captured: false,
        });
        Some(target)
    }

    fn focusable_ancestor(&self, id: WidgetId) -> Option<WidgetId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.tree.widget(c).map(|w| w.accepts_focus()).unwrap_or(false) {
                return Some(c);
            }
            current = self.tree.parent(c);
        }
        None
    }

    /// Release `button` at `zo`.
    pub fn mouse_up(&mut self, zo: PointD, button: MouseButton) -> Option<ClickOutcome> {
        self.mouse_move(zo);
        let slot = button.slot()?;
        let press = self.pressed[slot].take()?;
        if !self.tree.contains(press.widget) {
            return None;
        }
        self.tree.set_clicked(press.widget, button, false);

        let px = self.to_pixels(zo);
        if press.captured || self.point_in(press.widget, px) {
            self.dispatch(press.widget, |w, ctx| w.on_unclick(ctx, button));
            if let Some(signals) = self.tree.signals(press.widget) {
                signals.on_mouse_unclick.emit(&button);
            }
            Some(ClickOutcome::Clicked(press.widget))
        } else {
            self.dispatch(press.widget, |w, ctx| w.on_click_cancelled(ctx, button));
            tracing::trace!("Click on {} cancelled", press.widget);
            Some(ClickOutcome::Cancelled(press.widget))
        }
    }

    /// Deliver wheel steps to the widget under the cursor, bubbling up
    /// until one handles them.
    pub fn scroll(&mut self, delta: ScrollDelta) -> Option<WidgetId> {
        let mut current = self.hit_test(self.cursor);
        let root = self.tree.root();
        while let Some(id) = current.filter(|id| *id != root) {
            if self.dispatch(id, |w, ctx| w.on_scroll(ctx, delta)) {
                return Some(id);
            }
            current = self.tree.parent(id);
        }
        None
    }

    /// Focus owner, then its ancestors, then [`on_key_down`](Self::on_key_down).
    pub fn key_down(&mut self, event: KeyEvent) -> bool {
        let mut current = self.tree.focus();
        while let Some(id) = current {
            if self.dispatch(id, |w, ctx| w.on_key_down(ctx, &event)) {
                return true;
            }
            current = self.tree.parent(id);
        }
        self.on_key_down.emit(&event)
    }

    pub fn key_up(&mut self, event: KeyEvent) -> bool {
        let mut current = self.tree.focus();
        while let Some(id) = current {
            if self.dispatch(id, |w, ctx| w.on_key_up(ctx, &event)) {
                return true;
            }
            current = self.tree.parent(id);
        }
        self.on_key_up.emit(&event)
    }

    /// Take one press from the down queue, as announced by `MouseDownQueued`.
    fn next_mouse_down(&mut self) -> Option<WidgetId> {
        let click = self.mouse_down_queue.pop()?;
        let button = click.mouse_button()?;
        self.mouse_down(click.point, button)
    }

    fn next_mouse_up(&mut self) -> Option<ClickOutcome> {
        let click = self.mouse_up_queue.pop()?;
        let button = click.mouse_button()?;
        self.mouse_up(click.point, button)
    }

    /// Feed window messages returned by the renderer callback.
    ///
    /// Messages are handled in order. Each `MouseDownQueued` /
    /// `MouseUpQueued` consumes one click from the matching queue, so
    /// presses and releases keep the order the window reported them in.
    pub fn handle_messages(&mut self, messages: &[WindowMessage], now: f64) {
        for message in messages {
            match message {
                WindowMessage::MouseMove(point) => self.mouse_move(*point),
                WindowMessage::MouseDownQueued => {
                    self.next_mouse_down();
                }
                WindowMessage::MouseUpQueued => {
                    self.next_mouse_up();
                }
                WindowMessage::MouseDown { point, button } => {
                    self.mouse_down(*point, *button);
                }
                WindowMessage::MouseUp { point, button } => {
                    self.mouse_up(*point, *button);
                }
                WindowMessage::KeyDown(key) => {
                    self.key_down(KeyEvent::new(*key, now));
                }
                WindowMessage::KeyUp(key) => {
                    self.key_up(KeyEvent::new(*key, now));
                }
                _ => {}
            }
        }
    }

    /// Per-frame step at time `now` (seconds).
    ///
    /// Delayed destroys run first, then fades advance and visible widgets
    /// are initialized and updated parent before children.
    pub fn update(&mut self, now: f64) {
        let dt = self.last_update.map(|t| (now - t).max(0.0)).unwrap_or(0.0);
        self.last_update = Some(now);

        for id in self.tree.destroyer().take() {
            self.tree.destroy(id);
        }
        self.tree.step_fades(dt);

        let root = self.tree.root();
        for id in self.visible_order(root) {
            let Some((initialized, ok)) = self.tree.init_state(id) else {
                continue;
            };
            if !initialized {
                let ok = self.dispatch(id, |w, ctx| w.init(ctx));
                if !ok {
                    tracing::warn!("Widget {} ({:?}) failed to initialize", id, self.tree.class_name(id));
                }
                self.tree.mark_initialized(id, ok);
                if !ok {
                    continue;
                }
            } else if !ok {
                continue;
            }
            self.dispatch(id, |w, ctx| w.update(ctx, dt));
        }
    }

    /// Pre-order walk skipping hidden subtrees.
    fn visible_order(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.tree.node(current) else {
                continue;
            };
            if current != self.tree.root() && !self.tree.is_visible(current) {
                continue;
            }
            result.push(current);
            stack.extend(node.children().iter_rev());
        }
        result
    }

    /// Record draw commands for every visible widget, parents first.
    pub fn draw(&self) -> DrawList {
        let mut list = DrawList::new();
        let root = self.tree.root();
        self.draw_node(root, 1.0, &mut list);
        list
    }

    fn draw_node(&self, id: WidgetId, parent_opacity: f32, list: &mut DrawList) {
        let Some(node) = self.tree.node(id) else {
            return;
        };
        let opacity = parent_opacity * node.opacity();
        if opacity <= 0.0 {
            return;
        }
        let Some(rect) = self.tree.absolute_rect(id) else {
            return;
        };
        let ctx = DrawCtx {
            tree: &self.tree,
            id,
            rect,
            opacity,
        };
        let widget = self.tree.widget(id);
        if let Some(widget) = widget {
            widget.draw(&ctx, list);
        }
        for child in node.children().iter() {
            self.draw_node(child, opacity, list);
        }
        if let Some(widget) = widget {
            widget.draw_after_children(&ctx, list);
        }
    }

    /// Pop all pending messages into one message box.
    pub fn show_messages(&mut self, queue: &MsgQueue) -> Result<Option<WidgetId>, WidgetError> {
        let Some(msg) = queue.pop_all() else {
            return Ok(None);
        };
        let root = self.tree.root();
        let id = MessageBox::create(&mut self.tree, root, &msg)?;
        self.apply_focus_requests();
        Ok(Some(id))
    }
}

impl std::fmt::Debug for RootWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootWidget")
            .field("rect", &self.rect())
            .field("cursor", &self.cursor)
            .field("tree", &self.tree)
            .finish()
    }
}
