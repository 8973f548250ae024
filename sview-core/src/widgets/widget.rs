//! The per-widget behaviour trait.

use super::draw::DrawList;
use super::tree::{WidgetId, WidgetTree};
use crate::geometry::{PointD, RectI};
use crate::keys::{KeyEvent, MouseButton, ScrollDelta};
use std::any::Any;

/// Downcast support for `Box<dyn Widget>`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Mutable access handed to event hooks.
///
/// The widget being called is temporarily detached from its node, so
/// `tree.widget_as::<Self>(id)` returns `None` inside its own hooks; use
/// `self` instead.
pub struct WidgetCtx<'a> {
    pub tree: &'a mut WidgetTree,
    pub id: WidgetId,
}

/// Read-only state for drawing one widget.
pub struct DrawCtx<'a> {
    pub tree: &'a WidgetTree,
    pub id: WidgetId,
    /// Absolute pixel rectangle.
    pub rect: RectI,
    /// Own fade multiplied by every ancestor's.
    pub opacity: f32,
}

/// Widget hooks. Every method has a no-op default.
///
/// Event hooks return true when the event was handled; unhandled clicks,
/// keys and wheel steps bubble to the parent.
pub trait Widget: AsAny {
    fn class_name(&self) -> &'static str;

    /// Called once before the first update. Returning false marks the widget
    /// as failed; it stays in the tree but is never updated.
    fn init(&mut self, _ctx: &mut WidgetCtx<'_>) -> bool {
        true
    }

    /// Per-frame step, `dt` in seconds.
    fn update(&mut self, _ctx: &mut WidgetCtx<'_>, _dt: f64) {}

    /// Window or parent rectangle changed.
    fn resize(&mut self, _ctx: &mut WidgetCtx<'_>) {}

    fn draw(&self, _ctx: &DrawCtx<'_>, _list: &mut DrawList) {}

    fn draw_after_children(&self, _ctx: &DrawCtx<'_>, _list: &mut DrawList) {}

    fn on_click(&mut self, _ctx: &mut WidgetCtx<'_>, _button: MouseButton) -> bool {
        false
    }

    fn on_unclick(&mut self, _ctx: &mut WidgetCtx<'_>, _button: MouseButton) -> bool {
        false
    }

    /// Button released away from the widget that got the press.
    fn on_click_cancelled(&mut self, _ctx: &mut WidgetCtx<'_>, _button: MouseButton) {}

    /// Pointer moved while pressed past the drag tolerance, `delta` in
    /// pixels. Returning true captures the gesture: the release then counts
    /// as a click wherever it happens.
    fn on_drag(&mut self, _ctx: &mut WidgetCtx<'_>, _delta: PointD) -> bool {
        false
    }

    fn on_hover(&mut self, _ctx: &mut WidgetCtx<'_>, _entered: bool) {}

    fn on_key_down(&mut self, _ctx: &mut WidgetCtx<'_>, _event: &KeyEvent) -> bool {
        false
    }

    fn on_key_up(&mut self, _ctx: &mut WidgetCtx<'_>, _event: &KeyEvent) -> bool {
        false
    }

    fn on_scroll(&mut self, _ctx: &mut WidgetCtx<'_>, _delta: ScrollDelta) -> bool {
        false
    }

    fn on_focus_changed(&mut self, _ctx: &mut WidgetCtx<'_>, _focused: bool) {}

    fn accepts_focus(&self) -> bool {
        false
    }

    /// Hit test against the absolute rectangle, in pixels.
    fn is_point_in(&self, rect: &RectI, x: f64, y: f64) -> bool {
        rect.contains(x, y)
    }
}

/// Plain container without behaviour of its own.
#[derive(Debug, Default)]
pub struct Panel;

impl Widget for Panel {
    fn class_name(&self) -> &'static str {
        "StGLWidget"
    }
}
