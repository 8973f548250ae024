//! Push button. Connect to `on_mouse_unclick` of its [`WidgetSignals`]
//! to react to clicks.
//!
//! [`WidgetSignals`]: super::tree::WidgetSignals

use super::draw::{Color, DrawList};
use super::text_area::{text_width, LINE_HEIGHT};
use super::tree::{WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget, WidgetCtx};
use crate::geometry::{Corner, RectI};
use crate::keys::MouseButton;

const PADDING: i32 = 16;

#[derive(Debug, Clone)]
pub struct Button {
    label: String,
    pressed: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pressed: false,
        }
    }

    /// Create a button sized to its label.
    pub fn create(
        tree: &mut WidgetTree,
        parent: WidgetId,
        left: i32,
        top: i32,
        corner: Corner,
        label: impl Into<String>,
    ) -> Result<WidgetId, WidgetError> {
        let button = Self::new(label);
        let width = text_width(&button.label) + PADDING;
        tree.create(parent, button, RectI::from_xywh(left, top, width, LINE_HEIGHT), corner)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn class_name(&self) -> &'static str {
        "StGLButton"
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        let background = if self.pressed { Color::HIGHLIGHT } else { Color::MENU_BACKGROUND };
        list.rect(ctx.id, ctx.rect, background.with_opacity(ctx.opacity));
        list.text(ctx.id, ctx.rect, self.label.as_str(), Color::WHITE.with_opacity(ctx.opacity));
    }

    fn on_click(&mut self, _ctx: &mut WidgetCtx<'_>, button: MouseButton) -> bool {
        if button == MouseButton::Left {
            self.pressed = true;
        }
        true
    }

    fn on_unclick(&mut self, _ctx: &mut WidgetCtx<'_>, button: MouseButton) -> bool {
        if button == MouseButton::Left {
            self.pressed = false;
        }
        true
    }

    fn on_click_cancelled(&mut self, _ctx: &mut WidgetCtx<'_>, _button: MouseButton) {
        self.pressed = false;
    }
}
