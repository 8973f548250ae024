//! Static text label.

use super::draw::{Color, DrawList};
use super::tree::{WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget};
use crate::geometry::{Corner, RectI};

/// Line height in pixels.
pub const LINE_HEIGHT: i32 = 32;

/// Width estimate used until a font is available: ten pixels per
/// character plus two characters of padding.
pub fn text_width(text: &str) -> i32 {
    let chars = text.chars().count() as i32;
    10 * (chars + 2)
}

/// Width and height of a possibly multi-line string.
pub fn text_size(text: &str) -> (i32, i32) {
    let width = text.lines().map(text_width).max().unwrap_or_else(|| text_width(""));
    let lines = text.lines().count().max(1) as i32;
    (width, lines * LINE_HEIGHT)
}

#[derive(Debug, Clone)]
pub struct TextArea {
    text: String,
    color: Color,
}

impl TextArea {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Create a label at (`left`, `top`) sized to fit its text.
    pub fn create(
        tree: &mut WidgetTree,
        parent: WidgetId,
        left: i32,
        top: i32,
        text: impl Into<String>,
    ) -> Result<WidgetId, WidgetError> {
        let area = Self::new(text);
        let (width, height) = text_size(&area.text);
        tree.create(parent, area, RectI::from_xywh(left, top, width, height), Corner::TOP_LEFT)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text and refit the rectangle, keeping its origin.
    pub fn set_text(tree: &mut WidgetTree, id: WidgetId, text: impl Into<String>) -> Result<(), WidgetError> {
        let text = text.into();
        let (width, height) = text_size(&text);
        let area = tree.widget_as_mut::<TextArea>(id).ok_or(WidgetError::StaleHandle(id))?;
        area.text = text;
        let rect = tree.rect(id).ok_or(WidgetError::StaleHandle(id))?;
        tree.set_rect(id, RectI::from_xywh(rect.left, rect.top, width, height))
    }
}

impl Widget for TextArea {
    fn class_name(&self) -> &'static str {
        "StGLTextArea"
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        if !self.text.is_empty() {
            list.text(ctx.id, ctx.rect, self.text.as_str(), self.color.with_opacity(ctx.opacity));
        }
    }
}
