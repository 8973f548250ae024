//! Draw commands recorded by widgets.
//!
//! The widget tree does not talk to OpenGL itself. Every frame the root
//! walks visible widgets and collects a flat [`DrawList`] which the renderer
//! plugin (or a test) consumes in order.

use super::tree::WidgetId;
use crate::geometry::RectI;

/// RGBA color, components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const MENU_BACKGROUND: Color = Color::rgba(0.13, 0.13, 0.13, 0.9);
    pub const HIGHLIGHT: Color = Color::rgba(0.02, 0.38, 0.85, 1.0);
    pub const ERROR: Color = Color::rgba(0.85, 0.15, 0.1, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        widget: WidgetId,
        rect: RectI,
        color: Color,
    },
    Text {
        widget: WidgetId,
        rect: RectI,
        text: String,
        color: Color,
    },
    PushScissor(RectI),
    PopScissor,
}

#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rect(&mut self, widget: WidgetId, rect: RectI, color: Color) {
        self.commands.push(DrawCommand::Rect { widget, rect, color });
    }

    pub fn text(&mut self, widget: WidgetId, rect: RectI, text: impl Into<String>, color: Color) {
        self.commands.push(DrawCommand::Text {
            widget,
            rect,
            text: text.into(),
            color,
        });
    }

    pub fn push_scissor(&mut self, rect: RectI) {
        self.commands.push(DrawCommand::PushScissor(rect));
    }

    pub fn pop_scissor(&mut self) {
        self.commands.push(DrawCommand::PopScissor);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every text string in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Commands recorded by one widget.
    pub fn by_widget(&self, id: WidgetId) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(move |c| match c {
            DrawCommand::Rect { widget, .. } | DrawCommand::Text { widget, .. } => *widget == id,
            _ => false,
        })
    }
}
