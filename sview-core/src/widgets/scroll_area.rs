//! Vertical scroll container.
//!
//! Only the first child is scrolled, by [`SCROLL_STEP`] pixels per wheel
//! step, and only while it is taller than the area. The offset is clamped so
//! the content never leaves a gap at either end.

use super::draw::DrawList;
use super::tree::{WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget, WidgetCtx};
use crate::geometry::{Corner, RectI};
use crate::keys::ScrollDelta;

pub const SCROLL_STEP: i32 = 10;

#[derive(Debug, Clone, Default)]
pub struct ScrollArea;

impl ScrollArea {
    pub fn create(tree: &mut WidgetTree, parent: WidgetId, rect: RectI, corner: Corner) -> Result<WidgetId, WidgetError> {
        tree.create(parent, ScrollArea, rect, corner)
    }

    /// Shift the content by `steps` wheel steps, positive scrolls up.
    ///
    /// Returns false when there is nothing to scroll.
    pub fn scroll(tree: &mut WidgetTree, area: WidgetId, steps: i32) -> bool {
        let Some(content) = tree.node(area).and_then(|n| n.children().first()) else {
            return false;
        };
        let (Some(area_rect), Some(mut content_rect)) = (tree.rect(area), tree.rect(content)) else {
            return false;
        };
        if content_rect.height() <= area_rect.height() {
            return false;
        }
        let lowest = area_rect.height() - content_rect.height();
        let top = (content_rect.top + steps * SCROLL_STEP).clamp(lowest, 0);
        if top == content_rect.top {
            return true;
        }
        content_rect.move_top_to(top);
        tree.set_rect(content, content_rect).is_ok()
    }
}

impl Widget for ScrollArea {
    fn class_name(&self) -> &'static str {
        "StGLScrollArea"
    }

    fn on_scroll(&mut self, ctx: &mut WidgetCtx<'_>, delta: ScrollDelta) -> bool {
        delta.dy != 0 && ScrollArea::scroll(ctx.tree, ctx.id, delta.dy)
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        list.push_scissor(ctx.rect);
    }

    fn draw_after_children(&self, _ctx: &DrawCtx<'_>, list: &mut DrawList) {
        list.pop_scissor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointD;
    use crate::keys::MouseButton;
    use crate::widgets::draw::DrawCommand;
    use crate::widgets::widget::Panel;
    use crate::widgets::RootWidget;

    #[test]
    fn test_scroll_is_clamped() {
        let mut tree = WidgetTree::new(RectI::from_xywh(0, 0, 800, 600));
        let root = tree.root();
        let area = ScrollArea::create(&mut tree, root, RectI::from_xywh(0, 0, 100, 100), Corner::TOP_LEFT).unwrap();
        let content = tree.create(area, Panel, RectI::from_xywh(0, 0, 100, 125), Corner::TOP_LEFT).unwrap();

        // already at the top
        assert!(ScrollArea::scroll(&mut tree, area, 1));
        assert_eq!(tree.rect(content).unwrap().top, 0);

        assert!(ScrollArea::scroll(&mut tree, area, -2));
        assert_eq!(tree.rect(content).unwrap().top, -20);
        assert!(ScrollArea::scroll(&mut tree, area, -5));
        assert_eq!(tree.rect(content).unwrap().top, -25);
        assert_eq!(tree.rect(content).unwrap().height(), 125);
    }

    #[test]
    fn test_short_content_does_not_scroll() {
        let mut tree = WidgetTree::new(RectI::from_xywh(0, 0, 800, 600));
        let root = tree.root();
        let area = ScrollArea::create(&mut tree, root, RectI::from_xywh(0, 0, 100, 100), Corner::TOP_LEFT).unwrap();
        assert!(!ScrollArea::scroll(&mut tree, area, -1));
        tree.create(area, Panel, RectI::from_xywh(0, 0, 100, 50), Corner::TOP_LEFT).unwrap();
        assert!(!ScrollArea::scroll(&mut tree, area, -1));
    }

    #[test]
    fn test_wheel_and_scissor() {
        let mut root = RootWidget::new(RectI::from_xywh(0, 0, 800, 600));
        let id = root.id();
        let area = ScrollArea::create(root.tree_mut(), id, RectI::from_xywh(0, 0, 100, 100), Corner::TOP_LEFT).unwrap();
        let content = root
            .tree_mut()
            .create(area, Panel, RectI::from_xywh(0, 0, 100, 300), Corner::TOP_LEFT)
            .unwrap();

        let inside = PointD::new(50.0 / 800.0, 50.0 / 600.0);
        assert_eq!(root.mouse_down(inside, MouseButton::ScrollDown), Some(area));
        assert_eq!(root.tree().rect(content).unwrap().top, -10);

        let list = root.draw();
        assert_eq!(list.commands().first(), Some(&DrawCommand::PushScissor(RectI::from_xywh(0, 0, 100, 100))));
        assert_eq!(list.commands().last(), Some(&DrawCommand::PopScissor));
    }
}
