//! Subtitle line at the bottom of the video area.

use super::draw::{Color, DrawList};
use super::text_area::LINE_HEIGHT;
use super::tree::{WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget, WidgetCtx};
use crate::geometry::{Corner, HCorner, RectI, VCorner};
use crate::queues::{SubItem, SubQueue};
use std::sync::Arc;

/// Presentation clock in seconds, usually the video PTS.
pub type PtsClock = Arc<dyn Fn() -> f64 + Send + Sync>;

const BOTTOM_MARGIN: i32 = 40;
const LINES: i32 = 3;

pub struct SubtitlesView {
    queue: Arc<SubQueue>,
    clock: PtsClock,
    current: Option<Arc<SubItem>>,
}

impl SubtitlesView {
    pub fn new(queue: Arc<SubQueue>, clock: PtsClock) -> Self {
        Self {
            queue,
            clock,
            current: None,
        }
    }

    /// Create a full-width strip anchored to the bottom of `parent`.
    pub fn create(
        tree: &mut WidgetTree,
        parent: WidgetId,
        queue: Arc<SubQueue>,
        clock: PtsClock,
    ) -> Result<WidgetId, WidgetError> {
        let width = tree.rect(parent).map(|r| r.width()).unwrap_or(0);
        let rect = RectI::from_xywh(0, -BOTTOM_MARGIN, width, LINES * LINE_HEIGHT);
        let corner = Corner::new(VCorner::Bottom, HCorner::Center);
        tree.create(parent, Self::new(queue, clock), rect, corner)
    }

    pub fn queue(&self) -> &Arc<SubQueue> {
        &self.queue
    }

    /// Text shown right now, if any.
    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|item| item.text.as_str())
    }

    fn step(&mut self, pts: f64) {
        if let Some(item) = self.queue.pop(pts) {
            tracing::trace!("Subtitle at {:.3}s: {:?}", pts, item.text);
            self.current = Some(item);
        } else if self.current.as_ref().is_some_and(|item| !item.is_visible_at(pts)) {
            self.current = None;
        }
    }
}

impl Widget for SubtitlesView {
    fn class_name(&self) -> &'static str {
        "StGLSubtitles"
    }

    fn update(&mut self, _ctx: &mut WidgetCtx<'_>, _dt: f64) {
        let pts = (self.clock)();
        self.step(pts);
    }

    fn resize(&mut self, ctx: &mut WidgetCtx<'_>) {
        let Some(parent) = ctx.tree.parent(ctx.id) else {
            return;
        };
        let (Some(parent_rect), Some(mut rect)) = (ctx.tree.rect(parent), ctx.tree.rect(ctx.id)) else {
            return;
        };
        rect.right = rect.left + parent_rect.width();
        if let Err(e) = ctx.tree.set_rect(ctx.id, rect) {
            tracing::warn!("Subtitles view not resized: {}", e);
        }
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        if let Some(text) = self.text() {
            list.text(ctx.id, ctx.rect, text, Color::WHITE.with_opacity(ctx.opacity));
        }
    }

    /// Subtitles never take clicks.
    fn is_point_in(&self, _rect: &RectI, _x: f64, _y: f64) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::RootWidget;
    use parking_lot::Mutex;

    #[test]
    fn test_follows_clock() {
        let mut root = RootWidget::new(RectI::from_xywh(0, 0, 1920, 1080));
        let id = root.id();
        let queue = Arc::new(SubQueue::new());
        let pts = Arc::new(Mutex::new(0.0f64));
        let clock_pts = pts.clone();
        let clock: PtsClock = Arc::new(move || *clock_pts.lock());
        let view = SubtitlesView::create(root.tree_mut(), id, queue.clone(), clock).unwrap();
        assert_eq!(root.tree().absolute_rect(view), Some(RectI::from_xywh(0, 944, 1920, 96)));

        queue.push(SubItem::new("first", 1.0, 2.0));
        queue.push(SubItem::new("second", 2.5, 4.0));
        let text = |root: &RootWidget| root.tree().widget_as::<SubtitlesView>(view).and_then(|v| v.text()).map(str::to_string);

        root.update(0.5);
        assert_eq!(text(&root), None);
        *pts.lock() = 1.5;
        root.update(1.5);
        assert_eq!(text(&root).as_deref(), Some("first"));
        assert!(root.draw().texts().any(|t| t == "first"));

        *pts.lock() = 2.2;
        root.update(2.2);
        assert_eq!(text(&root), None);

        // a seek past "second" drops it unseen
        *pts.lock() = 5.0;
        root.update(5.0);
        assert_eq!(text(&root), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_resize_tracks_parent_width() {
        let mut root = RootWidget::new(RectI::from_xywh(0, 0, 800, 600));
        let id = root.id();
        let clock: PtsClock = Arc::new(|| 0.0);
        let view = SubtitlesView::create(root.tree_mut(), id, Arc::new(SubQueue::new()), clock).unwrap();
        root.resize(RectI::from_xywh(0, 0, 1024, 768));
        assert_eq!(root.tree().rect(view).map(|r| r.width()), Some(1024));
    }
}
