//! Modal-looking text box with an OK button.

use super::button::Button;
use super::draw::{Color, DrawList};
use super::text_area::{text_size, TextArea, LINE_HEIGHT};
use super::tree::{WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget, WidgetCtx};
use crate::geometry::{Corner, HCorner, RectI, VCorner};
use crate::keys::{KeyEvent, MouseButton, VirtKey};
use crate::queues::{Msg, MsgLevel};

const MARGIN: i32 = 20;
const MIN_WIDTH: i32 = 200;

#[derive(Debug, Clone)]
pub struct MessageBox {
    level: MsgLevel,
}

impl MessageBox {
    /// Create a centered box showing `msg`.
    ///
    /// The OK button queues the box for destruction; it disappears on the
    /// next root update.
    pub fn create(tree: &mut WidgetTree, parent: WidgetId, msg: &Msg) -> Result<WidgetId, WidgetError> {
        let (text_w, text_h) = text_size(&msg.text);
        let width = text_w.max(MIN_WIDTH) + 2 * MARGIN;
        let height = text_h + LINE_HEIGHT + 3 * MARGIN;
        let id = tree.create(
            parent,
            MessageBox { level: msg.level },
            RectI::from_xywh(0, 0, width, height),
            Corner::CENTER,
        )?;
        TextArea::create(tree, id, MARGIN, MARGIN, msg.text.as_str())?;

        let bottom_center = Corner::new(VCorner::Bottom, HCorner::Center);
        let ok = Button::create(tree, id, 0, -MARGIN, bottom_center, "OK")?;
        let destroyer = tree.destroyer();
        if let Some(signals) = tree.signals(ok) {
            signals.on_mouse_unclick.connect(move |_| destroyer.destroy_with_delay(id));
        }
        tree.request_focus(Some(id));
        tracing::debug!("Message box {} ({:?})", id, msg.level);
        Ok(id)
    }

    pub fn level(&self) -> MsgLevel {
        self.level
    }
}

impl Widget for MessageBox {
    fn class_name(&self) -> &'static str {
        "StGLMessageBox"
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        let background = match self.level {
            MsgLevel::Info => Color::MENU_BACKGROUND,
            MsgLevel::Error => Color::ERROR,
        };
        list.rect(ctx.id, ctx.rect, background.with_opacity(ctx.opacity));
    }

    fn accepts_focus(&self) -> bool {
        true
    }

    /// Swallow clicks on the box body.
    fn on_click(&mut self, _ctx: &mut WidgetCtx<'_>, _button: MouseButton) -> bool {
        true
    }

    fn on_key_down(&mut self, ctx: &mut WidgetCtx<'_>, event: &KeyEvent) -> bool {
        if event.key == VirtKey::RETURN || event.key == VirtKey::ESCAPE {
            ctx.tree.destroy_with_delay(ctx.id);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::RootWidget;

    #[test]
    fn test_layout_and_escape() {
        let mut root = RootWidget::new(RectI::from_xywh(0, 0, 800, 600));
        let id = root.id();
        let msg = Msg {
            level: MsgLevel::Error,
            text: "Short".to_string(),
        };
        let boxed = MessageBox::create(root.tree_mut(), id, &msg).unwrap();
        // width: max(70, 200) + 40, height: 32 + 32 + 60
        assert_eq!(root.tree().absolute_rect(boxed), Some(RectI::from_xywh(280, 238, 240, 124)));
        let children = root.tree().children(boxed);
        assert_eq!(children.len(), 2);
        let ok = root.tree().absolute_rect(children[1]).unwrap();
        assert_eq!(ok.bottom, 238 + 124 - MARGIN);

        root.update(0.0);
        assert_eq!(root.focus(), Some(boxed));
        assert!(root.key_down(KeyEvent::new(VirtKey::ESCAPE, 0.0)));
        root.update(0.1);
        assert!(!root.tree().contains(boxed));
    }
}
