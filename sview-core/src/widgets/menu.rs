//! # Menus
//!
//! A menu is a widget whose children are [`MenuItem`]s. An item opening a
//! sub-menu owns that menu as its own child, so the whole chain hangs off the
//! root menu:
//!
//! ```text
//! Menu (root, horizontal)
//!  ├── MenuItem "File" ── Menu (vertical, hidden until File is selected)
//!  │                        ├── MenuItem "Open"      Action(user data)
//!  │                        └── MenuItem "Stereo"    Check(BoolParam)
//!  └── MenuItem "View" ── Menu ...
//! ```
//!
//! The root menu starts inactive: hovering its items does nothing until one
//! is clicked. Once active, hovering selects items and opens their
//! sub-menus. Picking a leaf item, pressing Escape or clicking anywhere
//! outside the menus closes the chain and deactivates the root again.
//! Non-root menus are active for their whole life.

use super::draw::{Color, DrawList};
use super::text_area::{text_width, LINE_HEIGHT};
use super::tree::{WidgetError, WidgetId, WidgetTree};
use super::widget::{DrawCtx, Widget, WidgetCtx};
use crate::geometry::{Corner, RectI};
use crate::keys::{KeyEvent, MouseButton, VirtKey};
use crate::params::{BoolParam, Int32Param};
use crate::signal::Signal;
use std::sync::Arc;

pub const ITEM_HEIGHT: i32 = LINE_HEIGHT;
/// Horizontal padding added to the label width.
const ITEM_PADDING: i32 = 16;
/// Room for the check mark in vertical menus.
const ICON_WIDTH: i32 = 32;
/// Nested vertical menus overlap their parent by this much.
const SUBMENU_OVERLAP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOrient {
    Horizontal,
    Vertical,
}

#[derive(Debug)]
pub struct Menu {
    orient: MenuOrient,
    is_root: bool,
    active: bool,
    selected: Option<WidgetId>,
}

fn wrong_type(id: WidgetId, expected: &'static str) -> WidgetError {
    WidgetError::WrongType { id, expected }
}

impl Menu {
    pub fn create(
        tree: &mut WidgetTree,
        parent: WidgetId,
        left: i32,
        top: i32,
        orient: MenuOrient,
        is_root: bool,
    ) -> Result<WidgetId, WidgetError> {
        let menu = Menu {
            orient,
            is_root,
            active: !is_root,
            selected: None,
        };
        tree.create(parent, menu, RectI::from_xywh(left, top, 0, 0), Corner::TOP_LEFT)
    }

    pub fn orient(&self) -> MenuOrient {
        self.orient
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn selected(&self) -> Option<WidgetId> {
        self.selected
    }

    pub fn add_item(
        tree: &mut WidgetTree,
        menu: WidgetId,
        label: impl Into<String>,
        user_data: usize,
    ) -> Result<WidgetId, WidgetError> {
        let item = Self::add(tree, menu, MenuItem::new(label, MenuItemKind::Action(user_data)))?;
        tree.set_user_data(item, user_data);
        Ok(item)
    }

    /// Item toggling `param`.
    pub fn add_check(
        tree: &mut WidgetTree,
        menu: WidgetId,
        label: impl Into<String>,
        param: Arc<BoolParam>,
    ) -> Result<WidgetId, WidgetError> {
        Self::add(tree, menu, MenuItem::new(label, MenuItemKind::Check(param)))
    }

    /// Item setting `param` to `value`.
    pub fn add_radio(
        tree: &mut WidgetTree,
        menu: WidgetId,
        label: impl Into<String>,
        param: Arc<Int32Param>,
        value: i32,
    ) -> Result<WidgetId, WidgetError> {
        Self::add(tree, menu, MenuItem::new(label, MenuItemKind::Radio(param, value)))
    }

    /// Item opening a new vertical menu. Returns `(item, submenu)`.
    pub fn add_submenu(
        tree: &mut WidgetTree,
        menu: WidgetId,
        label: impl Into<String>,
    ) -> Result<(WidgetId, WidgetId), WidgetError> {
        let item = Self::add(tree, menu, MenuItem::new(label, MenuItemKind::SubMenu))?;
        let submenu = Menu::create(tree, item, 0, 0, MenuOrient::Vertical, false)?;
        tree.set_visibility(submenu, false, true);
        Self::layout(tree, menu)?;
        Ok((item, submenu))
    }

    fn add(tree: &mut WidgetTree, menu: WidgetId, item: MenuItem) -> Result<WidgetId, WidgetError> {
        if tree.widget_as::<Menu>(menu).is_none() {
            return Err(wrong_type(menu, "Menu"));
        }
        let id = tree.create(menu, item, RectI::default(), Corner::TOP_LEFT)?;
        Self::layout(tree, menu)?;
        Ok(id)
    }

    /// Recompute item rectangles, the menu size and sub-menu positions.
    ///
    /// Horizontal items are as wide as their label plus padding, laid out
    /// left to right. Vertical items all share the widest label plus room
    /// for a check mark.
    pub fn layout(tree: &mut WidgetTree, menu: WidgetId) -> Result<(), WidgetError> {
        let orient = tree
            .widget_as::<Menu>(menu)
            .map(|m| m.orient)
            .ok_or_else(|| wrong_type(menu, "Menu"))?;
        let items: Vec<(WidgetId, i32)> = tree
            .children(menu)
            .into_iter()
            .filter_map(|id| tree.widget_as::<MenuItem>(id).map(|item| (id, item.label_width())))
            .collect();

        let (width, height) = match orient {
            MenuOrient::Horizontal => {
                let mut left = 0;
                for (id, label_width) in &items {
                    let width = label_width + ITEM_PADDING;
                    tree.set_rect(*id, RectI::from_xywh(left, 0, width, ITEM_HEIGHT))?;
                    left += width;
                }
                (left, ITEM_HEIGHT)
            }
            MenuOrient::Vertical => {
                let widest = items.iter().map(|(_, w)| *w).max().unwrap_or(0);
                let width = widest + ICON_WIDTH + ITEM_PADDING;
                for (index, (id, _)) in items.iter().enumerate() {
                    let top = index as i32 * ITEM_HEIGHT;
                    tree.set_rect(*id, RectI::from_xywh(0, top, width, ITEM_HEIGHT))?;
                }
                (width, items.len() as i32 * ITEM_HEIGHT)
            }
        };
        let rect = tree.rect(menu).ok_or(WidgetError::StaleHandle(menu))?;
        tree.set_rect(menu, RectI::from_xywh(rect.left, rect.top, width, height))?;

        for (id, _) in &items {
            let Some(submenu) = MenuItem::submenu(tree, *id) else {
                continue;
            };
            let (Some(item_rect), Some(sub_rect)) = (tree.rect(*id), tree.rect(submenu)) else {
                continue;
            };
            // relative to the item
            let (left, top) = match orient {
                MenuOrient::Horizontal => (0, ITEM_HEIGHT),
                MenuOrient::Vertical => (item_rect.width() - SUBMENU_OVERLAP, 0),
            };
            tree.set_rect(submenu, RectI::from_xywh(left, top, sub_rect.width(), sub_rect.height()))?;
        }
        Ok(())
    }

    /// Select `item`, closing the previous selection's sub-menu and opening
    /// the new one.
    pub fn select_item(tree: &mut WidgetTree, menu: WidgetId, item: WidgetId) {
        let Some(previous) = tree.widget_as_mut::<Menu>(menu).map(|m| m.selected.replace(item)) else {
            return;
        };
        if previous == Some(item) {
            return;
        }
        if let Some(previous) = previous {
            close_submenu_of(tree, previous);
        }
        if let Some(submenu) = MenuItem::submenu(tree, item) {
            tree.set_visibility(submenu, true, true);
        }
    }

    /// Deselect everything in `menu` and below. A root menu goes inactive,
    /// any other menu is hidden.
    pub fn close(tree: &mut WidgetTree, menu: WidgetId) {
        if let Some(state) = tree.widget_as_mut::<Menu>(menu).map(Menu::collapse) {
            finish_collapse(tree, menu, state);
        }
    }

    /// Close the outermost menu containing `from`.
    pub fn close_chain(tree: &mut WidgetTree, from: WidgetId) {
        let mut outermost = None;
        let mut current = Some(from);
        while let Some(id) = current {
            if tree.widget_as::<Menu>(id).is_some() {
                outermost = Some(id);
            }
            current = tree.parent(id);
        }
        if let Some(menu) = outermost {
            Self::close(tree, menu);
        }
    }

    fn collapse(&mut self) -> Collapse {
        if self.is_root {
            self.active = false;
        }
        Collapse {
            selected: self.selected.take(),
            hide: !self.is_root,
        }
    }
}

struct Collapse {
    selected: Option<WidgetId>,
    hide: bool,
}

fn finish_collapse(tree: &mut WidgetTree, menu: WidgetId, state: Collapse) {
    if let Some(item) = state.selected {
        close_submenu_of(tree, item);
    }
    if state.hide {
        tree.set_visibility(menu, false, true);
    }
}

fn close_submenu_of(tree: &mut WidgetTree, item: WidgetId) {
    if let Some(submenu) = MenuItem::submenu(tree, item) {
        Menu::close(tree, submenu);
    }
}

impl Widget for Menu {
    fn class_name(&self) -> &'static str {
        "StGLMenu"
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        if ctx.rect.width() > 0 && ctx.rect.height() > 0 {
            list.rect(ctx.id, ctx.rect, Color::MENU_BACKGROUND.with_opacity(ctx.opacity));
        }
    }

    fn accepts_focus(&self) -> bool {
        self.is_root
    }

    fn on_focus_changed(&mut self, ctx: &mut WidgetCtx<'_>, focused: bool) {
        if !focused && self.is_root {
            let state = self.collapse();
            finish_collapse(ctx.tree, ctx.id, state);
        }
    }

    fn on_key_down(&mut self, ctx: &mut WidgetCtx<'_>, event: &KeyEvent) -> bool {
        if event.key != VirtKey::ESCAPE || (self.is_root && !self.active) {
            return false;
        }
        let state = self.collapse();
        finish_collapse(ctx.tree, ctx.id, state);
        true
    }
}

#[derive(Debug, Clone)]
pub enum MenuItemKind {
    /// Emits `on_item_click` with the user data.
    Action(usize),
    SubMenu,
    Check(Arc<BoolParam>),
    Radio(Arc<Int32Param>, i32),
}

pub struct MenuItem {
    label: String,
    kind: MenuItemKind,
    pub on_item_click: Signal<usize>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, kind: MenuItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            on_item_click: Signal::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Change the label (e.g. after a language switch) and re-layout the
    /// owning menu.
    pub fn set_label(tree: &mut WidgetTree, item: WidgetId, label: impl Into<String>) -> Result<(), WidgetError> {
        let entry = tree
            .widget_as_mut::<MenuItem>(item)
            .ok_or_else(|| wrong_type(item, "MenuItem"))?;
        entry.label = label.into();
        match tree.parent(item) {
            Some(menu) => Menu::layout(tree, menu),
            None => Ok(()),
        }
    }

    pub fn kind(&self) -> &MenuItemKind {
        &self.kind
    }

    /// Check / radio state, `None` for other kinds.
    pub fn is_checked(&self) -> Option<bool> {
        match &self.kind {
            MenuItemKind::Check(param) => Some(param.value()),
            MenuItemKind::Radio(param, value) => Some(param.value() == *value),
            _ => None,
        }
    }

    fn label_width(&self) -> i32 {
        text_width(&self.label)
    }

    /// Sub-menu opened by `item`, if any.
    pub fn submenu(tree: &WidgetTree, item: WidgetId) -> Option<WidgetId> {
        tree.node(item)?
            .children()
            .iter()
            .find(|child| tree.widget_as::<Menu>(*child).is_some())
    }

    pub fn is_selected(tree: &WidgetTree, item: WidgetId) -> bool {
        tree.parent(item)
            .and_then(|menu| tree.widget_as::<Menu>(menu))
            .is_some_and(|menu| menu.selected == Some(item))
    }
}

impl Widget for MenuItem {
    fn class_name(&self) -> &'static str {
        "StGLMenuItem"
    }

    /// Hovering an item of an active menu selects it.
    fn update(&mut self, ctx: &mut WidgetCtx<'_>, _dt: f64) {
        if ctx.tree.hovered() != Some(ctx.id) || ctx.tree.is_clicked(ctx.id, MouseButton::Left) {
            return;
        }
        let Some(menu) = ctx.tree.parent(ctx.id) else {
            return;
        };
        let selectable = ctx
            .tree
            .widget_as::<Menu>(menu)
            .is_some_and(|m| m.active && m.selected != Some(ctx.id));
        if selectable {
            Menu::select_item(ctx.tree, menu, ctx.id);
        }
    }

    fn draw(&self, ctx: &DrawCtx<'_>, list: &mut DrawList) {
        if MenuItem::is_selected(ctx.tree, ctx.id) {
            list.rect(ctx.id, ctx.rect, Color::HIGHLIGHT.with_opacity(ctx.opacity));
        }
        let mut text_rect = ctx.rect;
        if let Some(checked) = self.is_checked() {
            if checked {
                let icon = RectI::from_xywh(ctx.rect.left + 8, ctx.rect.top + 8, 16, 16);
                list.rect(ctx.id, icon, Color::WHITE.with_opacity(ctx.opacity));
            }
            text_rect.left += ICON_WIDTH;
        }
        list.text(ctx.id, text_rect, self.label.as_str(), Color::WHITE.with_opacity(ctx.opacity));
    }

    fn on_click(&mut self, _ctx: &mut WidgetCtx<'_>, button: MouseButton) -> bool {
        button == MouseButton::Left
    }

    fn on_unclick(&mut self, ctx: &mut WidgetCtx<'_>, button: MouseButton) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        let id = ctx.id;
        let Some(menu) = ctx.tree.parent(id) else {
            return false;
        };
        let Some((is_root, was_selected)) = ctx.tree.widget_as_mut::<Menu>(menu).map(|m| {
            let was_selected = m.active && m.selected == Some(id);
            m.active = true;
            (m.is_root, was_selected)
        }) else {
            return false;
        };

        match &self.kind {
            MenuItemKind::SubMenu => {
                if is_root && was_selected {
                    Menu::close(ctx.tree, menu);
                } else {
                    Menu::select_item(ctx.tree, menu, id);
                }
            }
            MenuItemKind::Check(param) => {
                param.reverse();
                Menu::close_chain(ctx.tree, id);
            }
            MenuItemKind::Radio(param, value) => {
                param.set_value(*value);
                Menu::close_chain(ctx.tree, id);
            }
            MenuItemKind::Action(user_data) => {
                tracing::debug!("Menu item {:?} clicked", self.label);
                self.on_item_click.emit(user_data);
                Menu::close_chain(ctx.tree, id);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointD;
    use crate::widgets::RootWidget;
    use parking_lot::Mutex;

    fn root() -> RootWidget {
        RootWidget::new(RectI::from_xywh(0, 0, 800, 600))
    }

    fn at(x: f64, y: f64) -> PointD {
        PointD::new(x / 800.0, y / 600.0)
    }

    fn click(root: &mut RootWidget, x: f64, y: f64) {
        root.mouse_down(at(x, y), MouseButton::Left);
        root.mouse_up(at(x, y), MouseButton::Left);
    }

    fn hover(root: &mut RootWidget, x: f64, y: f64, now: f64) {
        root.mouse_move(at(x, y));
        root.update(now);
    }

    fn menu(root: &RootWidget, id: WidgetId) -> &Menu {
        root.tree().widget_as::<Menu>(id).unwrap()
    }

    #[test]
    fn test_horizontal_layout() {
        let mut tree = WidgetTree::new(RectI::from_xywh(0, 0, 800, 600));
        let root = tree.root();
        let bar = Menu::create(&mut tree, root, 5, 0, MenuOrient::Horizontal, true).unwrap();
        let file = Menu::add_item(&mut tree, bar, "File", 1).unwrap();
        let view = Menu::add_item(&mut tree, bar, "View", 2).unwrap();
        assert_eq!(tree.rect(file), Some(RectI::from_xywh(0, 0, 76, 32)));
        assert_eq!(tree.rect(view), Some(RectI::from_xywh(76, 0, 76, 32)));
        assert_eq!(tree.rect(bar), Some(RectI::from_xywh(5, 0, 152, 32)));
        assert_eq!(tree.user_data(view), 2);
    }

    #[test]
    fn test_vertical_layout_and_submenu_positions() {
        let mut tree = WidgetTree::new(RectI::from_xywh(0, 0, 800, 600));
        let root = tree.root();
        let bar = Menu::create(&mut tree, root, 0, 0, MenuOrient::Horizontal, true).unwrap();
        Menu::add_item(&mut tree, bar, "Help", 0).unwrap();
        let (file, file_menu) = Menu::add_submenu(&mut tree, bar, "File").unwrap();
        Menu::add_item(&mut tree, file_menu, "Open", 0).unwrap();
        let (recent, recent_menu) = Menu::add_submenu(&mut tree, file_menu, "Recent files").unwrap();

        // widest label 140 + 32 + 16
        assert_eq!(tree.rect(file_menu), Some(RectI::from_xywh(0, 32, 188, 64)));
        assert_eq!(tree.rect(recent), Some(RectI::from_xywh(0, 32, 188, 32)));

        let file_abs = tree.absolute_rect(file).unwrap();
        let file_menu_abs = tree.absolute_rect(file_menu).unwrap();
        assert_eq!((file_menu_abs.left, file_menu_abs.top), (file_abs.left, file_abs.bottom));

        let recent_abs = tree.absolute_rect(recent).unwrap();
        let recent_menu_abs = tree.absolute_rect(recent_menu).unwrap();
        assert_eq!(
            (recent_menu_abs.left, recent_menu_abs.top),
            (file_menu_abs.right - 10, recent_abs.top)
        );
        assert!(!tree.is_visible(file_menu));
    }

    #[test]
    fn test_root_menu_needs_a_click() {
        let mut root = root();
        let id = root.id();
        let tree = root.tree_mut();
        let bar = Menu::create(tree, id, 0, 0, MenuOrient::Horizontal, true).unwrap();
        let (file, file_menu) = Menu::add_submenu(tree, bar, "File").unwrap();
        let open = Menu::add_item(tree, file_menu, "Open", 7).unwrap();
        Menu::add_item(tree, file_menu, "Quit", 8).unwrap();

        let clicked = Arc::new(Mutex::new(Vec::new()));
        let sink = clicked.clone();
        root.tree()
            .widget_as::<MenuItem>(open)
            .unwrap()
            .on_item_click
            .connect(move |data| sink.lock().push(*data));

        // hovering an inactive root menu does nothing
        hover(&mut root, 30.0, 16.0, 0.0);
        assert!(!menu(&root, bar).is_active());
        assert_eq!(menu(&root, bar).selected(), None);

        click(&mut root, 30.0, 16.0);
        assert!(menu(&root, bar).is_active());
        assert_eq!(menu(&root, bar).selected(), Some(file));
        assert!(root.tree().is_visible(file_menu));
        assert_eq!(root.focus(), Some(bar));

        // sub-menus select on hover
        hover(&mut root, 30.0, 48.0, 0.1);
        assert_eq!(menu(&root, file_menu).selected(), Some(open));

        click(&mut root, 30.0, 48.0);
        assert_eq!(*clicked.lock(), vec![7]);
        assert!(!menu(&root, bar).is_active());
        assert_eq!(menu(&root, bar).selected(), None);
        assert!(!root.tree().is_visible(file_menu));
    }

    #[test]
    fn test_hover_switches_open_submenu() {
        let mut root = root();
        let id = root.id();
        let tree = root.tree_mut();
        let bar = Menu::create(tree, id, 0, 0, MenuOrient::Horizontal, true).unwrap();
        let (_, file_menu) = Menu::add_submenu(tree, bar, "File").unwrap();
        Menu::add_item(tree, file_menu, "Open", 0).unwrap();
        let (view, view_menu) = Menu::add_submenu(tree, bar, "View").unwrap();
        Menu::add_item(tree, view_menu, "Fullscreen", 0).unwrap();

        click(&mut root, 30.0, 16.0);
        assert!(root.tree().is_visible(file_menu));

        hover(&mut root, 100.0, 16.0, 0.0);
        assert_eq!(menu(&root, bar).selected(), Some(view));
        assert!(!root.tree().is_visible(file_menu));
        assert!(root.tree().is_visible(view_menu));

        // clicking the open item again closes the menu
        click(&mut root, 100.0, 16.0);
        assert!(!menu(&root, bar).is_active());
        assert!(!root.tree().is_visible(view_menu));
    }

    #[test]
    fn test_click_outside_and_escape_close() {
        let mut root = root();
        let id = root.id();
        let tree = root.tree_mut();
        let bar = Menu::create(tree, id, 0, 0, MenuOrient::Horizontal, true).unwrap();
        let (_, file_menu) = Menu::add_submenu(tree, bar, "File").unwrap();
        Menu::add_item(tree, file_menu, "Open", 0).unwrap();

        click(&mut root, 30.0, 16.0);
        assert!(root.tree().is_visible(file_menu));
        root.mouse_down(at(600.0, 400.0), MouseButton::Left);
        root.mouse_up(at(600.0, 400.0), MouseButton::Left);
        assert!(!menu(&root, bar).is_active());
        assert!(!root.tree().is_visible(file_menu));

        click(&mut root, 30.0, 16.0);
        assert!(root.tree().is_visible(file_menu));
        assert!(root.key_down(KeyEvent::new(VirtKey::ESCAPE, 0.0)));
        assert!(!menu(&root, bar).is_active());
        assert!(!root.tree().is_visible(file_menu));
        // nothing left to close
        assert!(!root.key_down(KeyEvent::new(VirtKey::ESCAPE, 0.0)));
    }

    #[test]
    fn test_check_and_radio_items() {
        let mut root = root();
        let id = root.id();
        let stereo = Arc::new(BoolParam::new(false));
        let eye = Arc::new(Int32Param::new(0));
        let tree = root.tree_mut();
        let popup = Menu::create(tree, id, 0, 0, MenuOrient::Vertical, false).unwrap();
        let check = Menu::add_check(tree, popup, "Stereo", stereo.clone()).unwrap();
        Menu::add_radio(tree, popup, "Left", eye.clone(), 0).unwrap();
        let right = Menu::add_radio(tree, popup, "Right", eye.clone(), 1).unwrap();
        assert_eq!(root.tree().widget_as::<MenuItem>(check).unwrap().is_checked(), Some(false));

        click(&mut root, 30.0, 16.0);
        assert!(stereo.value());
        assert_eq!(root.tree().widget_as::<MenuItem>(check).unwrap().is_checked(), Some(true));
        // a popup closes by hiding
        assert!(!root.tree().is_visible(popup));

        root.tree_mut().set_visibility(popup, true, true);
        click(&mut root, 30.0, 80.0);
        assert_eq!(eye.value(), 1);
        assert_eq!(root.tree().widget_as::<MenuItem>(right).unwrap().is_checked(), Some(true));
    }

    #[test]
    fn test_relabel_relayouts() {
        let mut tree = WidgetTree::new(RectI::from_xywh(0, 0, 800, 600));
        let root = tree.root();
        let bar = Menu::create(&mut tree, root, 0, 0, MenuOrient::Horizontal, true).unwrap();
        let a = Menu::add_item(&mut tree, bar, "A", 0).unwrap();
        let b = Menu::add_item(&mut tree, bar, "B", 0).unwrap();
        MenuItem::set_label(&mut tree, a, "Longer").unwrap();
        assert_eq!(tree.rect(a).map(|r| r.width()), Some(96));
        assert_eq!(tree.rect(b).map(|r| r.left), Some(96));
        assert!(matches!(
            Menu::add_item(&mut tree, a, "x", 0),
            Err(WidgetError::WrongType { .. })
        ));
    }
}
