//! Pixel rectangles, points and corner anchoring.
//!
//! Layouts are `#[repr(C)]` because the same values cross the plugin ABI
//! (window placement, mouse positions).

/// Point in double precision.
///
/// Cursor positions use normalized window coordinates: (0, 0) is the
/// top-left corner and (1, 1) the bottom-right one.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

impl PointD {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Integer rectangle stored as top / bottom / left / right.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RectI {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl RectI {
    pub const fn new(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        Self { top, bottom, left, right }
    }

    /// Rectangle from origin and size.
    pub const fn from_xywh(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn move_left_to(&mut self, left: i32) {
        let width = self.width();
        self.left = left;
        self.right = left + width;
    }

    pub fn move_top_to(&mut self, top: i32) {
        let height = self.height();
        self.top = top;
        self.bottom = top + height;
    }

    pub fn move_top_left_to(&mut self, left: i32, top: i32) {
        self.move_left_to(left);
        self.move_top_to(top);
    }

    /// Shift both vertical edges.
    pub fn translate_y(&mut self, dy: i32) {
        self.top += dy;
        self.bottom += dy;
    }

    /// Strict interior test, edges are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > f64::from(self.left)
            && x < f64::from(self.right)
            && y > f64::from(self.top)
            && y < f64::from(self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VCorner {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HCorner {
    #[default]
    Left,
    Center,
    Right,
}

/// Anchor of a child rectangle inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Corner {
    pub v: VCorner,
    pub h: HCorner,
}

impl Corner {
    pub const TOP_LEFT: Corner = Corner { v: VCorner::Top, h: HCorner::Left };
    pub const CENTER: Corner = Corner { v: VCorner::Center, h: HCorner::Center };

    pub const fn new(v: VCorner, h: HCorner) -> Self {
        Self { v, h }
    }
}

/// Convert a child rectangle relative to `parent` into absolute pixels.
pub fn compute_absolute(parent: &RectI, child: &RectI, corner: Corner) -> RectI {
    let left = match corner.h {
        HCorner::Left => parent.left + child.left,
        HCorner::Right => parent.right - child.width() + child.left,
        HCorner::Center => parent.left + (parent.width() - child.width()) / 2 + child.left,
    };
    let top = match corner.v {
        VCorner::Top => parent.top + child.top,
        VCorner::Bottom => parent.bottom - child.height() + child.top,
        VCorner::Center => parent.top + (parent.height() - child.height()) / 2 + child.top,
    };
    RectI::from_xywh(left, top, child.width(), child.height())
}
