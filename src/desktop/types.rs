use serde::{Deserialize, Serialize};

/// Platform window identifier (X11 window id, HWND, CGWindowID)
pub type WindowId = u32;

/// Integer point in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by another point (used to turn window-relative into absolute)
    pub fn offset(self, origin: Point) -> Self {
        Self {
            x: self.x + origin.x,
            y: self.y + origin.y,
        }
    }
}

/// Screen or image rectangle in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center with integer division, matching how pixel boxes are reported
    pub fn center(&self) -> Point {
        Point::new(
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && (x as i64) < self.x as i64 + self.width as i64
            && (y as i64) < self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x={}, y={}, width={}, height={}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Window information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub app_name: String,
    pub bounds: Rect,
    pub is_minimized: bool,
}

impl WindowInfo {
    pub fn display_name(&self) -> String {
        if self.app_name.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.app_name)
        }
    }
}

/// The window an automation session drives.
///
/// `geometry` is refreshed before every action since the window may be moved
/// or resized while the automation is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowTarget {
    pub id: WindowId,
    pub geometry: Rect,
}

impl WindowTarget {
    pub fn new(id: WindowId, geometry: Rect) -> Self {
        Self { id, geometry }
    }

    /// Convert a window-relative point to absolute screen coordinates
    pub fn to_screen(&self, relative: Point) -> Point {
        relative.offset(self.geometry.origin())
    }
}
