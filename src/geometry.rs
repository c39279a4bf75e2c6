use serde::{Deserialize, Serialize};

/// Absolute screen coordinate in pixels.
///
/// Persisted as a two-element `[x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Divide by a linear display scale, rounding to the nearest pixel.
    pub fn unscaled(self, scale: f64) -> Self {
        if scale == 1.0 {
            return self;
        }
        Self {
            x: (f64::from(self.x) / scale).round() as i32,
            y: (f64::from(self.y) / scale).round() as i32,
        }
    }
}

impl From<[i32; 2]> for ScreenPoint {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<ScreenPoint> for [i32; 2] {
    fn from(p: ScreenPoint) -> Self {
        [p.x, p.y]
    }
}

impl std::fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Screen rectangle of a window, edges inclusive of `left`/`top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }
}
