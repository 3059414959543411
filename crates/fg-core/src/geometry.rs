//! Drag and resize geometry in canvas space.
//!
//! Resizing from a west or north edge keeps the opposite edge fixed: the
//! origin moves by exactly the amount the clamped size grew or shrank, so
//! once a bound is hit the origin stops moving too.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeDirection {
    pub const ALL: [ResizeDirection; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::NE,
        Self::NW,
        Self::SE,
        Self::SW,
    ];

    pub fn has_north(self) -> bool {
        matches!(self, Self::N | Self::NE | Self::NW)
    }

    pub fn has_south(self) -> bool {
        matches!(self, Self::S | Self::SE | Self::SW)
    }

    pub fn has_east(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    pub fn has_west(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::NE => "ne",
            Self::NW => "nw",
            Self::SE => "se",
            Self::SW => "sw",
        }
    }

    /// Handle anchor on a frame, as fractions of width and height.
    fn anchor(self) -> (f64, f64) {
        let x = if self.has_west() {
            0.0
        } else if self.has_east() {
            1.0
        } else {
            0.5
        };
        let y = if self.has_north() {
            0.0
        } else if self.has_south() {
            1.0
        } else {
            0.5
        };
        (x, y)
    }
}

impl fmt::Display for ResizeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ResizeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.token() == token)
            .ok_or_else(|| format!("unknown resize direction: {s}"))
    }
}

// ─── Bounds & frames ─────────────────────────────────────────────────────

/// Inclusive size limits for a component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeBounds {
    pub min: Size,
    pub max: Size,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            min: Size::new(100.0, 80.0),
            max: Size::new(800.0, 600.0),
        }
    }
}

impl SizeBounds {
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            clamp_axis(size.width, self.min.width, self.max.width),
            clamp_axis(size.height, self.min.height, self.max.height),
        )
    }

    pub fn fits(&self, size: Size) -> bool {
        self.clamp(size) == size
    }
}

/// Never panics, unlike `f64::clamp`: a misconfigured `min > max` yields
/// `max`, and NaN yields `min`.
fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Position and size of a component in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub position: Point,
    pub size: Size,
}

impl Frame {
    pub fn new(position: Point, size: Size) -> Self {
        Self { position, size }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Inclusive hit test.
    pub fn contains(&self, point: Point) -> bool {
        let r = self.rect();
        point.x >= r.x0 && point.x <= r.x1 && point.y >= r.y0 && point.y <= r.y1
    }

    /// Square hit box of `extent` centered on the handle's anchor.
    pub fn handle_rect(&self, direction: ResizeDirection, extent: f64) -> Rect {
        let (fx, fy) = direction.anchor();
        let center = Point::new(
            self.position.x + self.size.width * fx,
            self.position.y + self.size.height * fy,
        );
        Rect::from_center_size(center, Size::new(extent, extent))
    }
}

// ─── Operations ──────────────────────────────────────────────────────────

/// New position after dragging by `delta`. Unclamped.
pub fn drag(start: Point, delta: Vec2) -> Point {
    start + delta
}

/// Frame after dragging the `direction` handle by `delta` from `start`.
pub fn resize(direction: ResizeDirection, start: Frame, delta: Vec2, bounds: &SizeBounds) -> Frame {
    let mut position = start.position;
    let mut width = start.size.width;
    let mut height = start.size.height;

    if direction.has_east() {
        width = clamp_axis(start.size.width + delta.x, bounds.min.width, bounds.max.width);
    } else if direction.has_west() {
        width = clamp_axis(start.size.width - delta.x, bounds.min.width, bounds.max.width);
        position.x = start.position.x - (width - start.size.width);
    }

    if direction.has_south() {
        height = clamp_axis(start.size.height + delta.y, bounds.min.height, bounds.max.height);
    } else if direction.has_north() {
        height = clamp_axis(start.size.height - delta.y, bounds.min.height, bounds.max.height);
        position.y = start.position.y - (height - start.size.height);
    }

    Frame {
        position,
        size: bounds.clamp(Size::new(width, height)),
    }
}
