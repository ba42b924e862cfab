//! Geometric types for crop regions and widget bounds

use std::num::NonZeroU32;

/// Integer pixel position in display space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned box in display pixels
///
/// `x1 <= x2` and `y1 <= y2` only hold after [`Rect::normalized`]; a box
/// being dragged may be temporarily inverted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a rectangle from origin and size
    pub fn from_origin(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Square of the given side with its top-left corner at the origin
    pub fn square(side: i32) -> Self {
        Self::new(0, 0, side, side)
    }

    /// Swap coordinates so that `x1 <= x2` and `y1 <= y2`
    pub fn normalized(&self) -> Rect {
        Rect {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Translate the rectangle by the given offset
    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Signed width of the rectangle
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Signed height of the rectangle
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Convert to dimensions (NonZeroU32 width and height)
    pub fn dimensions(self) -> Option<RectDimension> {
        let width = NonZeroU32::new(self.width().unsigned_abs())?;
        let height = NonZeroU32::new(self.height().unsigned_abs())?;
        Some(RectDimension { width, height })
    }

    /// Inclusive containment test, edges count as inside
    pub fn contains(&self, p: Point) -> bool {
        let r = self.normalized();
        p.x >= r.x1 && p.x <= r.x2 && p.y >= r.y1 && p.y <= r.y2
    }

    /// Strict containment test used for widget hit-testing
    pub fn contains_strict(&self, p: Point) -> bool {
        let r = self.normalized();
        p.x > r.x1 && p.x < r.x2 && p.y > r.y1 && p.y < r.y2
    }

    /// The eight handle positions, corners on even indices, edge midpoints on odd
    ///
    /// Order: top-left, top, top-right, right, bottom-right, bottom, bottom-left, left.
    pub fn handle_points(&self) -> [Point; 8] {
        let cx = (self.x1 + self.x2) / 2;
        let cy = (self.y1 + self.y2) / 2;
        [
            Point::new(self.x1, self.y1),
            Point::new(cx, self.y1),
            Point::new(self.x2, self.y1),
            Point::new(self.x2, cy),
            Point::new(self.x2, self.y2),
            Point::new(cx, self.y2),
            Point::new(self.x1, self.y2),
            Point::new(self.x1, cy),
        ]
    }
}

/// Non-zero dimensions of a rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectDimension {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl RectDimension {
    /// Get the width as u32
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    /// Get the height as u32
    pub fn height(&self) -> u32 {
        self.height.get()
    }
}
