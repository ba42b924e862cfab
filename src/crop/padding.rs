//! Fractional offsets between a manual crop box and its suggestion
//!
//! All math runs in image-fraction space so a correction made at one zoom
//! level re-derives proportionally at any other.

use crate::domain::{Rect, Suggestion};

/// Signed offset of each crop edge from the matching suggestion edge,
/// divided by the suggestion's width (left/right) or height (top/bottom)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Padding {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Padding {
    /// Padding that reproduces `manual` from `suggestion` in a `width x height` display
    ///
    /// Returns `None` when the suggestion has no area, since no offset can be
    /// normalized against it.
    pub fn between(suggestion: &Suggestion, manual: &Rect, width: i32, height: i32) -> Option<Self> {
        let (sw, sh) = (suggestion.width(), suggestion.height());
        if sw <= 0.0 || sh <= 0.0 || width <= 0 || height <= 0 {
            return None;
        }
        let m = manual.normalized();
        let (w, h) = (width as f32, height as f32);
        let [sx1, sy1, sx2, sy2] = suggestion.bounds;
        Some(Self {
            left: (m.x1 as f32 / w - sx1) / sw,
            top: (m.y1 as f32 / h - sy1) / sh,
            right: (m.x2 as f32 / w - sx2) / sw,
            bottom: (m.y2 as f32 / h - sy2) / sh,
        })
    }

    /// Re-derive the padded box in a `width x height` display, without clamping
    pub fn apply(&self, suggestion: &Suggestion, width: i32, height: i32) -> Rect {
        let (sw, sh) = (suggestion.width(), suggestion.height());
        let (w, h) = (width as f32, height as f32);
        let [sx1, sy1, sx2, sy2] = suggestion.bounds;
        Rect::new(
            ((sx1 + self.left * sw) * w).round() as i32,
            ((sy1 + self.top * sh) * h).round() as i32,
            ((sx2 + self.right * sw) * w).round() as i32,
            ((sy2 + self.bottom * sh) * h).round() as i32,
        )
    }
}

/// Clamp every coordinate into `[0, width] x [0, height]`
pub fn clamp_rect(rect: Rect, width: i32, height: i32) -> Rect {
    Rect::new(
        rect.x1.clamp(0, width),
        rect.y1.clamp(0, height),
        rect.x2.clamp(0, width),
        rect.y2.clamp(0, height),
    )
}

/// Shrink the longer side so the box is square, keeping its centre
pub fn square_about_center(rect: Rect) -> Rect {
    let r = rect.normalized();
    let side = r.width().min(r.height());
    let x1 = r.x1 + (r.width() - side) / 2;
    let y1 = r.y1 + (r.height() - side) / 2;
    Rect::new(x1, y1, x1 + side, y1 + side)
}

/// Place a suggestion plus padding in display space, clamped then squared
pub fn place_suggestion(suggestion: &Suggestion, padding: &Padding, width: i32, height: i32) -> Rect {
    let raw = padding.apply(suggestion, width, height);
    square_about_center(clamp_rect(raw, width, height))
}
