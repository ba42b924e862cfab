//! Crop box state machine
//!
//! One [`CropRegion`] is bound to the displayed image. Pointer gestures drive
//! it through [`Handle`] states; every update ends inside the display bounds,
//! corner drags and re-application stay square, and a release normalizes the
//! box. Manual edits on a path with suggestions are remembered as [`Padding`]
//! so they survive zoom changes and suggestion refreshes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::padding::{Padding, clamp_rect, place_suggestion};
use crate::domain::{Handle, Point, Rect, RectDimension, Suggestion};
use crate::error::ItemError;

#[derive(Debug, Clone)]
pub struct CropRegion {
    rect: Rect,
    width: i32,
    height: i32,
    path: Option<PathBuf>,
    handle: Handle,
    last_pointer: Point,
    /// First suggestion of the bound path, if any
    primary: Option<Suggestion>,
    paddings: HashMap<PathBuf, Padding>,
    tolerance: f32,
}

impl CropRegion {
    pub fn new(tolerance: f32) -> Self {
        Self {
            rect: Rect::default(),
            width: 0,
            height: 0,
            path: None,
            handle: Handle::Idle,
            last_pointer: Point::default(),
            primary: None,
            paddings: HashMap::new(),
            tolerance,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn display_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn padding(&self, path: &Path) -> Option<&Padding> {
        self.paddings.get(path)
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.handle, Handle::Idle)
    }

    /// Bind the region to an image displayed at `width x height`
    ///
    /// With suggestions the box is re-derived from the first one plus the
    /// path's stored padding (zero on first sight). Without, the previous box
    /// is rescaled proportionally, or a top-left square is created when there
    /// is nothing to rescale.
    pub fn associate(&mut self, path: &Path, width: i32, height: i32, suggestions: &[Suggestion]) {
        let (old_w, old_h) = (self.width, self.height);
        self.width = width.max(0);
        self.height = height.max(0);
        self.path = Some(path.to_path_buf());
        self.handle = Handle::Idle;

        if let Some(first) = suggestions.first() {
            self.primary = Some(*first);
            self.paddings.entry(path.to_path_buf()).or_default();
            self.reapply();
            return;
        }

        self.primary = None;
        if old_w > 0 && old_h > 0 && self.rect.dimensions().is_some() {
            let scale = |v: i32, from: i32, to: i32| (v as f32 * to as f32 / from as f32).round() as i32;
            let r = self.rect.normalized();
            self.rect = clamp_rect(
                Rect::new(
                    scale(r.x1, old_w, self.width),
                    scale(r.y1, old_h, self.height),
                    scale(r.x2, old_w, self.width),
                    scale(r.y2, old_h, self.height),
                ),
                self.width,
                self.height,
            );
        } else {
            self.rect = Rect::square(self.width.min(self.height));
        }
    }

    /// Take a new suggestion list for the bound path without moving the box
    ///
    /// The current box counts as a manual edit against the new first
    /// suggestion.
    pub fn adopt(&mut self, suggestions: &[Suggestion]) {
        self.primary = suggestions.first().copied();
        self.record_padding();
    }

    /// Re-derive the box from the primary suggestion and stored padding
    ///
    /// Runs through [`Handle::Reapply`] and returns to idle; a no-op when the
    /// bound path has no suggestion.
    pub fn reapply(&mut self) {
        let (Some(primary), Some(path)) = (self.primary, self.path.as_ref()) else {
            return;
        };
        self.handle = Handle::Reapply;
        let padding = self.paddings.get(path).copied().unwrap_or_default();
        self.rect = place_suggestion(&primary, &padding, self.width, self.height);
        self.handle = Handle::Idle;
    }

    /// Square of side `min(width, height)` at the origin, counted as a manual edit
    pub fn reset(&mut self) {
        self.handle = Handle::Idle;
        self.rect = Rect::square(self.width.min(self.height));
        self.record_padding();
    }

    /// Which handle a press at `p` would grab
    pub fn handle_at(&self, p: Point) -> Handle {
        let grabbed = self
            .rect
            .handle_points()
            .iter()
            .position(|hp| p.distance(*hp) < self.tolerance);
        match grabbed {
            Some(i) => Handle::GRIPS[i],
            None if self.rect.contains(p) => Handle::Move,
            None => Handle::Idle,
        }
    }

    /// Start a gesture; returns the handle that was grabbed
    pub fn press(&mut self, p: Point) -> Handle {
        self.handle = self.handle_at(p);
        self.last_pointer = p;
        self.handle
    }

    /// Feed the pointer position while the button is held
    pub fn drag(&mut self, p: Point) {
        let (w, h) = (self.width, self.height);
        let clamped = Point::new(p.x.clamp(0, w), p.y.clamp(0, h));
        let r = &mut self.rect;
        match self.handle {
            Handle::Idle | Handle::Reapply => return,
            Handle::NW => {
                let (x, y) = square_corner((r.x2, r.y2), clamped, (-1, -1));
                r.x1 = x;
                r.y1 = y;
            }
            Handle::NE => {
                let (x, y) = square_corner((r.x1, r.y2), clamped, (1, -1));
                r.x2 = x;
                r.y1 = y;
            }
            Handle::SE => {
                let (x, y) = square_corner((r.x1, r.y1), clamped, (1, 1));
                r.x2 = x;
                r.y2 = y;
            }
            Handle::SW => {
                let (x, y) = square_corner((r.x2, r.y1), clamped, (-1, 1));
                r.x1 = x;
                r.y2 = y;
            }
            Handle::N => r.y1 = clamped.y,
            Handle::E => r.x2 = clamped.x,
            Handle::S => r.y2 = clamped.y,
            Handle::W => r.x1 = clamped.x,
            Handle::Move => {
                let moved = r.translate(p.x - self.last_pointer.x, p.y - self.last_pointer.y);
                *r = shift_inside(moved, w, h);
            }
        }
        self.last_pointer = p;
        self.record_padding();
    }

    /// End the gesture: normalize and go idle
    pub fn release(&mut self) {
        if self.handle == Handle::Idle {
            return;
        }
        self.rect = self.rect.normalized();
        self.handle = Handle::Idle;
        self.record_padding();
    }

    /// Map the box back to the full-resolution image
    ///
    /// Boxes with a dimension under one pixel are rejected.
    pub fn export_rect(&self, original_width: u32, original_height: u32) -> Result<Rect, ItemError> {
        let r = self.rect.normalized();
        if self.width <= 0 || self.height <= 0 {
            return Err(ItemError::Degenerate {
                width: r.width() as i64,
                height: r.height() as i64,
            });
        }
        let sx = original_width as f32 / self.width as f32;
        let sy = original_height as f32 / self.height as f32;
        let mapped = clamp_rect(
            Rect::new(
                (r.x1 as f32 * sx).round() as i32,
                (r.y1 as f32 * sy).round() as i32,
                (r.x2 as f32 * sx).round() as i32,
                (r.y2 as f32 * sy).round() as i32,
            ),
            original_width as i32,
            original_height as i32,
        );
        ensure_area(mapped)?;
        Ok(mapped)
    }

    fn record_padding(&mut self) {
        let (Some(primary), Some(path)) = (self.primary, self.path.as_ref()) else {
            return;
        };
        if let Some(padding) = Padding::between(&primary, &self.rect, self.width, self.height) {
            self.paddings.insert(path.clone(), padding);
        }
    }
}

/// Reject boxes narrower or shorter than one pixel
pub fn ensure_area(rect: Rect) -> Result<RectDimension, ItemError> {
    rect.dimensions().ok_or(ItemError::Degenerate {
        width: rect.width() as i64,
        height: rect.height() as i64,
    })
}

/// Square a corner against its fixed anchor
///
/// The side is `min(|dx|, |dy|)`; when the pointer sits level with the anchor
/// on one axis the corner's nominal direction supplies the sign.
fn square_corner(anchor: (i32, i32), pointer: Point, nominal: (i32, i32)) -> (i32, i32) {
    let dx = pointer.x - anchor.0;
    let dy = pointer.y - anchor.1;
    let side = dx.abs().min(dy.abs());
    let sign = |d: i32, fallback: i32| if d == 0 { fallback } else { d.signum() };
    (
        anchor.0 + sign(dx, nominal.0) * side,
        anchor.1 + sign(dy, nominal.1) * side,
    )
}

/// Translate a box by the minimal delta that puts it fully inside the bounds
fn shift_inside(rect: Rect, width: i32, height: i32) -> Rect {
    let n = rect.normalized();
    let dx = if n.x1 < 0 {
        -n.x1
    } else if n.x2 > width {
        width - n.x2
    } else {
        0
    };
    let dy = if n.y1 < 0 {
        -n.y1
    } else if n.y2 > height {
        height - n.y2
    } else {
        0
    };
    rect.translate(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(rect: Rect, w: i32, h: i32) -> CropRegion {
        let mut region = CropRegion::new(7.0);
        region.associate(Path::new("a.jpg"), w, h, &[]);
        region.rect = rect;
        region
    }

    #[test]
    fn test_corner_drag_to_top_left() {
        let mut r = region(Rect::new(10, 10, 50, 50), 100, 100);
        assert_eq!(r.press(Point::new(10, 10)), Handle::NW);
        r.drag(Point::new(5, 5));
        assert_eq!(r.rect(), Rect::new(5, 5, 50, 50));
        r.release();
        assert_eq!(r.handle(), Handle::Idle);
    }

    #[test]
    fn test_corner_drag_is_square_with_fixed_anchor() {
        let starts = [Rect::new(10, 10, 50, 50), Rect::new(20, 30, 80, 45)];
        let pointers = [
            Point::new(0, 0),
            Point::new(95, 3),
            Point::new(50, 50),
            Point::new(-40, 140),
            Point::new(12, 99),
        ];
        for start in starts {
            for (i, corner) in [Handle::NW, Handle::NE, Handle::SE, Handle::SW].into_iter().enumerate() {
                for p in pointers {
                    let mut r = region(start, 100, 100);
                    r.handle = corner;
                    r.drag(p);
                    let out = r.rect();
                    assert_eq!(out.width().abs(), out.height().abs(), "{corner:?} {p:?}");
                    let anchor_before = start.handle_points()[(i * 2 + 4) % 8];
                    let anchor_after = out.handle_points()[(i * 2 + 4) % 8];
                    assert_eq!(anchor_before, anchor_after);
                    assert!(out.x1 >= 0 && out.x2 <= 100 && out.y1 >= 0 && out.y2 <= 100);
                }
            }
        }
    }

    #[test]
    fn test_edge_drag_changes_one_coordinate() {
        let start = Rect::new(20, 20, 60, 60);
        for (edge, p) in [
            (Handle::N, Point::new(40, 5)),
            (Handle::E, Point::new(90, 40)),
            (Handle::S, Point::new(40, 95)),
            (Handle::W, Point::new(1, 40)),
        ] {
            let mut r = region(start, 100, 100);
            r.handle = edge;
            r.drag(p);
            let out = r.rect();
            let changed = [
                out.x1 != start.x1,
                out.y1 != start.y1,
                out.x2 != start.x2,
                out.y2 != start.y2,
            ];
            assert_eq!(changed.iter().filter(|c| **c).count(), 1, "{edge:?}");
        }
    }

    #[test]
    fn test_edge_drag_has_no_square_lock() {
        let mut r = region(Rect::new(20, 20, 60, 60), 100, 100);
        assert_eq!(r.press(Point::new(60, 40)), Handle::E);
        r.drag(Point::new(90, 40));
        assert_eq!(r.rect(), Rect::new(20, 20, 90, 60));
    }

    #[test]
    fn test_move_shifts_whole_box_back_inside() {
        let mut r = region(Rect::new(20, 20, 60, 60), 100, 100);
        assert_eq!(r.press(Point::new(40, 40)), Handle::Move);
        r.drag(Point::new(100, 10));
        let out = r.rect();
        assert_eq!(out, Rect::new(60, 0, 100, 40));
        assert_eq!(out.width(), 40);
        assert_eq!(out.height(), 40);
    }

    #[test]
    fn test_move_preserves_size() {
        let mut r = region(Rect::new(30, 10, 70, 35), 100, 100);
        r.press(Point::new(50, 20));
        for p in [Point::new(-50, 300), Point::new(10, 10), Point::new(80, 81)] {
            r.drag(p);
            let out = r.rect();
            assert_eq!((out.width(), out.height()), (40, 25));
            assert!(out.x1 >= 0 && out.x2 <= 100 && out.y1 >= 0 && out.y2 <= 100);
        }
    }

    #[test]
    fn test_press_outside_stays_idle() {
        let mut r = region(Rect::new(20, 20, 60, 60), 100, 100);
        assert_eq!(r.press(Point::new(90, 90)), Handle::Idle);
        r.drag(Point::new(10, 10));
        assert_eq!(r.rect(), Rect::new(20, 20, 60, 60));
    }

    #[test]
    fn test_release_normalizes() {
        let mut r = region(Rect::new(20, 20, 60, 60), 100, 100);
        r.press(Point::new(60, 40));
        r.drag(Point::new(5, 40));
        assert_eq!(r.rect(), Rect::new(20, 20, 5, 60));
        r.release();
        assert_eq!(r.rect(), Rect::new(5, 20, 20, 60));
    }

    #[test]
    fn test_suggestion_padding_survives_rescale() {
        let s = Suggestion::new([0.2, 0.2, 0.6, 0.6]);
        let path = Path::new("img.png");
        let mut r = CropRegion::new(7.0);
        r.associate(path, 100, 100, &[s]);
        assert_eq!(r.rect(), Rect::new(20, 20, 60, 60));
        assert_eq!(r.padding(path), Some(&Padding::default()));

        r.press(Point::new(60, 60));
        r.drag(Point::new(70, 70));
        r.release();
        assert_eq!(r.rect(), Rect::new(20, 20, 70, 70));
        let pad = r.padding(path).copied().unwrap();
        assert!((pad.right - 0.25).abs() < 1e-6);
        assert!((pad.bottom - 0.25).abs() < 1e-6);

        r.associate(path, 200, 200, &[s]);
        assert_eq!(r.rect(), Rect::new(40, 40, 140, 140));
    }

    #[test]
    fn test_reapply_reproduces_square_manual_box() {
        let path = Path::new("img.png");
        let cases = [
            (Suggestion::new([0.2, 0.2, 0.6, 0.6]), 100, 100, Rect::new(15, 22, 65, 72)),
            (Suggestion::new([0.13, 0.21, 0.47, 0.55]), 640, 480, Rect::new(90, 100, 290, 300)),
            (Suggestion::new([0.5, 0.1, 0.9, 0.4]), 333, 211, Rect::new(170, 30, 301, 161)),
        ];
        for (s, w, h, manual) in cases {
            let mut r = CropRegion::new(7.0);
            r.associate(path, w, h, &[s]);
            r.rect = manual;
            r.record_padding();
            r.rect = Rect::default();

            r.reapply();
            let back = r.rect();
            assert_eq!(r.handle(), Handle::Idle);
            assert!((back.x1 - manual.x1).abs() <= 1, "{back:?} vs {manual:?}");
            assert!((back.y1 - manual.y1).abs() <= 1, "{back:?} vs {manual:?}");
            assert!((back.x2 - manual.x2).abs() <= 1, "{back:?} vs {manual:?}");
            assert!((back.y2 - manual.y2).abs() <= 1, "{back:?} vs {manual:?}");
        }
    }

    #[test]
    fn test_adopt_keeps_box_and_records_padding() {
        let path = Path::new("img.png");
        let mut r = CropRegion::new(7.0);
        r.associate(path, 100, 100, &[]);
        assert!(r.padding(path).is_none());

        r.adopt(&[Suggestion::new([0.2, 0.2, 0.6, 0.6])]);
        assert_eq!(r.rect(), Rect::new(0, 0, 100, 100));
        let pad = r.padding(path).copied().unwrap();
        assert!((pad.left + 0.5).abs() < 1e-6);
        assert!((pad.right - 1.0).abs() < 1e-6);

        r.associate(path, 200, 200, &[Suggestion::new([0.2, 0.2, 0.6, 0.6])]);
        assert_eq!(r.rect(), Rect::new(0, 0, 200, 200));
    }

    #[test]
    fn test_no_suggestion_rescales_previous_box() {
        let mut r = CropRegion::new(7.0);
        r.associate(Path::new("a.jpg"), 100, 80, &[]);
        assert_eq!(r.rect(), Rect::new(0, 0, 80, 80));
        assert!(r.padding(Path::new("a.jpg")).is_none());

        r.associate(Path::new("b.jpg"), 200, 160, &[]);
        assert_eq!(r.rect(), Rect::new(0, 0, 160, 160));
    }

    #[test]
    fn test_export_rect_maps_to_original_and_rejects_empty() {
        let r = region(Rect::new(10, 10, 50, 50), 100, 100);
        assert_eq!(r.export_rect(400, 400).unwrap(), Rect::new(40, 40, 200, 200));

        let flat = region(Rect::new(10, 10, 10, 50), 100, 100);
        assert!(matches!(flat.export_rect(400, 400), Err(ItemError::Degenerate { .. })));
    }
}
