//! Crop box and suggestion overlay drawn over the displayed image

use crate::crop::CropRegion;
use crate::domain::{Handle, Point, Rect, Suggestion};

use super::canvas::{Canvas, Rgb};

pub const SUGGESTION_COLOR: Rgb = [128, 128, 128];
/// Crop box on an image that has detector suggestions
pub const SUGGESTED_COLOR: Rgb = [0, 90, 255];
/// Crop box on an image without suggestions
pub const MANUAL_COLOR: Rgb = [255, 140, 0];

const HANDLE_RADIUS: f32 = 5.0;
const HOVER_FILL: Rgb = [255, 255, 255];
const ACTIVE_FILL: Rgb = [200, 100, 0];

/// Suggestion box in display pixels
pub fn suggestion_rect(s: &Suggestion, width: i32, height: i32) -> Rect {
    let [x1, y1, x2, y2] = s.bounds;
    Rect::new(
        (x1 * width as f32).round() as i32,
        (y1 * height as f32).round() as i32,
        (x2 * width as f32).round() as i32,
        (y2 * height as f32).round() as i32,
    )
}

/// Draw suggestions, the crop box, and its handles
///
/// `origin` is where the image's top-left pixel sits on the canvas and
/// `pointer` is in image coordinates.
pub fn draw_crop_overlay(
    canvas: &mut Canvas,
    origin: Point,
    region: &CropRegion,
    suggestions: &[Suggestion],
    pointer: Point,
) {
    let (w, h) = region.display_size();
    let to_screen = |r: Rect| r.translate(origin.x, origin.y);

    for s in suggestions {
        canvas.stroke_rect(to_screen(suggestion_rect(s, w, h)), SUGGESTION_COLOR, 1.0);
    }

    let color = if suggestions.is_empty() {
        MANUAL_COLOR
    } else {
        SUGGESTED_COLOR
    };
    let rect = region.rect();
    canvas.stroke_rect(to_screen(rect), color, 2.0);

    let hovered = if region.is_dragging() {
        region.handle()
    } else {
        region.handle_at(pointer)
    };
    for (grip, p) in Handle::GRIPS.iter().zip(rect.handle_points()) {
        let center = Point::new(p.x + origin.x, p.y + origin.y);
        let fill = match (*grip == hovered, region.is_dragging()) {
            (true, true) => ACTIVE_FILL,
            (true, false) => HOVER_FILL,
            _ => color,
        };
        canvas.fill_circle(center, HANDLE_RADIUS, fill);
        canvas.stroke_circle(center, HANDLE_RADIUS, [0, 0, 0], 1.0);
    }
}
