//! Software frame buffer drawn with tiny-skia
//!
//! Everything on screen is redrawn into one [`Canvas`] per frame and then
//! handed to the host window as packed `0RGB` words.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::RgbaImage;
use tiny_skia::{
    IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke, Transform,
};

use crate::domain::{Point, Rect};

/// Opaque RGB color
pub type Rgb = [u8; 3];

/// Width and height of one glyph in pixels
pub const GLYPH_SIZE: i32 = 8;

pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color[0], color[1], color[2], 255));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let r = rect.normalized();
        let Some(area) =
            tiny_skia::Rect::from_xywh(r.x1 as f32, r.y1 as f32, r.width() as f32, r.height() as f32)
        else {
            return;
        };
        self.pixmap
            .fill_rect(area, &paint(color, 255), Transform::identity(), None);
    }

    /// Fill with partial opacity, used for dialog backdrops
    pub fn shade_rect(&mut self, rect: Rect, color: Rgb, alpha: u8) {
        let r = rect.normalized();
        let Some(area) =
            tiny_skia::Rect::from_xywh(r.x1 as f32, r.y1 as f32, r.width() as f32, r.height() as f32)
        else {
            return;
        };
        self.pixmap
            .fill_rect(area, &paint(color, alpha), Transform::identity(), None);
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Rgb, width: f32) {
        let r = rect.normalized();
        let Some(area) =
            tiny_skia::Rect::from_xywh(r.x1 as f32, r.y1 as f32, r.width() as f32, r.height() as f32)
        else {
            return;
        };
        let path = PathBuilder::from_rect(area);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color, 255), &stroke, Transform::identity(), None);
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
            self.pixmap.fill_path(
                &path,
                &paint(color, 255),
                tiny_skia::FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f32, color: Rgb, width: f32) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint(color, 255), &stroke, Transform::identity(), None);
        }
    }

    pub fn draw_pixmap(&mut self, pixmap: &Pixmap, origin: Point) {
        self.pixmap.draw_pixmap(
            origin.x,
            origin.y,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Draw 8x8 bitmap text with its top-left corner at `origin`
    pub fn draw_text(&mut self, origin: Point, text: &str, color: Rgb) {
        let Some(ink) = PremultipliedColorU8::from_rgba(color[0], color[1], color[2], 255) else {
            return;
        };
        let (w, h) = (self.pixmap.width() as i32, self.pixmap.height() as i32);
        let pixels = self.pixmap.pixels_mut();
        let mut cursor_x = origin.x;
        for ch in text.chars() {
            let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
                cursor_x += GLYPH_SIZE;
                continue;
            };
            for (row_idx, row) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (row >> col) & 1 == 0 {
                        continue;
                    }
                    let x = cursor_x + col;
                    let y = origin.y + row_idx as i32;
                    if x >= 0 && y >= 0 && x < w && y < h {
                        pixels[(y * w + x) as usize] = ink;
                    }
                }
            }
            cursor_x += GLYPH_SIZE;
        }
    }

    /// Copy into a `0RGB` buffer as expected by minifb
    pub fn write_0rgb(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.pixmap.pixels().iter().map(|p| {
            let c = p.demultiply();
            ((c.red() as u32) << 16) | ((c.green() as u32) << 8) | c.blue() as u32
        }));
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixmap
            .pixel(x, y)
            .map(|p| p.demultiply())
            .map(|c| [c.red(), c.green(), c.blue()])
    }
}

/// Pixel width of `text` in the bitmap font
pub fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_SIZE
}

/// Convert a decoded image into a drawable pixmap
pub fn pixmap_from_image(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    Pixmap::from_vec(img.as_raw().clone(), size)
}

fn paint(color: Rgb, alpha: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], alpha);
    paint.anti_alias = true;
    paint
}
