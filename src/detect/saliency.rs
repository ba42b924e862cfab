//! Edge and colour interest detector
//!
//! Scores a coarse grid of square windows on a downsampled copy of the image
//! by edge density, colour variance, saturation and distance from the centre,
//! and proposes the best one.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use imageproc::edges;

use super::{Detector, DetectorError};
use crate::domain::Suggestion;

/// Side of the proposed square relative to the image's shorter side
const WINDOW_RATIO: f32 = 0.75;
/// Longest side of the analysis copy
const ANALYSIS_DIM: u32 = 160;
/// Grid positions per axis
const GRID: u32 = 5;
/// Above this share of edges in the middle quarter, the centre crop wins outright
const CENTRAL_THRESHOLD: f32 = 0.6;

#[derive(Debug, Default)]
pub struct SaliencyDetector {
    closed: AtomicBool,
}

impl Detector for SaliencyDetector {
    fn name(&self) -> &str {
        "saliency"
    }

    fn load(&mut self, _base: &Path) -> Result<(), DetectorError> {
        self.closed.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn detect(&self, image: &RgbaImage) -> Result<Vec<Suggestion>, DetectorError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DetectorError::ResourceUnavailable("saliency detector closed".into()));
        }
        if image.width() < 2 || image.height() < 2 {
            return Err(DetectorError::Inference(format!(
                "image too small: {}x{}",
                image.width(),
                image.height()
            )));
        }
        Ok(vec![most_interesting_square(image)])
    }
}

/// Best square window, as an unscored suggestion
pub fn most_interesting_square(image: &RgbaImage) -> Suggestion {
    let (w, h) = image.dimensions();
    let scale = (ANALYSIS_DIM as f32 / w.max(h) as f32).min(1.0);
    let small = DynamicImage::ImageRgba8(image.clone()).resize_exact(
        ((w as f32 * scale) as u32).max(1),
        ((h as f32 * scale) as u32).max(1),
        FilterType::Nearest,
    );
    let (sw, sh) = (small.width(), small.height());
    let side = ((sw.min(sh) as f32 * WINDOW_RATIO) as u32).max(1);

    let edges = edges::canny(&small.to_luma8(), 30.0, 80.0);
    let rgb = small.to_rgb8();

    let (best_x, best_y) = if central_object_score(&edges) > CENTRAL_THRESHOLD {
        ((sw - side) / 2, (sh - side) / 2)
    } else {
        let x_range = sw.saturating_sub(side);
        let y_range = sh.saturating_sub(side);
        let steps = GRID - 1;
        let mut best = (f32::NEG_INFINITY, 0, 0);
        for gy in 0..GRID {
            let y = (gy * y_range / steps).min(y_range);
            for gx in 0..GRID {
                let x = (gx * x_range / steps).min(x_range);
                let score = region_interest(&edges, &rgb, x, y, side);
                if score > best.0 {
                    best = (score, x, y);
                }
            }
        }
        (best.1, best.2)
    };

    Suggestion::squared_from_pixels(
        best_x as f32,
        best_y as f32,
        (best_x + side) as f32,
        (best_y + side) as f32,
        sw,
        sh,
    )
}

/// Share of edge pixels falling in the middle quarter, times four and capped at one
///
/// An image with no edges at all scores 0.5.
fn central_object_score(edges: &GrayImage) -> f32 {
    let (w, h) = edges.dimensions();
    let (cx, cy, cw, ch) = (w / 4, h / 4, w / 2, h / 2);
    let mut center = 0u32;
    let mut total = 0u32;
    for y in (0..h).step_by(2) {
        for x in (0..w).step_by(2) {
            if edges.get_pixel(x, y)[0] > 0 {
                total += 1;
                if x >= cx && x < cx + cw && y >= cy && y < cy + ch {
                    center += 1;
                }
            }
        }
    }
    if total == 0 {
        return 0.5;
    }
    (center as f32 / total as f32 * 4.0).min(1.0)
}

/// Interest of a square window from 16 sparse samples
fn region_interest(edges: &GrayImage, rgb: &RgbImage, x: u32, y: u32, side: u32) -> f32 {
    let step = (side / 4).max(1);
    let mut edge_count = 0;
    let mut variance_sum = 0.0;
    let mut saturation_sum = 0.0;
    let mut samples = 0;
    for i in 0..4 {
        for j in 0..4 {
            let px = x + j * step + step / 2;
            let py = y + i * step + step / 2;
            if px >= edges.width() || py >= edges.height() {
                continue;
            }
            samples += 1;
            if edges.get_pixel(px, py)[0] > 0 {
                edge_count += 1;
            }
            let [r, g, b] = rgb.get_pixel(px, py).0.map(|c| c as f32);
            let avg = (r + g + b) / 3.0;
            variance_sum += ((r - avg).powi(2) + (g - avg).powi(2) + (b - avg).powi(2)) / 3.0;
            let (max, min) = (r.max(g).max(b), r.min(g).min(b));
            if max > 0.0 {
                saturation_sum += (max - min) / max;
            }
        }
    }
    if samples == 0 {
        return 0.0;
    }
    let n = samples as f32;
    let edge_density = edge_count as f32 / n;
    let variance = (variance_sum / n / 10000.0).min(1.0);
    let saturation = saturation_sum / n;

    let center_x = x as f32 + side as f32 / 2.0;
    let center_y = y as f32 + side as f32 / 2.0;
    let dx = (center_x - rgb.width() as f32 / 2.0) / rgb.width() as f32;
    let dy = (center_y - rgb.height() as f32 / 2.0) / rgb.height() as f32;
    let center_bias = 1.0 - (dx * dx + dy * dy).sqrt().min(1.0);

    0.25 * edge_density + 0.25 * saturation + 0.25 * variance + 0.25 * center_bias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_is_square_in_pixels() {
        let img = RgbaImage::from_fn(300, 200, |x, y| {
            if (200..260).contains(&x) && (40..100).contains(&y) {
                image::Rgba([250, 20, 20, 255])
            } else {
                image::Rgba([30, 30, 30, 255])
            }
        });
        let s = most_interesting_square(&img);
        let w_px = s.width() * 300.0;
        let h_px = s.height() * 200.0;
        assert!((w_px - h_px).abs() <= 3.0, "{w_px} vs {h_px}");
        assert!(s.bounds.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_plain_image_prefers_center() {
        let img = RgbaImage::from_pixel(100, 100, image::Rgba([90, 90, 90, 255]));
        let s = most_interesting_square(&img);
        let cx = (s.bounds[0] + s.bounds[2]) / 2.0;
        let cy = (s.bounds[1] + s.bounds[3]) / 2.0;
        assert!((cx - 0.5).abs() < 0.05 && (cy - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_tiny_image_is_an_inference_error() {
        let d = SaliencyDetector::default();
        let img = RgbaImage::new(1, 1);
        assert!(matches!(d.detect(&img), Err(DetectorError::Inference(_))));
    }
}
