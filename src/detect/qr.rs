//! QR code detector using rqrr

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;

use super::{Detector, DetectorError};
use crate::domain::Suggestion;

/// Images are downsampled to this maximum dimension before scanning
const MAX_SCAN_DIM: u32 = 1024;

/// Proposes a square box around every decodable QR code
#[derive(Debug, Default)]
pub struct QrDetector {
    closed: AtomicBool,
}

impl Detector for QrDetector {
    fn name(&self) -> &str {
        "qr"
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
            return Err(DetectorError::ResourceUnavailable("QR scanner closed".into()));
        }
        Ok(find_codes(image, MAX_SCAN_DIM))
    }
}

/// Scan for QR codes, downsampling to `max_dim` first (0 = full resolution)
pub fn find_codes(img: &RgbaImage, max_dim: u32) -> Vec<Suggestion> {
    use rqrr::PreparedImage;

    let (orig_w, orig_h) = (img.width(), img.height());
    if orig_w == 0 || orig_h == 0 {
        return Vec::new();
    }
    let downsample_factor = if max_dim > 0 && (orig_w > max_dim || orig_h > max_dim) {
        orig_w.max(orig_h) as f32 / max_dim as f32
    } else {
        1.0
    };

    let gray = if downsample_factor > 1.0 {
        let new_w = ((orig_w as f32 / downsample_factor) as u32).max(1);
        let new_h = ((orig_h as f32 / downsample_factor) as u32).max(1);
        let resized = image::imageops::resize(img, new_w, new_h, image::imageops::FilterType::Nearest);
        image::DynamicImage::ImageRgba8(resized).to_luma8()
    } else {
        image::DynamicImage::ImageRgba8(img.clone()).to_luma8()
    };
    let (scan_w, scan_h) = gray.dimensions();

    let mut prepared = PreparedImage::prepare(gray);
    let mut results = Vec::new();
    for grid in prepared.detect_grids() {
        if grid.decode().is_err() {
            continue;
        }
        let xs = grid.bounds.iter().map(|p| p.x as f32);
        let ys = grid.bounds.iter().map(|p| p.y as f32);
        let (x1, x2) = xs.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (y1, y2) = ys.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let suggestion = Suggestion::squared_from_pixels(x1, y1, x2, y2, scan_w, scan_h);
        results.push(suggestion.with_confidence(1.0));
    }
    results
}
