//! Detector-proposed crop boxes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A proposed box in image-fraction coordinates `[0, 1]`
///
/// Serialized as `{"score": f, "bbox": [x1, y1, x2, y2]}`, the record shape
/// used by the per-directory result cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "score", default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(rename = "bbox")]
    pub bounds: [f32; 4],
}

impl Suggestion {
    pub fn new(bounds: [f32; 4]) -> Self {
        Self {
            confidence: None,
            bounds,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn width(&self) -> f32 {
        self.bounds[2] - self.bounds[0]
    }

    pub fn height(&self) -> f32 {
        self.bounds[3] - self.bounds[1]
    }

    /// Build a square suggestion centred on a pixel-space box
    ///
    /// The side is the smaller of the two box dimensions; coordinates are
    /// divided by the image size so the result is resolution independent.
    pub fn squared_from_pixels(x1: f32, y1: f32, x2: f32, y2: f32, width: u32, height: u32) -> Self {
        let half = (x2 - x1).min(y2 - y1) / 2.0;
        let cx = (x1 + x2) / 2.0;
        let cy = (y1 + y2) / 2.0;
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self::new([
            ((cx - half) / w).clamp(0.0, 1.0),
            ((cy - half) / h).clamp(0.0, 1.0),
            ((cx + half) / w).clamp(0.0, 1.0),
            ((cy + half) / h).clamp(0.0, 1.0),
        ])
    }
}

/// Path to ordered list of suggestions
pub type SuggestionMap = HashMap<PathBuf, Vec<Suggestion>>;
