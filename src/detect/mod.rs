//! Region detectors
//!
//! Detectors propose square crop boxes for an image. They are compiled in and
//! listed in [`DETECTORS`]; the user picks one from the menu, which builds and
//! loads it on a worker.

pub mod batch;
pub mod qr;
pub mod saliency;

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

use crate::config::CropperConfig;
use crate::domain::Suggestion;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// The detector could not be initialised.
    #[error("detector failed to load: {0}")]
    Load(String),

    /// The detector's backing resource is gone; later items would fail too.
    #[error("detector resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The detector failed on one image.
    #[error("detection failed: {0}")]
    Inference(String),
}

/// Capability shared by every detector back-end
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare resources found under `base`
    fn load(&mut self, base: &Path) -> Result<(), DetectorError>;

    /// Release resources; later calls to [`Detector::detect`] report
    /// [`DetectorError::ResourceUnavailable`]
    fn close(&self);

    /// Propose boxes for one image, in image-fraction coordinates
    fn detect(&self, image: &RgbaImage) -> Result<Vec<Suggestion>, DetectorError>;
}

/// One compiled-in detector
pub struct DetectorEntry {
    pub id: &'static str,
    /// Menu label
    pub label: &'static str,
    build: fn(&CropperConfig) -> Box<dyn Detector>,
}

impl DetectorEntry {
    pub fn build(&self, config: &CropperConfig) -> Box<dyn Detector> {
        (self.build)(config)
    }
}

pub static DETECTORS: &[DetectorEntry] = &[
    DetectorEntry {
        id: "qr",
        label: "QR codes",
        build: build_qr,
    },
    DetectorEntry {
        id: "saliency",
        label: "Saliency",
        build: build_saliency,
    },
];

fn build_qr(_: &CropperConfig) -> Box<dyn Detector> {
    Box::new(qr::QrDetector::default())
}

fn build_saliency(_: &CropperConfig) -> Box<dyn Detector> {
    Box::new(saliency::SaliencyDetector::default())
}
