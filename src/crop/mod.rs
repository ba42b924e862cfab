//! Crop region geometry engine

pub mod padding;
pub mod region;

pub use padding::{Padding, place_suggestion};
pub use region::{CropRegion, ensure_area};
