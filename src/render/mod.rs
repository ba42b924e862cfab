//! Drawing module
//!
//! This module contains:
//! - The software canvas every frame is drawn into
//! - Crop box and suggestion overlay drawing

pub mod canvas;
pub mod overlay;
