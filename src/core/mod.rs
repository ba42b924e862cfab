//! Core application module
//!
//! This module contains:
//! - Application state and message handling
//! - The fixed-cadence frame loop and its host seam
//! - The minifb window host

pub mod app;
pub mod frame_loop;
pub mod host;
