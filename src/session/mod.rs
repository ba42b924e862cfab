//! Editing session around a folder of images
//!
//! This module contains:
//! - Image listing and the resume checkpoint
//! - The per-folder detection result cache
//! - Single and batch crop export
//! - Near-duplicate removal
//! - The final square check over a finished folder
//! - Message types and key bindings

pub mod cache;
pub mod export;
pub mod images;
pub mod messages;
pub mod shortcuts;
pub mod similar;
pub mod square_check;
