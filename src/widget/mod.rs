//! Immediate-mode widget layer
//!
//! This module contains:
//! - Per-frame input snapshot and pointer edge tracking
//! - Widget registry with z-ordered hit testing
//! - Buttons, the menu bar, dialogs and their parts

pub mod button;
pub mod dialog;
pub mod input;
pub mod menu;
pub mod notifier;
pub mod progress;
pub mod registry;
pub mod text_field;
