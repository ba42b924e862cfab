//! Pure domain types with minimal dependencies
//!
//! Types here know nothing about windows, widgets or worker threads so every
//! other module can depend on them.

pub mod geometry;
pub mod selection;
pub mod suggestion;

pub use geometry::*;
pub use selection::*;
pub use suggestion::*;
