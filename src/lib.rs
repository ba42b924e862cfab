//! Square crop editor with detector-proposed regions

pub mod config;
pub mod core;
pub mod crop;
pub mod detect;
pub mod domain;
pub mod error;
pub mod render;
pub mod session;
pub mod widget;
pub mod worker;
