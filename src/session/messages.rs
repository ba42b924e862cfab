//! Message types for the crop editor
//!
//! Every user-facing action, whether it comes from a toolbar button, a menu
//! entry, or a key binding, is expressed as one [`Msg`] and handled in
//! [`crate::core::app::App::update`].

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    // ========================================================================
    // File and session
    // ========================================================================
    /// Ask for an image folder in an Input dialog
    OpenFolderPrompt,
    /// Open a folder and resume from its checkpoint
    LoadFolder(PathBuf),
    /// Leave the application
    Exit,
    /// Restart the folder from the first image
    ResetCheckpoint,

    // ========================================================================
    // Editing the current image
    // ========================================================================
    /// Zoom factor back to 1 and a top-left square crop
    Reset,
    /// Delete the current file from disk
    Delete,
    ZoomIn,
    ZoomOut,
    /// Skip to the next image without saving a crop
    Next,
    /// Save the crop and move on
    CropAndNext,

    // ========================================================================
    // Background jobs
    // ========================================================================
    /// Build and load the detector at this index of the registry
    LoadDetector(usize),
    /// Run a loaded detector on the current image or the whole folder
    Detect { detector: usize, all: bool },
    /// Write every suggestion of every image into the output folder
    ExportAllSuggestions,
    /// Delete near-duplicate images in the folder
    RemoveSimilarImages,
}
