//! Typed per-item errors
//!
//! Batch operations match on these to decide between skipping one item and
//! abandoning the rest of the batch. Application-level plumbing uses `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

use crate::detect::DetectorError;

/// Failure while processing a single image
#[derive(Debug, Error)]
pub enum ItemError {
    /// The file could not be read or written.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image could not be decoded or encoded.
    #[error("image error on '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The detector failed on this item.
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// A crop box below one pixel in some dimension.
    #[error("degenerate crop {width}x{height}")]
    Degenerate { width: i64, height: i64 },
}

impl ItemError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ItemError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        ItemError::Image {
            path: path.into(),
            source,
        }
    }

    /// Whether the remaining items of the batch should be abandoned
    pub fn aborts_batch(&self) -> bool {
        matches!(self, ItemError::Detector(DetectorError::ResourceUnavailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_resource_loss_aborts() {
        let lost = ItemError::from(DetectorError::ResourceUnavailable("closed".into()));
        assert!(lost.aborts_batch());

        let inference = ItemError::from(DetectorError::Inference("bad tensor".into()));
        assert!(!inference.aborts_batch());

        let io = ItemError::io("a.jpg", std::io::Error::other("gone"));
        assert!(!io.aborts_batch());
        assert!(io.to_string().contains("a.jpg"));

        assert!(!ItemError::Degenerate { width: 0, height: 3 }.aborts_batch());
    }
}
