//! Near-duplicate removal
//!
//! Each image is shrunk to a 64x64 thumbnail and compared with the thumbnails
//! of images kept so far. One whose normalized L2 distance to any of them is
//! below the threshold is deleted from disk.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::ItemError;
use crate::worker::TaskContext;

const THUMB_SIDE: u32 = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimilarSummary {
    pub removed: usize,
    pub skipped: usize,
}

impl std::fmt::Display for SimilarSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} similar images found and removed.", self.removed)
    }
}

/// Delete images that nearly duplicate an earlier one
///
/// `window` bounds how many retained thumbnails are compared against; zero
/// compares with all of them.
pub fn remove_similar(paths: &[PathBuf], threshold: f32, window: usize, ctx: &TaskContext) -> SimilarSummary {
    let mut summary = SimilarSummary::default();
    let mut kept: VecDeque<Vec<f32>> = VecDeque::new();
    for (i, path) in paths.iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        match thumbnail(path) {
            Ok(thumb) => {
                if kept.iter().any(|k| distance(k, &thumb) < threshold) {
                    match std::fs::remove_file(path) {
                        Ok(()) => {
                            log::info!("Removed near-duplicate {}", path.display());
                            summary.removed += 1;
                        }
                        Err(e) => {
                            log::warn!("{}", ItemError::io(path, e));
                            summary.skipped += 1;
                        }
                    }
                } else {
                    kept.push_back(thumb);
                    if window > 0 && kept.len() > window {
                        kept.pop_front();
                    }
                }
            }
            Err(err) => {
                log::warn!("Skipping {}", err);
                summary.skipped += 1;
            }
        }
        ctx.progress.step(i + 1, paths.len());
    }
    ctx.progress.set(1.0);
    summary
}

fn thumbnail(path: &Path) -> Result<Vec<f32>, ItemError> {
    let img = image::open(path).map_err(|e| ItemError::image(path, e))?;
    let small = img.resize_exact(THUMB_SIDE, THUMB_SIDE, FilterType::Triangle).to_rgb8();
    Ok(small.into_raw().into_iter().map(f32::from).collect())
}

/// L2 distance divided by the thumbnail pixel count
fn distance(a: &[f32], b: &[f32]) -> f32 {
    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    sum.sqrt() / (THUMB_SIDE * THUMB_SIDE) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{CancelToken, TaskQueue};
    use std::time::Duration;

    #[test]
    fn test_duplicates_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let solid = |name: &str, v: u8| {
            let p = dir.path().join(name);
            image::RgbImage::from_pixel(80, 80, image::Rgb([v, v, v])).save(&p).unwrap();
            p
        };
        let paths = vec![
            solid("a.png", 10),
            solid("b.png", 10),
            solid("c.png", 250),
            solid("d.png", 11),
        ];

        let queue = TaskQueue::new(1, 1, CancelToken::default()).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let job_paths = paths.clone();
        queue
            .submit(move |ctx| {
                let _ = tx.send(remove_similar(&job_paths, 1.0, 0, ctx));
            })
            .unwrap();
        let summary = rx.recv_timeout(Duration::from_secs(30)).unwrap();

        assert_eq!(summary.removed, 2);
        assert!(paths[0].exists());
        assert!(!paths[1].exists());
        assert!(paths[2].exists());
        assert!(!paths[3].exists());
        assert_eq!(summary.to_string(), "2 similar images found and removed.");
    }

    #[test]
    fn test_distance_scale() {
        let a = vec![0.0; 12288];
        let mut b = a.clone();
        b[0] = 4096.0;
        assert!((distance(&a, &b) - 1.0).abs() < 1e-6);
    }
}
