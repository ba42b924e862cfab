//! Final pass over a finished folder
//!
//! Images whose aspect ratio is already within 10% of square need no crop.
//! They are stretched to an exact square in place and leave the listing, as
//! do files that can no longer be read.

use std::path::{Path, PathBuf};

use image::GenericImageView;
use image::imageops::FilterType;

use crate::error::ItemError;
use crate::worker::TaskContext;

const ASPECT_TOLERANCE: f32 = 0.1;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SquareCheck {
    /// Paths that need no further cropping
    pub settled: Vec<PathBuf>,
    pub resized: usize,
    pub unreadable: usize,
}

impl std::fmt::Display for SquareCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} image(s) already square ({} resized), {} unreadable.",
            self.settled.len() - self.unreadable,
            self.resized,
            self.unreadable
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    NeedsCrop,
    Square,
    Resized,
}

pub fn is_near_square(width: u32, height: u32) -> bool {
    height > 0 && (width as f32 / height as f32 - 1.0).abs() < ASPECT_TOLERANCE
}

/// Square up near-square images and report which ones are done
pub fn final_square_check(paths: &[PathBuf], ctx: &TaskContext) -> SquareCheck {
    let mut check = SquareCheck::default();
    for (i, path) in paths.iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        match square_up(path) {
            Ok(Shape::NeedsCrop) => {}
            Ok(shape) => {
                if shape == Shape::Resized {
                    check.resized += 1;
                }
                check.settled.push(path.clone());
            }
            Err(err) => {
                log::warn!("Final check: {}", err);
                check.unreadable += 1;
                check.settled.push(path.clone());
            }
        }
        ctx.progress.step(i + 1, paths.len());
    }
    ctx.progress.set(1.0);
    check
}

fn square_up(path: &Path) -> Result<Shape, ItemError> {
    let img = image::open(path).map_err(|e| ItemError::image(path, e))?;
    let (w, h) = img.dimensions();
    if !is_near_square(w, h) {
        return Ok(Shape::NeedsCrop);
    }
    if w == h {
        return Ok(Shape::Square);
    }
    let side = w.max(h);
    img.resize_exact(side, side, FilterType::Triangle)
        .save(path)
        .map_err(|e| ItemError::image(path, e))?;
    log::debug!("Stretched {} to {}x{}", path.display(), side, side);
    Ok(Shape::Resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{CancelToken, TaskQueue};
    use std::time::Duration;

    #[test]
    fn test_near_square() {
        assert!(is_near_square(100, 100));
        assert!(is_near_square(105, 100));
        assert!(!is_near_square(111, 100));
        assert!(!is_near_square(100, 0));
    }

    #[test]
    fn test_settles_square_and_stretches_near_square() {
        let dir = tempfile::tempdir().unwrap();
        let save = |name: &str, w: u32, h: u32| {
            let p = dir.path().join(name);
            image::RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30])).save(&p).unwrap();
            p
        };
        let square = save("a.png", 40, 40);
        let near = save("b.png", 42, 40);
        let wide = save("c.png", 80, 40);
        let broken = dir.path().join("d.png");
        std::fs::write(&broken, b"not a png").unwrap();
        let paths = vec![square.clone(), near.clone(), wide.clone(), broken.clone()];

        let queue = TaskQueue::new(1, 1, CancelToken::default()).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let progress = queue
            .submit(move |ctx| {
                let _ = tx.send(final_square_check(&paths, ctx));
            })
            .unwrap();
        let check = rx.recv_timeout(Duration::from_secs(30)).unwrap();

        assert_eq!(check.settled, vec![square, near.clone(), broken]);
        assert_eq!((check.resized, check.unreadable), (1, 1));
        assert_eq!(image::open(&near).unwrap().dimensions(), (42, 42));
        assert_eq!(image::open(&wide).unwrap().dimensions(), (80, 40));
        assert_eq!(progress.get(), 1.0);
        assert_eq!(check.to_string(), "2 image(s) already square (1 resized), 1 unreadable.");
    }
}
