//! Running a detector over many images on a worker
//!
//! Cached results are published without touching the detector. Each fresh
//! result is published as one complete list the moment it is known, and all
//! fresh results are merged into the cache at the end.

use std::path::PathBuf;

use super::Detector;
use crate::domain::{Suggestion, SuggestionMap};
use crate::error::ItemError;
use crate::session::cache::ResultCache;
use crate::worker::{TaskContext, TaskEvent};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSummary {
    pub processed: usize,
    pub cached: usize,
    pub skipped: usize,
    /// The detector's resource went away and the rest of the batch was dropped
    pub aborted: bool,
    pub cancelled: bool,
}

impl std::fmt::Display for DetectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Detection finished: {} image(s) processed ({} cached), {} skipped.",
            self.processed, self.cached, self.skipped
        )?;
        if self.aborted {
            write!(f, " Stopped early: detector unavailable.")?;
        }
        if self.cancelled {
            write!(f, " Cancelled.")?;
        }
        Ok(())
    }
}

/// Keep suggestions without a score or scoring at least `min_confidence`
pub fn filter_confident(suggestions: Vec<Suggestion>, min_confidence: f32) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .filter(|s| s.confidence.is_none_or(|c| c >= min_confidence))
        .collect()
}

pub fn run_detection(
    detector: &dyn Detector,
    paths: &[PathBuf],
    cache: &ResultCache,
    min_confidence: f32,
    ctx: &TaskContext,
) -> DetectionSummary {
    let mut summary = DetectionSummary::default();
    let known = cache.load();
    let mut fresh = SuggestionMap::new();

    for (i, path) in paths.iter().enumerate() {
        if ctx.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        if let Some(cached) = known.get(path) {
            ctx.publish(TaskEvent::Suggestions {
                path: path.clone(),
                suggestions: cached.clone(),
            });
            summary.processed += 1;
            summary.cached += 1;
        } else {
            match detect_one(detector, path, min_confidence) {
                Ok(suggestions) => {
                    log::debug!("{}: {} suggestion(s)", path.display(), suggestions.len());
                    fresh.insert(path.clone(), suggestions.clone());
                    ctx.publish(TaskEvent::Suggestions {
                        path: path.clone(),
                        suggestions,
                    });
                    summary.processed += 1;
                }
                Err(err) if err.aborts_batch() => {
                    log::error!("Aborting detection at {}: {}", path.display(), err);
                    summary.aborted = true;
                    summary.skipped += paths.len() - i;
                    break;
                }
                Err(err) => {
                    log::warn!("Skipping {}: {}", path.display(), err);
                    summary.skipped += 1;
                }
            }
        }
        ctx.progress.step(i + 1, paths.len());
    }

    if !fresh.is_empty()
        && let Err(err) = cache.merge(&fresh)
    {
        log::error!("Failed to update result cache: {:?}", err);
    }
    ctx.progress.set(1.0);
    summary
}

fn detect_one(detector: &dyn Detector, path: &PathBuf, min_confidence: f32) -> Result<Vec<Suggestion>, ItemError> {
    let image = image::open(path).map_err(|e| ItemError::image(path, e))?;
    let found = detector.detect(&image.to_rgba8())?;
    Ok(filter_confident(found, min_confidence))
}
