//! Writing crops to disk

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};

use crate::config::ExportFormat;
use crate::crop::{Padding, ensure_area, place_suggestion};
use crate::domain::{Rect, Suggestion};
use crate::error::ItemError;
use crate::worker::TaskContext;

/// Directory created next to the images for batch output
pub const OUTPUT_DIR: &str = "Output";

/// One image of a batch export
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub suggestions: Vec<Suggestion>,
    pub padding: Padding,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Process completed. {} crop(s) written", self.written)?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        write!(f, ".")
    }
}

/// `<source>.<ext>`, next to the source
pub fn single_output_path(source: &Path, format: ExportFormat) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// `<dir>/Output/<stem>-<index>.<ext>`
pub fn batch_output_path(source: &Path, index: usize, format: ExportFormat) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(OUTPUT_DIR)
        .join(format!("{stem}-{index}.{}", format.extension()))
}

/// Crop `rect` (original pixels) out of `image` and write it next to `source`
pub fn export_crop(
    image: &DynamicImage,
    source: &Path,
    rect: Rect,
    format: ExportFormat,
) -> Result<PathBuf, ItemError> {
    let target = single_output_path(source, format);
    save_region(image, rect, &target, format)?;
    log::info!("Saved crop to {}", target.display());
    Ok(target)
}

/// Write every suggestion of every entry into the `Output` directory
///
/// Unreadable images and unwritable crops are logged and skipped.
pub fn export_batch(entries: &[BatchEntry], format: ExportFormat, ctx: &TaskContext) -> ExportSummary {
    let mut summary = ExportSummary::default();
    for (i, entry) in entries.iter().enumerate() {
        if ctx.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        match export_entry(entry, format) {
            Ok(report) => {
                summary.written += report.written;
                summary.skipped += report.skipped;
            }
            Err(err) => {
                log::warn!("Skipping {}: {}", entry.path.display(), err);
                summary.skipped += entry.suggestions.len();
            }
        }
        ctx.progress.step(i + 1, entries.len());
    }
    ctx.progress.set(1.0);
    summary
}

fn export_entry(entry: &BatchEntry, format: ExportFormat) -> Result<ExportSummary, ItemError> {
    let image = image::open(&entry.path).map_err(|e| ItemError::image(&entry.path, e))?;
    let (w, h) = image.dimensions();
    if let Some(parent) = batch_output_path(&entry.path, 0, format).parent() {
        std::fs::create_dir_all(parent).map_err(|e| ItemError::io(parent, e))?;
    }

    let mut report = ExportSummary::default();
    for (index, suggestion) in entry.suggestions.iter().enumerate() {
        let rect = place_suggestion(suggestion, &entry.padding, w as i32, h as i32);
        let target = batch_output_path(&entry.path, index, format);
        match save_region(&image, rect, &target, format) {
            Ok(()) => report.written += 1,
            Err(err) => {
                log::warn!("Skipping crop {} of {}: {}", index, entry.path.display(), err);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

fn save_region(image: &DynamicImage, rect: Rect, target: &Path, format: ExportFormat) -> Result<(), ItemError> {
    let r = rect.normalized();
    let dims = ensure_area(r)?;
    let cropped = image.crop_imm(r.x1 as u32, r.y1 as u32, dims.width(), dims.height());
    // JPEG has no alpha channel
    let out = match format {
        ExportFormat::Jpg => DynamicImage::ImageRgb8(cropped.to_rgb8()),
        ExportFormat::Png => cropped,
    };
    out.save_with_format(target, format.image_format())
        .map_err(|e| ItemError::image(target, e))
}
