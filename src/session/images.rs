//! Image directory listing and resume checkpoint
//!
//! The checkpoint file holds the 1-based index of the image to resume at.
//! It is written atomically whenever the user advances, so a crash leaves
//! either the old or the new value. A folder reopened with a checkpoint past
//! its last image starts over and is flagged for the final square check.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::ItemError;

pub const CHECKPOINT_FILE: &str = "_iter.txt";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug)]
pub struct ImageList {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    cursor: usize,
    deleted: usize,
    wrapped: bool,
}

impl ImageList {
    /// List images in `dir` and restore the cursor from the checkpoint
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        paths.sort();

        let mut cursor = read_checkpoint(&dir).unwrap_or(0);
        let wrapped = !paths.is_empty() && cursor >= paths.len();
        if cursor >= paths.len() {
            cursor = 0;
        }
        log::info!(
            "Opened {} with {} image(s), resuming at {}",
            dir.display(),
            paths.len(),
            cursor + 1
        );
        Ok(Self {
            dir,
            paths,
            cursor,
            deleted: 0,
            wrapped,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Files removed through [`ImageList::delete_current`] this session
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    /// The checkpoint pointed past the last image when the folder was opened
    pub fn checkpoint_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn current(&self) -> Option<&Path> {
        self.paths.get(self.cursor).map(PathBuf::as_path)
    }

    /// Move to the next image; `None` once the list is exhausted
    pub fn advance(&mut self, save_checkpoint: bool) -> Result<Option<&Path>> {
        if self.cursor < self.paths.len() {
            self.cursor += 1;
        }
        if save_checkpoint {
            write_checkpoint(&self.dir, self.cursor + 1)?;
        }
        Ok(self.current())
    }

    /// Delete the current file from disk and the listing
    ///
    /// The cursor then points at what was the next image.
    pub fn delete_current(&mut self) -> Result<Option<&Path>, ItemError> {
        let Some(path) = self.paths.get(self.cursor).cloned() else {
            return Ok(None);
        };
        std::fs::remove_file(&path).map_err(|e| ItemError::io(&path, e))?;
        self.paths.remove(self.cursor);
        self.deleted += 1;
        log::info!("Deleted {}", path.display());
        Ok(self.current())
    }

    /// Drop `settled` paths from the listing, keeping the cursor on the same image
    ///
    /// Files stay on disk.
    pub fn settle(&mut self, settled: &[PathBuf]) {
        let before = self.paths[..self.cursor.min(self.paths.len())]
            .iter()
            .filter(|p| settled.contains(p))
            .count();
        self.paths.retain(|p| !settled.contains(p));
        self.cursor = (self.cursor - before).min(self.paths.len());
        log::info!("{} image(s) left after the final check", self.paths.len());
    }

    /// Start over from the first image
    pub fn reset_checkpoint(&mut self) -> Result<()> {
        write_checkpoint(&self.dir, 0)?;
        self.cursor = 0;
        Ok(())
    }

    /// `[i/n] path` for the status line
    pub fn formatted_info(&self) -> String {
        match self.current() {
            Some(path) => format!("[{}/{}] {}", self.cursor + 1, self.len(), path.display()),
            None => format!("[{}/{}]", self.len(), self.len()),
        }
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_checkpoint(dir: &Path) -> Option<usize> {
    let text = std::fs::read_to_string(dir.join(CHECKPOINT_FILE)).ok()?;
    let value: usize = text.trim().parse().ok()?;
    Some(value.saturating_sub(1))
}

fn write_checkpoint(dir: &Path, value: usize) -> Result<()> {
    let target = dir.join(CHECKPOINT_FILE);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    write!(tmp, "{value}")?;
    tmp.persist(&target)
        .with_context(|| format!("Failed to write checkpoint: {}", target.display()))?;
    Ok(())
}
