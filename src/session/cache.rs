//! Per-directory detection result cache
//!
//! `output.json` in the image directory maps file names to suggestion
//! records. Updates are read-merge-write under a lock: keys already present
//! are never overwritten, new keys are added, and the whole object is
//! rewritten. A missing or malformed file reads as empty.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::domain::{Suggestion, SuggestionMap};

pub const CACHE_FILE: &str = "output.json";

type Records = BTreeMap<String, Vec<Suggestion>>;

#[derive(Debug)]
pub struct ResultCache {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ResultCache {
    pub fn for_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    /// All cached suggestions, keyed by full image path
    pub fn load(&self) -> SuggestionMap {
        self.read_records()
            .into_iter()
            .map(|(name, list)| (self.dir.join(name), list))
            .collect()
    }

    /// Add entries for paths not yet cached; returns how many were added
    pub fn merge(&self, fresh: &SuggestionMap) -> Result<usize> {
        let _guard = self.write_lock.lock();
        let mut records = self.read_records();
        let mut added = 0;
        for (path, list) in fresh {
            let Some(key) = record_key(path) else {
                continue;
            };
            if !records.contains_key(&key) {
                records.insert(key, list.clone());
                added += 1;
            }
        }
        if added == 0 {
            return Ok(0);
        }

        let json = serde_json::to_string_pretty(&records)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temp file in {}", self.dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.file_path())
            .with_context(|| format!("Failed to write {}", self.file_path().display()))?;
        log::info!("Cached {} new result(s) in {}", added, self.file_path().display());
        Ok(added)
    }

    fn read_records(&self) -> Records {
        let path = self.file_path();
        let Ok(json) = std::fs::read_to_string(&path) else {
            return Records::new();
        };
        match serde_json::from_str(&json) {
            Ok(records) => records,
            Err(err) => {
                log::debug!("Ignoring malformed cache {}: {}", path.display(), err);
                Records::new()
            }
        }
    }
}

fn record_key(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(dir: &Path, entries: &[(&str, f32)]) -> SuggestionMap {
        entries
            .iter()
            .map(|(name, v)| (dir.join(name), vec![Suggestion::new([*v; 4])]))
            .collect()
    }

    #[test]
    fn test_merge_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::for_dir(dir.path());
        assert!(cache.load().is_empty());

        assert_eq!(cache.merge(&map(dir.path(), &[("a.jpg", 0.1)])).unwrap(), 1);
        assert_eq!(
            cache
                .merge(&map(dir.path(), &[("a.jpg", 0.9), ("b.jpg", 0.2)]))
                .unwrap(),
            1
        );

        let loaded = cache.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&dir.path().join("a.jpg")][0].bounds, [0.1; 4]);
        assert_eq!(loaded[&dir.path().join("b.jpg")][0].bounds, [0.2; 4]);
    }

    #[test]
    fn test_corrupt_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE), "[[[ nope").unwrap();
        let cache = ResultCache::for_dir(dir.path());
        assert!(cache.load().is_empty());

        // A merge replaces the unreadable file
        assert_eq!(cache.merge(&map(dir.path(), &[("c.png", 0.3)])).unwrap(), 1);
        assert_eq!(cache.load().len(), 1);
    }

    #[test]
    fn test_records_use_score_and_bbox() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::for_dir(dir.path());
        let mut fresh = SuggestionMap::new();
        fresh.insert(
            dir.path().join("x.jpg"),
            vec![Suggestion::new([0.0, 0.0, 0.5, 0.5]).with_confidence(0.95)],
        );
        cache.merge(&fresh).unwrap();
        let text = std::fs::read_to_string(cache.file_path()).unwrap();
        assert!(text.contains("\"x.jpg\""));
        assert!(text.contains("\"score\""));
        assert!(text.contains("\"bbox\""));
    }
}
