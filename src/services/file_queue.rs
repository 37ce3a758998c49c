//! Ordered, deduplicated collection of files staged for one submission.

use crate::models::{FileKey, StagedFile};
use tracing::debug;

/// Files staged for submission, in the order they were added.
///
/// No two entries share a [`FileKey`]; adding a file whose name and size are
/// already present is silently ignored.
#[derive(Clone, Debug, Default)]
pub struct FileQueue {
    entries: Vec<StagedFile>,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every candidate not already present, preserving order.
    ///
    /// Duplicates within `candidates` itself are dropped as well. Returns how
    /// many files were appended.
    pub fn add<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = StagedFile>,
    {
        let before = self.entries.len();
        for file in candidates {
            if self.contains(&file.key()) {
                debug!("skipping duplicate staged file {}", file.name);
                continue;
            }
            self.entries.push(file);
        }
        self.entries.len() - before
    }

    /// Remove the entry with `key`. Returns false when nothing matched.
    pub fn remove(&mut self, key: &FileKey) -> bool {
        match self.entries.iter().position(|f| f.matches(key)) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &FileKey) -> bool {
        self.entries.iter().any(|f| f.matches(key))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<FileKey> {
        self.entries.iter().map(StagedFile::key).collect()
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|f| f.size).sum()
    }
}
