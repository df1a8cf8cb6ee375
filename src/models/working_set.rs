//! The ordered set of files under review.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::FileRecord;

/// Files queued for protection plus the chosen output directory.
///
/// Records are appended in processing order. Only the password field is
/// edited after insertion.
#[derive(Debug, Default, Serialize)]
pub struct WorkingSet {
    files: Vec<FileRecord>,
    /// Custom output directory; `None` writes next to each input file.
    output_dir: Option<PathBuf>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn set_output_dir(&mut self, dir: Option<PathBuf>) {
        self.output_dir = dir;
    }

    /// Append newly processed records.
    pub fn extend(&mut self, records: impl IntoIterator<Item = FileRecord>) {
        self.files.extend(records);
    }

    /// Remove a record from the set.
    pub fn remove(&mut self, index: usize) -> Option<FileRecord> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Drop every record. The output directory is kept.
    pub fn reset(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter()
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.files.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FileRecord> {
        self.files.get_mut(index)
    }

    /// Index of the first record with the given file name.
    pub fn position_by_name(&self, file_name: &str) -> Option<usize> {
        self.files.iter().position(|f| f.file_name == file_name)
    }

    /// Set a user-supplied password. Returns false for an unknown index.
    pub fn set_password(&mut self, index: usize, password: impl Into<String>) -> bool {
        match self.files.get_mut(index) {
            Some(record) => {
                record.set_password(password);
                true
            }
            None => false,
        }
    }

    /// Number of records with a non-empty password.
    pub fn ready_count(&self) -> usize {
        self.files.iter().filter(|f| f.has_password()).count()
    }

    /// Number of records still needing a password.
    pub fn pending_count(&self) -> usize {
        self.len() - self.ready_count()
    }

    /// Whether every record has a password.
    pub fn is_ready(&self) -> bool {
        self.pending_count() == 0
    }

    /// Short status line, e.g. "2 of 3 ready".
    pub fn status_summary(&self) -> String {
        format!("{} of {} ready", self.ready_count(), self.len())
    }

    /// Directory an encrypted copy of `record` is written to.
    pub fn output_dir_for(&self, record: &FileRecord) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| record.input_dir())
    }

    /// Directory shown after a batch: the custom one or the first file's.
    pub fn display_output_dir(&self) -> Option<PathBuf> {
        self.output_dir
            .clone()
            .or_else(|| self.files.first().map(FileRecord::input_dir))
    }
}
