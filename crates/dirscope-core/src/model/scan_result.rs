/// Scan results and entry metadata as delivered by a backend.
///
/// A `ScanResult` is immutable once built. The session shares it between
/// the current display and the folder cache via `Arc`, so nothing may
/// assume unique ownership.
use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::label::file_name;

/// One immediate child of a scanned directory (or one search match).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Cumulative size in bytes (recursive for directories).
    pub size: u64,
    /// Absolute path of the entry.
    pub path: CompactString,
    pub is_file: bool,
}

impl DirEntry {
    pub fn new(path: impl Into<CompactString>, size: u64, is_file: bool) -> Self {
        Self {
            size,
            path: path.into(),
            is_file,
        }
    }

    /// Display name (final path component).
    pub fn name(&self) -> &str {
        file_name(&self.path)
    }
}

/// The listing of a directory with cumulative sizes.
///
/// Also used for search match sets, where `root_path` is the search scope
/// and `entries` are the matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Recursive cumulative size of `root_path`.
    pub total_size: u64,
    pub root_path: CompactString,
    /// `None` when `root_path` is a filesystem root.
    pub parent_path: Option<CompactString>,
    /// Backend delivery order; not guaranteed sorted.
    pub entries: Vec<DirEntry>,
}

impl ScanResult {
    pub fn new(
        root_path: impl Into<CompactString>,
        parent_path: Option<CompactString>,
        total_size: u64,
        entries: Vec<DirEntry>,
    ) -> Self {
        Self {
            total_size,
            root_path: root_path.into(),
            parent_path,
            entries,
        }
    }
}

/// Filesystem metadata for a single entry, shown in the details popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    pub path: CompactString,
    pub created: Option<DateTime<Local>>,
    pub accessed: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    pub read_only: bool,
    pub file_size: u64,
}
