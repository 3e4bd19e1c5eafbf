/// Folder cache: the last few scan results, keyed by directory path.
///
/// Eviction is strict FIFO: when full, the oldest *inserted* record is
/// dropped, and looking a record up never refreshes its position.
///
/// Inserts never replace an existing record for the same path. A second
/// insert for a path stores a duplicate, and [`FolderCache::lookup`]
/// keeps returning the older one until it is evicted. The session only
/// inserts results for the directory being displayed, which a cache hit
/// never re-requests, so duplicates need two concurrent misses for one path.
use crate::model::ScanResult;
use compact_str::CompactString;
use std::sync::Arc;
use tracing::debug;

/// Default number of folders remembered per session.
pub const DEFAULT_CACHE_CAPACITY: usize = 5;

/// One remembered folder.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub size: u64,
    pub root_path: CompactString,
    pub result: Arc<ScanResult>,
}

impl CacheRecord {
    /// Build a record from a scan result, keyed by its `root_path`.
    pub fn from_result(result: Arc<ScanResult>) -> Self {
        Self {
            size: result.total_size,
            root_path: result.root_path.clone(),
            result,
        }
    }
}

/// Bounded, insertion-ordered store of scan results.
#[derive(Debug)]
pub struct FolderCache {
    records: Vec<CacheRecord>,
    capacity: usize,
}

impl Default for FolderCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl FolderCache {
    /// Create an empty cache holding at most `capacity` records (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Exact-match lookup by path. Returns the oldest matching record.
    pub fn lookup(&self, path: &str) -> Option<&CacheRecord> {
        self.records.iter().find(|r| r.root_path.as_str() == path)
    }

    /// Append a record, evicting the oldest one first when full.
    pub fn insert(&mut self, record: CacheRecord) {
        if self.records.len() >= self.capacity {
            let evicted = self.records.remove(0);
            debug!("Folder cache evicted {}", evicted.root_path);
        }
        self.records.push(record);
    }

    /// Forget every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached paths, oldest first.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.root_path.as_str())
    }
}
