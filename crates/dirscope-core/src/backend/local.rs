/// Local backend: answers commands by walking the filesystem on
/// background threads.
///
/// Each command runs on its own named thread and reports back through a
/// bounded crossbeam channel. Directory walks use `jwalk`'s rayon-backed
/// parallel traversal, following the same settings as a full disk scan:
/// hidden files included, symlinks not followed and sized as links.
use super::{Backend, BackendEvent, RequestId};
use crate::error::BackendError;
use crate::model::{contains_ignore_case, DirEntry, EntryDetails, ScanResult};
use chrono::{DateTime, Local};
use compact_str::CompactString;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rayon::slice::ParallelSliceMut;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum number of events that may queue up before the workers block.
///
/// The session drains the channel every turn; at the default throttle a size
/// walk produces a handful of events per second, so this only fills if the
/// frontend stops pumping altogether.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// Minimum interval between two running-total pushes for one size walk.
pub const SIZE_PUSH_INTERVAL: Duration = Duration::from_millis(400);

/// Search results beyond this count are dropped.
pub const MAX_SEARCH_MATCHES: usize = 50_000;

/// How often (in walked entries) a search checks its cancel flag.
const CANCEL_CHECK_EVERY: u64 = 1_000;

/// Filesystem-backed implementation of [`Backend`].
pub struct LocalBackend {
    events: Sender<BackendEvent>,
    /// Cancel flag of the most recently started search.
    search_cancel: Mutex<Arc<AtomicBool>>,
}

impl LocalBackend {
    /// Create a backend and the receiving end of its event channel.
    pub fn new() -> (Self, Receiver<BackendEvent>) {
        let (events, rx) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);
        let backend = Self {
            events,
            search_cancel: Mutex::new(Arc::new(AtomicBool::new(false))),
        };
        (backend, rx)
    }

    /// A sender for injecting events from outside the backend, e.g. file
    /// drops reported by the windowing layer.
    pub fn event_sender(&self) -> Sender<BackendEvent> {
        self.events.clone()
    }

    /// Run `job` on a named worker thread. If the thread cannot be spawned,
    /// `on_spawn_error` is sent instead so the request does not hang.
    fn spawn_worker(
        &self,
        name: &str,
        on_spawn_error: BackendEvent,
        job: impl FnOnce(Sender<BackendEvent>) + Send + 'static,
    ) {
        let tx = self.events.clone();
        let spawned = thread::Builder::new()
            .name(name.into())
            .spawn(move || job(tx));
        if let Err(err) = spawned {
            warn!("Failed to spawn {name} worker: {err}");
            let _ = self.events.send(on_spawn_error);
        }
    }
}

impl Backend for LocalBackend {
    fn compute_folder_size(&self, request: RequestId, path: &str) {
        let root = CompactString::new(path);
        let spawn_error = BackendEvent::SizeComputed {
            request,
            result: Err(BackendError::Other("could not start size worker".into())),
        };
        self.spawn_worker("dirscope-size", spawn_error, move |tx| {
            let start = Instant::now();
            info!("Computing size of {root} ({request})");
            match scan_folder(request, &root, &tx) {
                Ok(result) => {
                    let total = result.total_size;
                    debug!(
                        "Size of {root}: {total} bytes, {} entries in {:?}",
                        result.entries.len(),
                        start.elapsed()
                    );
                    let _ = tx.send(BackendEvent::EntriesReady { request, result });
                    let _ = tx.send(BackendEvent::SizeComputed {
                        request,
                        result: Ok(total),
                    });
                }
                Err(err) => {
                    warn!("Size of {root} failed: {err}");
                    let _ = tx.send(BackendEvent::SizeComputed {
                        request,
                        result: Err(err),
                    });
                }
            }
        });
    }

    fn search(&self, request: RequestId, path: &str, pattern: &str) {
        let cancel = Arc::new(AtomicBool::new(false));
        {
            // Supersede any search that is still running.
            let mut current = self.search_cancel.lock();
            current.store(true, Ordering::Relaxed);
            *current = cancel.clone();
        }

        let root = CompactString::new(path);
        let pattern = CompactString::new(pattern);
        let spawn_error = BackendEvent::SearchCompleted {
            request,
            result: Err(BackendError::Other("could not start search worker".into())),
        };
        self.spawn_worker("dirscope-search", spawn_error, move |tx| {
            debug!("Searching {root} for {pattern:?} ({request})");
            let result = search_folder(&root, &pattern, &cancel);
            if matches!(result, Err(BackendError::Cancelled)) {
                let _ = tx.send(BackendEvent::SearchCancelled);
            }
            let _ = tx.send(BackendEvent::SearchCompleted { request, result });
        });
    }

    fn cancel_search(&self) {
        self.search_cancel.lock().store(true, Ordering::Relaxed);
    }

    fn entry_details(&self, request: RequestId, path: &str) {
        let path = CompactString::new(path);
        let spawn_error = BackendEvent::DetailsReady {
            request,
            result: Err(BackendError::Other("could not start details worker".into())),
        };
        self.spawn_worker("dirscope-details", spawn_error, move |tx| {
            let result = read_details(&path);
            let _ = tx.send(BackendEvent::DetailsReady { request, result });
        });
    }

    fn reveal(&self, path: &str) {
        let path = CompactString::new(path);
        let spawn_error = BackendEvent::RevealFailed {
            path: path.clone(),
            error: BackendError::Other("could not start reveal worker".into()),
        };
        self.spawn_worker("dirscope-reveal", spawn_error, move |tx| {
            let mut cmd = reveal_command(Path::new(path.as_str()));
            // Only a failure to launch is reported; file browsers disagree
            // on what their exit codes mean.
            match cmd.spawn() {
                Ok(mut child) => {
                    let _ = child.wait();
                }
                Err(err) => {
                    let _ = tx.send(BackendEvent::RevealFailed {
                        error: BackendError::from_io(&path, &err),
                        path,
                    });
                }
            }
        });
    }
}

/// Configure a walker the same way for every command.
fn walker(root: &Path) -> jwalk::WalkDir {
    jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()))
}

/// Make a user-typed path absolute and drop `.` and `..` components.
///
/// Resolution is lexical: symlinks are not followed, and a path that does
/// not exist is still resolved. Falls back to the input when the working
/// directory cannot be read.
pub fn resolve_path(path: &str) -> CompactString {
    let absolute = match std::path::absolute(path) {
        Ok(p) => p,
        Err(err) => {
            debug!("Cannot resolve {path:?}: {err}");
            return CompactString::new(path);
        }
    };
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    CompactString::new(out.to_string_lossy())
}

/// Parent directory of `root`, or `None` at a filesystem root. A bare
/// relative name has no parent either.
fn parent_of(root: &Path) -> Option<CompactString> {
    root.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| CompactString::new(p.to_string_lossy()))
}

/// Walk `root` and build its listing: immediate children with cumulative
/// sizes, largest first. Pushes a running total every [`SIZE_PUSH_INTERVAL`].
fn scan_folder(
    request: RequestId,
    root: &str,
    tx: &Sender<BackendEvent>,
) -> Result<ScanResult, BackendError> {
    let root_path = PathBuf::from(root);
    let meta = std::fs::metadata(&root_path).map_err(|e| BackendError::from_io(root, &e))?;
    if !meta.is_dir() {
        return Ok(ScanResult::new(root, parent_of(&root_path), meta.len(), Vec::new()));
    }
    // Reading the directory itself is the common failure (access denied);
    // jwalk would only report it as a skipped entry.
    std::fs::read_dir(&root_path).map_err(|e| BackendError::from_io(root, &e))?;

    // Immediate child path -> (cumulative size, is_file).
    let mut children: HashMap<PathBuf, (u64, bool)> = HashMap::new();
    let mut total: u64 = 0;
    let mut last_push = Instant::now();

    for entry_result in walker(&root_path) {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                debug!("Skipping unreadable entry under {root}: {err}");
                continue;
            }
        };
        let depth = entry.depth();
        if depth == 0 {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().is_dir();

        // The immediate child of root that this entry lives under.
        let top = if depth == 1 {
            children.entry(path.clone()).or_insert((0, !is_dir));
            path.clone()
        } else {
            match path.strip_prefix(&root_path).ok().and_then(|rel| rel.components().next()) {
                Some(first) => {
                    let top = root_path.join(first);
                    children.entry(top.clone()).or_insert((0, false));
                    top
                }
                None => continue,
            }
        };

        if is_dir {
            continue;
        }
        let size = match std::fs::symlink_metadata(&path) {
            Ok(m) => m.len(),
            Err(err) => {
                debug!("Cannot stat {}: {err}", path.display());
                continue;
            }
        };
        total += size;
        if let Some(child) = children.get_mut(&top) {
            child.0 += size;
        }

        if last_push.elapsed() >= SIZE_PUSH_INTERVAL {
            last_push = Instant::now();
            let _ = tx.send(BackendEvent::SizeProgress {
                request,
                bytes: total,
            });
        }
    }

    let mut entries: Vec<DirEntry> = children
        .into_iter()
        .map(|(path, (size, is_file))| DirEntry::new(path.to_string_lossy(), size, is_file))
        .collect();
    entries.par_sort_unstable_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));

    Ok(ScanResult::new(root, parent_of(&root_path), total, entries))
}

/// Walk `root` collecting every entry whose name contains `pattern`.
///
/// Directory matches report the cumulative size of the files beneath them;
/// `total_size` of the result is the size of the whole scope.
fn search_folder(
    root: &str,
    pattern: &str,
    cancel: &AtomicBool,
) -> Result<ScanResult, BackendError> {
    let root_path = PathBuf::from(root);
    std::fs::metadata(&root_path).map_err(|e| BackendError::from_io(root, &e))?;

    let mut entries: Vec<DirEntry> = Vec::new();
    // Matched directory path -> index into `entries`.
    let mut matched_dirs: HashMap<PathBuf, usize> = HashMap::new();
    let mut total: u64 = 0;
    let mut walked: u64 = 0;

    for entry_result in walker(&root_path) {
        walked += 1;
        if walked % CANCEL_CHECK_EVERY == 0 && cancel.load(Ordering::Relaxed) {
            return Err(BackendError::Cancelled);
        }

        let Ok(entry) = entry_result else { continue };
        if entry.depth() == 0 {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().is_dir();
        let name = entry.file_name().to_string_lossy();
        let is_match = contains_ignore_case(&name, pattern) && entries.len() < MAX_SEARCH_MATCHES;

        if is_dir {
            if is_match {
                matched_dirs.insert(path.clone(), entries.len());
                entries.push(DirEntry::new(path.to_string_lossy(), 0, false));
            }
            continue;
        }

        let size = std::fs::symlink_metadata(&path).map(|m| m.len()).unwrap_or(0);
        total += size;
        if !matched_dirs.is_empty() {
            for ancestor in path.ancestors().skip(1) {
                if ancestor == root_path {
                    break;
                }
                if let Some(&idx) = matched_dirs.get(ancestor) {
                    entries[idx].size += size;
                }
            }
        }
        if is_match {
            entries.push(DirEntry::new(path.to_string_lossy(), size, true));
        }
    }

    if cancel.load(Ordering::Relaxed) {
        return Err(BackendError::Cancelled);
    }
    Ok(ScanResult::new(root, parent_of(&root_path), total, entries))
}

fn read_details(path: &str) -> Result<EntryDetails, BackendError> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| BackendError::from_io(path, &e))?;
    let local = |t: std::io::Result<std::time::SystemTime>| t.ok().map(DateTime::<Local>::from);
    Ok(EntryDetails {
        path: CompactString::new(path),
        created: local(meta.created()),
        accessed: local(meta.accessed()),
        modified: local(meta.modified()),
        read_only: meta.permissions().readonly(),
        file_size: meta.len(),
    })
}

#[cfg(windows)]
fn reveal_command(path: &Path) -> Command {
    let mut cmd = Command::new("explorer");
    cmd.arg(format!("/select,{}", path.display()));
    cmd
}

#[cfg(target_os = "macos")]
fn reveal_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg("-R").arg(path);
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn reveal_command(path: &Path) -> Command {
    // xdg-open cannot select a file; open the containing folder instead.
    let target = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target);
    cmd
}
