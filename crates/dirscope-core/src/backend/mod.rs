/// Backend boundary: the commands the session issues and the events it
/// receives.
///
/// The backend performs the actual filesystem work out of the session's
/// control flow. Every command returns immediately; results come back as
/// [`BackendEvent`]s on a channel the session drains once per turn, in no
/// particular order relative to each other or to later commands.
///
/// Each command is tagged with a [`RequestId`] so that the session can
/// recognise and discard responses to requests it has since superseded.
pub mod local;

use crate::error::BackendError;
use crate::model::{EntryDetails, ScanResult};
use compact_str::CompactString;

pub use local::{resolve_path, LocalBackend};

/// Monotonically increasing id attached to every backend command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commands understood by a backend. All methods must return without
/// waiting for the work to finish.
pub trait Backend {
    /// Compute the cumulative size of `path`. Expected to push
    /// [`BackendEvent::SizeProgress`] while running, then
    /// [`BackendEvent::EntriesReady`] and [`BackendEvent::SizeComputed`].
    fn compute_folder_size(&self, request: RequestId, path: &str);

    /// Find entries under `path` whose names contain `pattern`.
    fn search(&self, request: RequestId, path: &str, pattern: &str);

    /// Best-effort cancellation of whatever search is running. No
    /// acknowledgment is required.
    fn cancel_search(&self);

    /// Look up filesystem metadata for a single entry.
    fn entry_details(&self, request: RequestId, path: &str);

    /// Show `path` in the platform file browser.
    fn reveal(&self, path: &str);
}

/// Messages pushed from the backend (and the windowing layer) to the session.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// Running total while a size computation is in progress.
    SizeProgress { request: RequestId, bytes: u64 },
    /// Response to [`Backend::compute_folder_size`].
    SizeComputed {
        request: RequestId,
        result: Result<u64, BackendError>,
    },
    /// Directory listing for a completed scan.
    EntriesReady {
        request: RequestId,
        result: ScanResult,
    },
    /// Response to [`Backend::search`].
    SearchCompleted {
        request: RequestId,
        result: Result<ScanResult, BackendError>,
    },
    /// A running search observed its cancel flag.
    SearchCancelled,
    /// Response to [`Backend::entry_details`].
    DetailsReady {
        request: RequestId,
        result: Result<EntryDetails, BackendError>,
    },
    /// [`Backend::reveal`] could not open the file browser.
    RevealFailed { path: CompactString, error: BackendError },
    /// Paths dropped onto the window. Only the first is used.
    FileDrop(Vec<CompactString>),
}
