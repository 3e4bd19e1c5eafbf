/// Navigation: directory selection, cache consultation and readiness gating.
use super::{Session, ViewMode};
use crate::backend::{Backend, RequestId};
use crate::error::BackendError;
use crate::model::{DirEntry, ScanResult};
use compact_str::CompactString;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Whether a user-initiated navigation is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Idle,
    /// A size request is in flight; further navigation is refused.
    Scanning,
}

/// The size request behind the current navigation.
#[derive(Debug, Clone)]
pub(super) struct PendingNavigation {
    pub(super) request: RequestId,
    pub(super) path: CompactString,
    pub(super) issued_at: Instant,
    pub(super) timeout: Option<Duration>,
    pub(super) retries: u32,
}

/// Where the user is and what is being shown there.
#[derive(Debug)]
pub struct NavigationState {
    pub current_path: Option<CompactString>,
    /// Listing of `current_path`. Cleared while a new navigation resolves.
    pub current_result: Option<Arc<ScanResult>>,
    /// Cumulative size of `current_path`, live while scanning.
    pub current_size: Option<u64>,
    pub readiness: Readiness,
    /// Number of listing rows to show.
    pub display_limit: usize,
    pub(super) pending: Option<PendingNavigation>,
}

impl NavigationState {
    pub(super) fn new(display_limit: usize) -> Self {
        Self {
            current_path: None,
            current_result: None,
            current_size: None,
            readiness: Readiness::Idle,
            display_limit,
            pending: None,
        }
    }

    /// Id of the outstanding size request, if any.
    pub fn pending_request(&self) -> Option<RequestId> {
        self.pending.as_ref().map(|p| p.request)
    }

    pub fn is_scanning(&self) -> bool {
        self.readiness == Readiness::Scanning
    }
}

impl<B: Backend> Session<B> {
    /// Navigate to `path`.
    ///
    /// Ignored while another navigation is outstanding or when `path` is
    /// already current. A cached folder is restored synchronously;
    /// otherwise a size request is sent and the listing arrives later as an
    /// entries event. Returns `true` if a navigation started.
    pub fn select_directory(&mut self, path: &str) -> bool {
        if self.nav.readiness == Readiness::Scanning {
            debug!("Ignoring navigation to {path}: scan in progress");
            return false;
        }
        if self.nav.current_path.as_deref() == Some(path) {
            return false;
        }

        self.nav.current_result = None;
        self.nav.current_size = None;
        self.revision += 1;
        self.nav.readiness = Readiness::Scanning;
        self.nav.current_path = Some(CompactString::new(path));
        self.nav.display_limit = self.config.display_limit;

        if let Some(record) = self.cache.lookup(path) {
            info!("Restored {path} from folder cache");
            self.nav.current_result = Some(record.result.clone());
            self.revision += 1;
            self.nav.current_size = Some(record.size);
            self.nav.readiness = Readiness::Idle;
            return true;
        }

        let request = self.next_request_id();
        info!("Requesting size of {path} ({request})");
        self.nav.pending = Some(PendingNavigation {
            request,
            path: CompactString::new(path),
            issued_at: Instant::now(),
            timeout: self.config.request_timeout(),
            retries: 0,
        });
        self.backend.compute_folder_size(request, path);
        true
    }

    /// Open a new root picked by the user. Starts from an empty cache.
    pub fn open_root(&mut self, path: &str) -> bool {
        if self.nav.is_scanning() || self.nav.current_path.as_deref() == Some(path) {
            return false;
        }
        self.cache.clear();
        self.view = ViewMode::Browse;
        self.select_directory(path)
    }

    /// Go to the parent of the displayed folder. No-op at a filesystem root
    /// or when nothing is displayed.
    pub fn navigate_to_parent(&mut self) -> bool {
        let parent = match self
            .nav
            .current_result
            .as_ref()
            .and_then(|r| r.parent_path.clone())
        {
            Some(p) => p,
            None => return false,
        };
        self.select_directory(&parent)
    }

    /// Drill into a listed entry. Files are not navigable.
    pub fn navigate_to_entry(&mut self, entry: &DirEntry) -> bool {
        if entry.is_file {
            return false;
        }
        self.select_directory(&entry.path)
    }

    /// Jump to an ancestor from the breadcrumb trail.
    ///
    /// Unlike drilling down, this always empties the folder cache first,
    /// even when the jump itself is refused.
    pub fn jump_to_breadcrumb(&mut self, target: &str) -> bool {
        self.cache.clear();
        self.view = ViewMode::Browse;
        self.select_directory(target)
    }

    /// Reveal another page of listing rows.
    pub fn show_more(&mut self) {
        self.nav.display_limit += self.config.display_step;
    }

    /// The listing rows currently within the display limit.
    pub fn visible_entries(&self) -> &[DirEntry] {
        match &self.nav.current_result {
            Some(r) => &r.entries[..r.entries.len().min(self.nav.display_limit)],
            None => &[],
        }
    }

    /// `true` if the listing has rows beyond the display limit.
    pub fn has_more_entries(&self) -> bool {
        self.nav
            .current_result
            .as_ref()
            .is_some_and(|r| r.entries.len() > self.nav.display_limit)
    }

    /// Resolve the current navigation as failed and return to Idle.
    pub(super) fn fail_navigation(&mut self, error: BackendError) {
        let path = self
            .nav
            .pending
            .take()
            .map(|p| p.path)
            .unwrap_or_default();
        self.nav.readiness = Readiness::Idle;
        if !error.is_cancelled() {
            warn!("Navigation to {path} failed: {error}");
            self.notices.push(format!("Could not scan {path}: {error}"));
        }
    }

    pub(super) fn expire_navigation(&mut self, now: Instant) {
        let Some(pending) = self.nav.pending.as_ref() else {
            return;
        };
        let Some(timeout) = pending.timeout else {
            return;
        };
        if now.saturating_duration_since(pending.issued_at) < timeout {
            return;
        }

        if pending.retries >= self.config.max_retries {
            let elapsed = now.saturating_duration_since(pending.issued_at);
            self.fail_navigation(BackendError::Other(format!(
                "timed out after {}s",
                elapsed.as_secs()
            )));
            return;
        }

        let request = self.next_request_id();
        let factor = self.config.retry_backoff_factor.max(1);
        if let Some(pending) = self.nav.pending.as_mut() {
            pending.request = request;
            pending.issued_at = now;
            pending.timeout = Some(timeout * factor);
            pending.retries += 1;
            warn!(
                "Size request for {} timed out, retrying ({request}, attempt {})",
                pending.path, pending.retries
            );
            self.backend.compute_folder_size(request, &pending.path);
        }
    }
}
