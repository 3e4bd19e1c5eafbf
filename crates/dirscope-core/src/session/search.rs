/// Search: one backend search per pattern change, newest wins.
///
/// Every pattern change first asks the backend to cancel whatever search is
/// running. Cancellation is advisory, so a superseded search may still
/// answer; its response is discarded because its id is no longer the
/// latest one issued.
use super::{Session, ViewMode};
use crate::backend::{Backend, RequestId};
use crate::error::BackendError;
use crate::model::{DirEntry, ScanResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
}

#[derive(Debug)]
pub struct SearchState {
    pub pattern: String,
    pub matches: Option<Arc<ScanResult>>,
    pub display_limit: usize,
    pub phase: SearchPhase,
    latest: Option<RequestId>,
    issued_at: Option<Instant>,
}

impl SearchState {
    pub(super) fn new(display_limit: usize) -> Self {
        Self {
            pattern: String::new(),
            matches: None,
            display_limit,
            phase: SearchPhase::Idle,
            latest: None,
            issued_at: None,
        }
    }

    /// Id of the search whose answer would currently be accepted.
    pub fn latest_request(&self) -> Option<RequestId> {
        self.latest
    }

    fn settle(&mut self) {
        self.phase = SearchPhase::Idle;
        self.latest = None;
        self.issued_at = None;
    }
}

/// Scope used when no directory has been selected yet.
pub fn filesystem_root() -> &'static str {
    std::path::MAIN_SEPARATOR_STR
}

impl<B: Backend> Session<B> {
    /// Replace the search pattern and start a fresh search.
    ///
    /// An empty pattern clears the matches without contacting the backend
    /// (apart from the cancellation signal).
    pub fn set_search_pattern(&mut self, pattern: &str) {
        self.backend.cancel_search();
        self.search.pattern = pattern.to_string();
        self.search.display_limit = self.config.display_limit;

        if pattern.is_empty() {
            self.search.matches = None;
            self.search.settle();
            self.revision += 1;
            return;
        }

        let request = self.next_request_id();
        self.search.latest = Some(request);
        self.search.phase = SearchPhase::Searching;
        self.search.issued_at = Some(Instant::now());

        let scope = self
            .nav
            .current_path
            .clone()
            .unwrap_or_else(|| filesystem_root().into());
        debug!("Searching {scope} for {pattern:?} ({request})");
        self.backend.search(request, &scope, pattern);
    }

    /// Open a directory from the match list and return to browsing.
    pub fn open_match(&mut self, entry: &DirEntry) -> bool {
        if entry.is_file {
            return false;
        }
        self.view = ViewMode::Browse;
        self.select_directory(&entry.path)
    }

    pub fn show_more_matches(&mut self) {
        self.search.display_limit += self.config.display_step;
    }

    pub fn visible_matches(&self) -> &[DirEntry] {
        match &self.search.matches {
            Some(m) => &m.entries[..m.entries.len().min(self.search.display_limit)],
            None => &[],
        }
    }

    pub fn has_more_matches(&self) -> bool {
        self.search
            .matches
            .as_ref()
            .is_some_and(|m| m.entries.len() > self.search.display_limit)
    }

    pub(super) fn on_search_completed(
        &mut self,
        request: RequestId,
        result: Result<ScanResult, BackendError>,
    ) {
        if self.search.latest != Some(request) {
            debug!("Dropping superseded search response from {request}");
            return;
        }
        self.search.settle();
        match result {
            Ok(matches) => {
                self.search.matches = Some(Arc::new(matches));
                self.revision += 1;
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                warn!("Search for {:?} failed: {err}", self.search.pattern);
                self.notices.push(format!("Search failed: {err}"));
            }
        }
    }

    pub(super) fn on_search_cancelled(&mut self) {
        debug!("Backend acknowledged search cancellation");
    }

    pub(super) fn expire_search(&mut self, now: Instant) {
        let (Some(issued_at), Some(timeout)) = (self.search.issued_at, self.config.request_timeout())
        else {
            return;
        };
        if now.saturating_duration_since(issued_at) < timeout {
            return;
        }
        warn!("Search for {:?} timed out", self.search.pattern);
        self.backend.cancel_search();
        self.search.settle();
        self.notices
            .push(format!("Search for \"{}\" timed out", self.search.pattern));
    }
}
