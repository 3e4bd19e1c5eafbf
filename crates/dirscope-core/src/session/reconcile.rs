/// Live update reconciliation: applying backend pushes to the display.
///
/// Size pushes carry only the id of the request that produced them, and
/// listings carry the path they describe. Both can arrive after the user has
/// navigated elsewhere, so each one is checked against the current state
/// before it is applied:
///
/// - size progress / size response: applied only for the outstanding request.
/// - entries: applied (and cached) only when `root_path` is the current path.
use super::navigation::Readiness;
use super::Session;
use crate::backend::{Backend, RequestId};
use crate::cache::CacheRecord;
use crate::error::BackendError;
use crate::model::{EntryDetails, ScanResult};
use compact_str::CompactString;
use std::sync::Arc;
use tracing::{debug, info};

impl<B: Backend> Session<B> {
    fn is_pending_navigation(&self, request: RequestId) -> bool {
        self.nav.pending_request() == Some(request)
    }

    pub(super) fn on_size_progress(&mut self, request: RequestId, bytes: u64) {
        if !self.is_pending_navigation(request) {
            debug!("Dropping stale size progress from {request}");
            return;
        }
        self.nav.current_size = Some(bytes);
    }

    pub(super) fn on_size_computed(&mut self, request: RequestId, result: Result<u64, BackendError>) {
        if !self.is_pending_navigation(request) {
            debug!("Dropping stale size response from {request}");
            return;
        }
        match result {
            Ok(bytes) => {
                self.nav.pending = None;
                self.nav.current_size = Some(bytes);
                self.nav.readiness = Readiness::Idle;
            }
            Err(err) => self.fail_navigation(err),
        }
    }

    pub(super) fn on_entries_ready(&mut self, request: RequestId, result: ScanResult) {
        if self.nav.current_path.as_deref() != Some(result.root_path.as_str()) {
            debug!(
                "Dropping listing of {} from {request}: no longer displayed",
                result.root_path
            );
            return;
        }
        info!(
            "Listing of {} ready: {} entries",
            result.root_path,
            result.entries.len()
        );
        let result = Arc::new(result);
        if self.nav.current_size.is_none() {
            self.nav.current_size = Some(result.total_size);
        }
        self.cache.insert(CacheRecord::from_result(result.clone()));
        self.nav.current_result = Some(result);
        self.revision += 1;
    }

    pub(super) fn on_file_drop(&mut self, paths: Vec<CompactString>) {
        if let Some(first) = paths.first() {
            self.select_directory(first);
        }
    }

    pub(super) fn on_details_ready(
        &mut self,
        request: RequestId,
        result: Result<EntryDetails, BackendError>,
    ) {
        if self.details_request != Some(request) {
            debug!("Dropping stale details response from {request}");
            return;
        }
        self.details_request = None;
        match result {
            Ok(details) => self.details = Some(details),
            Err(err) => {
                self.notices.push(format!("Could not read details: {err}"));
            }
        }
    }
}
