/// The navigation session: a single actor owning all mutable state.
///
/// A `Session` tracks where the user is, decides when a backend scan is
/// needed, reconciles asynchronous backend events against the current
/// location, keeps a small FIFO cache of visited folders and runs the
/// interactive search. Frontends call the command methods in response to
/// user input and call [`Session::process_events`] (plus
/// [`Session::tick`]) once per frame or loop turn.
///
/// Nothing in here blocks: backend commands return immediately and their
/// results arrive later as [`BackendEvent`]s, possibly out of order and
/// possibly after the user has moved on. Every response is checked against
/// the latest [`RequestId`] of its command family (and, for listings,
/// against the current path) before it is applied.
mod navigation;
mod notice;
mod reconcile;
mod search;

pub use navigation::{NavigationState, Readiness};
pub use notice::{Notice, Notices};
pub use search::{filesystem_root, SearchPhase, SearchState};

use crate::backend::{Backend, BackendEvent, RequestId};
use crate::cache::FolderCache;
use crate::config::SessionConfig;
use crate::model::EntryDetails;
use crossbeam_channel::Receiver;
use std::time::Instant;

/// Maximum number of backend events handled per [`Session::process_events`] call.
///
/// Keeps a backlog (e.g. after the frontend was suspended) from stalling a
/// single frame.
pub const MAX_EVENTS_PER_TURN: usize = 300;

/// Which listing the frontend is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Browse,
    Search,
}

/// All session state plus the backend it drives.
pub struct Session<B: Backend> {
    backend: B,
    events: Receiver<BackendEvent>,
    config: SessionConfig,
    cache: FolderCache,
    nav: NavigationState,
    search: SearchState,
    view: ViewMode,
    details: Option<EntryDetails>,
    details_request: Option<RequestId>,
    notices: Notices,
    next_request: u64,
    /// Bumped whenever the listing or the match set is replaced.
    revision: u64,
}

impl<B: Backend> Session<B> {
    /// Create a session around `backend`, reading its events from `events`.
    pub fn new(backend: B, events: Receiver<BackendEvent>, config: SessionConfig) -> Self {
        Self {
            cache: FolderCache::with_capacity(config.cache_capacity),
            nav: NavigationState::new(config.display_limit),
            search: SearchState::new(config.display_limit),
            notices: Notices::new(config.max_notices),
            view: ViewMode::Browse,
            details: None,
            details_request: None,
            next_request: 1,
            revision: 0,
            backend,
            events,
            config,
        }
    }

    // ── Accessors ───────────────────────────────────────

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn cache(&self) -> &FolderCache {
        &self.cache
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn details(&self) -> Option<&EntryDetails> {
        self.details.as_ref()
    }

    /// Changes every time the listing or the match set is replaced, so a
    /// frontend can tell when to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The event channel, for frontends that wait on it alongside other
    /// input sources. Received events must be passed to
    /// [`Session::handle_event`].
    pub fn event_receiver(&self) -> &Receiver<BackendEvent> {
        &self.events
    }

    // ── Event pump ──────────────────────────────────────

    /// Drain pending backend events without blocking.
    ///
    /// Returns `true` if anything was handled and the frontend should redraw.
    pub fn process_events(&mut self) -> bool {
        let mut handled = 0usize;
        while handled < MAX_EVENTS_PER_TURN {
            let event = match self.events.try_recv() {
                Ok(e) => e,
                Err(_) => break,
            };
            handled += 1;
            self.handle_event(event);
        }
        handled > 0
    }

    /// Apply a single backend event.
    pub fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::SizeProgress { request, bytes } => self.on_size_progress(request, bytes),
            BackendEvent::SizeComputed { request, result } => self.on_size_computed(request, result),
            BackendEvent::EntriesReady { request, result } => self.on_entries_ready(request, result),
            BackendEvent::SearchCompleted { request, result } => {
                self.on_search_completed(request, result)
            }
            BackendEvent::SearchCancelled => self.on_search_cancelled(),
            BackendEvent::DetailsReady { request, result } => {
                self.on_details_ready(request, result)
            }
            BackendEvent::RevealFailed { path, error } => {
                self.notices.push(format!("Could not reveal {path}: {error}"));
            }
            BackendEvent::FileDrop(paths) => self.on_file_drop(paths),
        }
    }

    /// Expire backend requests that have been outstanding too long.
    ///
    /// A timed-out size request is re-issued with back-off up to
    /// `max_retries` times before the navigation is abandoned. Call
    /// periodically; does nothing when timeouts are disabled.
    pub fn tick(&mut self, now: Instant) {
        self.expire_navigation(now);
        self.expire_search(now);
    }

    // ── Details, reveal, notices ────────────────────────

    /// Ask the backend for metadata of `path`. Only the latest request's
    /// answer is kept.
    pub fn request_details(&mut self, path: &str) {
        let request = self.next_request_id();
        self.details_request = Some(request);
        self.backend.entry_details(request, path);
    }

    /// Close the details view.
    pub fn clear_details(&mut self) {
        self.details = None;
        self.details_request = None;
    }

    /// Show `path` in the system file browser. Empty paths are ignored.
    pub fn reveal(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        self.backend.reveal(path);
    }

    /// Remove a notice. Returns `false` if no notice had that id.
    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        self.notices.dismiss(id)
    }

    // ── View mode ───────────────────────────────────────

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    pub fn toggle_search_view(&mut self) {
        self.view = match self.view {
            ViewMode::Browse => ViewMode::Search,
            ViewMode::Search => ViewMode::Browse,
        };
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }
}
