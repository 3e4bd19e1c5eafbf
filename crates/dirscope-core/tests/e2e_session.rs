/// End-to-end tests for `Session`: the navigation/search state machine.
///
/// A recording backend captures every command the session issues, and
/// backend responses are injected with `handle_event` in whatever order a
/// test needs. This makes the out-of-order and stale-response cases
/// deterministic.
use dirscope_core::backend::{Backend, BackendEvent, RequestId};
use dirscope_core::config::SessionConfig;
use dirscope_core::error::BackendError;
use dirscope_core::model::{DirEntry, EntryDetails, ScanResult};
use dirscope_core::session::{filesystem_root, Readiness, SearchPhase, Session, ViewMode};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Size(RequestId, String),
    Search(RequestId, String, String),
    CancelSearch,
    Details(RequestId, String),
    Reveal(String),
}

#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
}

impl Backend for RecordingBackend {
    fn compute_folder_size(&self, request: RequestId, path: &str) {
        self.calls.lock().push(Call::Size(request, path.into()));
    }
    fn search(&self, request: RequestId, path: &str, pattern: &str) {
        self.calls
            .lock()
            .push(Call::Search(request, path.into(), pattern.into()));
    }
    fn cancel_search(&self) {
        self.calls.lock().push(Call::CancelSearch);
    }
    fn entry_details(&self, request: RequestId, path: &str) {
        self.calls.lock().push(Call::Details(request, path.into()));
    }
    fn reveal(&self, path: &str) {
        self.calls.lock().push(Call::Reveal(path.into()));
    }
}

fn session_with(config: SessionConfig) -> Session<RecordingBackend> {
    let (_tx, rx) = crossbeam_channel::unbounded();
    Session::new(RecordingBackend::default(), rx, config)
}

fn session() -> Session<RecordingBackend> {
    session_with(SessionConfig::default())
}

fn calls(s: &Session<RecordingBackend>) -> Vec<Call> {
    s.backend().calls.lock().clone()
}

fn size_requests(s: &Session<RecordingBackend>) -> Vec<(RequestId, String)> {
    calls(s)
        .into_iter()
        .filter_map(|c| match c {
            Call::Size(id, path) => Some((id, path)),
            _ => None,
        })
        .collect()
}

fn search_requests(s: &Session<RecordingBackend>) -> Vec<(RequestId, String, String)> {
    calls(s)
        .into_iter()
        .filter_map(|c| match c {
            Call::Search(id, path, pat) => Some((id, path, pat)),
            _ => None,
        })
        .collect()
}

fn last_size_request(s: &Session<RecordingBackend>) -> RequestId {
    size_requests(s).last().expect("no size request issued").0
}

fn listing(root: &str, parent: Option<&str>, children: &[(&str, u64, bool)]) -> ScanResult {
    let entries: Vec<DirEntry> = children
        .iter()
        .map(|&(name, size, is_file)| DirEntry::new(format!("{root}/{name}"), size, is_file))
        .collect();
    let total = entries.iter().map(|e| e.size).sum();
    ScanResult::new(root, parent.map(Into::into), total, entries)
}

/// Navigate to `path` and deliver its listing plus the size response.
fn visit(s: &mut Session<RecordingBackend>, path: &str, parent: Option<&str>) {
    assert!(s.select_directory(path), "navigation to {path} refused");
    if s.navigation().readiness == Readiness::Idle {
        return; // cache hit
    }
    let request = last_size_request(s);
    let result = listing(path, parent, &[("sub", 10, false), ("f.txt", 5, true)]);
    let total = result.total_size;
    s.handle_event(BackendEvent::EntriesReady { request, result });
    s.handle_event(BackendEvent::SizeComputed {
        request,
        result: Ok(total),
    });
}

// ── Navigation ────────────────────────────────────────────────────────────────

#[test]
fn selecting_same_path_twice_issues_one_request() {
    let mut s = session();
    assert!(s.select_directory("/data"));
    let request = last_size_request(&s);
    s.handle_event(BackendEvent::SizeComputed {
        request,
        result: Ok(42),
    });
    assert!(!s.select_directory("/data"));
    assert_eq!(size_requests(&s).len(), 1);
}

#[test]
fn navigation_is_gated_while_scanning() {
    let mut s = session();
    assert!(s.select_directory("/a"));
    assert_eq!(s.navigation().readiness, Readiness::Scanning);
    assert!(!s.select_directory("/b"));
    assert_eq!(s.navigation().current_path.as_deref(), Some("/a"));
    assert_eq!(size_requests(&s).len(), 1);
}

#[test]
fn select_resets_display_state() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    s.show_more();
    assert_eq!(s.navigation().display_limit, 300);

    s.select_directory("/b");
    let nav = s.navigation();
    assert!(nav.current_result.is_none());
    assert!(nav.current_size.is_none());
    assert_eq!(nav.display_limit, 200);
    assert_eq!(nav.readiness, Readiness::Scanning);
}

#[test]
fn size_response_returns_to_idle() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    let nav = s.navigation();
    assert_eq!(nav.readiness, Readiness::Idle);
    assert_eq!(nav.current_size, Some(15));
    assert_eq!(
        nav.current_result.as_ref().map(|r| r.root_path.as_str()),
        Some("/a")
    );
}

#[test]
fn cache_hit_restores_without_backend_round_trip() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    visit(&mut s, "/b", Some("/"));
    let before = size_requests(&s).len();

    assert!(s.select_directory("/a"));
    assert_eq!(size_requests(&s).len(), before);
    let nav = s.navigation();
    assert_eq!(nav.readiness, Readiness::Idle);
    assert_eq!(nav.current_size, Some(15));
    assert_eq!(
        nav.current_result.as_ref().map(|r| r.root_path.as_str()),
        Some("/a")
    );
}

#[test]
fn cache_evicts_oldest_visit_after_five_more() {
    let mut s = session();
    for dir in ["/d0", "/d1", "/d2", "/d3", "/d4"] {
        visit(&mut s, dir, Some("/"));
    }
    // Revisit /d0 (cache hit): FIFO position must not refresh.
    visit(&mut s, "/d0", Some("/"));
    visit(&mut s, "/d5", Some("/"));
    assert_eq!(s.cache().len(), 5);
    assert!(s.cache().lookup("/d0").is_none());

    let before = size_requests(&s).len();
    s.select_directory("/d1");
    assert_eq!(size_requests(&s).len(), before, "/d1 must still be cached");
}

#[test]
fn parent_navigation_at_root_is_noop() {
    let mut s = session();
    visit(&mut s, "/", None);
    let before = calls(&s);

    assert!(!s.navigate_to_parent());
    assert_eq!(calls(&s), before);
    let nav = s.navigation();
    assert_eq!(nav.current_path.as_deref(), Some("/"));
    assert_eq!(nav.readiness, Readiness::Idle);
    assert!(nav.current_result.is_some());
}

#[test]
fn parent_navigation_without_listing_is_noop() {
    let mut s = session();
    assert!(!s.navigate_to_parent());
    assert!(calls(&s).is_empty());
}

#[test]
fn parent_navigation_selects_parent() {
    let mut s = session();
    visit(&mut s, "/a/b", Some("/a"));
    assert!(s.navigate_to_parent());
    assert_eq!(s.navigation().current_path.as_deref(), Some("/a"));
    assert_eq!(size_requests(&s).last().map(|r| r.1.as_str()), Some("/a"));
}

#[test]
fn entry_navigation_ignores_files() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    let file = DirEntry::new("/a/f.txt", 5, true);
    let dir = DirEntry::new("/a/sub", 10, false);

    assert!(!s.navigate_to_entry(&file));
    assert!(s.navigate_to_entry(&dir));
    assert_eq!(s.navigation().current_path.as_deref(), Some("/a/sub"));
}

#[test]
fn breadcrumb_jump_clears_cache_but_drill_down_does_not() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    visit(&mut s, "/a/sub", Some("/a"));
    assert_eq!(s.cache().len(), 2);

    assert!(s.jump_to_breadcrumb("/a"));
    assert!(s.cache().is_empty());
    // The ancestor had to be fetched again.
    assert_eq!(size_requests(&s).last().map(|r| r.1.as_str()), Some("/a"));
    assert_eq!(s.navigation().readiness, Readiness::Scanning);
}

#[test]
fn breadcrumb_jump_leaves_search_view() {
    let mut s = session();
    visit(&mut s, "/a/b", Some("/a"));
    s.set_view(ViewMode::Search);
    s.jump_to_breadcrumb("/a");
    assert_eq!(s.view(), ViewMode::Browse);
}

#[test]
fn open_root_clears_cache() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    visit(&mut s, "/b", Some("/"));
    assert!(s.open_root("/c"));
    assert!(s.cache().is_empty());
    assert_eq!(s.navigation().current_path.as_deref(), Some("/c"));
}

#[test]
fn open_root_is_gated_while_scanning() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    s.select_directory("/b");
    assert!(!s.open_root("/c"));
    assert_eq!(s.cache().len(), 1, "refused open must not clear the cache");
}

#[test]
fn show_more_extends_visible_entries() {
    let mut s = session_with(SessionConfig {
        display_limit: 2,
        display_step: 1,
        ..SessionConfig::default()
    });
    s.select_directory("/big");
    let request = last_size_request(&s);
    let result = listing(
        "/big",
        Some("/"),
        &[("a", 4, true), ("b", 3, true), ("c", 2, true), ("d", 1, true)],
    );
    s.handle_event(BackendEvent::EntriesReady { request, result });

    assert_eq!(s.visible_entries().len(), 2);
    assert!(s.has_more_entries());
    s.show_more();
    s.show_more();
    assert_eq!(s.visible_entries().len(), 4);
    assert!(!s.has_more_entries());
}

// ── Live updates ──────────────────────────────────────────────────────────────

#[test]
fn entries_before_size_are_applied() {
    let mut s = session();
    s.select_directory("/a");
    let request = last_size_request(&s);
    s.handle_event(BackendEvent::EntriesReady {
        request,
        result: listing("/a", Some("/"), &[("x", 7, true)]),
    });
    assert!(s.navigation().current_result.is_some());
    assert_eq!(s.navigation().readiness, Readiness::Scanning);

    s.handle_event(BackendEvent::SizeComputed {
        request,
        result: Ok(7),
    });
    assert_eq!(s.navigation().readiness, Readiness::Idle);
    assert!(s.cache().lookup("/a").is_some());
}

#[test]
fn late_entries_for_previous_folder_are_discarded() {
    let mut s = session();
    s.select_directory("/a");
    let first = last_size_request(&s);
    s.handle_event(BackendEvent::SizeComputed {
        request: first,
        result: Ok(10),
    });
    s.select_directory("/b");

    s.handle_event(BackendEvent::EntriesReady {
        request: first,
        result: listing("/a", Some("/"), &[("x", 10, true)]),
    });
    assert!(s.navigation().current_result.is_none());
    assert!(s.cache().lookup("/a").is_none());
    assert_eq!(s.navigation().current_path.as_deref(), Some("/b"));
}

#[test]
fn revision_tracks_listing_and_match_replacements() {
    let mut s = session();
    let start = s.revision();
    visit(&mut s, "/a", Some("/"));
    visit(&mut s, "/b", Some("/"));
    let after_visits = s.revision();
    assert!(after_visits > start);

    // Cache hit swaps in an already cached listing: still a replacement.
    assert!(s.select_directory("/a"));
    assert_eq!(s.navigation().readiness, Readiness::Idle);
    let after_restore = s.revision();
    assert!(after_restore > after_visits);

    // A listing for a folder no longer shown changes nothing.
    s.handle_event(BackendEvent::EntriesReady {
        request: RequestId(999),
        result: listing("/b", Some("/"), &[("y", 1, true)]),
    });
    assert_eq!(s.revision(), after_restore);

    s.set_search_pattern("f");
    assert_eq!(s.revision(), after_restore);
    let request = search_requests(&s)[0].0;
    s.handle_event(BackendEvent::SearchCompleted {
        request,
        result: Ok(match_set("/a", &["f.txt"])),
    });
    let after_search = s.revision();
    assert!(after_search > after_restore);

    s.set_search_pattern("");
    assert!(s.revision() > after_search);
}

#[test]
fn stale_size_updates_are_discarded() {
    let mut s = session();
    s.select_directory("/a");
    let first = last_size_request(&s);
    s.handle_event(BackendEvent::SizeComputed {
        request: first,
        result: Ok(10),
    });
    s.select_directory("/b");

    s.handle_event(BackendEvent::SizeProgress {
        request: first,
        bytes: 999,
    });
    s.handle_event(BackendEvent::SizeComputed {
        request: first,
        result: Ok(999),
    });
    let nav = s.navigation();
    assert_eq!(nav.current_size, None);
    assert_eq!(nav.readiness, Readiness::Scanning);
}

#[test]
fn size_progress_updates_running_total() {
    let mut s = session();
    s.select_directory("/a");
    let request = last_size_request(&s);
    s.handle_event(BackendEvent::SizeProgress {
        request,
        bytes: 100,
    });
    assert_eq!(s.navigation().current_size, Some(100));
    s.handle_event(BackendEvent::SizeProgress {
        request,
        bytes: 250,
    });
    assert_eq!(s.navigation().current_size, Some(250));
}

#[test]
fn failed_size_request_returns_to_idle_with_notice() {
    let mut s = session();
    s.select_directory("/secret");
    let request = last_size_request(&s);
    s.handle_event(BackendEvent::SizeComputed {
        request,
        result: Err(BackendError::PermissionDenied("/secret".into())),
    });
    assert_eq!(s.navigation().readiness, Readiness::Idle);
    assert_eq!(s.notices().len(), 1);
    let notice = s.notices().latest().unwrap().clone();
    assert!(notice.message.contains("Permission denied"));

    assert!(s.dismiss_notice(notice.id));
    assert!(s.notices().is_empty());

    // Navigation works again after the failure.
    assert!(s.select_directory("/public"));
}

#[test]
fn file_drop_selects_first_path() {
    let mut s = session();
    s.handle_event(BackendEvent::FileDrop(vec!["/dropped".into(), "/ignored".into()]));
    assert_eq!(s.navigation().current_path.as_deref(), Some("/dropped"));
    assert_eq!(size_requests(&s).len(), 1);

    s.handle_event(BackendEvent::FileDrop(Vec::new()));
    assert_eq!(size_requests(&s).len(), 1);
}

#[test]
fn process_events_drains_channel() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut s = Session::new(RecordingBackend::default(), rx, SessionConfig::default());
    assert!(!s.process_events());

    s.select_directory("/a");
    let request = last_size_request(&s);
    tx.send(BackendEvent::SizeComputed {
        request,
        result: Ok(3),
    })
    .unwrap();
    assert!(s.process_events());
    assert_eq!(s.navigation().readiness, Readiness::Idle);
}

// ── Timeouts ──────────────────────────────────────────────────────────────────

#[test]
fn timed_out_size_request_is_retried_then_abandoned() {
    let mut s = session_with(SessionConfig {
        request_timeout_secs: Some(10),
        max_retries: 1,
        retry_backoff_factor: 2,
        ..SessionConfig::default()
    });
    let t0 = Instant::now();
    s.select_directory("/slow");
    let first = last_size_request(&s);

    s.tick(t0 + Duration::from_secs(11));
    let requests = size_requests(&s);
    assert_eq!(requests.len(), 2);
    let retry = requests[1].0;
    assert_ne!(retry, first);
    assert_eq!(s.navigation().pending_request(), Some(retry));

    // The original attempt answering late is ignored.
    s.handle_event(BackendEvent::SizeComputed {
        request: first,
        result: Ok(1),
    });
    assert_eq!(s.navigation().readiness, Readiness::Scanning);

    // Back-off doubled the timeout to 20s.
    s.tick(t0 + Duration::from_secs(11 + 15));
    assert_eq!(s.navigation().readiness, Readiness::Scanning);
    s.tick(t0 + Duration::from_secs(11 + 21));
    assert_eq!(s.navigation().readiness, Readiness::Idle);
    assert_eq!(size_requests(&s).len(), 2);
    assert!(s.notices().latest().unwrap().message.contains("timed out"));
}

#[test]
fn disabled_timeout_waits_forever() {
    let mut s = session_with(SessionConfig {
        request_timeout_secs: None,
        ..SessionConfig::default()
    });
    s.select_directory("/slow");
    s.tick(Instant::now() + Duration::from_secs(1_000_000));
    assert_eq!(s.navigation().readiness, Readiness::Scanning);
    assert_eq!(size_requests(&s).len(), 1);
}

// ── Search ────────────────────────────────────────────────────────────────────

fn match_set(scope: &str, names: &[&str]) -> ScanResult {
    let entries = names
        .iter()
        .map(|n| DirEntry::new(format!("{scope}/{n}"), 1, true))
        .collect();
    ScanResult::new(scope, None, 0, entries)
}

fn match_names(s: &Session<RecordingBackend>) -> Vec<String> {
    s.visible_matches().iter().map(|e| e.name().to_string()).collect()
}

#[test]
fn newer_search_wins_when_older_answers_last() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    s.set_search_pattern("foo");
    s.set_search_pattern("foobar");
    let reqs = search_requests(&s);
    let (foo, foobar) = (reqs[0].0, reqs[1].0);

    s.handle_event(BackendEvent::SearchCompleted {
        request: foobar,
        result: Ok(match_set("/a", &["foobar.txt"])),
    });
    s.handle_event(BackendEvent::SearchCompleted {
        request: foo,
        result: Ok(match_set("/a", &["foo.txt", "foobar.txt"])),
    });
    assert_eq!(match_names(&s), ["foobar.txt"]);
    assert_eq!(s.search_state().phase, SearchPhase::Idle);
}

#[test]
fn newer_search_wins_when_older_answers_first() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    s.set_search_pattern("foo");
    s.set_search_pattern("foobar");
    let reqs = search_requests(&s);
    let (foo, foobar) = (reqs[0].0, reqs[1].0);

    s.handle_event(BackendEvent::SearchCompleted {
        request: foo,
        result: Ok(match_set("/a", &["foo.txt", "foobar.txt"])),
    });
    assert!(s.search_state().matches.is_none());
    s.handle_event(BackendEvent::SearchCompleted {
        request: foobar,
        result: Ok(match_set("/a", &["foobar.txt"])),
    });
    assert_eq!(match_names(&s), ["foobar.txt"]);
}

#[test]
fn every_pattern_change_signals_cancellation() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    let start = calls(&s).len();
    s.set_search_pattern("f");
    s.set_search_pattern("fo");
    let all = calls(&s);
    let tail = &all[start..];
    assert_eq!(tail[0], Call::CancelSearch);
    assert!(matches!(tail[1], Call::Search(_, _, ref p) if p == "f"));
    assert_eq!(tail[2], Call::CancelSearch);
    assert!(matches!(tail[3], Call::Search(_, _, ref p) if p == "fo"));
}

#[test]
fn empty_pattern_clears_matches_without_searching() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    s.set_search_pattern("foo");
    let request = search_requests(&s)[0].0;
    s.handle_event(BackendEvent::SearchCompleted {
        request,
        result: Ok(match_set("/a", &["foo"])),
    });
    assert!(s.search_state().matches.is_some());

    s.set_search_pattern("fo");
    s.set_search_pattern("");
    assert!(s.search_state().matches.is_none());
    assert_eq!(s.search_state().phase, SearchPhase::Idle);
    assert_eq!(search_requests(&s).len(), 2);
    assert_eq!(calls(&s).last(), Some(&Call::CancelSearch));

    // The in-flight "fo" search answering now must not resurrect matches.
    let fo = search_requests(&s)[1].0;
    s.handle_event(BackendEvent::SearchCompleted {
        request: fo,
        result: Ok(match_set("/a", &["foo"])),
    });
    assert!(s.search_state().matches.is_none());
}

#[test]
fn search_is_scoped_to_current_path_or_filesystem_root() {
    let mut s = session();
    s.set_search_pattern("x");
    assert_eq!(search_requests(&s)[0].1, filesystem_root());

    visit(&mut s, "/home", Some("/"));
    s.set_search_pattern("y");
    assert_eq!(search_requests(&s)[1].1, "/home");
}

#[test]
fn search_failure_raises_notice_but_cancellation_does_not() {
    let mut s = session();
    s.set_search_pattern("a");
    let a = search_requests(&s)[0].0;
    s.handle_event(BackendEvent::SearchCompleted {
        request: a,
        result: Err(BackendError::Cancelled),
    });
    assert!(s.notices().is_empty());

    s.set_search_pattern("b");
    let b = search_requests(&s)[1].0;
    s.handle_event(BackendEvent::SearchCompleted {
        request: b,
        result: Err(BackendError::NotFound("/".into())),
    });
    assert_eq!(s.notices().len(), 1);
    assert_eq!(s.search_state().phase, SearchPhase::Idle);
}

#[test]
fn search_times_out() {
    let mut s = session_with(SessionConfig {
        request_timeout_secs: Some(5),
        ..SessionConfig::default()
    });
    s.set_search_pattern("slow");
    assert_eq!(s.search_state().phase, SearchPhase::Searching);
    s.tick(Instant::now() + Duration::from_secs(6));
    assert_eq!(s.search_state().phase, SearchPhase::Idle);
    assert_eq!(s.search_state().latest_request(), None);
    assert_eq!(s.notices().len(), 1);
}

#[test]
fn open_match_navigates_and_returns_to_browse() {
    let mut s = session();
    visit(&mut s, "/a", Some("/"));
    s.set_view(ViewMode::Search);

    assert!(!s.open_match(&DirEntry::new("/a/x.txt", 1, true)));
    assert_eq!(s.view(), ViewMode::Search);

    assert!(s.open_match(&DirEntry::new("/a/deep/dir", 1, false)));
    assert_eq!(s.view(), ViewMode::Browse);
    assert_eq!(s.navigation().current_path.as_deref(), Some("/a/deep/dir"));
}

// ── Details and reveal ────────────────────────────────────────────────────────

fn details(path: &str, size: u64) -> EntryDetails {
    EntryDetails {
        path: path.into(),
        created: None,
        accessed: None,
        modified: None,
        read_only: false,
        file_size: size,
    }
}

#[test]
fn only_latest_details_response_is_kept() {
    let mut s = session();
    s.request_details("/a/one");
    s.request_details("/a/two");
    let ids: Vec<RequestId> = calls(&s)
        .into_iter()
        .filter_map(|c| match c {
            Call::Details(id, _) => Some(id),
            _ => None,
        })
        .collect();

    s.handle_event(BackendEvent::DetailsReady {
        request: ids[0],
        result: Ok(details("/a/one", 1)),
    });
    assert!(s.details().is_none());
    s.handle_event(BackendEvent::DetailsReady {
        request: ids[1],
        result: Ok(details("/a/two", 2)),
    });
    assert_eq!(s.details().map(|d| d.file_size), Some(2));

    s.clear_details();
    assert!(s.details().is_none());
}

#[test]
fn reveal_ignores_empty_path_and_reports_failures() {
    let mut s = session();
    s.reveal("");
    assert!(calls(&s).is_empty());
    s.reveal("/a/file");
    assert_eq!(calls(&s), [Call::Reveal("/a/file".into())]);

    s.handle_event(BackendEvent::RevealFailed {
        path: "/a/file".into(),
        error: BackendError::Other("no file browser".into()),
    });
    assert_eq!(s.notices().len(), 1);
}
