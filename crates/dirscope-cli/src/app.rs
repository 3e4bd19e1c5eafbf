/// Console application loop.
///
/// Multiplexes three inputs on one thread: lines from stdin (read on a
/// helper thread), backend events, and a periodic tick for request
/// timeouts. All session mutation happens here.
use crate::command::{Command, HELP};
use crate::render;
use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use dirscope_core::backend::{resolve_path, Backend, BackendEvent, LocalBackend};
use dirscope_core::config::SessionConfig;
use dirscope_core::model::DirEntry;
use dirscope_core::session::{Readiness, Session, ViewMode};
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};
use tracing::info;

/// How often timeouts are checked while no input arrives.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// What the user last saw; output is only redrawn when this changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    view: ViewMode,
    readiness: Readiness,
    path: Option<String>,
    revision: u64,
    latest_notice: Option<u64>,
    details: Option<String>,
}

impl Snapshot {
    fn of<B: Backend>(session: &Session<B>) -> Self {
        let nav = session.navigation();
        Self {
            view: session.view(),
            readiness: nav.readiness,
            path: nav.current_path.as_ref().map(|p| p.to_string()),
            revision: session.revision(),
            latest_notice: session.notices().latest().map(|n| n.id),
            details: session.details().map(|d| d.path.to_string()),
        }
    }
}

/// A session plus the writer its output goes to.
pub struct ConsoleApp<B: Backend, W: Write> {
    session: Session<B>,
    out: W,
    shown: Snapshot,
    /// Highest notice id already printed.
    notices_shown: u64,
}

impl<B: Backend, W: Write> ConsoleApp<B, W> {
    pub fn new(session: Session<B>, out: W) -> Self {
        let shown = Snapshot::of(&session);
        let notices_shown = session.notices().latest().map_or(0, |n| n.id);
        Self {
            session,
            out,
            shown,
            notices_shown,
        }
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<B> {
        &mut self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Row `n` (1-based) of whichever list is on screen.
    fn row(&self, n: usize) -> Option<DirEntry> {
        let rows = match self.session.view() {
            ViewMode::Browse => self.session.visible_entries(),
            ViewMode::Search => self.session.visible_matches(),
        };
        rows.get(n - 1).cloned()
    }

    fn no_row(&mut self, n: usize) -> Result<()> {
        writeln!(self.out, "No row {n}.")?;
        Ok(())
    }

    /// Run one command and print whatever changed.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Open(path) => {
                if !self.session.open_root(&resolve_path(&path)) {
                    self.explain_refusal()?;
                }
            }
            Command::Cd(path) => {
                if !self.session.select_directory(&resolve_path(&path)) {
                    self.explain_refusal()?;
                }
            }
            Command::Up => {
                if !self.session.navigate_to_parent() {
                    self.explain_refusal()?;
                }
            }
            Command::Enter(n) => match self.session.visible_entries().get(n - 1).cloned() {
                Some(entry) if entry.is_file => writeln!(self.out, "{} is a file.", entry.name())?,
                Some(entry) => {
                    self.session.set_view(ViewMode::Browse);
                    if !self.session.navigate_to_entry(&entry) {
                        self.explain_refusal()?;
                    }
                }
                None => self.no_row(n)?,
            },
            Command::Crumb(n) => {
                let target = self.session.navigation().current_path.as_deref().and_then(|p| {
                    dirscope_core::model::decompose_path(p)
                        .into_iter()
                        .filter_map(|c| c.target().map(str::to_string))
                        .nth(n - 1)
                });
                match target {
                    Some(target) => {
                        if !self.session.jump_to_breadcrumb(&target) {
                            self.explain_refusal()?;
                        }
                    }
                    None => writeln!(self.out, "No breadcrumb segment {n}.")?,
                }
            }
            Command::List => self.print_view()?,
            Command::More => {
                match self.session.view() {
                    ViewMode::Browse => self.session.show_more(),
                    ViewMode::Search => self.session.show_more_matches(),
                }
                self.print_view()?;
            }
            Command::Find(pattern) => {
                self.session.set_view(ViewMode::Search);
                self.session.set_search_pattern(&pattern);
                self.print_view()?;
            }
            Command::Browse => self.session.set_view(ViewMode::Browse),
            Command::Pick(n) => match self.session.visible_matches().get(n - 1).cloned() {
                Some(entry) if entry.is_file => writeln!(self.out, "{} is a file.", entry.name())?,
                Some(entry) => {
                    if !self.session.open_match(&entry) {
                        self.explain_refusal()?;
                    }
                }
                None => self.no_row(n)?,
            },
            Command::Details(n) => match self.row(n) {
                Some(entry) => self.session.request_details(&entry.path),
                None => self.no_row(n)?,
            },
            Command::Reveal(n) => match self.row(n) {
                Some(entry) => self.session.reveal(&entry.path),
                None => self.no_row(n)?,
            },
            Command::Notices => write!(self.out, "{}", render::notices(&self.session))?,
            Command::Dismiss(id) => {
                if !self.session.dismiss_notice(id) {
                    writeln!(self.out, "No notice {id}.")?;
                }
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {}
        }
        self.refresh()
    }

    fn explain_refusal(&mut self) -> Result<()> {
        if self.session.navigation().readiness == Readiness::Scanning {
            writeln!(self.out, "Still scanning; try again when it finishes.")?;
        } else {
            writeln!(self.out, "Nothing to do.")?;
        }
        Ok(())
    }

    fn print_view(&mut self) -> Result<()> {
        let text = match self.session.view() {
            ViewMode::Browse => render::listing(&self.session),
            ViewMode::Search => render::matches(&self.session),
        };
        write!(self.out, "{text}")?;
        self.shown = Snapshot::of(&self.session);
        Ok(())
    }

    /// Redraw if the visible state changed since the last redraw.
    pub fn refresh(&mut self) -> Result<()> {
        let now = Snapshot::of(&self.session);
        if now == self.shown {
            return Ok(());
        }
        for notice in self.session.notices().iter() {
            if notice.id > self.notices_shown {
                writeln!(self.out, "! ({}) {}", notice.id, notice.message)?;
                self.notices_shown = notice.id;
            }
        }
        if now.details != self.shown.details {
            if let Some(details) = self.session.details() {
                write!(self.out, "{}", render::details(details))?;
            }
        }
        let view_changed = now.view != self.shown.view
            || now.readiness != self.shown.readiness
            || now.path != self.shown.path
            || now.revision != self.shown.revision;
        if view_changed {
            self.print_view()?;
        }
        self.shown = now;
        self.out.flush()?;
        Ok(())
    }
}

enum Input {
    Line(String),
    Event(Option<BackendEvent>),
    Closed,
    Tick,
}

/// Read stdin lines on a helper thread. The channel closes at end of input.
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
        .name("dirscope-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

/// Run the interactive console until `quit` or end of input.
pub fn run(config: SessionConfig, start: Option<String>) -> Result<()> {
    let (backend, events) = LocalBackend::new();
    let session = Session::new(backend, events.clone(), config);
    let stdout = std::io::stdout();
    let mut app = ConsoleApp::new(session, stdout.lock());
    let lines = spawn_stdin_reader()?;

    writeln!(app.out, "DirScope -- type `help` for commands.")?;
    match start {
        Some(path) => app.execute(Command::Open(path))?,
        None => app.print_view()?,
    }

    loop {
        let input = crossbeam_channel::select! {
            recv(lines) -> line => match line {
                Ok(line) => Input::Line(line),
                Err(_) => Input::Closed,
            },
            recv(events) -> event => Input::Event(event.ok()),
            default(TICK_INTERVAL) => Input::Tick,
        };
        match input {
            Input::Line(line) => match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => app.execute(command)?,
                Err(err) => writeln!(app.out, "{err}")?,
            },
            Input::Event(event) => {
                if let Some(event) = event {
                    app.session.handle_event(event);
                }
                app.session.process_events();
            }
            Input::Closed => break,
            Input::Tick => {}
        }
        app.session.tick(Instant::now());
        app.refresh()?;
    }

    info!("DirScope console exiting");
    Ok(())
}
