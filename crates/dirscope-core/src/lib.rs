/// DirScope Core: navigation, caching, and live-update reconciliation.
///
/// This crate contains all business logic with zero UI dependencies.
/// Any frontend (console, GUI, TUI) drives a [`session::Session`] and
/// renders what it exposes.
///
/// # Modules
///
/// - [`model`]: Scan result types and pure display helpers (sizes, breadcrumbs, highlights).
/// - [`cache`]: Bounded FIFO cache of previously visited folders.
/// - [`backend`]: Backend command trait, push events, and the local filesystem backend.
/// - [`session`]: The single-actor navigation/search state machine.
/// - [`config`]: Session tuning loaded from JSON.
/// - [`error`]: Backend and configuration error types.
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
