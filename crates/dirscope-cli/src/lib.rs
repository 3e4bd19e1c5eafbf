/// DirScope console frontend.
///
/// Drives a `dirscope_core::session::Session` from line-oriented commands
/// and renders its state as plain text.
pub mod app;
pub mod command;
pub mod render;

pub use app::{run, ConsoleApp};
pub use command::Command;
