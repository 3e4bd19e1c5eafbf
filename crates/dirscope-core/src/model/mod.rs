/// Data model for DirScope.
///
/// Scan results as delivered by the backend, plus the pure helpers the
/// frontends use to render them.
pub mod breadcrumb;
pub mod label;
pub mod scan_result;
pub mod size;

pub use breadcrumb::{decompose_path, Crumb};
pub use label::{contains_ignore_case, file_name, highlight, split_extension, MatchRun};
pub use scan_result::{DirEntry, EntryDetails, ScanResult};
pub use size::{format_size, humanize, HumanSize};
