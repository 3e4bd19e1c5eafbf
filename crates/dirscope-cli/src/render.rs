/// Plain-text rendering of session state.
///
/// Every function returns a `String` so the output can be asserted on in
/// tests; the console loop just prints it.
use dirscope_core::backend::Backend;
use dirscope_core::model::{
    decompose_path, file_name, format_size, highlight, split_extension, Crumb, DirEntry,
    EntryDetails,
};
use dirscope_core::session::{Readiness, SearchPhase, Session};
use std::fmt::Write;

const NAME_WIDTH: usize = 48;

/// Breadcrumb trail with numbered segments, e.g. `/[1]home/[2]me`.
pub fn breadcrumb_line(path: &str) -> String {
    let mut out = String::new();
    let mut n = 0;
    for crumb in decompose_path(path) {
        match crumb {
            Crumb::Separator(c) => out.push(c),
            Crumb::Segment { label, .. } => {
                n += 1;
                let _ = write!(out, "[{n}]{label}");
            }
        }
    }
    out
}

/// Breadcrumb plus the folder size (or scanning progress).
pub fn header<B: Backend>(session: &Session<B>) -> String {
    let nav = session.navigation();
    let Some(path) = nav.current_path.as_deref() else {
        return "No folder selected. Use `open <path>`.".to_string();
    };
    let size = match (nav.readiness, nav.current_size) {
        (Readiness::Scanning, Some(bytes)) => format!("scanning... {} so far", format_size(bytes)),
        (Readiness::Scanning, None) => "scanning...".to_string(),
        (Readiness::Idle, Some(bytes)) => format_size(bytes),
        (Readiness::Idle, None) => "size unknown".to_string(),
    };
    format!("{}  ({size})", breadcrumb_line(path))
}

fn entry_label(entry: &DirEntry) -> String {
    if entry.is_file {
        entry.name().to_string()
    } else {
        format!("{}/", entry.name())
    }
}

fn row(n: usize, label: &str, size: u64) -> String {
    format!(
        "{n:>5}  {label:<width$} {:>12}",
        format_size(size),
        width = NAME_WIDTH
    )
}

/// The folder listing within the display limit.
pub fn listing<B: Backend>(session: &Session<B>) -> String {
    let mut out = header(session);
    out.push('\n');

    let nav = session.navigation();
    let Some(result) = nav.current_result.as_ref() else {
        if nav.readiness == Readiness::Idle && nav.current_path.is_some() {
            out.push_str("       (no listing)\n");
        }
        return out;
    };

    if result.parent_path.is_some() {
        out.push_str("       ../\n");
    }
    for (i, entry) in session.visible_entries().iter().enumerate() {
        out.push_str(&row(i + 1, &entry_label(entry), entry.size));
        out.push('\n');
    }
    if session.has_more_entries() {
        let hidden = result.entries.len() - session.visible_entries().len();
        let _ = writeln!(out, "       ... {hidden} more (`more`)");
    }
    out
}

/// Search matches, with the matched text wrapped in `[` `]`.
pub fn matches<B: Backend>(session: &Session<B>) -> String {
    let search = session.search_state();
    let mut out = format!("Search: {:?}", search.pattern);
    if search.phase == SearchPhase::Searching {
        out.push_str("  (searching...)");
    }
    out.push('\n');

    let Some(found) = search.matches.as_ref() else {
        return out;
    };
    if found.entries.is_empty() {
        out.push_str("       (no matches)\n");
        return out;
    }
    for (i, entry) in session.visible_matches().iter().enumerate() {
        let mut label = String::new();
        for run in highlight(entry.name(), &search.pattern) {
            if run.matched {
                let _ = write!(label, "[{}]", run.text);
            } else {
                label.push_str(run.text);
            }
        }
        if !entry.is_file {
            label.push('/');
        }
        out.push_str(&row(i + 1, &label, entry.size));
        out.push('\n');
    }
    if session.has_more_matches() {
        let hidden = found.entries.len() - session.visible_matches().len();
        let _ = writeln!(out, "       ... {hidden} more (`more`)");
    }
    out
}

pub fn details(details: &EntryDetails) -> String {
    let stamp = |t: &Option<chrono::DateTime<chrono::Local>>| match t {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    };
    let (_, ext) = split_extension(file_name(&details.path));
    let kind = if ext.is_empty() { "-" } else { ext };
    format!(
        "{}\n  type:      {kind}\n  size:      {} ({} bytes)\n  created:   {}\n  modified:  {}\n  accessed:  {}\n  read-only: {}\n",
        details.path,
        format_size(details.file_size),
        details.file_size,
        stamp(&details.created),
        stamp(&details.modified),
        stamp(&details.accessed),
        if details.read_only { "yes" } else { "no" },
    )
}

pub fn notices<B: Backend>(session: &Session<B>) -> String {
    if session.notices().is_empty() {
        return "No notices.\n".to_string();
    }
    let mut out = String::new();
    for notice in session.notices().iter() {
        let _ = writeln!(out, "  ({}) {}", notice.id, notice.message);
    }
    out
}
