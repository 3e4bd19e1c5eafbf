/// Breadcrumb decomposition of absolute paths.
///
/// Both `/` and `\` are treated as separators so that Windows and Unix
/// paths render the same way. Each clickable segment carries the absolute
/// prefix up to and including itself; for every segment except the last
/// that prefix ends with the separator that followed it.
use compact_str::CompactString;

/// One token of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crumb {
    /// A separator character, rendered as a non-clickable label.
    Separator(char),
    /// A path segment; clicking it navigates to `target`.
    Segment {
        label: CompactString,
        target: CompactString,
    },
}

impl Crumb {
    /// The navigation target, if this crumb is clickable.
    pub fn target(&self) -> Option<&str> {
        match self {
            Crumb::Segment { target, .. } => Some(target.as_str()),
            Crumb::Separator(_) => None,
        }
    }
}

/// Split `path` into alternating separator and segment crumbs.
///
/// Empty segments (a leading `/`, doubled or trailing separators) produce
/// no clickable crumb; their separators are still emitted.
pub fn decompose_path(path: &str) -> Vec<Crumb> {
    let mut crumbs = Vec::new();
    let mut start = 0;

    for (i, ch) in path.char_indices() {
        if ch == '/' || ch == '\\' {
            push_segment(&mut crumbs, &path[start..i], &path[..i + ch.len_utf8()]);
            crumbs.push(Crumb::Separator(ch));
            start = i + ch.len_utf8();
        }
    }
    push_segment(&mut crumbs, &path[start..], path);
    crumbs
}

fn push_segment(crumbs: &mut Vec<Crumb>, label: &str, target: &str) {
    if label.is_empty() {
        return;
    }
    crumbs.push(Crumb::Segment {
        label: CompactString::new(label),
        target: CompactString::new(target),
    });
}
