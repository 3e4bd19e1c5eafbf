/// Label helpers for directory listings and search results.
///
/// Names are compared case-insensitively one `char` at a time, so byte
/// offsets into the original label are always preserved in the output.

/// A run of label text, tagged by whether it matched the search pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRun<'a> {
    pub matched: bool,
    pub text: &'a str,
}

/// The final component of a path (text after the last `/` or `\`).
pub fn file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Split a file name into `(stem, extension)`, the extension keeping its dot.
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

#[inline]
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Case-insensitive substring test. An empty pattern matches everything.
pub fn contains_ignore_case(label: &str, pattern: &str) -> bool {
    let needle: Vec<char> = pattern.chars().map(fold).collect();
    if needle.is_empty() {
        return true;
    }
    let hay: Vec<char> = label.chars().map(fold).collect();
    hay.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Split `label` into ordered runs marking every non-overlapping,
/// case-insensitive occurrence of `pattern`.
///
/// Concatenating the runs' text always reproduces `label`.
pub fn highlight<'a>(label: &'a str, pattern: &str) -> Vec<MatchRun<'a>> {
    let needle: Vec<char> = pattern.chars().map(fold).collect();
    if label.is_empty() {
        return Vec::new();
    }
    if needle.is_empty() {
        return vec![MatchRun {
            matched: false,
            text: label,
        }];
    }

    let chars: Vec<(usize, char)> = label.char_indices().map(|(i, c)| (i, fold(c))).collect();
    let byte_at = |ci: usize| chars.get(ci).map(|&(b, _)| b).unwrap_or(label.len());

    let mut runs = Vec::new();
    let mut plain_start = 0usize; // byte offset
    let mut ci = 0usize;
    while ci + needle.len() <= chars.len() {
        let hit = chars[ci..ci + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(&(_, c), &n)| c == n);
        if !hit {
            ci += 1;
            continue;
        }
        let start = byte_at(ci);
        let end = byte_at(ci + needle.len());
        if start > plain_start {
            runs.push(MatchRun {
                matched: false,
                text: &label[plain_start..start],
            });
        }
        runs.push(MatchRun {
            matched: true,
            text: &label[start..end],
        });
        plain_start = end;
        ci += needle.len();
    }
    if plain_start < label.len() {
        runs.push(MatchRun {
            matched: false,
            text: &label[plain_start..],
        });
    }
    runs
}
