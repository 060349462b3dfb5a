//! Restricted `*` expansion against directory entries.
//!
//! Only `*` is special. A `*` swallows characters up to the first occurrence
//! of the literal that follows it in the pattern, and a trailing `*` swallows
//! the rest of the name. This is intentionally simpler than POSIX globbing:
//! `*.txt` does not match `a.b.txt`.

use log::debug;
use std::fs;
use std::path::Path;

const WILDCARD: char = '*';

/// Expands `token` against the directory it names, relative to `cwd`.
///
/// Returns the matching paths in directory order, with the directory prefix
/// of the token preserved. A token without `*`, an unreadable directory, or a
/// pattern that matches nothing yields the token itself.
pub fn expand(cwd: &Path, token: &str) -> Vec<String> {
    if !token.contains(WILDCARD) {
        return vec![token.to_string()];
    }

    let (prefix, dir, pattern) = match token.rfind('/') {
        Some(idx) => {
            let dir = if idx == 0 { "/" } else { &token[..idx] };
            (&token[..=idx], dir, &token[idx + 1..])
        }
        None => ("", ".", token),
    };

    let entries = match fs::read_dir(cwd.join(dir)) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("wildcard: cannot read {}: {}", dir, e);
            return vec![token.to_string()];
        }
    };

    let show_hidden = pattern.starts_with('.');
    let expanded: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| show_hidden || !name.starts_with('.'))
        .filter(|name| matches(pattern, name))
        .map(|name| format!("{prefix}{name}"))
        .collect();

    if expanded.is_empty() {
        vec![token.to_string()]
    } else {
        expanded
    }
}

/// Matches `name` against `pattern` using the greedy-to-next-literal rule.
pub fn matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);

    while pi < pattern.len() {
        if pattern[pi] == WILDCARD {
            while pi < pattern.len() && pattern[pi] == WILDCARD {
                pi += 1;
            }
            let Some(&literal) = pattern.get(pi) else {
                return true;
            };
            match name[ni..].iter().position(|&c| c == literal) {
                Some(offset) => ni += offset,
                None => return false,
            }
        } else {
            if name.get(ni) != Some(&pattern[pi]) {
                return false;
            }
            pi += 1;
            ni += 1;
        }
    }

    ni == name.len()
}
