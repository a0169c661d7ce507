//! Helpers for the `.`-rooted relative paths used throughout the index.
//!
//! Every file and folder path is stored relative to the scan root, with the
//! root itself spelled `.`. These helpers keep that convention in one place
//! so callers never have to reason about empty-string edge cases.

use std::path::{Component, Path};

/// Parent of a relative path; the parent of a top-level entry is `.`.
pub fn parent_path(path: &str) -> String {
    match Path::new(path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

/// Final component of a relative path; `.` names itself.
pub fn base_name(path: &str) -> String {
    match Path::new(path).file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => ".".to_string(),
    }
}

/// Join a folder path and a basename, collapsing the `.` root.
pub fn join_rel(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn components(path: &str) -> Vec<String> {
    Path::new(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Deepest common ancestor of two relative paths, `.` when they share none.
pub fn common_ancestor(a: &str, b: &str) -> String {
    let ca = components(a);
    let cb = components(b);

    let mut shared = Vec::new();
    for (x, y) in ca.iter().zip(cb.iter()) {
        if x != y {
            break;
        }
        shared.push(x.as_str());
    }
    if shared.is_empty() {
        ".".to_string()
    } else {
        shared.join("/")
    }
}
