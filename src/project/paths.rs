//! Path utilities for project membership.
//!
//! Membership is keyed on canonical absolute paths. Paths in the project
//! file are stored relative to the project base directory and resolved
//! on load. All functions use `Path` APIs rather than string manipulation.

use std::path::{Component, Path, PathBuf};

/// Make `file_path` absolute against `base_dir`.
///
/// - relative paths are joined onto `base_dir`
/// - absolute paths are returned unchanged
pub fn absolutize(file_path: &Path, base_dir: &Path) -> PathBuf {
    if file_path.is_relative() {
        base_dir.join(file_path)
    } else {
        file_path.to_path_buf()
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let dangling = matches!(out.components().next_back(), Some(Component::ParentDir))
                    || out.as_os_str().is_empty();
                if dangling {
                    out.push("..");
                } else {
                    // `..` at the root stays at the root
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonical form used as the membership key.
///
/// Symlinks are resolved when the file exists. For a file that does not
/// exist (yet) the deepest existing ancestor is resolved and the missing
/// components are appended, so the key stays the same once it is created.
pub fn canonicalize(file_path: &Path, base_dir: &Path) -> PathBuf {
    let absolute = absolutize(file_path, base_dir);
    if let Ok(resolved) = dunce::canonicalize(&absolute) {
        return resolved;
    }

    let normalized = normalize_lexically(&absolute);
    let mut missing = Vec::new();
    let mut ancestor = normalized.as_path();
    while let Some(parent) = ancestor.parent() {
        if let Some(name) = ancestor.file_name() {
            missing.push(name);
        }
        ancestor = parent;
        if let Ok(mut resolved) = dunce::canonicalize(ancestor) {
            resolved.extend(missing.iter().rev());
            return resolved;
        }
    }
    normalized
}

/// Express `path` relative to `base_dir`, walking up with `..` when needed.
///
/// Returns `path` unchanged when the two share no common root (different
/// drive on Windows).
pub fn relativize(path: &Path, base_dir: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix(base_dir) {
        return stripped.to_path_buf();
    }

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base_dir.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return path.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}
