//! Project membership set.
//!
//! One ordered set holds every canonical path that belongs to the project,
//! so set membership and the persisted order can never disagree.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use super::paths;

/// The authoritative list of files a project tracks.
///
/// Paths are canonicalized before insertion; duplicates collapse onto the
/// first occurrence so enumeration keeps the original input order.
#[derive(Debug, Default, Clone)]
pub struct ProjectFileSet {
    /// Canonical absolute paths, in insertion order.
    files: IndexSet<PathBuf>,
    /// Directory relative entries are resolved against.
    base_dir: PathBuf,
}

impl ProjectFileSet {
    /// Create an empty set resolving relative paths against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            files: IndexSet::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Replace the whole membership set.
    ///
    /// Empty entries are skipped; entries that canonicalize to the same
    /// path are stored once.
    pub fn set_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut next = IndexSet::new();
        for file in files {
            let file = file.as_ref();
            if file.as_os_str().is_empty() {
                continue;
            }
            next.insert(paths::canonicalize(file, &self.base_dir));
        }

        crate::debug_event!("project", "files set", "{} entries", next.len());
        self.files = next;
    }

    /// Check whether `path` (in any spelling) belongs to the project.
    pub fn contains(&self, path: &Path) -> bool {
        if self.files.contains(path) {
            return true;
        }
        self.files
            .contains(&paths::canonicalize(path, &self.base_dir))
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Canonical paths in their original order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Paths relative to the base directory, for persistence.
    pub fn relative_paths(&self) -> Vec<PathBuf> {
        // Members are canonical, so the base must be too.
        let base = paths::canonicalize(&self.base_dir, &self.base_dir);
        self.files
            .iter()
            .map(|p| paths::relativize(p, &base))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
