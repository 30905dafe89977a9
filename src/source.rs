//! Read-only access to the source tree under review.
//!
//! The locators and the upload-all context policy only ever need two
//! operations, so the seam stays small. Absent files and directories are a
//! normal outcome (`Ok(None)` / empty listing), not an error: the import
//! graph routinely points at modules that do not exist as files.

use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Read-only view of the files a review subject covers.
pub trait SourceTree: Send + Sync {
    /// Read a file's content. `Ok(None)` if the file does not exist.
    fn read_file(&self, path: &str) -> io::Result<Option<String>>;

    /// List the entry names directly inside a directory, sorted.
    /// An absent directory yields an empty listing.
    fn list_dir(&self, dir: &str) -> io::Result<Vec<String>>;

    /// All file paths in the tree, relative to its root, sorted.
    fn all_files(&self) -> io::Result<Vec<String>>;
}

/// Source tree rooted at a local directory.
///
/// Paths are interpreted relative to the root; anything that tries to
/// escape it (`..` components or absolute paths) reads as absent.
pub struct FsSourceTree {
    root: PathBuf,
}

impl FsSourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let rel = Path::new(path);
        if rel.is_absolute() {
            return None;
        }
        if rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return None;
        }
        Some(self.root.join(rel))
    }
}

impl SourceTree for FsSourceTree {
    fn read_file(&self, path: &str) -> io::Result<Option<String>> {
        let Some(full) = self.resolve(path) else {
            return Ok(None);
        };
        match std::fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Reading a directory as a file also reads as absent.
            Err(_) if full.is_dir() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list_dir(&self, dir: &str) -> io::Result<Vec<String>> {
        let Some(full) = self.resolve(dir) else {
            return Ok(Vec::new());
        };
        let entries = match std::fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn all_files(&self) -> io::Result<Vec<String>> {
        let mut files = Vec::new();
        let mut pending = vec![PathBuf::new()];
        while let Some(dir) = pending.pop() {
            let full = self.root.join(&dir);
            let entries = match std::fs::read_dir(&full) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            for entry in entries {
                let entry = entry?;
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let rel = if dir.as_os_str().is_empty() {
                    PathBuf::from(&name)
                } else {
                    dir.join(&name)
                };
                if entry.file_type()?.is_dir() {
                    pending.push(rel);
                } else {
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        Ok(files)
    }
}
