//! Filesystem seam for import resolution
//!
//! The core never touches the disk. Hosts hand the resolver something that
//! implements [`SchemaFs`]; tests and editors use [`MemoryFs`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("schema file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },
}

/// Read-only view of the schema search roots
pub trait SchemaFs {
    /// `parent/name` if it is a directory
    fn find_subdirectory(&self, parent: &Path, name: &str) -> Option<PathBuf>;

    /// `dir/name` if it is a file
    fn find_file(&self, dir: &Path, name: &str) -> Option<PathBuf>;

    fn read_to_string(&self, path: &Path) -> Result<String, FsError>;

    /// Walk an import path (`a/b/c.schema`) below `root`
    ///
    /// Every segment but the last must be a directory; the last must be a
    /// file.
    fn import_target(&self, root: &Path, import: &str) -> Option<PathBuf> {
        let mut segments: Vec<&str> = import.split('/').filter(|s| !s.is_empty()).collect();
        let file = segments.pop()?;
        let mut dir = root.to_path_buf();
        for segment in segments {
            dir = self.find_subdirectory(&dir, segment)?;
        }
        self.find_file(&dir, file)
    }
}

/// In-memory file set keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SchemaFs for MemoryFs {
    fn find_subdirectory(&self, parent: &Path, name: &str) -> Option<PathBuf> {
        let dir = parent.join(name);
        self.files
            .keys()
            .any(|path| path.starts_with(&dir) && path != &dir)
            .then_some(dir)
    }

    fn find_file(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let path = dir.join(name);
        self.files.contains_key(&path).then_some(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }
}

/// Filesystem with no files; resolution stays inside the current tree
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImports;

impl SchemaFs for NoImports {
    fn find_subdirectory(&self, _parent: &Path, _name: &str) -> Option<PathBuf> {
        None
    }

    fn find_file(&self, _dir: &Path, _name: &str) -> Option<PathBuf> {
        None
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        Err(FsError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_target_walks_directories() {
        let fs = MemoryFs::new().with_file("/roots/a/improbable/vector.schema", "package improbable;");
        assert_eq!(
            fs.import_target(Path::new("/roots/a"), "improbable/vector.schema"),
            Some(PathBuf::from("/roots/a/improbable/vector.schema"))
        );
        assert_eq!(fs.import_target(Path::new("/roots/b"), "improbable/vector.schema"), None);
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let fs = MemoryFs::new().with_file("/r/improbable/vector.schema", "");
        assert_eq!(fs.import_target(Path::new("/r"), "improbable"), None);
    }

    #[test]
    fn test_read_missing_file() {
        let fs = MemoryFs::new();
        assert!(matches!(
            fs.read_to_string(Path::new("/nope.schema")),
            Err(FsError::NotFound(_))
        ));
    }
}
