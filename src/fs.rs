//! Disk-backed [`SchemaFs`]

use std::path::{Path, PathBuf};

use schema_core::{FsError, SchemaFs};
use tracing::trace;

/// Reads schema files straight from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl SchemaFs for DiskFs {
    fn find_subdirectory(&self, parent: &Path, name: &str) -> Option<PathBuf> {
        let dir = parent.join(name);
        dir.is_dir().then_some(dir)
    }

    fn find_file(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let path = dir.join(name);
        trace!(path = %path.display(), "probing import");
        path.is_file().then_some(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            _ => FsError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })
    }
}
