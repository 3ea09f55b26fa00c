//! Search-root configuration
//!
//! Import paths in schema files are resolved against an ordered list of
//! directories. The list is persisted one path per line; see
//! [`ConfigLoader`] for where it is looked up.

mod loader;

pub use loader::{ConfigLoader, ProjectFile, PROJECT_FILE, SEARCH_PATHS_ENV, SEARCH_PATHS_FILE};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Ordered, de-duplicated list of schema search roots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchRoots {
    roots: Vec<PathBuf>,
}

impl SearchRoots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut roots = Self::new();
        for path in paths {
            roots.push(path);
        }
        roots
    }

    /// Append a root; returns false if it was already present
    pub fn push(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.roots.contains(&path) {
            return false;
        }
        self.roots.push(path);
        true
    }

    /// Parse the persisted form: one path per line, blank lines ignored
    pub fn parse(text: &str) -> Self {
        Self::from_paths(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from),
        )
    }

    /// Persisted form, one path per line
    pub fn format(&self) -> String {
        self.roots
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Make relative roots absolute against `base`
    pub fn relative_to(self, base: &Path) -> Self {
        Self::from_paths(self.roots.into_iter().map(|root| {
            if root.is_relative() {
                base.join(root)
            } else {
                root
            }
        }))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_skips_blank_lines() {
        let roots = SearchRoots::parse("/a/schema\n\n  /b/schema  \n\n");
        assert_eq!(
            roots.as_slice(),
            &[PathBuf::from("/a/schema"), PathBuf::from("/b/schema")]
        );
    }

    #[test]
    fn test_format_parse_round_trip() {
        let roots = SearchRoots::from_paths(["/one", "/two", "/three"]);
        assert_eq!(SearchRoots::parse(&roots.format()), roots);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let mut roots = SearchRoots::from_paths(["/a", "/b"]);
        assert!(!roots.push("/a"));
        assert!(roots.push("/c"));
        assert_eq!(roots.format(), "/a\n/b\n/c");
    }

    #[test]
    fn test_relative_to() {
        let roots = SearchRoots::from_paths(["schema", "/abs"]).relative_to(Path::new("/project"));
        assert_eq!(
            roots.as_slice(),
            &[PathBuf::from("/project/schema"), PathBuf::from("/abs")]
        );
    }
}
