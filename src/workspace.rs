//! Schema workspace
//!
//! Pairs a [`SchemaFs`] with the configured search roots and runs the
//! front end over files: parse, resolve imports, check.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use schema_core::{check_file, parse, Definition, Diagnostic, Resolver, SchemaFs, SyntaxTree};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SearchRoots;
use crate::error::{SchemaError, SchemaResult};
use crate::fs::DiskFs;

/// File extension of schema sources
pub const SCHEMA_EXTENSION: &str = "schema";

/// Result of checking one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub tree: Arc<SyntaxTree>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    path: &'a Path,
    valid: bool,
    errors: usize,
    warnings: usize,
    diagnostics: &'a [Diagnostic],
}

impl FileReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn to_json(&self) -> SchemaResult<serde_json::Value> {
        let json = ReportJson {
            path: &self.path,
            valid: !self.has_errors(),
            errors: self.error_count(),
            warnings: self.warning_count(),
            diagnostics: &self.diagnostics,
        };
        Ok(serde_json::to_value(json)?)
    }
}

pub struct Workspace<F = DiskFs> {
    fs: F,
    roots: SearchRoots,
}

impl Workspace<DiskFs> {
    /// Workspace over the local disk
    pub fn new(roots: SearchRoots) -> Self {
        Self::with_fs(DiskFs, roots)
    }
}

impl<F: SchemaFs> Workspace<F> {
    pub fn with_fs(fs: F, roots: SearchRoots) -> Self {
        Self { fs, roots }
    }

    pub fn roots(&self) -> &SearchRoots {
        &self.roots
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.fs, self.roots.as_slice())
    }

    /// Read and parse one file
    pub fn load(&self, path: &Path) -> SchemaResult<Arc<SyntaxTree>> {
        let source = self.fs.read_to_string(path)?;
        Ok(Self::parse_source(path, source))
    }

    pub fn parse_source(path: &Path, source: impl AsRef<str>) -> Arc<SyntaxTree> {
        Arc::new(parse(source.as_ref()).with_path(path))
    }

    /// Parse and check one file
    pub fn check(&self, path: &Path) -> SchemaResult<FileReport> {
        let tree = self.load(path)?;
        Ok(self.check_tree(tree))
    }

    /// Check text that is not (or not yet) on disk, e.g. an editor buffer
    pub fn check_source(&self, path: &Path, source: &str) -> FileReport {
        self.check_tree(Self::parse_source(path, source))
    }

    pub fn check_tree(&self, tree: Arc<SyntaxTree>) -> FileReport {
        let diagnostics = check_file(&tree, &self.resolver());
        let path = tree.path().map(Path::to_path_buf).unwrap_or_default();
        debug!(path = %path.display(), count = diagnostics.len(), "file checked");
        FileReport {
            path,
            tree,
            diagnostics,
        }
    }

    /// Check every file, stopping at the first unreadable one
    pub fn check_all(&self, paths: &[PathBuf]) -> SchemaResult<Vec<FileReport>> {
        info!("Checking {} schema file(s)", paths.len());
        paths.iter().map(|p| self.check(p)).collect()
    }

    /// Go to definition: the definition referenced at byte `offset`
    pub fn definition_at(&self, path: &Path, offset: usize) -> SchemaResult<Option<Definition>> {
        let tree = self.load(path)?;
        let node = tree.node_at(offset);
        let found = std::iter::once(node)
            .chain(tree.ancestors(node))
            .find(|&n| tree.kind(n).is_reference())
            .and_then(|n| self.resolver().resolve_reference(&tree, n));
        Ok(found)
    }
}

/// All `.schema` files under `dir`, sorted
pub fn discover(dir: &Path) -> SchemaResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_schema_files(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_schema_files(dir: &Path, found: &mut Vec<PathBuf>) -> SchemaResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| SchemaError::io(dir, e))?.path();
        if path.is_dir() {
            collect_schema_files(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == SCHEMA_EXTENSION) {
            found.push(path);
        }
    }
    Ok(())
}
