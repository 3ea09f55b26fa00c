//! Name resolution
//!
//! Maps a dotted name, seen from some node in a file, to the node that
//! defines it. Three places are searched in order:
//!
//! 1. the file root, walking the segments through nested types
//! 2. each enclosing type of the reference, innermost first
//! 3. every import of the file under every search root, when the name
//!    starts with the imported file's package
//!
//! Imported files are read through [`SchemaFs`] and parsed on demand; no
//! cache is kept, so results always reflect current file contents.

mod fs;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

pub use fs::{FsError, MemoryFs, NoImports, SchemaFs};

use crate::parser::parse;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

pub const STANDARD_LIBRARY_IMPORT: &str = "improbable/standard_library.schema";

const STANDARD_LIBRARY_PACKAGE: &str = "improbable";

const STANDARD_LIBRARY_TYPES: &[&str] = &[
    "Position",
    "Coordinates",
    "WorkerAttributeSet",
    "WorkerRequirementSet",
    "EntityAcl",
    "Persistence",
    "Metadata",
    "Interest",
];

// ============================================================================
// Definition
// ============================================================================

/// A defining node together with the file that owns it
#[derive(Debug, Clone)]
pub struct Definition {
    tree: Arc<SyntaxTree>,
    node: NodeId,
}

impl Definition {
    pub fn new(tree: Arc<SyntaxTree>, node: NodeId) -> Self {
        Self { tree, node }
    }

    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> NodeKind {
        self.tree.kind(self.node)
    }

    pub fn name(&self) -> Option<&str> {
        self.tree.definition_name(self.node)
    }

    pub fn path(&self) -> Option<&Path> {
        self.tree.path()
    }

    /// Same owning file: equal paths, or the very same tree when unnamed
    pub fn same_file(&self, tree: &Arc<SyntaxTree>) -> bool {
        match (self.tree.path(), tree.path()) {
            (Some(a), Some(b)) => a == b,
            _ => Arc::ptr_eq(&self.tree, tree),
        }
    }

    /// Direct child of `parent` in the same file
    pub fn is_child_of(&self, parent: &Definition) -> bool {
        parent.same_file(&self.tree) && self.tree.parent(self.node) == Some(parent.node)
    }

    /// Types and components can be instantiated in annotations
    pub fn is_instantiable(&self) -> bool {
        matches!(self.kind(), NodeKind::Type | NodeKind::Component)
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.same_file(&other.tree)
    }
}

impl Eq for Definition {}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves names against a tree, its enclosing scopes and its imports
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    fs: &'a dyn SchemaFs,
    roots: &'a [PathBuf],
}

impl<'a> Resolver<'a> {
    pub fn new(fs: &'a dyn SchemaFs, roots: &'a [PathBuf]) -> Self {
        Self { fs, roots }
    }

    /// Resolver that never leaves the current file
    pub fn local() -> Resolver<'static> {
        static NO_IMPORTS: NoImports = NoImports;
        Resolver {
            fs: &NO_IMPORTS,
            roots: &[],
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        self.roots
    }

    /// Resolve `name` as seen from `node`, following imports
    pub fn resolve(&self, tree: &Arc<SyntaxTree>, node: NodeId, name: &str) -> Option<Definition> {
        self.resolve_with(tree, node, name, true)
    }

    /// Resolve `name`, optionally skipping the import search
    pub fn resolve_with(
        &self,
        tree: &Arc<SyntaxTree>,
        node: NodeId,
        name: &str,
        search_imports: bool,
    ) -> Option<Definition> {
        let segments: Vec<&str> = name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        if let Some(found) = walk_segments(tree, tree.root(), &segments, true) {
            return Some(Definition::new(Arc::clone(tree), found));
        }

        for scope in tree.ancestors(node).filter(|&a| tree.kind(a) == NodeKind::Type) {
            trace!(name, scope = tree.definition_name(scope), "searching enclosing type");
            if let Some(found) = walk_segments(tree, scope, &segments, false) {
                return Some(Definition::new(Arc::clone(tree), found));
            }
        }

        if search_imports {
            self.search_imports(tree, name)
        } else {
            None
        }
    }

    fn search_imports(&self, tree: &SyntaxTree, name: &str) -> Option<Definition> {
        let imports = tree.imports();
        if imports.is_empty() {
            return None;
        }

        for root in self.roots {
            for import in &imports {
                let Some(file) = self.fs.import_target(root, import) else {
                    trace!(root = %root.display(), import, "import not under root");
                    continue;
                };
                debug!(file = %file.display(), name, "probing import");

                let source = match self.fs.read_to_string(&file) {
                    Ok(source) => source,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable import");
                        continue;
                    }
                };
                let imported = Arc::new(parse(&source).with_path(file));

                let Some(package) = imported.package_name() else {
                    continue;
                };
                let Some(rest) = name
                    .strip_prefix(package)
                    .and_then(|rest| rest.strip_prefix('.'))
                else {
                    continue;
                };
                debug!(package, import, "package matched");

                let root_node = imported.root();
                if let Some(found) = self.resolve_with(&imported, root_node, rest, false) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Go-to-definition for a reference-bearing node
    pub fn resolve_reference(&self, tree: &Arc<SyntaxTree>, node: NodeId) -> Option<Definition> {
        match tree.kind(node) {
            NodeKind::TypeName
            | NodeKind::TypeParameterName
            | NodeKind::TypeNameRef
            | NodeKind::NewInstanceName
            | NodeKind::EnumOrInstanceRef => self.resolve(tree, node, tree.text(node)),
            NodeKind::FieldType => {
                let name = tree.first_child_of_kind(node, NodeKind::TypeName)?;
                self.resolve(tree, node, tree.text(name))
            }
            NodeKind::FieldRef => {
                let annotation = tree
                    .ancestors(node)
                    .find(|&a| tree.kind(a) == NodeKind::Annotation)?;
                let target = tree.first_child_of_kind(annotation, NodeKind::TypeNameRef)?;
                let name = format!("{}.{}", tree.text(target), tree.text(node));
                self.resolve(tree, node, &name)
            }
            _ => None,
        }
    }
}

/// Walk `segments` downward from `scope`
///
/// The second-to-last segment may name an enum, in which case the last one
/// must be one of its values. The last segment matches an enum (or a field
/// when `fields` is set) before a type or component. Every other segment
/// descends into a nested type.
fn walk_segments(
    tree: &SyntaxTree,
    scope: NodeId,
    segments: &[&str],
    fields: bool,
) -> Option<NodeId> {
    let (last, path) = segments.split_last()?;
    let mut scope = scope;

    for (i, segment) in path.iter().enumerate() {
        if i + 1 == path.len() {
            if let Some(owner) = tree.find_named_child(scope, NodeKind::Enum, segment) {
                return tree.find_named_child(owner, NodeKind::EnumValue, last);
            }
        }
        scope = tree.find_named_child(scope, NodeKind::Type, segment)?;
    }

    tree.find_named_child(scope, NodeKind::Enum, last)
        .or_else(|| {
            fields
                .then(|| tree.find_named_child(scope, NodeKind::Field, last))
                .flatten()
        })
        .or_else(|| tree.find_named_child(scope, NodeKind::Type, last))
        .or_else(|| tree.find_named_child(scope, NodeKind::Component, last))
}

/// Names accepted without a definition: `EntityId`, plus the standard
/// library types when the file imports it
pub fn is_standard_library_name(tree: &SyntaxTree, name: &str) -> bool {
    if name == "EntityId" {
        return true;
    }
    let Some(short) = name
        .strip_prefix(STANDARD_LIBRARY_PACKAGE)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return false;
    };
    STANDARD_LIBRARY_TYPES.contains(&short) && tree.imports().contains(&STANDARD_LIBRARY_IMPORT)
}

// ============================================================================
// Tests
// ============================================================================
