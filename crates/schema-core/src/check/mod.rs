//! Type checker
//!
//! Walks a parsed file and reports, as [`Diagnostic`]s:
//!
//! - type names in fields and commands that resolve nowhere
//! - annotation and constructor arguments whose count, names or literal
//!   shapes disagree with the target type's fields
//! - enum or instance references that do not resolve
//! - field numbers reused inside one type or component
//!
//! Checking only reads the tree; it runs on incomplete trees too.

mod annotation;
mod literal;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::diagnostics::{
    syntax_error, type_mismatch_error, unresolved_error, Diagnostic, DiagnosticCode, RelatedInfo,
    SuggestedFix,
};
use crate::resolve::{is_standard_library_name, Resolver};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

pub const BUILT_IN_TYPES: &[&str] = &[
    "double", "float", "string", "bytes", "int32", "int64", "uint32", "uint64", "sint32", "sint64",
    "fixed32", "fixed64", "sfixed32", "sfixed64", "bool",
];

pub const BUILT_IN_GENERICS: &[&str] = &["option", "list", "map"];

const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Syntax errors followed by everything the checker finds
pub fn check_file(tree: &Arc<SyntaxTree>, resolver: &Resolver<'_>) -> Vec<Diagnostic> {
    let mut checker = Checker::new(tree, *resolver);
    for error in tree.errors() {
        checker.diagnostics.push(syntax_error(tree, error));
    }
    for node in tree.descendants(tree.root()) {
        checker.validate(node);
    }

    let diagnostics = checker.finish();
    debug!(
        path = ?tree.path(),
        syntax_errors = tree.errors().len(),
        total = diagnostics.len(),
        "checked schema file"
    );
    diagnostics
}

pub fn is_built_in(name: &str) -> bool {
    BUILT_IN_TYPES.contains(&name) || BUILT_IN_GENERICS.contains(&name)
}

/// Per-file checking state
pub struct Checker<'a> {
    tree: &'a Arc<SyntaxTree>,
    resolver: Resolver<'a>,
    /// References already judged against an expected type
    judged: HashSet<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    pub fn new(tree: &'a Arc<SyntaxTree>, resolver: Resolver<'a>) -> Self {
        Self {
            tree,
            resolver,
            judged: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Check one node; kinds without rules are ignored
    pub fn validate(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::FieldType => self.field_type(node),
            NodeKind::Command => self.command(node),
            NodeKind::Annotation => self.annotation(node),
            NodeKind::NewInstance => self.new_instance(node),
            NodeKind::EnumOrInstanceRef => self.enum_or_instance(node),
            NodeKind::Type | NodeKind::Component => self.field_numbers(node),
            _ => {}
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // -------------------------------------------------------------------------
    // Type references
    // -------------------------------------------------------------------------

    fn field_type(&mut self, node: NodeId) {
        let tree = self.tree;
        let children = tree.children(node);
        let Some(&head) = children.first() else {
            return;
        };
        self.type_reference(head);
        if BUILT_IN_GENERICS.contains(&tree.text(head)) {
            for &param in &children[1..] {
                self.type_reference(param);
            }
        }
    }

    fn command(&mut self, node: NodeId) {
        let tree = self.tree;
        for reference in tree.children_of_kind(node, NodeKind::TypeNameRef) {
            self.type_reference(reference);
        }
    }

    fn type_reference(&mut self, node: NodeId) {
        let tree = self.tree;
        let name = tree.text(node);
        if is_built_in(name) {
            return;
        }
        match self.resolver.resolve(tree, node, name) {
            Some(def) => match def.kind() {
                NodeKind::Type | NodeKind::Enum | NodeKind::Component => {}
                other => self.push(type_mismatch_error(
                    tree,
                    node,
                    format!("'{}' names a {}, not a type", name, other),
                )),
            },
            None if is_standard_library_name(tree, name) => {}
            None => self.unresolved(node, format!("Unable to find type {}", name)),
        }
    }

    fn enum_or_instance(&mut self, node: NodeId) {
        if self.judged.contains(&node) {
            return;
        }
        let tree = self.tree;
        let name = tree.text(node);
        if self.resolver.resolve(tree, node, name).is_none() && !is_standard_library_name(tree, name)
        {
            self.unresolved(node, format!("Unable to find type/enum {}", name));
        }
    }

    /// Report an unresolved name, suggesting a close definition name
    fn unresolved(&mut self, node: NodeId, message: String) {
        let tree = self.tree;
        let mut diagnostic = unresolved_error(tree, node, message);
        if let Some(candidate) = self.suggest(tree.text(node)) {
            diagnostic = diagnostic.with_fix(SuggestedFix {
                description: format!("did you mean '{}'?", candidate),
                replacement: candidate,
                range: tree.range(node),
            });
        }
        self.push(diagnostic);
    }

    fn suggest(&self, name: &str) -> Option<String> {
        let tree = self.tree;
        let wanted = name.to_lowercase();
        tree.descendants(tree.root())
            .filter(|&n| {
                matches!(
                    tree.kind(n),
                    NodeKind::Type | NodeKind::Enum | NodeKind::Component
                )
            })
            .filter_map(|n| tree.definition_name(n))
            .filter(|&candidate| candidate != name)
            .map(|candidate| {
                let score = strsim::jaro_winkler(&wanted, &candidate.to_lowercase());
                (score, candidate)
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate.to_string())
    }

    // -------------------------------------------------------------------------
    // Field numbers
    // -------------------------------------------------------------------------

    fn field_numbers(&mut self, node: NodeId) {
        let tree = self.tree;
        let mut seen: HashMap<u64, NodeId> = HashMap::new();
        for field in tree.children_of_kind(node, NodeKind::Field) {
            let Some(number) = tree.field_number(field) else {
                continue;
            };
            let Some(&first) = seen.get(&number) else {
                seen.insert(number, field);
                continue;
            };
            let anchor = tree
                .first_child_of_kind(field, NodeKind::FieldNumber)
                .unwrap_or(field);
            let diagnostic = Diagnostic::warning(
                DiagnosticCode::DuplicateFieldNumber,
                format!(
                    "Field number {} is already used by '{}'",
                    number,
                    tree.field_name(first).unwrap_or_default()
                ),
            )
            .at(tree, anchor)
            .with_related(RelatedInfo::at(tree, first, "first declared here"));
            self.push(diagnostic);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check(source: &str) -> Vec<Diagnostic> {
        let tree = Arc::new(parse(source));
        check_file(&tree, &Resolver::local())
    }

    #[test]
    fn test_clean_file() {
        let diags = check(
            "package p;\ntype Vec { double x = 1; double y = 2; }\n\
             component Thing { id = 1; Vec v = 1; list<Vec> path = 2; map<string, Vec> named = 3; }",
        );
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_unresolved_field_type() {
        let diags = check("type A { Missing m = 1; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnresolvedReference);
        assert_eq!(diags[0].message, "Unable to find type Missing");
    }

    #[test]
    fn test_generic_parameters_are_checked() {
        let diags = check("type A { map<string, Nope> m = 1; }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Nope"));
    }

    #[test]
    fn test_suggestion_for_typo() {
        let diags = check("type Position {} type A { Positon p = 1; }");
        let fix = diags[0].suggested_fix.as_ref().unwrap();
        assert_eq!(fix.replacement, "Position");
    }

    #[test]
    fn test_no_suggestion_for_distant_name() {
        let diags = check("type Position {} type A { Zzz p = 1; }");
        assert!(diags[0].suggested_fix.is_none());
    }

    #[test]
    fn test_command_types() {
        let diags = check("type Req {} component C { id = 2; command Resp go(Req); }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unable to find type Resp");
    }

    #[test]
    fn test_entity_id_is_always_known() {
        assert!(check("type A { EntityId e = 1; }").is_empty());
    }

    #[test]
    fn test_standard_library_needs_import() {
        let with = check(
            "import \"improbable/standard_library.schema\";\n\
             component C { id = 1; improbable.Position p = 1; }",
        );
        assert!(with.is_empty(), "{:?}", with);
        let without = check("component C { id = 1; improbable.Position p = 1; }");
        assert_eq!(without.len(), 1);
    }

    #[test]
    fn test_duplicate_field_numbers_warn() {
        let diags = check("type A { int32 a = 1; int32 b = 1; }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_warning());
        assert_eq!(diags[0].code, DiagnosticCode::DuplicateFieldNumber);
        assert_eq!(diags[0].related.len(), 1);
    }

    #[test]
    fn test_syntax_errors_come_first() {
        let diags = check("type A { Missing m = 1 }\n???");
        assert_eq!(diags[0].code, DiagnosticCode::SyntaxError);
    }

    #[test]
    fn test_field_reference_is_not_a_type() {
        let diags = check("type A { int32 b = 1; A.b x = 2; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::TypeMismatch);
    }
}
