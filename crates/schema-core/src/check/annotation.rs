//! Annotation and constructor argument checks

use super::Checker;
use crate::diagnostics::{arity_error, type_mismatch_error, Diagnostic, DiagnosticCode, SuggestedFix};
use crate::resolve::{is_standard_library_name, Definition};
use crate::syntax::{NodeId, NodeKind};

impl Checker<'_> {
    /// `[T]`, `[T(a, b)]` or `[T(x = a, y = b)]`
    pub(super) fn annotation(&mut self, node: NodeId) {
        let tree = self.tree;
        let Some(type_ref) = tree
            .child(node, 0)
            .filter(|&c| tree.kind(c) == NodeKind::TypeNameRef)
        else {
            return;
        };
        let target = self.resolver.resolve(tree, node, tree.text(type_ref));

        let qualifiers: Vec<NodeId> = tree
            .children_of_kind(node, NodeKind::AnnotationQualifier)
            .collect();
        let array = tree.first_child_of_kind(node, NodeKind::FieldArray);

        let incomplete = tree.is_incomplete(node)
            || array.is_some_and(|a| tree.is_incomplete(a))
            || qualifiers.iter().any(|&q| tree.is_incomplete(q));
        if incomplete || (qualifiers.is_empty() && array.is_none()) {
            self.target_exists(type_ref, target.as_ref());
            if target.is_some() {
                self.set_aside_arguments(node);
            }
        } else if let Some(array) = array {
            self.positional_arguments(node, type_ref, target, array);
        } else {
            self.named_arguments(node, type_ref, target, &qualifiers);
        }
    }

    /// `T(a, b)` used as a value
    pub(super) fn new_instance(&mut self, node: NodeId) {
        let tree = self.tree;
        let Some(name) = tree.first_child_of_kind(node, NodeKind::NewInstanceName) else {
            return;
        };
        let target = self.resolver.resolve(tree, node, tree.text(name));

        match tree.first_child_of_kind(node, NodeKind::FieldArray) {
            Some(array) if !tree.is_incomplete(node) && !tree.is_incomplete(array) => {
                self.positional_arguments(node, name, target, array);
            }
            _ => {
                self.target_exists(name, target.as_ref());
                if target.is_some() {
                    self.set_aside_arguments(node);
                }
            }
        }
    }

    /// Mark the bare references among arguments that will not be matched
    /// against fields, so they are not looked up without an expected type.
    /// Nested constructors check their own arguments.
    fn set_aside_arguments(&mut self, node: NodeId) {
        let tree = self.tree;
        let mut stack: Vec<NodeId> = tree.children(node).to_vec();
        while let Some(current) = stack.pop() {
            match tree.kind(current) {
                NodeKind::EnumOrInstanceRef => {
                    self.judged.insert(current);
                }
                NodeKind::NewInstance => {}
                _ => stack.extend_from_slice(tree.children(current)),
            }
        }
    }

    fn target_exists(&mut self, name: NodeId, target: Option<&Definition>) {
        let tree = self.tree;
        let text = tree.text(name);
        if target.is_none() && !is_standard_library_name(tree, text) {
            self.unresolved(name, format!("Unable to find type {}", text));
        }
    }

    /// Resolve the target and require it to be instantiable
    fn instantiable_target(&mut self, name: NodeId, target: Option<Definition>) -> Option<Definition> {
        let tree = self.tree;
        let Some(target) = target else {
            self.target_exists(name, None);
            return None;
        };
        if !target.is_instantiable() {
            self.push(type_mismatch_error(
                tree,
                name,
                format!(
                    "'{}' does not name a type or component (found {})",
                    tree.text(name),
                    target.kind()
                ),
            ));
            return None;
        }
        Some(target)
    }

    fn positional_arguments(
        &mut self,
        node: NodeId,
        name: NodeId,
        target: Option<Definition>,
        array: NodeId,
    ) {
        let Some(target) = self.instantiable_target(name, target) else {
            return;
        };
        let tree = self.tree;
        let arguments: Vec<NodeId> = tree.value_children(array).collect();
        let fields = target.tree().ordered_fields(target.node());
        if fields.len() != arguments.len() {
            self.push(arity_error(tree, node, fields.len(), arguments.len()));
            self.set_aside_arguments(array);
            return;
        }

        for (&argument, &field) in arguments.iter().zip(&fields) {
            if let Some(field_type) = target.tree().field_type(field) {
                self.check_field(argument, target.tree(), field_type);
            }
        }
    }

    fn named_arguments(
        &mut self,
        node: NodeId,
        name: NodeId,
        target: Option<Definition>,
        qualifiers: &[NodeId],
    ) {
        let Some(target) = self.instantiable_target(name, target) else {
            return;
        };
        let tree = self.tree;
        let fields = target.tree().ordered_fields(target.node());
        if fields.len() != qualifiers.len() {
            self.push(arity_error(tree, node, fields.len(), qualifiers.len()));
            for &qualifier in qualifiers {
                self.set_aside_arguments(qualifier);
            }
            return;
        }

        for (&qualifier, &field) in qualifiers.iter().zip(&fields) {
            let Some(field_ref) = tree.first_child_of_kind(qualifier, NodeKind::FieldRef) else {
                continue;
            };
            let written = tree.text(field_ref);
            let declared = target.tree().field_name(field).unwrap_or_default();
            if written != declared {
                let diagnostic = Diagnostic::error(
                    DiagnosticCode::NameMismatch,
                    format!(
                        "Invalid field name '{}' found. Did you mean '{}'?",
                        written, declared
                    ),
                )
                .at(tree, field_ref)
                .with_fix(SuggestedFix {
                    description: format!("rename to '{}'", declared),
                    replacement: declared.to_string(),
                    range: tree.range(field_ref),
                });
                self.push(diagnostic);
            }

            let value = tree.value_children(qualifier).find(|&c| c != field_ref);
            if let (Some(value), Some(field_type)) = (value, target.tree().field_type(field)) {
                self.check_field(value, target.tree(), field_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::check::check_file;
    use crate::diagnostics::{Diagnostic, DiagnosticCode};
    use crate::parser::parse;
    use crate::resolve::{MemoryFs, Resolver};

    fn check(source: &str) -> Vec<Diagnostic> {
        let tree = Arc::new(parse(source));
        check_file(&tree, &Resolver::local())
    }

    const CONFIG: &str = "type Config { int32 speed = 1; string label = 2; }\n";

    #[test]
    fn test_positional_arity() {
        let diags = check(&format!("{}[Config(1)] type X {{}}", CONFIG));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::ArityMismatch);
        assert!(diags[0].message.to_lowercase().contains("expected 2 found 1"));
    }

    #[test]
    fn test_named_arguments_in_field_order() {
        let diags = check(&format!("{}[Config(speed = 1, label = \"x\")] type X {{}}", CONFIG));
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_named_argument_wrong_name() {
        let diags = check(&format!("{}[Config(sped = 1, label = \"x\")] type X {{}}", CONFIG));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::NameMismatch);
        assert_eq!(
            diags[0].suggested_fix.as_ref().map(|f| f.replacement.as_str()),
            Some("speed")
        );
    }

    #[test]
    fn test_named_argument_value_type() {
        let diags = check(&format!("{}[Config(speed = \"fast\", label = \"x\")] type X {{}}", CONFIG));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::TypeMismatch);
    }

    #[test]
    fn test_bare_annotation_only_resolves() {
        assert!(check(&format!("{}[Config] type X {{}}", CONFIG)).is_empty());
        let diags = check("[Nowhere] type X {}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnresolvedReference);
    }

    #[test]
    fn test_enum_target_is_mismatch() {
        let diags = check("enum E { A = 0; }\n[E(1)] type X {}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::TypeMismatch);
    }

    #[test]
    fn test_constructor_arity() {
        let source = "type Vec { double x = 1; double y = 2; }\ntype Holder { Vec v = 1; }\n\
                      [Holder(Vec(1.0))] type X {}";
        let diags = check(source);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Expected 2 found 1"));
    }

    #[test]
    fn test_arity_mismatch_does_not_judge_arguments() {
        let source = "enum Color { RED = 0; GREEN = 1; }\ntype Paint { Color c = 1; }\n\
                      [Paint(GREEN, 1)] type X {}\n\
                      [Paint(c = GREEN, n = RED)] type Y {}";
        let codes: Vec<DiagnosticCode> = check(source).iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::ArityMismatch, DiagnosticCode::ArityMismatch]);
    }

    #[test]
    fn test_nested_constructor_still_checked_after_arity_mismatch() {
        let source = "enum Color { RED = 0; }\ntype Tint { Color c = 1; }\n\
                      type Pair { Tint a = 1; }\n\
                      [Pair(Tint(BLUE), 2)] type X {}";
        let messages: Vec<String> = check(source).into_iter().map(|d| d.message).collect();
        assert_eq!(
            messages,
            vec![
                "Invalid parameter count. Expected 1 found 2".to_string(),
                "Invalid type BLUE. Expected enum-type: 'Color'".to_string(),
            ]
        );
    }

    #[test]
    fn test_annotation_on_imported_type() {
        let fs = MemoryFs::new().with_file(
            "/schema/lib/config.schema",
            "package lib;\nenum Mode { FAST = 0; SLOW = 1; }\ntype Config { Mode mode = 1; int32 level = 2; }",
        );
        let roots = vec![PathBuf::from("/schema")];
        let resolver = Resolver::new(&fs, &roots);
        let good = Arc::new(parse(
            "import \"lib/config.schema\";\n[lib.Config(lib.Mode.FAST, 3)] type X {}",
        ));
        assert!(check_file(&good, &resolver).is_empty());

        let bad = Arc::new(parse(
            "import \"lib/config.schema\";\n[lib.Config(lib.Mode.FAST, \"three\")] type X {}",
        ));
        let diags = check_file(&bad, &resolver);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::TypeMismatch);
    }
}
