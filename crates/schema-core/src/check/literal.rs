//! Literal values against declared field types

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::Checker;
use crate::diagnostics::{arity_error, type_mismatch_error};
use crate::resolve::Definition;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

static BOOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?i:true|false)$").unwrap());
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").unwrap());
static STRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^".*"$"#).unwrap());

const INTEGER_TYPES: &[&str] = &[
    "uint32", "uint64", "int32", "int64", "sint32", "sint64", "fixed32", "fixed64", "sfixed32",
    "sfixed64", "EntityId",
];
const DECIMAL_TYPES: &[&str] = &["float", "double"];
const STRING_TYPES: &[&str] = &["string", "bytes"];

/// Pattern a literal must match for a primitive type, with its description
fn primitive_pattern(base: &str) -> Option<(&'static Regex, &'static str)> {
    if base == "bool" {
        Some((&*BOOL, "true or false"))
    } else if INTEGER_TYPES.contains(&base) {
        Some((&*INTEGER, "an integer"))
    } else if DECIMAL_TYPES.contains(&base) {
        Some((&*DECIMAL, "a decimal"))
    } else if STRING_TYPES.contains(&base) {
        Some((&*STRING, "a string"))
    } else {
        None
    }
}

/// Declared type split into its head name and generic parameter nodes
struct ExpectedType<'t> {
    base: &'t str,
    params: Vec<NodeId>,
    full: &'t str,
}

impl<'t> ExpectedType<'t> {
    fn of(tree: &'t SyntaxTree, node: NodeId) -> Self {
        let full = tree.text(node);
        if tree.kind(node) != NodeKind::FieldType {
            return Self {
                base: full,
                params: Vec::new(),
                full,
            };
        }
        Self {
            base: tree
                .first_child_of_kind(node, NodeKind::TypeName)
                .map_or(full, |n| tree.text(n)),
            params: tree
                .children_of_kind(node, NodeKind::TypeParameterName)
                .collect(),
            full,
        }
    }
}

impl Checker<'_> {
    /// Check a value node against a declared type node
    ///
    /// `expected` may live in another file (an imported type's field), so
    /// its tree is passed alongside; names in it resolve from there.
    pub fn check_field(&mut self, value: NodeId, expected_tree: &Arc<SyntaxTree>, expected: NodeId) {
        let tree = self.tree;
        let typed = tree.text(value).trim();
        let ty = ExpectedType::of(expected_tree, expected);

        if typed == "_" {
            if ty.base != "option" {
                self.push(type_mismatch_error(
                    tree,
                    value,
                    format!("Illegal Character. Empty options are not allowed on {}", ty.full),
                ));
            }
            return;
        }

        if ty.params.is_empty() {
            if let Some((pattern, description)) = primitive_pattern(ty.base) {
                if !pattern.is_match(typed) {
                    self.push(type_mismatch_error(
                        tree,
                        value,
                        format!("Expected {}. Found '{}'", description, typed),
                    ));
                }
                return;
            }
        }

        match ty.base {
            "option" => {
                if let Some(&inner) = ty.params.first() {
                    self.check_field(value, expected_tree, inner);
                }
            }
            "list" => {
                if !typed.starts_with('[') {
                    self.push(type_mismatch_error(tree, value, "Lists should start with '['".into()));
                } else if !typed.ends_with(']') {
                    self.push(type_mismatch_error(tree, value, "Lists should end with ']'".into()));
                } else if let Some(&element) = ty.params.first() {
                    for item in tree.value_children(value) {
                        self.check_field(item, expected_tree, element);
                    }
                }
            }
            "map" => {
                if !typed.starts_with('{') {
                    self.push(type_mismatch_error(tree, value, "Maps should start with '{'".into()));
                } else if !typed.ends_with('}') {
                    self.push(type_mismatch_error(tree, value, "Maps should end with '}'".into()));
                } else {
                    for entry in tree.value_children(value) {
                        self.map_entry(entry, expected_tree, &ty.params);
                    }
                }
            }
            base => self.user_type(value, typed, expected_tree, expected, base),
        }
    }

    fn map_entry(&mut self, entry: NodeId, expected_tree: &Arc<SyntaxTree>, params: &[NodeId]) {
        let tree = self.tree;
        let parts: Vec<NodeId> = tree.value_children(entry).collect();
        let &[key, value] = &parts[..] else {
            self.push(type_mismatch_error(
                tree,
                entry,
                "Invalid map entry. Format should be K:V".into(),
            ));
            return;
        };
        if let &[key_type, value_type] = params {
            self.check_field(key, expected_tree, key_type);
            self.check_field(value, expected_tree, value_type);
        }
    }

    fn user_type(
        &mut self,
        value: NodeId,
        typed: &str,
        expected_tree: &Arc<SyntaxTree>,
        expected: NodeId,
        base: &str,
    ) {
        // An unknown declared type is reported on the declaration itself
        let Some(target) = self.resolver.resolve(expected_tree, expected, base) else {
            return;
        };
        match target.kind() {
            NodeKind::Enum => self.enum_literal(value, typed, &target, expected_tree, expected, base),
            NodeKind::Type | NodeKind::Component => self.instance_literal(value, typed, &target, base),
            _ => {}
        }
    }

    /// The literal must name one of the enum's values, qualified or bare
    fn enum_literal(
        &mut self,
        value: NodeId,
        typed: &str,
        target: &Definition,
        expected_tree: &Arc<SyntaxTree>,
        expected: NodeId,
        base: &str,
    ) {
        let tree = self.tree;
        self.judged.insert(value);

        let found = self.resolver.resolve(tree, value, typed).or_else(|| {
            if typed.contains('.') {
                None
            } else {
                let qualified = format!("{}.{}", base, typed);
                self.resolver.resolve(expected_tree, expected, &qualified)
            }
        });

        match found {
            Some(member) if member.kind() == NodeKind::EnumValue => {
                if !member.is_child_of(target) {
                    self.push(type_mismatch_error(
                        tree,
                        value,
                        format!("Enum '{}' is not of type '{}'", typed, base),
                    ));
                }
            }
            _ => self.push(type_mismatch_error(
                tree,
                value,
                format!("Invalid type {}. Expected enum-type: '{}'", typed, base),
            )),
        }
    }

    /// Nominal match for constructor calls and bare instance references
    fn instance_literal(&mut self, value: NodeId, typed: &str, target: &Definition, base: &str) {
        let tree = self.tree;
        match tree.kind(value) {
            NodeKind::NewInstance => {
                let Some(name) = tree.first_child_of_kind(value, NodeKind::NewInstanceName) else {
                    return;
                };
                let head = self.resolver.resolve(tree, value, tree.text(name));
                if head.as_ref() != Some(target) {
                    self.push(type_mismatch_error(
                        tree,
                        value,
                        format!("Expected '{}' found '{}'", base, tree.text(name)),
                    ));
                }
            }
            NodeKind::EnumOrInstanceRef => {
                self.judged.insert(value);
                match self.resolver.resolve(tree, value, typed) {
                    Some(head) if &head == target => {
                        let fields = target.tree().ordered_fields(target.node()).len();
                        if fields != 0 {
                            self.push(arity_error(tree, value, fields, 0));
                        }
                    }
                    _ => self.push(type_mismatch_error(
                        tree,
                        value,
                        format!("Expected '{}' found '{}'", base, typed),
                    )),
                }
            }
            _ => self.push(type_mismatch_error(
                tree,
                value,
                format!("Expected '{}' found '{}'", base, typed),
            )),
        }
    }
}
