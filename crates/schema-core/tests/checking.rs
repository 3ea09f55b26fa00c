//! Type checking of annotation arguments and type references

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use schema_core::{check_file, parse, Diagnostic, DiagnosticCode, MemoryFs, NodeKind, Resolver};

fn check(source: &str) -> Vec<Diagnostic> {
    let tree = Arc::new(parse(source));
    check_file(&tree, &Resolver::local())
}

fn codes_and_messages(source: &str) -> Vec<(DiagnosticCode, String)> {
    check(source)
        .into_iter()
        .map(|d| (d.code, d.message))
        .collect()
}

#[test]
fn test_valid_file_has_no_diagnostics() {
    let source = "package foo; import \"a/b.schema\"; type T { int32 x = 1; }";
    let tree = parse(source);
    assert_eq!(tree.incomplete_nodes().count(), 0);
    assert!(check(source).is_empty());
}

#[test]
fn test_arity_reports_both_counts() {
    let source = "type P { int32 x = 1; int32 y = 2; }\n[P(1)] type Marked {}";
    let diags = check(source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::ArityMismatch);
    assert_eq!(diags[0].message, "Invalid parameter count. Expected 2 found 1");
}

#[test]
fn test_enum_membership() {
    let base = "enum Color { RED = 0; GREEN = 1; }\ntype Paint { Color color = 1; }\n";
    let bad = codes_and_messages(&format!("{}[Paint(Color.BLUE)] type X {{}}", base));
    assert_eq!(
        bad,
        vec![(
            DiagnosticCode::TypeMismatch,
            "Invalid type Color.BLUE. Expected enum-type: 'Color'".to_string()
        )]
    );
    assert!(check(&format!("{}[Paint(Color.RED)] type X {{}}", base)).is_empty());
}

#[test]
fn test_list_literal_needs_brackets_and_checks_elements() {
    let base = "type Ids { list<int32> values = 1; }\n";
    assert_eq!(
        codes_and_messages(&format!("{}[Ids(1)] type X {{}}", base)),
        vec![(DiagnosticCode::TypeMismatch, "Lists should start with '['".to_string())]
    );
    assert!(check(&format!("{}[Ids([1, 2])] type X {{}}", base)).is_empty());
    assert_eq!(
        codes_and_messages(&format!("{}[Ids([1, true])] type X {{}}", base)),
        vec![(DiagnosticCode::TypeMismatch, "Expected an integer. Found 'true'".to_string())]
    );
}

#[test]
fn test_map_of_enums() {
    let source = "enum Slot { HEAD = 0; FEET = 1; }\n\
                  type Gear { map<Slot, string> worn = 1; }\n\
                  [Gear({Slot.HEAD: \"hat\", HANDS: \"glove\"})] type X {}";
    assert_eq!(
        codes_and_messages(source),
        vec![(
            DiagnosticCode::TypeMismatch,
            "Invalid type HANDS. Expected enum-type: 'Slot'".to_string()
        )]
    );
}

#[test]
fn test_named_arguments_follow_field_order() {
    let base = "type Range { int32 min = 1; int32 max = 2; }\n";
    assert!(check(&format!("{}[Range(min = 0, max = 10)] type X {{}}", base)).is_empty());

    let diags = check(&format!("{}[Range(max = 10, min = 0)] type X {{}}", base));
    let renames: Vec<(&str, &str)> = diags
        .iter()
        .filter(|d| d.code == DiagnosticCode::NameMismatch)
        .filter_map(|d| d.suggested_fix.as_ref())
        .map(|fix| (fix.description.as_str(), fix.replacement.as_str()))
        .collect();
    assert_eq!(
        renames,
        vec![("rename to 'min'", "min"), ("rename to 'max'", "max")]
    );
}

#[test]
fn test_constructor_arguments_are_checked_recursively() {
    let source = "type Vec { double x = 1; double y = 2; }\n\
                  type Segment { Vec from = 1; Vec to = 2; }\n\
                  [Segment(Vec(0.0, 1.0), Vec(2.0))] type X {}\n\
                  [Segment(Vec(0.0, 1.0), Vec(2.0, \"y\"))] type Y {}";
    assert_eq!(
        codes_and_messages(source),
        vec![
            (
                DiagnosticCode::ArityMismatch,
                "Invalid parameter count. Expected 2 found 1".to_string()
            ),
            (DiagnosticCode::TypeMismatch, "Expected a decimal. Found '\"y\"'".to_string()),
        ]
    );
}

#[test]
fn test_component_can_be_instantiated() {
    let source = "component Health { id = 10; int32 current = 1; }\n\
                  type Defaults { Health health = 1; }\n\
                  [Defaults(Health(100))] type X {}";
    assert!(check(source).is_empty(), "{:?}", check(source));
}

#[test]
fn test_enum_is_not_an_annotation_target() {
    let source = "enum Color { RED = 0; }\n[Color(1)] type X {}";
    let diags = check(source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::TypeMismatch);
    assert_eq!(
        diags[0].message,
        "'Color' does not name a type or component (found ENUM)"
    );
}

#[test]
fn test_unresolved_annotation_type() {
    let diags = check("[Missing] type X {}");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::UnresolvedReference);
    assert_eq!(diags[0].message, "Unable to find type Missing");
}

#[test]
fn test_broken_annotation_is_only_resolved() {
    // One syntax error; the damaged argument list is not arity checked
    let source = "type P { int32 x = 1; int32 y = 2; }\n[P(1 2)] type X {}";
    let diags = check(source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::SyntaxError);

    let diags = check("[Nope(1 2)] type X {}");
    let codes: Vec<DiagnosticCode> = diags.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::SyntaxError, DiagnosticCode::UnresolvedReference]
    );
}

#[test]
fn test_failed_argument_skips_arity_check() {
    let base = "type P { int32 x = 1; int32 y = 2; }\n";
    let diags = codes_and_messages(&format!("{}[P(,1)] type A {{}}", base));
    assert_eq!(
        diags,
        vec![(DiagnosticCode::SyntaxError, "Unknown value ','.".to_string())]
    );

    let diags = check(&format!("{}[P(x = 1, y = [?])] type A {{}}", base));
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::SyntaxError);
}

#[test]
fn test_arity_mismatch_leaves_bare_enum_arguments_alone() {
    let source = "enum Color { RED = 0; GREEN = 1; }\n\
                  type Paint { Color c = 1; }\n\
                  [Paint(GREEN, 1)] type X {}";
    assert_eq!(
        codes_and_messages(source),
        vec![(
            DiagnosticCode::ArityMismatch,
            "Invalid parameter count. Expected 1 found 2".to_string()
        )]
    );
}

#[test]
fn test_sparse_field_numbers_skip_gaps() {
    // Fields 1 and 5: the gap is tolerated and two arguments are expected
    let base = "type Sparse { int32 low = 1; string high = 5; }\n";
    assert!(check(&format!("{}[Sparse(1, \"x\")] type X {{}}", base)).is_empty());

    let diags = check(&format!("{}[Sparse(1)] type X {{}}", base));
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "Invalid parameter count. Expected 2 found 1");
}

#[test]
fn test_duplicate_number_warns_and_later_field_wins() {
    let source = "type Dup { int32 first = 1; string second = 1; }\n[Dup(\"x\")] type X {}";
    let diags = check(source);
    assert_eq!(diags.len(), 1);
    assert!(diags[0].is_warning());
    assert_eq!(diags[0].code, DiagnosticCode::DuplicateFieldNumber);
    assert_eq!(diags[0].message, "Field number 1 is already used by 'first'");
    assert_eq!(diags[0].related[0].message, "first declared here");

    let tree = parse(source);
    let dup = tree.child(tree.root(), 0).unwrap();
    let ordered: Vec<Option<&str>> = tree
        .ordered_fields(dup)
        .into_iter()
        .map(|f| tree.field_name(f))
        .collect();
    assert_eq!(ordered, vec![Some("second")]);
}

#[test]
fn test_unnumbered_fields_are_not_ordered() {
    let tree = parse("component C { id = 1; int32 a = 2; bytes blob; int32 b = 1; }");
    let component = tree.child(tree.root(), 0).unwrap();
    assert_eq!(tree.kind(component), NodeKind::Component);
    let ordered: Vec<Option<&str>> = tree
        .ordered_fields(component)
        .into_iter()
        .map(|f| tree.field_name(f))
        .collect();
    assert_eq!(ordered, vec![Some("b"), Some("a")]);
}

#[test]
fn test_imported_enum_argument() {
    let fs = MemoryFs::new().with_file(
        "/schema/lib/colors.schema",
        "package lib; enum Color { RED = 0; GREEN = 1; } type Tint { Color color = 1; }",
    );
    let roots = vec![PathBuf::from("/schema")];
    let resolver = Resolver::new(&fs, &roots);

    let good = Arc::new(parse(
        "import \"lib/colors.schema\";\n[lib.Tint(lib.Color.GREEN)] type X {}",
    ));
    assert!(check_file(&good, &resolver).is_empty());

    // A bare value name is looked up inside the imported enum
    let bare = Arc::new(parse("import \"lib/colors.schema\";\n[lib.Tint(RED)] type X {}"));
    assert!(check_file(&bare, &resolver).is_empty());

    let bad = Arc::new(parse("import \"lib/colors.schema\";\n[lib.Tint(PURPLE)] type X {}"));
    let diags = check_file(&bad, &resolver);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "Invalid type PURPLE. Expected enum-type: 'Color'");
}

#[test]
fn test_diagnostics_point_at_offending_text() {
    let source = "type A {\n  Positon p = 1;\n}\ntype Position {}";
    let tree = Arc::new(parse(source));
    let diags = check_file(&tree, &Resolver::local());
    assert_eq!(diags.len(), 1);
    let diag = &diags[0];
    assert_eq!(&source[diag.range.start..diag.range.end], "Positon");
    let span = diag.span.as_ref().unwrap();
    assert_eq!((span.start_line, span.start_col), (2, 3));
    assert_eq!(diag.suggested_fix.as_ref().unwrap().replacement, "Position");
}
