//! Totality properties over arbitrary input

use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;
use schema_core::{check_file, parse, tokenize, MemoryFs, Resolver, SyntaxTree};

/// Pieces of schema text, glued together in any order
const FRAGMENTS: &[&str] = &[
    "package a.b;",
    "import \"lib/x.schema\";",
    "option o = 1;",
    "type",
    "enum",
    "component",
    "id = 4;",
    "command A go(B);",
    "event E e;",
    "data D;",
    "transient",
    "list<",
    "map<int32, ",
    "option<",
    ">",
    "T",
    "x.y.Z",
    "int32 x = 1;",
    "{",
    "}",
    "[",
    "]",
    "(",
    ")",
    "=",
    ",",
    ":",
    ";",
    "_",
    "1.5",
    "42",
    "true",
    "\"str\"",
    "\"unterminated",
    "// note\n",
    "/* block",
    "*/",
    "#",
    " ",
    "\n",
];

fn schema_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..40).prop_map(|parts| parts.join(" "))
}

fn assert_well_formed(tree: &SyntaxTree, source: &str) -> Result<(), TestCaseError> {
    let root = tree.root();
    prop_assert_eq!(tree.range(root).start, 0);
    prop_assert_eq!(tree.range(root).end, source.len());
    prop_assert_eq!(tree.leaf_text(root), source);

    for node in tree.descendants(root) {
        let range = tree.range(node);
        prop_assert!(range.start <= range.end);
        if let Some(parent) = tree.parent(node) {
            let outer = tree.range(parent);
            prop_assert!(outer.start <= range.start && range.end <= outer.end);
        }
        for pair in tree.children(node).windows(2) {
            prop_assert!(tree.range(pair[0]).end <= tree.range(pair[1]).start);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn tokens_tile_any_input(source in "\\PC*") {
        let tokens = tokenize(&source);
        let mut offset = 0;
        for token in &tokens {
            prop_assert_eq!(token.start, offset);
            prop_assert!(token.end > token.start);
            offset = token.end;
        }
        prop_assert_eq!(offset, source.len());
    }

    #[test]
    fn parse_is_total_on_any_input(source in "\\PC*") {
        let tree = parse(&source);
        assert_well_formed(&tree, &source)?;
    }

    #[test]
    fn parse_is_total_on_schema_soup(source in schema_soup()) {
        let tree = parse(&source);
        assert_well_formed(&tree, &source)?;
    }

    #[test]
    fn check_never_panics(source in schema_soup()) {
        let fs = MemoryFs::new().with_file("/r/lib/x.schema", "package lib.x; type Z { int32 v = 1; }");
        let roots = vec![PathBuf::from("/r")];
        let tree = Arc::new(parse(&source));
        let diagnostics = check_file(&tree, &Resolver::new(&fs, &roots));
        prop_assert!(diagnostics.len() >= tree.errors().len());
        for diagnostic in &diagnostics {
            prop_assert!(diagnostic.range.end <= source.len());
        }
    }
}
