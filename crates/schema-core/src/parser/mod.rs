//! Recursive-descent schema parser
//!
//! One function per grammar construct. Constructs are delimited with
//! [`Marker`]s that write `Start` / `Finish` events; the events are turned
//! into a [`SyntaxTree`] afterwards.
//!
//! ## Recovery
//!
//! Parsing never aborts. When a construct cannot continue, [`Parser::error`]
//! closes it as *incomplete* (keeping its kind), wraps the tokens it skips
//! in an `Error` node carrying the message, and returns to the enclosing
//! loop at a boundary chosen by [`Recovery`].
//!
//! ```text
//! Statement       stop before '}', or after ';'
//! Annotation      stop before '}', or after ']' or ';'
//! Value           stop before ')' ']' '}', or after ';'
//! Delimited(c)    stop after c or ';', or before any other closer
//! Braces          stop after '}'
//! TopLevel        stop after whichever of ';' and '}' comes first
//! ```
//!
//! A statement that is complete except for its `;` is closed as incomplete
//! without skipping anything when the next token can start another member,
//! so one forgotten semicolon costs one diagnostic.
//!
//! Nested types, enums and annotation values deeper than [`MAX_NESTING`]
//! are not descended into; each is skipped up to its balanced closer.

mod annotations;
mod definitions;

use crate::lexer::{tokenize, Token, TokenKind};
use crate::syntax::{build_tree, Event, NodeKind, SyntaxTree};

pub(crate) const KEYWORD_PACKAGE: &str = "package";
pub(crate) const KEYWORD_IMPORT: &str = "import";
pub(crate) const KEYWORD_OPTION: &str = "option";
pub(crate) const KEYWORD_ENUM: &str = "enum";
pub(crate) const KEYWORD_TYPE: &str = "type";
pub(crate) const KEYWORD_COMPONENT: &str = "component";
pub(crate) const KEYWORD_ID: &str = "id";
pub(crate) const KEYWORD_DATA: &str = "data";
pub(crate) const KEYWORD_EVENT: &str = "event";
pub(crate) const KEYWORD_COMMAND: &str = "command";
pub(crate) const KEYWORD_TRANSIENT: &str = "transient";

/// Deepest nesting of definitions and annotation values that is parsed
pub const MAX_NESTING: usize = 256;

// ============================================================================
// Public API
// ============================================================================

/// Parse a whole schema file
///
/// Always returns a tree. Syntax problems are recorded on the tree (see
/// [`SyntaxTree::errors`]) rather than returned.
pub fn parse(source: &str) -> SyntaxTree {
    parse_tokens(source, tokenize(source))
}

/// Parse from an already tokenized buffer
///
/// `tokens` must tile `source`, as produced by [`tokenize`].
pub fn parse_tokens(source: &str, tokens: Vec<Token>) -> SyntaxTree {
    let mut parser = Parser::new(source, &tokens);
    definitions::schema_file(&mut parser);
    let events = parser.events;
    build_tree(source.to_string(), tokens, events)
}

// ============================================================================
// Parser state
// ============================================================================

/// Where error recovery resumes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Recovery {
    Statement,
    /// The annotation itself; its closing `]` is swallowed
    Annotation,
    /// Inside an annotation value; closers are left for the enclosing value
    Value,
    /// Inside a bracketed annotation value that ends with the given closer
    Delimited(TokenKind),
    Braces,
    TopLevel,
}

impl Recovery {
    /// Token that ends the skip and is swallowed with it
    fn stops_after(self, kind: TokenKind) -> bool {
        match self {
            Recovery::Statement | Recovery::Value => kind == TokenKind::Semicolon,
            Recovery::Annotation => matches!(kind, TokenKind::Semicolon | TokenKind::RBracket),
            Recovery::Delimited(closer) => kind == TokenKind::Semicolon || kind == closer,
            Recovery::Braces => kind == TokenKind::RBrace,
            Recovery::TopLevel => matches!(kind, TokenKind::Semicolon | TokenKind::RBrace),
        }
    }

    /// Token that ends the skip and is left for the caller
    fn stops_before(self, kind: TokenKind) -> bool {
        match self {
            Recovery::Statement | Recovery::Annotation => kind == TokenKind::RBrace,
            Recovery::Value | Recovery::Delimited(_) => matches!(
                kind,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
            ),
            Recovery::Braces | Recovery::TopLevel => false,
        }
    }
}

pub(crate) struct Parser<'t> {
    source: &'t str,
    tokens: &'t [Token],
    /// Indexes of non-trivia tokens
    significant: Vec<usize>,
    pos: usize,
    events: Vec<Event>,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn new(source: &'t str, tokens: &'t [Token]) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .map(|(i, _)| i)
            .collect();
        Self {
            source,
            tokens,
            significant,
            pos: 0,
            events: Vec::new(),
            depth: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Lookahead
    // -------------------------------------------------------------------------

    pub(crate) fn nth(&self, n: usize) -> Option<TokenKind> {
        self.nth_token(n).map(|t| t.kind)
    }

    fn nth_token(&self, n: usize) -> Option<&Token> {
        self.significant
            .get(self.pos + n)
            .map(|&i| &self.tokens[i])
    }

    pub(crate) fn current(&self) -> Option<TokenKind> {
        self.nth(0)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.significant.len()
    }

    /// Identifier token with exactly this text
    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.at(TokenKind::Identifier) && self.text() == word
    }

    /// Text of the current token, empty at end of input
    pub(crate) fn text(&self) -> &'t str {
        match self.nth_token(0) {
            Some(token) => token.text(self.source),
            None => "",
        }
    }

    /// Text of the current token for messages
    pub(crate) fn found(&self) -> &'t str {
        if self.at_eof() {
            "<EOF>"
        } else {
            self.text()
        }
    }

    /// Position in the significant token stream, for progress checks
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    // -------------------------------------------------------------------------
    // Consuming
    // -------------------------------------------------------------------------

    pub(crate) fn bump(&mut self) {
        if let Some(&index) = self.significant.get(self.pos) {
            self.events.push(Event::Token(index));
            self.pos += 1;
        }
    }

    /// Consume the current token wrapped in a one-token node
    pub(crate) fn bump_as(&mut self, kind: NodeKind) {
        let marker = self.mark();
        self.bump();
        marker.done(self, kind);
    }

    /// Parse a nested construct one level deeper
    ///
    /// Past [`MAX_NESTING`] the construct is wrapped in an error node instead
    /// and `None` is returned.
    pub(crate) fn nested<R>(&mut self, parse: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.depth >= MAX_NESTING {
            self.skip_balanced("Nesting too deep.".to_string());
            return None;
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        Some(result)
    }

    /// Skip up to the closer that balances the first opener, or a `;`
    /// outside any bracket; an unmatched closer is left for the caller
    fn skip_balanced(&mut self, message: String) {
        let skipped = self.mark();
        let mut open = 0usize;
        while let Some(kind) = self.current() {
            match kind {
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => open += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => {
                    if open == 0 {
                        break;
                    }
                    open -= 1;
                    if open == 0 {
                        self.bump();
                        break;
                    }
                }
                TokenKind::Semicolon if open == 0 => {
                    self.bump();
                    break;
                }
                _ => {}
            }
            self.bump();
        }
        skipped.error(self, message);
    }

    pub(crate) fn mark(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::tombstone());
        Marker { pos }
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    /// Report an error and skip to a recovery boundary
    ///
    /// `open` is the construct being built; it is closed as incomplete before
    /// the error node starts, so the skipped tokens become its sibling.
    pub(crate) fn error(
        &mut self,
        open: Option<(Marker, NodeKind)>,
        recovery: Recovery,
        message: String,
    ) {
        if let Some((marker, kind)) = open {
            marker.done_incomplete(self, kind);
        }

        let skipped = self.mark();
        while let Some(kind) = self.current() {
            if recovery.stops_after(kind) {
                self.bump();
                break;
            }
            if recovery.stops_before(kind) {
                break;
            }
            self.bump();
        }
        skipped.error(self, message);
    }

    /// Report an error covering at most the current token
    ///
    /// Closing delimiters are left for the enclosing construct.
    pub(crate) fn error_here(&mut self, message: String) {
        let skipped = self.mark();
        if !matches!(
            self.current(),
            None | Some(
                TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::Comma
                    | TokenKind::Semicolon
            )
        ) {
            self.bump();
        }
        skipped.error(self, message);
    }

    /// Close a statement that ends in `;`
    pub(crate) fn expect_terminator(&mut self, marker: Marker, kind: NodeKind, message: String) {
        self.expect_closing(marker, kind, TokenKind::Semicolon, Recovery::Statement, message);
    }

    /// Close a construct on `closer`
    ///
    /// When the closer is missing but the next token can start another
    /// member, nothing is skipped and the error node is empty.
    pub(crate) fn expect_closing(
        &mut self,
        marker: Marker,
        kind: NodeKind,
        closer: TokenKind,
        recovery: Recovery,
        message: String,
    ) {
        if self.at(closer) {
            self.bump();
            marker.done(self, kind);
        } else if self.at_eof() || self.can_start_member() {
            marker.done_incomplete(self, kind);
            let missing = self.mark();
            missing.error(self, message);
        } else {
            self.error(Some((marker, kind)), recovery, message);
        }
    }

    fn can_start_member(&self) -> bool {
        matches!(
            self.current(),
            Some(TokenKind::Identifier | TokenKind::LBracket | TokenKind::RBrace)
        )
    }

    /// Wrap one token in an error node when a loop made no progress
    pub(crate) fn ensure_progress(&mut self, before: usize) {
        if self.pos == before && !self.at_eof() {
            let message = format!("Unexpected '{}'.", self.found());
            let skipped = self.mark();
            self.bump();
            skipped.error(self, message);
        }
    }
}

// ============================================================================
// Markers
// ============================================================================

/// An open construct; must be completed, failed or abandoned
#[must_use]
pub(crate) struct Marker {
    pos: usize,
}

impl Marker {
    pub(crate) fn done(self, p: &mut Parser<'_>, kind: NodeKind) {
        self.close(p, kind, false, None);
    }

    pub(crate) fn done_incomplete(self, p: &mut Parser<'_>, kind: NodeKind) {
        self.close(p, kind, true, None);
    }

    fn error(self, p: &mut Parser<'_>, message: String) {
        self.close(p, NodeKind::Error, false, Some(message));
    }

    /// Drop the marker; anything consumed since belongs to the parent
    pub(crate) fn abandon(self, p: &mut Parser<'_>) {
        if self.pos + 1 == p.events.len() {
            p.events.pop();
        }
    }

    fn close(self, p: &mut Parser<'_>, kind: NodeKind, incomplete: bool, message: Option<String>) {
        p.events[self.pos] = Event::Start {
            kind: Some(kind),
            incomplete,
            message,
        };
        p.events.push(Event::Finish);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds_under(tree: &SyntaxTree, id: crate::syntax::NodeId) -> Vec<NodeKind> {
        tree.children(id).iter().map(|&c| tree.kind(c)).collect()
    }

    #[test]
    fn test_package_and_import() {
        let tree = parse("package improbable.test;\nimport \"improbable/standard_library.schema\";\n");
        assert!(tree.errors().is_empty(), "{:?}", tree.errors());
        assert_eq!(tree.package_name(), Some("improbable.test"));
        assert_eq!(tree.imports(), vec!["improbable/standard_library.schema"]);
    }

    #[test]
    fn test_empty_file() {
        let tree = parse("");
        assert_eq!(tree.kind(tree.root()), NodeKind::SchemaFile);
        assert!(tree.children(tree.root()).is_empty());
        assert!(tree.errors().is_empty());
    }

    #[test]
    fn test_trivia_only_file() {
        let source = "  // nothing here\n/* or here */\n";
        let tree = parse(source);
        assert!(tree.errors().is_empty());
        assert_eq!(tree.range(tree.root()).end, source.len());
        assert_eq!(tree.leaf_text(tree.root()), source);
    }

    #[test]
    fn test_type_with_fields() {
        let tree = parse("type Position { double x = 1; double y = 2; }");
        assert!(tree.errors().is_empty());
        let ty = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.kind(ty), NodeKind::Type);
        assert_eq!(tree.definition_name(ty), Some("Position"));
        assert_eq!(
            kinds_under(&tree, ty),
            vec![NodeKind::Keyword, NodeKind::DefinitionName, NodeKind::Field, NodeKind::Field]
        );
    }

    #[test]
    fn test_missing_semicolon_keeps_next_field() {
        let source = "type T { int32 x = 1 int32 y = 2; }";
        let tree = parse(source);
        assert_eq!(tree.errors().len(), 1);
        let ty = tree.child(tree.root(), 0).unwrap();
        let fields: Vec<_> = tree.children_of_kind(ty, NodeKind::Field).collect();
        assert_eq!(fields.len(), 2);
        assert!(tree.is_incomplete(fields[0]));
        assert!(!tree.is_incomplete(fields[1]));
        assert_eq!(tree.field_name(fields[1]), Some("y"));
        assert_eq!(tree.errors()[0].span.start, tree.range(fields[0]).end);
    }

    #[test]
    fn test_bad_argument_stays_inside_annotation() {
        let tree = parse("[Foo(1 2)] type T { int32 x = 1; }");
        assert_eq!(tree.errors().len(), 1);
        let annotation = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.kind(annotation), NodeKind::Annotation);
        assert!(!tree.is_incomplete(annotation));
        let array = tree.first_child_of_kind(annotation, NodeKind::FieldArray).unwrap();
        assert!(tree.is_incomplete(array));

        let ty = tree.child(tree.root(), 1).unwrap();
        assert_eq!(tree.kind(ty), NodeKind::Type);
        assert_eq!(tree.definition_name(ty), Some("T"));
        assert!(!tree.is_incomplete(ty));
    }

    #[test]
    fn test_unclosed_annotation_does_not_swallow_definition() {
        let tree = parse("[Foo(1) type T {}");
        assert_eq!(tree.errors().len(), 1);
        assert_eq!(tree.errors()[0].message, "Expected end of annotation ']', found 'type'.");
        assert_eq!(
            kinds_under(&tree, tree.root()),
            vec![NodeKind::Annotation, NodeKind::Error, NodeKind::Type]
        );
    }

    #[test]
    fn test_too_deep_type_is_skipped_whole() {
        let mut source = "type A { ".repeat(MAX_NESTING + 1);
        source.push_str("int32 x = 1; ");
        source.push_str(&"} ".repeat(MAX_NESTING + 1));
        source.push_str("type B {}");
        let tree = parse(&source);

        assert_eq!(tree.errors().len(), 1);
        assert_eq!(tree.errors()[0].message, "Nesting too deep.");
        assert!(tree.errors()[0].span.end < source.len());
        let last = tree.children(tree.root()).last().copied().unwrap();
        assert_eq!(tree.definition_name(last), Some("B"));
        assert_eq!(tree.leaf_text(tree.root()), source);
    }

    #[test]
    fn test_nesting_limit_applies_to_values() {
        let mut source = "[T(".to_string();
        source.push_str(&"[".repeat(MAX_NESTING + 1));
        source.push_str(&"]".repeat(MAX_NESTING + 1));
        source.push_str(")] type X {}");
        let tree = parse(&source);
        assert_eq!(tree.errors().len(), 1);
        assert_eq!(tree.errors()[0].message, "Nesting too deep.");
        let last = tree.children(tree.root()).last().copied().unwrap();
        assert_eq!(tree.kind(last), NodeKind::Type);
        assert!(!tree.is_incomplete(last));
    }

    #[test]
    fn test_abandoned_marker_leaves_no_node() {
        let mut parser = Parser::new("", &[]);
        let marker = parser.mark();
        marker.abandon(&mut parser);
        assert!(parser.events.is_empty());
    }

    #[test]
    fn test_progress_guard_consumes_one_token() {
        let tokens = tokenize(")");
        let mut parser = Parser::new(")", &tokens);
        let before = parser.position();
        parser.ensure_progress(before);
        assert!(parser.at_eof());
    }
}
