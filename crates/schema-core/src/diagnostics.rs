//! Unified Diagnostics Module
//!
//! Single diagnostic type used for syntax errors and checker findings.
//! Diagnostics are plain data: nothing in the front end fails with `Err`,
//! it reports and carries on.

use serde::{Deserialize, Serialize};

use crate::syntax::{NodeId, Span, SyntaxTree};

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Hint,
    Info,
}

/// Diagnostic codes for categorizing issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // =========================================================================
    // Parse errors
    // =========================================================================
    SyntaxError,

    // =========================================================================
    // Checker errors
    // =========================================================================
    UnresolvedReference,
    ArityMismatch,
    TypeMismatch,
    NameMismatch,

    // =========================================================================
    // Checker warnings
    // =========================================================================
    DuplicateFieldNumber,
}

impl DiagnosticCode {
    /// Short stable code shown by formatters
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::SyntaxError => "S001",
            DiagnosticCode::UnresolvedReference => "E010",
            DiagnosticCode::ArityMismatch => "E020",
            DiagnosticCode::TypeMismatch => "E030",
            DiagnosticCode::NameMismatch => "E040",
            DiagnosticCode::DuplicateFieldNumber => "W050",
        }
    }
}

/// Source location span
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a span from byte offsets (requires source text for line/col calculation)
    pub fn from_byte_offset(source: &str, start: usize, end: usize) -> Self {
        let (start_line, start_col) = byte_to_line_col(source, start);
        let (end_line, end_col) = byte_to_line_col(source, end);
        Self::new(start_line, start_col, end_line, end_col)
    }
}

/// Convert byte offset to line and column
fn byte_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Related information for multi-location diagnostics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedInfo {
    pub message: String,
    pub range: Span,
    pub span: SourceSpan,
}

impl RelatedInfo {
    pub fn at(tree: &SyntaxTree, node: NodeId, message: impl Into<String>) -> Self {
        let range = tree.range(node);
        Self {
            message: message.into(),
            range,
            span: SourceSpan::from_byte_offset(tree.source(), range.start, range.end),
        }
    }
}

/// Suggested fix for code actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    pub description: String,
    pub replacement: String,
    pub range: Span,
}

/// A diagnostic message with location, severity, and optional fix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Byte range in the checked file
    pub range: Span,
    pub span: Option<SourceSpan>,
    pub related: Vec<RelatedInfo>,
    pub suggested_fix: Option<SuggestedFix>,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    fn with_severity(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            range: Span::default(),
            span: None,
            related: vec![],
            suggested_fix: None,
        }
    }

    /// Anchor at a byte range, computing line/column from `source`
    pub fn with_range(mut self, source: &str, range: Span) -> Self {
        self.range = range;
        self.span = Some(SourceSpan::from_byte_offset(source, range.start, range.end));
        self
    }

    /// Anchor at a node's range
    pub fn at(self, tree: &SyntaxTree, node: NodeId) -> Self {
        self.with_range(tree.source(), tree.range(node))
    }

    /// Add suggested fix
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.suggested_fix = Some(fix);
        self
    }

    /// Add related information
    pub fn with_related(mut self, related: RelatedInfo) -> Self {
        self.related.push(related);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }

    /// Syntax errors and unresolved names make the file unusable downstream
    pub fn is_hard_error(&self) -> bool {
        self.is_error()
            && matches!(
                self.code,
                DiagnosticCode::SyntaxError | DiagnosticCode::UnresolvedReference
            )
    }
}

// =============================================================================
// Convenience Builders
// =============================================================================

/// Diagnostic for a recovered parse error
pub fn syntax_error(tree: &SyntaxTree, error: &crate::syntax::SyntaxError) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::SyntaxError, error.message.clone())
        .with_range(tree.source(), error.span)
}

/// Create an error for a name that resolves nowhere
pub fn unresolved_error(tree: &SyntaxTree, node: NodeId, message: String) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::UnresolvedReference, message).at(tree, node)
}

/// Create an error for a wrong argument count
pub fn arity_error(tree: &SyntaxTree, node: NodeId, expected: usize, found: usize) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::ArityMismatch,
        format!(
            "Invalid parameter count. Expected {} found {}",
            expected, found
        ),
    )
    .at(tree, node)
}

/// Create an error for a literal of the wrong shape or type
pub fn type_mismatch_error(tree: &SyntaxTree, node: NodeId, message: String) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::TypeMismatch, message).at(tree, node)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_error_creation() {
        let diag = Diagnostic::error(DiagnosticCode::SyntaxError, "unexpected token");
        assert!(diag.is_error());
        assert!(diag.is_hard_error());
        assert_eq!(diag.message, "unexpected token");
    }

    #[test]
    fn test_warning_not_error() {
        let diag = Diagnostic::warning(DiagnosticCode::DuplicateFieldNumber, "field number 1 reused");
        assert!(!diag.is_error());
        assert!(diag.is_warning());
        assert!(!diag.is_hard_error());
    }

    #[test]
    fn test_with_range() {
        let source = "type A {}\ntype B {}";
        let diag = Diagnostic::error(DiagnosticCode::TypeMismatch, "bad").with_range(source, Span::new(15, 16));
        assert_eq!(diag.range, Span::new(15, 16));
        assert_eq!(diag.span, Some(SourceSpan::new(2, 6, 2, 7)));
    }

    #[test]
    fn test_byte_to_line_col() {
        let source = "line1\nline2\nline3";
        assert_eq!(byte_to_line_col(source, 0), (1, 1));
        assert_eq!(byte_to_line_col(source, 5), (1, 6));
        assert_eq!(byte_to_line_col(source, 6), (2, 1));
        assert_eq!(byte_to_line_col(source, 12), (3, 1));
    }

    #[test]
    fn test_arity_message() {
        let tree = parse("type T {}");
        let diag = arity_error(&tree, tree.root(), 2, 1);
        assert_eq!(diag.code, DiagnosticCode::ArityMismatch);
        assert!(diag.message.contains("Expected 2 found 1"));
    }

    #[test]
    fn test_codes_are_distinct() {
        use std::collections::HashSet;
        let codes = [
            DiagnosticCode::SyntaxError,
            DiagnosticCode::UnresolvedReference,
            DiagnosticCode::ArityMismatch,
            DiagnosticCode::TypeMismatch,
            DiagnosticCode::NameMismatch,
            DiagnosticCode::DuplicateFieldNumber,
        ];
        let unique: HashSet<_> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_serializes_for_tools() {
        let tree = parse("type A { Missing m = 1; }");
        let node = tree
            .descendants(tree.root())
            .find(|&n| tree.text(n) == "Missing")
            .unwrap();
        let diag = unresolved_error(&tree, node, "Unable to find type Missing".into());
        let value = serde_json::to_value(&diag).unwrap();
        assert_eq!(value["severity"], "Error");
        assert_eq!(value["code"], "UnresolvedReference");
        assert_eq!(value["span"]["start_col"], 10);
        assert_eq!(value["span"]["end_col"], 17);

        let back: Diagnostic = serde_json::from_value(value).unwrap();
        assert_eq!(back, diag);
    }
}
