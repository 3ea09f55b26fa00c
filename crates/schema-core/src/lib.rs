//! schema-core: tokenizer, syntax tree, parser, resolver and checker for
//! the SpatialOS schema language
//!
//! This crate contains the pure front end with NO filesystem access:
//! - Nom-based tokenizer producing a lossless token stream
//! - Recursive-descent parser with error recovery, building an arena CST
//! - Name resolver; imports are read through the injected `SchemaFs`
//! - Type checker reporting `Diagnostic`s
//!
//! Disk access, search-root configuration and the CLI live in the
//! `spatial-schema` host crate.

pub mod check;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod syntax;

// Re-export commonly used types
pub use check::{check_file, Checker};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, SourceSpan};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{parse, parse_tokens, MAX_NESTING};
pub use resolve::{Definition, FsError, MemoryFs, Resolver, SchemaFs};
pub use syntax::{NodeId, NodeKind, Span, SyntaxTree};
