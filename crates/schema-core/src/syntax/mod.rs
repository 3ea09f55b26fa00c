//! Syntax tree types and construction

mod builder;
mod kind;
mod tree;

pub(crate) use builder::{build_tree, Event};
pub use kind::NodeKind;
pub use tree::{Descendants, Element, NodeId, Span, SyntaxError, SyntaxTree};
