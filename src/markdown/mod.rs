//! Markdown front-end.
//!
//! Parses source text with tree-sitter-md and lowers the concrete syntax tree
//! into [`MarkdownNode`]s carrying 1-based source ranges, which is all the
//! indexer needs to know about the parser.

pub mod node;
pub mod parser;

pub use node::{MarkdownNode, NodeKind, SourceLocation, SourceRange};
pub use parser::{MarkdownParser, ParsedSource};
