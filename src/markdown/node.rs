//! Front-end neutral Markdown tree handed to the indexer.
//!
//! Positions are 1-based `(line, column)` pairs where the column counts
//! UTF-8 bytes within its line and lines are separated by `\n` only.

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Start and end positions of a node in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Heading { level: u8, text: String },
    CodeBlock { language: Option<String> },
    Paragraph,
    ListItem,
    BlockQuote,
    /// Any other node; carries the front-end's own kind name.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownNode {
    pub kind: NodeKind,
    pub range: Option<SourceRange>,
    pub children: Vec<MarkdownNode>,
}

impl MarkdownNode {
    pub fn new(kind: NodeKind, range: Option<SourceRange>) -> Self {
        Self {
            kind,
            range,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<MarkdownNode>) -> Self {
        self.children = children;
        self
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &MarkdownNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}
