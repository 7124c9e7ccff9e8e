//! Path → byte-span index over a Markdown snapshot.
//!
//! Headings open sections that run until the next heading of the same or a
//! shallower level; fenced code blocks (and optionally paragraphs, list items
//! and block quotes) are recorded as leaves under the enclosing section.
//! An index is only valid for the exact text it was built from.

mod builder;
pub mod slug;

pub use builder::LineIndex;
pub use slug::slugify;

use crate::error::DocError;
use crate::markdown::{MarkdownNode, SourceRange};
use crate::pool::with_parser;
use crate::types::{SlugPath, Span};
use builder::IndexBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Extra node kinds to record besides headings and code blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    pub paragraphs: bool,
    pub list_items: bool,
    pub block_quotes: bool,
}

impl IndexOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            paragraphs: true,
            list_items: true,
            block_quotes: true,
        }
    }

    pub fn with_paragraphs(mut self) -> Self {
        self.paragraphs = true;
        self
    }

    pub fn with_list_items(mut self) -> Self {
        self.list_items = true;
        self
    }

    pub fn with_block_quotes(mut self) -> Self {
        self.block_quotes = true;
        self
    }
}

/// Source and byte range of a heading line itself, as opposed to the
/// section it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HeadingDeclaration {
    pub source: SourceRange,
    pub bytes: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AstIndex {
    spans: BTreeMap<SlugPath, Span>,
    headings: BTreeMap<SlugPath, HeadingDeclaration>,
}

impl AstIndex {
    /// Build an index from an already parsed tree.
    pub fn build(document: &MarkdownNode, text: &str, options: IndexOptions) -> Self {
        IndexBuilder::new(text, options).build(document)
    }

    /// Parse `text` with the pooled Markdown parser and index it.
    pub fn parse(text: &str, options: IndexOptions) -> Result<Self, DocError> {
        let document = with_parser(|parser| parser.parse_document(text))??;
        Ok(Self::build(&document, text, options))
    }

    pub fn get(&self, path: &SlugPath) -> Option<Span> {
        self.spans.get(path).copied()
    }

    pub fn contains(&self, path: &SlugPath) -> bool {
        self.spans.contains_key(path)
    }

    pub fn heading(&self, path: &SlugPath) -> Option<&HeadingDeclaration> {
        self.headings.get(path)
    }

    /// Source range of the heading line that opens the section at `path`.
    pub fn heading_range(&self, path: &SlugPath) -> Option<SourceRange> {
        self.headings.get(path).map(|heading| heading.source)
    }

    /// Text of a section after its heading line, up to the section end.
    pub fn section_body<'a>(&self, path: &SlugPath, text: &'a str) -> Option<&'a str> {
        let heading = self.headings.get(path)?;
        let section = self.spans.get(path)?;
        let body = Span::new(heading.bytes.end.min(section.end), section.end);
        body.slice(text).ok()
    }

    /// True when the section exists and holds nothing but whitespace.
    pub fn is_section_body_empty(&self, path: &SlugPath, text: &str) -> bool {
        self.section_body(path, text)
            .is_some_and(|body| body.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlugPath, &Span)> {
        self.spans.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &SlugPath> {
        self.spans.keys()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Flat JSON object of `"a/b" -> {start, end}`, keys in sorted order.
    pub fn to_json(&self) -> Result<String, DocError> {
        let flat: BTreeMap<String, Span> = self
            .spans
            .iter()
            .map(|(path, span)| (path.joined(), *span))
            .collect();
        Ok(serde_json::to_string(&flat)?)
    }
}
