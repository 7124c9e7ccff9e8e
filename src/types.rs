//! Core value types shared by the indexer, resolver, edit applier and engine.

use crate::error::DocError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Reserved path segment that asks for the whole index instead of a slice.
pub const INTROSPECT: &str = "*";

/// Ordered sequence of slugs naming a section hierarchy.
///
/// The empty path is the document root; `["*"]` is the introspection sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlugPath(Vec<String>);

impl SlugPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn introspect() -> Self {
        Self(vec![INTROSPECT.to_string()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_introspect(&self) -> bool {
        self.0.len() == 1 && self.0[0] == INTROSPECT
    }

    /// New path with `slug` appended.
    pub fn child(&self, slug: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(slug.into());
        Self(segments)
    }

    pub fn push(&mut self, slug: impl Into<String>) {
        self.0.push(slug.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments joined with `/`, used in error messages and introspection keys.
    pub fn joined(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for SlugPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<S: Into<String>> FromIterator<S> for SlugPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String> + Clone> From<&[S]> for SlugPath {
    fn from(segments: &[S]) -> Self {
        segments.iter().cloned().collect()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for SlugPath {
    fn from(segments: [S; N]) -> Self {
        segments.into_iter().collect()
    }
}

/// Half-open byte range `[start, end)` into one specific text snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const EMPTY: Span = Span { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Build a span and check it against a text of `len` bytes.
    pub fn checked(start: usize, end: usize, len: usize) -> Result<Self, DocError> {
        let span = Self { start, end };
        span.validate(len)?;
        Ok(span)
    }

    /// Fails with `RangeOutOfBounds` unless `start <= end <= len`.
    pub fn validate(&self, len: usize) -> Result<(), DocError> {
        if self.start > self.end || self.end > len {
            return Err(DocError::RangeOutOfBounds {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Borrow the spanned bytes of `text` as a string slice.
    ///
    /// Out-of-bounds spans and spans that split a UTF-8 sequence both fail
    /// with `RangeOutOfBounds`.
    pub fn slice<'a>(&self, text: &'a str) -> Result<&'a str, DocError> {
        self.validate(text.len())?;
        text.get(self.range()).ok_or(DocError::RangeOutOfBounds {
            start: self.start,
            end: self.end,
            len: text.len(),
        })
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Opaque token naming one persisted version of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Revision {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Address of a document region: a semantic path, an optional fenced-block
/// tag, and an optional explicit byte range used when the path misses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub path: SlugPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Span>,
}

impl Selector {
    pub fn path(path: impl Into<SlugPath>) -> Self {
        Self {
            path: path.into(),
            field: None,
            range: None,
        }
    }

    /// Selector that only carries an explicit byte range.
    pub fn range(start: usize, end: usize) -> Self {
        Self {
            path: SlugPath::root(),
            field: None,
            range: Some(Span::new(start, end)),
        }
    }

    pub fn introspect() -> Self {
        Self::path(SlugPath::introspect())
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.range = Some(Span::new(start, end));
        self
    }
}

/// Parses `a/b/c`, `a/b#field`, `a/b@10..20` or `@10..20`; `*` introspects.
impl FromStr for Selector {
    type Err = DocError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (rest, range) = match input.rsplit_once('@') {
            Some((rest, range)) => (rest, Some(parse_range(range)?)),
            None => (input, None),
        };
        let (path, field) = match rest.split_once('#') {
            Some((path, field)) if !field.is_empty() => (path, Some(field.to_string())),
            Some((path, _)) => (path, None),
            None => (rest, None),
        };
        let path = path
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();
        Ok(Selector { path, field, range })
    }
}

fn parse_range(input: &str) -> Result<Span, DocError> {
    let invalid = || DocError::InvalidSelector(format!("malformed byte range: {input:?}"));
    let (start, end) = input.split_once("..").ok_or_else(invalid)?;
    let start = start.trim().parse::<usize>().map_err(|_| invalid())?;
    let end = end.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok(Span::new(start, end))
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(field) = &self.field {
            write!(f, "#{field}")?;
        }
        if let Some(range) = &self.range {
            write!(f, "@{range}")?;
        }
        Ok(())
    }
}

/// Edit operations supported by the applier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOp {
    Insert,
    Replace,
    Delete,
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EditOp::Insert => "insert",
            EditOp::Replace => "replace",
            EditOp::Delete => "delete",
        })
    }
}

impl FromStr for EditOp {
    type Err = DocError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "insert" => Ok(EditOp::Insert),
            "replace" => Ok(EditOp::Replace),
            "delete" => Ok(EditOp::Delete),
            other => Err(DocError::InvalidEdit(format!("unknown operation: {other}"))),
        }
    }
}

/// A single edit request against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "DocEdit does nothing until passed to Engine::apply"]
pub struct DocEdit {
    pub op: EditOp,
    pub selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocEdit {
    pub fn insert(selector: Selector, text: impl Into<String>) -> Self {
        Self {
            op: EditOp::Insert,
            selector,
            text: Some(text.into()),
        }
    }

    pub fn replace(selector: Selector, text: impl Into<String>) -> Self {
        Self {
            op: EditOp::Replace,
            selector,
            text: Some(text.into()),
        }
    }

    pub fn delete(selector: Selector) -> Self {
        Self {
            op: EditOp::Delete,
            selector,
            text: None,
        }
    }
}

/// Text of a resolved selector, its span, and the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceResult {
    pub text: String,
    pub span: Span,
    pub revision: Revision,
}

/// One change contained in a [`DiffEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub selector: Selector,
    pub action: EditOp,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
}

/// Outcome of a committed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEnvelope {
    pub doc_id: String,
    pub base_revision: Revision,
    pub new_revision: Revision,
    pub changes: Vec<ChangeSummary>,
    pub patch: String,
}
