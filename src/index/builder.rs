use crate::index::slug::slugify;
use crate::index::{AstIndex, HeadingDeclaration, IndexOptions};
use crate::markdown::{MarkdownNode, NodeKind, SourceLocation, SourceRange};
use crate::types::{SlugPath, Span};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Maps 1-based `(line, column)` positions to absolute byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Byte offset of `location`, clamped to the text length.
    pub fn offset(&self, location: SourceLocation) -> usize {
        let line = location.line.saturating_sub(1);
        match self.line_starts.get(line) {
            Some(start) => (start + location.column.saturating_sub(1)).min(self.len),
            None => self.len,
        }
    }

    pub fn span(&self, range: SourceRange) -> Span {
        let start = self.offset(range.start);
        let end = self.offset(range.end).max(start);
        Span::new(start, end)
    }
}

/// An open heading whose section has not been closed yet.
#[derive(Debug, Clone)]
struct HeadingFrame {
    level: u8,
    start: usize,
    declaration: HeadingDeclaration,
}

/// Single pre-order walk over a [`MarkdownNode`] tree.
///
/// Open headings live on a plain stack alongside the current path; a heading
/// at level `L` closes every frame at level `>= L` before opening its own.
pub(crate) struct IndexBuilder {
    lines: LineIndex,
    text_len: usize,
    options: IndexOptions,
    path: SlugPath,
    frames: Vec<HeadingFrame>,
    spans: BTreeMap<SlugPath, Span>,
    headings: BTreeMap<SlugPath, HeadingDeclaration>,
    /// Slugs handed out so far, per parent path.
    siblings: HashMap<SlugPath, SiblingSlugs>,
}

impl IndexBuilder {
    pub(crate) fn new(text: &str, options: IndexOptions) -> Self {
        Self {
            lines: LineIndex::new(text),
            text_len: text.len(),
            options,
            path: SlugPath::root(),
            frames: Vec::new(),
            spans: BTreeMap::new(),
            headings: BTreeMap::new(),
            siblings: HashMap::new(),
        }
    }

    pub(crate) fn build(mut self, document: &MarkdownNode) -> AstIndex {
        self.visit(document);
        self.close_frames(0, self.text_len);
        AstIndex {
            spans: self.spans,
            headings: self.headings,
        }
    }

    fn visit(&mut self, node: &MarkdownNode) {
        match &node.kind {
            NodeKind::Heading { level, text } => self.visit_heading(node, *level, text),
            NodeKind::CodeBlock { language } => {
                let base = match language.as_deref().map(slugify) {
                    Some(lang) if !lang.is_empty() => format!("code-{lang}"),
                    _ => "code".to_string(),
                };
                self.record_leaf(node, &base);
            }
            NodeKind::Paragraph => {
                if self.options.paragraphs {
                    self.record_leaf(node, "para");
                }
                self.descend(node);
            }
            NodeKind::ListItem => {
                if self.options.list_items {
                    self.record_leaf(node, "li");
                }
                self.descend(node);
            }
            NodeKind::BlockQuote => {
                if self.options.block_quotes {
                    self.record_leaf(node, "quote");
                }
                self.descend(node);
            }
            NodeKind::Document | NodeKind::Other(_) => self.descend(node),
        }
    }

    fn descend(&mut self, node: &MarkdownNode) {
        for child in &node.children {
            self.visit(child);
        }
    }

    fn visit_heading(&mut self, node: &MarkdownNode, level: u8, text: &str) {
        let Some(range) = node.range else {
            return;
        };
        let bytes = self.lines.span(range);
        self.close_frames(level, bytes.start);

        let slug = self.unique_slug(slugify(text));
        self.path.push(slug);
        self.frames.push(HeadingFrame {
            level,
            start: bytes.start,
            declaration: HeadingDeclaration {
                source: range,
                bytes,
            },
        });
    }

    /// Record a node's own span under `path + [slug]` without opening a frame.
    fn record_leaf(&mut self, node: &MarkdownNode, base: &str) {
        let Some(range) = node.range else {
            return;
        };
        let span = self.lines.span(range);
        let slug = self.unique_slug(base.to_string());
        self.spans.insert(self.path.child(slug), span);
    }

    /// Close every open frame at `level` or deeper, ending its section at `end`.
    fn close_frames(&mut self, level: u8, end: usize) {
        while self.frames.last().is_some_and(|frame| frame.level >= level) {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            self.spans
                .insert(self.path.clone(), Span::new(frame.start, end.max(frame.start)));
            self.headings.insert(self.path.clone(), frame.declaration);
            self.path.pop();
        }
    }

    /// First occurrence under the current parent stays bare; later ones get
    /// `-1`, `-2`, ... in appearance order, skipping any suffixed form a
    /// sibling already holds.
    fn unique_slug(&mut self, base: String) -> String {
        self.siblings
            .entry(self.path.clone())
            .or_default()
            .claim(base)
    }
}

#[derive(Debug, Default)]
struct SiblingSlugs {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SiblingSlugs {
    fn claim(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let suffix = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{base}-{suffix}");
            *suffix += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
