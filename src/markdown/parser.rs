use crate::error::DocError;
use crate::markdown::node::{MarkdownNode, NodeKind, SourceLocation, SourceRange};
use tree_sitter::{Node, Parser, Point, Tree};

/// Tree-sitter parser wrapper for Markdown (block grammar).
pub struct MarkdownParser {
    parser: Parser,
}

impl MarkdownParser {
    pub fn new() -> Result<Self, DocError> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_md::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| DocError::ParseFailure(format!("failed to set markdown language: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse source text into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, DocError> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| DocError::ParseFailure("parser produced no tree".to_string()))
    }

    pub fn parse_with_source<'a>(&mut self, source: &'a str) -> Result<ParsedSource<'a>, DocError> {
        let tree = self.parse(source)?;
        Ok(ParsedSource { source, tree })
    }

    /// Parse straight into the front-end neutral tree the indexer consumes.
    pub fn parse_document(&mut self, source: &str) -> Result<MarkdownNode, DocError> {
        Ok(self.parse_with_source(source)?.to_markdown())
    }
}

/// A parsed Markdown source with its tree-sitter tree.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
}

impl<'a> ParsedSource<'a> {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    /// Convert the concrete syntax tree into a [`MarkdownNode`] tree.
    pub fn to_markdown(&self) -> MarkdownNode {
        let mut root = self.convert(self.root_node());
        root.kind = NodeKind::Document;
        root
    }

    fn convert(&self, node: Node<'_>) -> MarkdownNode {
        let range = Some(source_range(node));
        match node.kind() {
            "atx_heading" => {
                let level = atx_level(node).unwrap_or(1);
                let raw = node
                    .child_by_field_name("heading_content")
                    .map(|content| self.node_text(content))
                    .unwrap_or("");
                let text = plain_text(strip_closing_sequence(raw));
                MarkdownNode::new(NodeKind::Heading { level, text }, range)
            }
            "setext_heading" => {
                let level = setext_level(node);
                let raw = node
                    .child_by_field_name("heading_content")
                    .map(|content| self.node_text(content))
                    .unwrap_or("");
                let text = plain_text(raw.trim());
                MarkdownNode::new(NodeKind::Heading { level, text }, range)
            }
            "fenced_code_block" => {
                let language = self.fence_language(node);
                MarkdownNode::new(NodeKind::CodeBlock { language }, range)
            }
            "indented_code_block" => MarkdownNode::new(NodeKind::CodeBlock { language: None }, range),
            "paragraph" => MarkdownNode::new(NodeKind::Paragraph, range),
            "list_item" => MarkdownNode::new(NodeKind::ListItem, range)
                .with_children(self.convert_children(node)),
            "block_quote" => MarkdownNode::new(NodeKind::BlockQuote, range)
                .with_children(self.convert_children(node)),
            other => MarkdownNode::new(NodeKind::Other(other.to_string()), range)
                .with_children(self.convert_children(node)),
        }
    }

    fn convert_children(&self, node: Node<'_>) -> Vec<MarkdownNode> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .map(|child| self.convert(child))
            .collect()
    }

    fn fence_language(&self, node: Node<'_>) -> Option<String> {
        let mut cursor = node.walk();
        let info = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "info_string")?;

        let mut info_cursor = info.walk();
        let declared = info
            .named_children(&mut info_cursor)
            .find(|child| child.kind() == "language")
            .map(|language| self.node_text(language))
            .unwrap_or_else(|| self.node_text(info));

        declared
            .split_whitespace()
            .next()
            .filter(|word| !word.is_empty())
            .map(str::to_string)
    }
}

fn location(point: Point) -> SourceLocation {
    SourceLocation::new(point.row + 1, point.column + 1)
}

fn source_range(node: Node<'_>) -> SourceRange {
    SourceRange::new(location(node.start_position()), location(node.end_position()))
}

fn atx_level(node: Node<'_>) -> Option<u8> {
    let mut cursor = node.walk();
    let marker = node
        .children(&mut cursor)
        .find(|child| child.kind().starts_with("atx_h") && child.kind().ends_with("_marker"))?;
    marker
        .kind()
        .strip_prefix("atx_h")
        .and_then(|rest| rest.strip_suffix("_marker"))
        .and_then(|digit| digit.parse().ok())
}

fn setext_level(node: Node<'_>) -> u8 {
    let mut cursor = node.walk();
    let is_h2 = node
        .children(&mut cursor)
        .any(|child| child.kind() == "setext_h2_underline");
    if is_h2 {
        2
    } else {
        1
    }
}

/// Drop an ATX closing sequence (`## Title ##`). The run of `#` only counts
/// as a closer when it is the whole content or preceded by whitespace.
fn strip_closing_sequence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without = trimmed.trim_end_matches('#');
    if without.len() == trimmed.len() {
        return trimmed;
    }
    if without.is_empty() || without.ends_with(char::is_whitespace) {
        without.trim_end()
    } else {
        trimmed
    }
}

/// Reduce inline markup to the text a reader sees: link destinations, raw
/// HTML tags, code ticks, emphasis delimiters and brackets are removed,
/// escapes are resolved.
pub(crate) fn plain_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '*' | '_' if is_emphasis_delimiter(c, prev, next) => {}
            ']' if chars.peek() == Some(&'(') => {
                let mut depth = 0usize;
                for next in chars.by_ref() {
                    match next {
                        '(' => depth += 1,
                        ')' => {
                            depth = depth.saturating_sub(1);
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            '<' if chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == '/' || *next == '!') =>
            {
                for next in chars.by_ref() {
                    if next == '>' {
                        break;
                    }
                }
            }
            '[' | ']' | '`' => {}
            other => out.push(other),
        }
        prev = Some(c);
    }

    out.trim().to_string()
}

/// A `*` or `_` delimits emphasis unless it stands alone between spaces;
/// `_` inside a word (`snake_case`) is literal.
fn is_emphasis_delimiter(c: char, prev: Option<char>, next: Option<char>) -> bool {
    let blank = |side: Option<char>| side.is_none_or(char::is_whitespace);
    if blank(prev) && blank(next) {
        return false;
    }
    let word = |side: Option<char>| side.is_some_and(char::is_alphanumeric);
    !(c == '_' && word(prev) && word(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(node: &MarkdownNode) -> Vec<(u8, String)> {
        node.descendants()
            .filter_map(|n| match &n.kind {
                NodeKind::Heading { level, text } => Some((*level, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_atx_and_setext_headings() {
        let mut parser = MarkdownParser::new().unwrap();
        let doc = parser
            .parse_document("# One\n\nTwo\n---\n\n### Three ###\n")
            .unwrap();
        assert_eq!(doc.kind, NodeKind::Document);
        assert_eq!(
            headings(&doc),
            vec![
                (1, "One".to_string()),
                (2, "Two".to_string()),
                (3, "Three".to_string())
            ]
        );
    }

    #[test]
    fn heading_positions_are_one_based() {
        let mut parser = MarkdownParser::new().unwrap();
        let doc = parser.parse_document("intro\n\n## Sub\n").unwrap();
        let heading = doc
            .descendants()
            .find(|n| matches!(n.kind, NodeKind::Heading { .. }))
            .unwrap();
        let range = heading.range.unwrap();
        assert_eq!(range.start, SourceLocation::new(3, 1));
    }

    #[test]
    fn fenced_code_language() {
        let mut parser = MarkdownParser::new().unwrap();
        let doc = parser
            .parse_document("```rust ignore\nfn main() {}\n```\n\n```\nplain\n```\n")
            .unwrap();
        let languages: Vec<Option<String>> = doc
            .descendants()
            .filter_map(|n| match &n.kind {
                NodeKind::CodeBlock { language } => Some(language.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(languages, vec![Some("rust".to_string()), None]);
    }

    #[test]
    fn closing_sequence_rules() {
        assert_eq!(strip_closing_sequence("Title ##"), "Title");
        assert_eq!(strip_closing_sequence("C#"), "C#");
        assert_eq!(strip_closing_sequence("##"), "");
    }

    #[test]
    fn plain_text_strips_inline_markup() {
        assert_eq!(plain_text("[Install](https://x.y/(a)) guide"), "Install guide");
        assert_eq!(plain_text("Use `cargo` <em>now</em>"), "Use cargo now");
        assert_eq!(plain_text("a < b"), "a < b");
        assert_eq!(plain_text(r"\*literal\*"), "*literal*");
        assert_eq!(plain_text("**Bold** and _soft_ intro"), "Bold and soft intro");
        assert_eq!(plain_text("snake_case * star"), "snake_case * star");
    }
}
