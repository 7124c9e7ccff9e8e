use crate::error::DocError;
use crate::types::{EditOp, Span};

/// The splice primitive: an operation bound to a span of one text snapshot.
///
/// Spans must come from resolving against the text passed to [`apply_to`];
/// a span resolved against any other snapshot is meaningless.
///
/// [`apply_to`]: SpanEdit::apply_to
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "SpanEdit does nothing until apply_to() is called"]
pub struct SpanEdit<'a> {
    pub op: EditOp,
    pub span: Span,
    pub text: Option<&'a str>,
}

/// Check that the operation and its text payload agree: delete carries no
/// text, insert and replace require it.
pub fn check_payload(op: EditOp, text: Option<&str>) -> Result<(), DocError> {
    match (op, text) {
        (EditOp::Delete, Some(_)) => Err(DocError::InvalidEdit(
            "delete must not carry replacement text".to_string(),
        )),
        (EditOp::Insert | EditOp::Replace, None) => Err(DocError::InvalidEdit(format!(
            "{op} requires replacement text"
        ))),
        _ => Ok(()),
    }
}

impl<'a> SpanEdit<'a> {
    pub fn new(op: EditOp, span: Span, text: Option<&'a str>) -> Self {
        Self { op, span, text }
    }

    /// Validate payload and span against `content`, returning the spanned text.
    fn validate<'c>(&self, content: &'c str) -> Result<&'c str, DocError> {
        check_payload(self.op, self.text)?;
        self.span.slice(content)
    }

    /// Produce the full new text.
    ///
    /// - delete: prefix + suffix
    /// - insert: prefix + text + spanned bytes + suffix (content is kept)
    /// - replace: prefix + text + suffix
    pub fn apply_to(&self, content: &str) -> Result<String, DocError> {
        let current = self.validate(content)?;
        let text = self.text.unwrap_or("");

        let prefix = &content[..self.span.start];
        let suffix = &content[self.span.end..];

        let mut out = String::with_capacity(prefix.len() + text.len() + current.len() + suffix.len());
        out.push_str(prefix);
        match self.op {
            EditOp::Delete => {}
            EditOp::Insert => {
                out.push_str(text);
                out.push_str(current);
            }
            EditOp::Replace => out.push_str(text),
        }
        out.push_str(suffix);
        Ok(out)
    }
}
