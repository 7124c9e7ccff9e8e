//! Selector resolution against an [`AstIndex`].
//!
//! Order, first match wins: the `*` introspection sentinel, a code block
//! tagged by `field` under the path, the path itself, the explicit byte range.
//! Anything else is a selector miss. Out-of-bounds ranges fail separately
//! with `RangeOutOfBounds`.

use crate::error::DocError;
use crate::index::{slugify, AstIndex};
use crate::types::{Selector, SlugPath, Span};

/// What a selector resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Serialized view of the whole index (`*` selector).
    Index(String),
    Span(Span),
}

/// Resolve a selector for reading; `*` yields the serialized index.
pub fn resolve(index: &AstIndex, selector: &Selector, text_len: usize) -> Result<Resolved, DocError> {
    if selector.path.is_introspect() {
        log::debug!("selector '*' resolved to index view ({} entries)", index.len());
        return Ok(Resolved::Index(index.to_json()?));
    }
    resolve_span(index, selector, text_len).map(Resolved::Span)
}

/// Resolve a selector to a concrete span. The introspection sentinel is not
/// an addressable region, so `*` only succeeds through its explicit range.
pub fn resolve_span(index: &AstIndex, selector: &Selector, text_len: usize) -> Result<Span, DocError> {
    if let Some(span) = tagged_block(index, selector) {
        return checked(span, text_len);
    }

    if let Some(span) = index.get(&selector.path) {
        log::debug!("selector {} resolved by path to {span}", selector.path);
        return checked(span, text_len);
    }

    if let Some(range) = selector.range {
        range.validate(text_len)?;
        log::debug!("selector {} resolved by explicit range {range}", selector.path);
        return Ok(range);
    }

    Err(DocError::SelectorMiss(selector.path.joined()))
}

/// `path + [code-<field>]`, when the selector carries a fenced-block tag.
fn tagged_block(index: &AstIndex, selector: &Selector) -> Option<Span> {
    let field = selector.field.as_deref()?;
    let tag = slugify(field);
    if tag.is_empty() {
        return None;
    }
    let path = selector.path.child(format!("code-{tag}"));
    let span = index.get(&path)?;
    log::debug!("selector {} resolved by field tag to {path}", selector.path);
    Some(span)
}

fn checked(span: Span, text_len: usize) -> Result<Span, DocError> {
    span.validate(text_len)?;
    Ok(span)
}

/// Index paths closest to `missing`, best first, for "did you mean" hints.
pub fn suggest_paths(index: &AstIndex, missing: &SlugPath, limit: usize) -> Vec<SlugPath> {
    const THRESHOLD: f64 = 0.7;

    let target = missing.joined();
    let mut scored: Vec<(f64, &SlugPath)> = index
        .paths()
        .map(|path| (strsim::jaro_winkler(&target, &path.joined()), path))
        .filter(|(score, _)| *score >= THRESHOLD)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, path)| path.clone())
        .collect()
}
