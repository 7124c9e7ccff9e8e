//! Thread-local parser pooling.
//!
//! Keeps one [`MarkdownParser`] per thread so repeated reads and applies do
//! not rebuild the tree-sitter parser. Parsing never awaits, so the borrow
//! never spans a suspension point.

use crate::error::DocError;
use crate::markdown::MarkdownParser;
use std::cell::RefCell;

thread_local! {
    static MARKDOWN_PARSER: RefCell<Option<MarkdownParser>> = const { RefCell::new(None) };
}

/// Execute `f` with the pooled parser for this thread.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), mdpath::DocError> {
/// use mdpath::pool::with_parser;
///
/// let _doc = with_parser(|parser| parser.parse_document("# Title\n"))??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, DocError>
where
    F: FnOnce(&mut MarkdownParser) -> R,
{
    MARKDOWN_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(MarkdownParser::new()?);
        }
        match slot.as_mut() {
            Some(parser) => Ok(f(parser)),
            None => Err(DocError::ParseFailure(
                "markdown parser unavailable".to_string(),
            )),
        }
    })
}
