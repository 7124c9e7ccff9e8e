//! Operation-scoped index cache.
//!
//! Holds at most one [`AstIndex`] together with the exact text it was built
//! from. Lookups compare an xxh3 fingerprint first and then the full text, so
//! a different snapshot always forces a rebuild. A cache belongs to a single
//! [`Session`](crate::engine::Session) and is never shared between operations.

use crate::error::DocError;
use crate::index::{AstIndex, IndexOptions};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug)]
struct CachedIndex {
    fingerprint: u64,
    text: String,
    index: AstIndex,
}

impl CachedIndex {
    fn matches(&self, fingerprint: u64, text: &str) -> bool {
        self.fingerprint == fingerprint && self.text == text
    }
}

#[derive(Debug)]
pub struct IndexCache {
    options: IndexOptions,
    entry: Option<CachedIndex>,
    hits: usize,
    misses: usize,
}

impl IndexCache {
    pub fn new(options: IndexOptions) -> Self {
        Self {
            options,
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Index for `text`, reusing the cached one only if it was built from
    /// byte-identical text.
    pub fn index_for(&mut self, text: &str) -> Result<&AstIndex, DocError> {
        let fingerprint = xxh3_64(text.as_bytes());

        let entry = match self.entry.take() {
            Some(entry) if entry.matches(fingerprint, text) => {
                self.hits += 1;
                log::debug!("index cache hit ({fingerprint:016x})");
                entry
            }
            _ => {
                self.misses += 1;
                log::debug!("index cache miss ({fingerprint:016x}), rebuilding");
                CachedIndex {
                    fingerprint,
                    text: text.to_string(),
                    index: AstIndex::parse(text, self.options)?,
                }
            }
        };

        Ok(&self.entry.insert(entry).index)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
