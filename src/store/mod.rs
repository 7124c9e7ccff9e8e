//! Document persistence contract and the bundled backends.
//!
//! A store owns document text and revisions. `save` is an atomic
//! compare-and-swap on the revision: it either persists the new text and
//! returns a fresh revision, or fails with `RevisionConflict` carrying the
//! store's current revision. The diff producer is only invoked after the
//! revision check has passed.

mod file;
mod guard;
mod memory;

pub use file::FileStore;
pub use guard::RootGuard;
pub use memory::InMemoryStore;

use crate::error::DocError;
use crate::types::Revision;
use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64;

/// Lazily renders the patch for a successful write from `(old, new)` text.
pub type DiffProducer<'a> = Box<dyn FnOnce(&str, &str) -> String + Send + 'a>;

/// Text and revision of a document at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub revision: Revision,
}

/// Result of a successful compare-and-swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub revision: Revision,
    pub patch: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current text and revision; `NotFound` for unknown ids.
    async fn load(&self, id: &str) -> Result<Snapshot, DocError>;

    /// Persist `new_text` if the stored revision equals `expected`.
    ///
    /// Ids the store has never seen are created regardless of `expected`.
    async fn save(
        &self,
        id: &str,
        new_text: String,
        expected: &Revision,
        diff: DiffProducer<'_>,
    ) -> Result<Commit, DocError>;
}

/// Short hex fingerprint of document content, used inside revision tokens.
pub(crate) fn content_fingerprint(text: &str) -> String {
    format!("{:016x}", xxh3_64(text.as_bytes()))
}
