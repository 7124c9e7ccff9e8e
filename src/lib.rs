//! mdpath: address and edit Markdown sections by semantic path
//!
//! Sections are named by slug paths derived from the heading hierarchy
//! (`["install", "linux"]`) instead of raw byte offsets, and every write is
//! guarded by optimistic concurrency on a store-issued revision.
//!
//! # Architecture
//!
//! Every edit compiles down to one primitive, [`SpanEdit`]: an operation bound
//! to a byte span of a single text snapshot. Intelligence lives in span
//! acquisition ([`AstIndex`] + [`resolve()`]), not in the splice.
//!
//! - [`markdown`] parses text with tree-sitter-md into source-positioned nodes
//! - [`index`] walks those nodes once and derives the path → span map
//! - [`resolve`](mod@resolve) turns a [`Selector`] into a span (or the whole index for `*`)
//! - [`edit`] splices replacement text at a span
//! - [`diff`] renders a minimal line patch
//! - [`engine`] ties them together against a pluggable [`DocumentStore`]
//!
//! # Concurrency
//!
//! - The engine holds no document state and never retries
//! - Stores compare-and-swap on revision; a stale revision is a conflict
//! - The patch is rendered only after the store accepts the write
//!
//! # Example
//!
//! ```no_run
//! use mdpath::{DocEdit, Engine, InMemoryStore, Selector};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), mdpath::DocError> {
//! let store = Arc::new(InMemoryStore::new());
//! store.insert("readme", "# Intro\n\nOld text.\n").await;
//!
//! let engine = Engine::new(store);
//! let slice = engine.read("readme", &Selector::path(["intro"])).await?;
//! let edit = DocEdit::replace(Selector::path(["intro"]), "# Intro\n\nNew text.\n");
//! let envelope = engine.apply("readme", &edit, &slice.revision).await?;
//! println!("{}", envelope.patch);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod diff;
pub mod edit;
pub mod engine;
pub mod error;
pub mod index;
pub mod markdown;
pub mod pool;
pub mod resolve;
pub mod store;
pub mod types;

// Re-exports
pub use config::{load_from_path, load_from_str, load_or_default, ConfigError, EngineConfig};
pub use edit::SpanEdit;
pub use engine::{Engine, Session};
pub use error::DocError;
pub use index::{slugify, AstIndex, IndexOptions};
pub use resolve::{resolve, resolve_span, suggest_paths, Resolved};
pub use store::{Commit, DiffProducer, DocumentStore, FileStore, InMemoryStore, Snapshot};
pub use types::{
    ChangeSummary, DiffEnvelope, DocEdit, EditOp, Revision, Selector, SliceResult, SlugPath, Span,
};
