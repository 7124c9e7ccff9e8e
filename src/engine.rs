//! Read and apply orchestration over a [`DocumentStore`].
//!
//! The engine holds no document state. Each call runs in a [`Session`] whose
//! index cache lives only as long as the session, so a read followed by an
//! apply on the same session can share one parse when the text is unchanged.
//!
//! Apply order: load, index, resolve, splice, commit. The patch is rendered
//! by the store through a deferred producer only after its revision check
//! passes, so a writer that loses the race never pays for the diff. Failures
//! before the commit leave the store untouched; nothing is retried.

use crate::cache::IndexCache;
use crate::diff;
use crate::edit::{check_payload, SpanEdit};
use crate::error::DocError;
use crate::index::{AstIndex, IndexOptions};
use crate::resolve::{resolve, resolve_span, Resolved};
use crate::store::{DiffProducer, DocumentStore};
use crate::types::{ChangeSummary, DiffEnvelope, DocEdit, Revision, Selector, SliceResult, Span};
use std::sync::Arc;

#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    options: IndexOptions,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, IndexOptions::none())
    }

    pub fn with_options(store: Arc<dyn DocumentStore>, options: IndexOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Start an operation scope with its own index cache.
    pub fn session(&self) -> Session<'_> {
        Session {
            engine: self,
            cache: IndexCache::new(self.options),
        }
    }

    /// Text for `selector` plus the revision to pass to a later [`apply`].
    ///
    /// [`apply`]: Engine::apply
    pub async fn read(&self, id: &str, selector: &Selector) -> Result<SliceResult, DocError> {
        self.session().read(id, selector).await
    }

    /// Apply `edit` if the document is still at `expected`.
    pub async fn apply(
        &self,
        id: &str,
        edit: &DocEdit,
        expected: &Revision,
    ) -> Result<DiffEnvelope, DocError> {
        self.session().apply(id, edit, expected).await
    }

    /// Index of the current stored text.
    pub async fn index(&self, id: &str) -> Result<AstIndex, DocError> {
        let snapshot = self.store.load(id).await?;
        AstIndex::parse(&snapshot.text, self.options)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// One logical operation (typically a read followed by an apply).
///
/// Never share a session between unrelated operations: its cache is only
/// meaningful for the snapshots this operation has loaded.
pub struct Session<'e> {
    engine: &'e Engine,
    cache: IndexCache,
}

impl Session<'_> {
    pub async fn read(&mut self, id: &str, selector: &Selector) -> Result<SliceResult, DocError> {
        let snapshot = self.engine.store.load(id).await?;
        let index = self.cache.index_for(&snapshot.text)?;

        match resolve(index, selector, snapshot.text.len())? {
            Resolved::Index(json) => Ok(SliceResult {
                text: json,
                span: Span::EMPTY,
                revision: snapshot.revision,
            }),
            Resolved::Span(span) => Ok(SliceResult {
                text: span.slice(&snapshot.text)?.to_string(),
                span,
                revision: snapshot.revision,
            }),
        }
    }

    pub async fn apply(
        &mut self,
        id: &str,
        edit: &DocEdit,
        expected: &Revision,
    ) -> Result<DiffEnvelope, DocError> {
        check_payload(edit.op, edit.text.as_deref())?;

        // Always the stored text, never a caller-held copy.
        let snapshot = self.engine.store.load(id).await?;
        let index = self.cache.index_for(&snapshot.text)?;
        let span = resolve_span(index, &edit.selector, snapshot.text.len())?;

        let old_slice = span.slice(&snapshot.text)?.to_string();
        let updated = SpanEdit::new(edit.op, span, edit.text.as_deref()).apply_to(&snapshot.text)?;

        if &snapshot.revision != expected {
            log::debug!(
                "{id}: expected revision {expected} but loaded {}, leaving the decision to the store",
                snapshot.revision
            );
        }

        let original = snapshot.text;
        let committed_text = updated.clone();
        let producer: DiffProducer<'static> =
            Box::new(move |_: &str, _: &str| diff::unified(&original, &updated));

        let commit = match self
            .engine
            .store
            .save(id, committed_text, expected, producer)
            .await
        {
            Ok(commit) => commit,
            Err(err) => {
                if let Some(current) = err.current_revision() {
                    log::warn!("{id}: revision conflict, expected {expected}, store at {current}");
                }
                return Err(err);
            }
        };
        log::debug!("{id}: {} at {span} committed as {}", edit.op, commit.revision);

        Ok(DiffEnvelope {
            doc_id: id.to_string(),
            base_revision: expected.clone(),
            new_revision: commit.revision,
            changes: vec![ChangeSummary {
                selector: edit.selector.clone(),
                action: edit.op,
                old_text: Some(old_slice),
                new_text: edit.text.clone(),
            }],
            patch: commit.patch,
        })
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Commit, InMemoryStore, Snapshot};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    async fn engine_with(text: &str) -> (Engine, Arc<InMemoryStore>, Revision) {
        let store = Arc::new(InMemoryStore::new());
        let revision = store.insert("doc", text).await;
        (Engine::new(store.clone()), store, revision)
    }

    #[tokio::test]
    async fn read_slice_by_path() {
        let (engine, _, revision) = engine_with("# Title\n\nHello").await;
        let slice = engine.read("doc", &Selector::path(["title"])).await.unwrap();
        assert_eq!(slice.text, "# Title\n\nHello");
        assert_eq!(slice.revision, revision);
    }

    #[tokio::test]
    async fn read_introspection() {
        let (engine, _, _) = engine_with("# A\n## B\n").await;
        let slice = engine.read("doc", &Selector::introspect()).await.unwrap();
        assert_eq!(slice.span, Span::EMPTY);
        let parsed: serde_json::Value = serde_json::from_str(&slice.text).unwrap();
        assert!(parsed.get("a/b").is_some());
    }

    #[tokio::test]
    async fn read_unknown_document() {
        let (engine, _, _) = engine_with("x").await;
        assert!(matches!(
            engine.read("other", &Selector::path(["a"])).await,
            Err(DocError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn session_shares_index_between_read_and_apply() {
        let (engine, store, _) = engine_with("# A\n\nbody\n").await;
        let mut session = engine.session();
        let slice = session.read("doc", &Selector::path(["a"])).await.unwrap();
        session
            .apply(
                "doc",
                &DocEdit::replace(Selector::path(["a"]), "# A\n\nnew\n"),
                &slice.revision,
            )
            .await
            .unwrap();
        assert_eq!(session.cache().misses(), 1);
        assert_eq!(session.cache().hits(), 1);
        assert_eq!(store.load("doc").await.unwrap().text, "# A\n\nnew\n");
    }

    #[tokio::test]
    async fn invalid_edit_fails_before_store_access() {
        let (engine, store, revision) = engine_with("Hello").await;
        let edit = DocEdit {
            op: crate::types::EditOp::Delete,
            selector: Selector::range(0, 5),
            text: Some("x".to_string()),
        };
        assert!(matches!(
            engine.apply("doc", &edit, &revision).await,
            Err(DocError::InvalidEdit(_))
        ));
        assert_eq!(store.load("doc").await.unwrap().revision, revision);
    }

    /// Records calls and hands the diff producer a blank `old` text.
    struct RecordingStore {
        text: Mutex<String>,
        loads: AtomicUsize,
        saves: AtomicUsize,
        last_patch: Mutex<Option<String>>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn load(&self, _id: &str) -> Result<Snapshot, DocError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let text = self.text.lock().unwrap().clone();
            Ok(Snapshot {
                text,
                revision: Revision::new("r1"),
            })
        }

        async fn save(
            &self,
            _id: &str,
            new_text: String,
            _expected: &Revision,
            diff: DiffProducer<'_>,
        ) -> Result<Commit, DocError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let patch = diff("", &new_text);
            *self.last_patch.lock().unwrap() = Some(patch.clone());
            *self.text.lock().unwrap() = new_text;
            Ok(Commit {
                revision: Revision::new("r2"),
                patch,
            })
        }
    }

    #[tokio::test]
    async fn patch_is_computed_from_loaded_text() {
        let store = Arc::new(RecordingStore {
            text: Mutex::new("initial".to_string()),
            loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            last_patch: Mutex::new(None),
        });
        let engine = Engine::new(store.clone());
        let edit = DocEdit::insert(Selector::introspect().with_range(0, 0), "X");
        let envelope = engine.apply("doc", &edit, &Revision::new("r1")).await.unwrap();

        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(*store.text.lock().unwrap(), "Xinitial");
        assert_eq!(envelope.patch, "--- old\n+++ new\n-initial\n+Xinitial\n");
        assert_eq!(store.last_patch.lock().unwrap().as_deref(), Some(envelope.patch.as_str()));
        assert_eq!(envelope.new_revision, Revision::new("r2"));
    }
}
