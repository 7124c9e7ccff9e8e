use crate::error::DocError;
use crate::store::{content_fingerprint, Commit, DiffProducer, DocumentStore, Snapshot};
use crate::types::Revision;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    documents: HashMap<String, Snapshot>,
    generation: u64,
}

/// Process-local store. Revisions are `<generation>-<content hash>` and are
/// unique per commit, even when the text does not change.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a document without a revision check.
    pub async fn insert(&self, id: impl Into<String>, text: impl Into<String>) -> Revision {
        let mut state = self.state.lock().await;
        let text = text.into();
        let revision = next_revision(&mut state, &text);
        state.documents.insert(
            id.into(),
            Snapshot {
                text,
                revision: revision.clone(),
            },
        );
        revision
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.documents.is_empty()
    }
}

fn next_revision(state: &mut State, text: &str) -> Revision {
    state.generation += 1;
    Revision::new(format!("{}-{}", state.generation, content_fingerprint(text)))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn load(&self, id: &str) -> Result<Snapshot, DocError> {
        let state = self.state.lock().await;
        state
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| DocError::NotFound { id: id.to_string() })
    }

    async fn save(
        &self,
        id: &str,
        new_text: String,
        expected: &Revision,
        diff: DiffProducer<'_>,
    ) -> Result<Commit, DocError> {
        let mut state = self.state.lock().await;

        let old_text = match state.documents.get(id) {
            Some(current) if &current.revision != expected => {
                return Err(DocError::RevisionConflict {
                    current: current.revision.clone(),
                });
            }
            Some(current) => current.text.clone(),
            None => String::new(),
        };

        let patch = diff(&old_text, &new_text);
        let revision = next_revision(&mut state, &new_text);
        state.documents.insert(
            id.to_string(),
            Snapshot {
                text: new_text,
                revision: revision.clone(),
            },
        );
        log::debug!("committed {id} at revision {revision}");

        Ok(Commit { revision, patch })
    }
}
