pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, load_or_default, ConfigError, DEFAULT_CONFIG_FILE};
pub use schema::{EngineConfig, StoreConfig, StoreKind, ValidationError, ValidationIssue};

use crate::engine::Engine;
use crate::error::DocError;
use crate::store::{DocumentStore, FileStore, InMemoryStore};
use std::sync::Arc;

impl EngineConfig {
    /// Build the configured store.
    pub fn build_store(&self) -> Result<Arc<dyn DocumentStore>, DocError> {
        let store: Arc<dyn DocumentStore> = match self.store.kind {
            StoreKind::File => Arc::new(FileStore::new(self.store.root_or_cwd())?),
            StoreKind::Memory => Arc::new(InMemoryStore::new()),
        };
        Ok(store)
    }

    pub fn build_engine(&self) -> Result<Engine, DocError> {
        Ok(Engine::with_options(self.build_store()?, self.index))
    }
}
