// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Lets the engine run without touching the filesystem: unit tests, demos,
// and throwaway console sessions. All state is lost when the store is dropped.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::assignment::{AssignmentDocument, AssignmentRecord};
use crate::pool::AliasPool;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// Stores the pool and the raw assignment document behind a `RwLock`.
/// Clones share the same state, so a test can keep a handle and inspect what
/// the engine persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    pool: AliasPool,
    document: AssignmentDocument,
    writes: usize,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a pool and a raw document
    ///
    /// The document may contain legacy single-alias values.
    pub fn with_state(pool: AliasPool, document: AssignmentDocument) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryState {
                pool,
                document,
                writes: 0,
            })),
        }
    }

    /// Currently stored pool
    pub async fn pool(&self) -> AliasPool {
        self.inner.read().await.pool.clone()
    }

    /// Currently stored assignment document
    pub async fn document(&self) -> AssignmentDocument {
        self.inner.read().await.document.clone()
    }

    /// Number of save operations performed so far
    pub async fn write_count(&self) -> usize {
        self.inner.read().await.writes
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_pool(&self) -> Result<AliasPool, Error> {
        Ok(self.inner.read().await.pool.clone())
    }

    async fn load_assignments(&self) -> Result<AssignmentDocument, Error> {
        Ok(self.inner.read().await.document.clone())
    }

    async fn save_assignments(&self, record: &AssignmentRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.document = record.to_document();
        guard.writes += 1;
        Ok(())
    }

    async fn replace_all(&self, pool: &AliasPool, record: &AssignmentRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.pool = pool.clone();
        guard.document = record.to_document();
        guard.writes += 1;
        Ok(())
    }
}
