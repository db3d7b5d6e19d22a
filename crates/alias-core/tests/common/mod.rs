//! Test doubles and common utilities for engine contract tests

#![allow(dead_code)]

use alias_core::error::{Error, Result};
use alias_core::{AliasPool, AssignmentDocument, AssignmentRecord, MemoryStateStore, StateStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A state store that counts calls and can be told to fail writes
#[derive(Clone, Default)]
pub struct MockStateStore {
    inner: MemoryStateStore,
    fail_writes: Arc<AtomicBool>,
    save_calls: Arc<AtomicUsize>,
    replace_calls: Arc<AtomicUsize>,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-existing (possibly legacy) state
    pub fn with_state(pool: AliasPool, document: AssignmentDocument) -> Self {
        Self {
            inner: MemoryStateStore::with_state(pool, document),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    /// What the store currently holds
    pub async fn document(&self) -> AssignmentDocument {
        self.inner.document().await
    }

    pub async fn pool(&self) -> AliasPool {
        self.inner.pool().await
    }
}

#[async_trait::async_trait]
impl StateStore for MockStateStore {
    async fn load_pool(&self) -> Result<AliasPool> {
        self.inner.load_pool().await
    }

    async fn load_assignments(&self) -> Result<AssignmentDocument> {
        self.inner.load_assignments().await
    }

    async fn save_assignments(&self, record: &AssignmentRecord) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::state_store("simulated write failure"));
        }
        self.inner.save_assignments(record).await
    }

    async fn replace_all(&self, pool: &AliasPool, record: &AssignmentRecord) -> Result<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::state_store("simulated write failure"));
        }
        self.inner.replace_all(pool, record).await
    }
}

/// Gmail-style policy used by all contract tests
pub fn gmail() -> alias_core::AddressPolicy {
    alias_core::AddressPolicy::default()
}
