//! Core alias engine
//!
//! The AliasEngine is responsible for:
//! - Regenerating the alias pool from a seed address
//! - Answering which aliases a service holds
//! - Allocating the next unused alias per service
//! - Persisting state after every mutation
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   generate / register / assign   ┌──────────────┐
//! │   Adapter    │ ───────────────────────────────▶ │ AliasEngine  │
//! └──────────────┘                                  └──────────────┘
//!                                                          │
//!                         ┌────────────────────────────────┼───────────────┐
//!                         ▼                                ▼               ▼
//!                  ┌─────────────┐              ┌──────────────────┐ ┌─────────────┐
//!                  │  AliasPool  │              │ AssignmentRecord │ │ StateStore  │
//!                  │  (order)    │              │ (per service)    │ │ (persist)   │
//!                  └─────────────┘              └──────────────────┘ └─────────────┘
//! ```
//!
//! ## Service Lifecycle
//!
//! A service starts Unbound, becomes Bound with its first alias and only ever
//! grows from there. The single way back to Unbound is regeneration, which
//! resets every service at once.

use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::alias::{Alias, ServiceName};
use crate::assignment::AssignmentRecord;
use crate::config::AddressPolicy;
use crate::error::{Error, Result};
use crate::pool::AliasPool;
use crate::traits::StateStore;

/// Outcome of [`AliasEngine::check_and_assign`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The service already had an alias; nothing changed
    Existing(Alias),

    /// The service was unbound and has just been given this alias
    Assigned(Alias),

    /// The service was unbound and the pool has nothing left for it
    Exhausted,
}

impl Registration {
    /// Whether the service was already bound before the call
    pub fn existed(&self) -> bool {
        matches!(self, Registration::Existing(_))
    }

    /// The alias bound to the service, if any
    pub fn alias(&self) -> Option<&Alias> {
        match self {
            Registration::Existing(alias) | Registration::Assigned(alias) => Some(alias),
            Registration::Exhausted => None,
        }
    }
}

/// In-memory engine state guarded by a single lock
#[derive(Debug, Default)]
struct EngineState {
    pool: AliasPool,
    record: AssignmentRecord,
}

/// Core alias engine
///
/// Owns the pool, the assignment record and the store they persist to.
///
/// ## Threading
///
/// All operations serialize on one async mutex, so the engine can be shared
/// (e.g. in an `Arc`) by an event-driven adapter without overlapping
/// mutations. Every mutating call completes its durable write before the
/// lock is released.
///
/// ## Persistence
///
/// A mutation is applied to a copy of the record, written through the
/// store, and only then made visible. A failed write leaves the engine
/// unchanged.
pub struct AliasEngine {
    /// Durable storage
    store: Box<dyn StateStore>,

    /// Addressing convention for seeds
    policy: AddressPolicy,

    /// Pool and assignments
    state: Mutex<EngineState>,
}

impl AliasEngine {
    /// Load the engine from a store
    ///
    /// Legacy assignment documents are normalized and written back before
    /// this returns.
    pub async fn open(store: Box<dyn StateStore>, policy: AddressPolicy) -> Result<Self> {
        policy.validate()?;

        let pool = store.load_pool().await?;
        let document = store.load_assignments().await?;
        let (record, migrated) = AssignmentRecord::from_document(document);

        if migrated {
            info!("Migrating assignment document to the current format");
            store.save_assignments(&record).await?;
        }

        debug!(
            "Alias engine loaded: {} aliases, {} services",
            pool.len(),
            record.len()
        );

        Ok(Self {
            store,
            policy,
            state: Mutex::new(EngineState { pool, record }),
        })
    }

    /// Addressing policy seeds are validated against
    pub fn policy(&self) -> &AddressPolicy {
        &self.policy
    }

    /// Replace the pool with every variant of `seed`
    ///
    /// Clears all assignments. The new pool and the empty record are
    /// committed together.
    ///
    /// # Returns
    ///
    /// The number of generated aliases.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`]: malformed seed, nothing changed
    /// - [`Error::StateStore`]: write failed, nothing changed
    pub async fn generate_domain_names(&self, seed: &str) -> Result<usize> {
        let pool = AliasPool::generate(seed, &self.policy)?;
        let count = pool.len();

        let mut state = self.state.lock().await;
        let dropped = state.record.len();
        self.reset(&mut state, pool).await?;

        info!(
            "Generated {} aliases from {}; cleared {} service binding(s)",
            count,
            seed.trim(),
            dropped
        );
        Ok(count)
    }

    /// Install a new pool with an empty assignment record
    async fn reset(&self, state: &mut EngineState, pool: AliasPool) -> Result<()> {
        let record = AssignmentRecord::new();
        self.store.replace_all(&pool, &record).await?;
        state.pool = pool;
        state.record = record;
        Ok(())
    }

    /// Aliases bound to a service, oldest first
    pub async fn service_aliases(&self, service: &str) -> Vec<Alias> {
        let name = ServiceName::new(service);
        let state = self.state.lock().await;
        state.record.list_for_service(&name).to_vec()
    }

    /// The alias most recently bound to a service
    pub async fn latest_for_service(&self, service: &str) -> Option<Alias> {
        let name = ServiceName::new(service);
        let state = self.state.lock().await;
        state.record.latest_for_service(&name).cloned()
    }

    /// First pool alias the service does not hold yet
    ///
    /// May return an alias already bound to a different service.
    pub async fn unused_for_service(&self, service: &str) -> Option<Alias> {
        let name = ServiceName::new(service);
        let state = self.state.lock().await;
        state
            .record
            .next_unused_for_service(&state.pool, &name)
            .cloned()
    }

    /// First pool alias bound to no service at all
    pub async fn next_globally_unused(&self) -> Option<Alias> {
        let state = self.state.lock().await;
        let used = state.record.all_used();
        state.pool.iter().find(|alias| !used.contains(*alias)).cloned()
    }

    /// Every alias bound to any service
    pub async fn all_used(&self) -> HashSet<Alias> {
        self.state.lock().await.record.all_used()
    }

    /// Bind an alias to a service
    ///
    /// Binding an alias the service already holds is a no-op and does not
    /// write to the store.
    pub async fn assign(&self, service: &str, alias: Alias) -> Result<()> {
        let name = ServiceName::new(service);
        let mut state = self.state.lock().await;
        self.assign_locked(&mut state, &name, alias).await?;
        Ok(())
    }

    /// Return the service's current alias, or bind it a fresh one
    ///
    /// A bound service always gets its latest alias back; registration never
    /// rotates.
    pub async fn check_and_assign(&self, service: &str) -> Result<Registration> {
        let name = ServiceName::new(service);
        let mut state = self.state.lock().await;

        if let Some(existing) = state.record.latest_for_service(&name) {
            return Ok(Registration::Existing(existing.clone()));
        }

        let Some(alias) = state
            .record
            .next_unused_for_service(&state.pool, &name)
            .cloned()
        else {
            warn!("No alias available for service '{}'", name);
            return Ok(Registration::Exhausted);
        };

        self.assign_locked(&mut state, &name, alias.clone()).await?;
        Ok(Registration::Assigned(alias))
    }

    /// Bind the next unused alias to a service, bound or not
    ///
    /// # Errors
    ///
    /// [`Error::PoolExhausted`] when the service already holds every alias.
    pub async fn assign_next(&self, service: &str) -> Result<Alias> {
        let name = ServiceName::new(service);
        let mut state = self.state.lock().await;

        let alias = state
            .record
            .next_unused_for_service(&state.pool, &name)
            .cloned()
            .ok_or_else(|| Error::pool_exhausted(name.as_str()))?;

        self.assign_locked(&mut state, &name, alias.clone()).await?;
        Ok(alias)
    }

    /// Known services in sorted order
    pub async fn services(&self) -> Vec<ServiceName> {
        let state = self.state.lock().await;
        state.record.services().cloned().collect()
    }

    /// Snapshot of the current pool
    pub async fn pool(&self) -> AliasPool {
        self.state.lock().await.pool.clone()
    }

    /// Number of aliases in the pool
    pub async fn pool_len(&self) -> usize {
        self.state.lock().await.pool.len()
    }

    async fn assign_locked(
        &self,
        state: &mut EngineState,
        name: &ServiceName,
        alias: Alias,
    ) -> Result<bool> {
        let mut next = state.record.clone();
        if !next.assign(name, alias.clone()) {
            debug!("Alias {} already bound to '{}'", alias, name);
            return Ok(false);
        }

        self.store.save_assignments(&next).await?;
        state.record = next;

        info!("Bound {} to '{}'", alias, name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{AssignmentDocument, StoredAliases};
    use crate::state::MemoryStateStore;

    async fn engine_with(store: &MemoryStateStore) -> AliasEngine {
        AliasEngine::open(Box::new(store.clone()), AddressPolicy::default())
            .await
            .unwrap()
    }

    async fn seeded(seed: &str) -> (AliasEngine, MemoryStateStore) {
        let store = MemoryStateStore::new();
        let engine = engine_with(&store).await;
        engine.generate_domain_names(seed).await.unwrap();
        (engine, store)
    }

    #[tokio::test]
    async fn test_generate_reports_count() {
        let (engine, store) = seeded("abc@gmail.com").await;
        assert_eq!(engine.pool_len().await, 4);
        assert_eq!(store.pool().await.len(), 4);
    }

    #[tokio::test]
    async fn test_generate_rejects_wrong_domain_without_side_effects() {
        let (engine, store) = seeded("ab@gmail.com").await;
        engine.check_and_assign("groq").await.unwrap();
        let writes = store.write_count().await;

        let err = engine.generate_domain_names("ab@yahoo.com").await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
        assert_eq!(engine.service_aliases("groq").await.len(), 1);
        assert_eq!(store.write_count().await, writes);
    }

    #[tokio::test]
    async fn test_check_and_assign_is_sticky() {
        let (engine, _store) = seeded("ab@gmail.com").await;

        let first = engine.check_and_assign("groq").await.unwrap();
        assert_eq!(first, Registration::Assigned(Alias::from("ab@gmail.com")));
        assert!(!first.existed());

        let second = engine.check_and_assign("Groq").await.unwrap();
        assert_eq!(second, Registration::Existing(Alias::from("ab@gmail.com")));
        assert!(second.existed());
    }

    #[tokio::test]
    async fn test_check_and_assign_on_empty_pool_is_exhausted() {
        let store = MemoryStateStore::new();
        let engine = engine_with(&store).await;

        let result = engine.check_and_assign("groq").await.unwrap();
        assert_eq!(result, Registration::Exhausted);
        assert!(result.alias().is_none());
        assert!(engine.service_aliases("groq").await.is_empty());
        assert_eq!(store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_assign_next_until_exhausted() {
        let (engine, _store) = seeded("ab@gmail.com").await;

        engine.check_and_assign("groq").await.unwrap();
        let second = engine.assign_next("groq").await.unwrap();
        assert_eq!(second, Alias::from("a.b@gmail.com"));
        assert_eq!(
            engine.latest_for_service("groq").await,
            Some(Alias::from("a.b@gmail.com"))
        );

        assert!(engine.unused_for_service("groq").await.is_none());
        let err = engine.assign_next("groq").await.unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { ref service } if service == "groq"));
    }

    #[tokio::test]
    async fn test_duplicate_assign_does_not_write() {
        let (engine, store) = seeded("ab@gmail.com").await;

        engine.assign("groq", Alias::from("ab@gmail.com")).await.unwrap();
        let writes = store.write_count().await;

        engine.assign("GROQ", Alias::from("ab@gmail.com")).await.unwrap();
        assert_eq!(store.write_count().await, writes);
        assert_eq!(engine.service_aliases("groq").await.len(), 1);
    }

    #[tokio::test]
    async fn test_global_views() {
        let (engine, _store) = seeded("abc@gmail.com").await;

        engine.check_and_assign("groq").await.unwrap();
        engine.check_and_assign("openai").await.unwrap();

        // Both services share the first alias
        assert_eq!(engine.all_used().await.len(), 1);
        assert_eq!(
            engine.next_globally_unused().await,
            Some(Alias::from("a.bc@gmail.com"))
        );
        assert_eq!(
            engine.services().await,
            vec![ServiceName::new("groq"), ServiceName::new("openai")]
        );
    }

    #[tokio::test]
    async fn test_open_migrates_legacy_document() {
        let pool = AliasPool::generate("ab@gmail.com", &AddressPolicy::default()).unwrap();
        let mut document = AssignmentDocument::new();
        document.insert(
            "groq".to_string(),
            StoredAliases::Single(Alias::from("ab@gmail.com")),
        );
        let store = MemoryStateStore::with_state(pool, document);

        let engine = engine_with(&store).await;

        assert_eq!(store.write_count().await, 1);
        assert_eq!(
            store.document().await.get("groq"),
            Some(&StoredAliases::List(vec![Alias::from("ab@gmail.com")]))
        );
        assert_eq!(
            engine.service_aliases("groq").await,
            vec![Alias::from("ab@gmail.com")]
        );
    }
}
