// # State Store Trait
//
// Defines the storage port the alias engine persists through.
//
// ## Purpose
//
// The engine keeps the pool and the assignment record in memory and writes
// them through this trait after every mutation. Two independent documents
// are stored:
//
// - Pool: newline-delimited aliases, rewritten on regeneration only
// - Assignments: service -> aliases document, rewritten on every mutation
//
// ## Implementations
//
// - File-based: plain text + JSON files with atomic replace
// - Memory: for tests and throwaway sessions
//
// ## Usage
//
// ```rust
// use alias_core::StateStore;
//
// #[tokio::main]
// async fn main() -> alias_core::Result<()> {
//     let store = /* StateStore implementation */;
//
//     let pool = store.load_pool().await?;
//     let document = store.load_assignments().await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::assignment::{AssignmentDocument, AssignmentRecord};
use crate::pool::AliasPool;

/// Trait for state store implementations
///
/// # Read Failures
///
/// Loading never fails because of missing or malformed content: a missing
/// pool is an empty pool, an unreadable assignment document is an empty
/// document. Implementations log a warning in those cases and return
/// `Ok`. `Err` is reserved for failures the caller can act on.
///
/// # Writes
///
/// Every save fully replaces the previous durable content or leaves it
/// untouched. No partially written document may become visible.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted pool
    async fn load_pool(&self) -> Result<AliasPool, crate::Error>;

    /// Load the raw assignment document, legacy values included
    ///
    /// Normalization is the engine's job; see
    /// [`AssignmentRecord::from_document`].
    async fn load_assignments(&self) -> Result<AssignmentDocument, crate::Error>;

    /// Replace the persisted assignment document
    async fn save_assignments(&self, record: &AssignmentRecord) -> Result<(), crate::Error>;

    /// Replace the pool and the assignment document together
    ///
    /// Used by regeneration: either both documents are replaced or neither is.
    async fn replace_all(
        &self,
        pool: &AliasPool,
        record: &AssignmentRecord,
    ) -> Result<(), crate::Error>;
}
