// # alias-core
//
// Core library for dot-trick alias allocation.
//
// ## Architecture Overview
//
// This library assigns address variants ("aliases") to named services on
// behalf of a single operator:
// - **AliasPool**: every dotted variant of a seed address, in allocation order
// - **AssignmentRecord**: which aliases each service has been given
// - **StateStore**: Trait for durable storage of pool and assignments
// - **AliasEngine**: Owns the above and exposes the operations adapters call
// - **OwnerPolicy**: Single-owner check applied by adapters, not the engine
//
// ## Design Principles
//
// 1. **Explicit ownership**: the engine is a value built once at startup, no globals
// 2. **Idempotency**: binding an alias a service already holds changes nothing
// 3. **Durability**: every mutation is written before it becomes visible
// 4. **Library-First**: adapters (console, chat bots) stay thin

pub mod access;
pub mod alias;
pub mod assignment;
pub mod config;
pub mod engine;
pub mod error;
pub mod pool;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use access::OwnerPolicy;
pub use alias::{Alias, SeedAddress, ServiceName};
pub use assignment::{AssignmentDocument, AssignmentRecord, StoredAliases};
pub use config::{AddressPolicy, AliasConfig, StateStoreConfig};
pub use engine::{AliasEngine, Registration};
pub use error::{Error, Result};
pub use pool::AliasPool;
pub use state::{FileStateStore, MemoryStateStore, open_store};
pub use traits::StateStore;
