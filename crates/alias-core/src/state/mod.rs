// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use crate::config::StateStoreConfig;
use crate::error::Result;
use crate::traits::StateStore;

/// Build the state store described by the configuration
pub async fn open_store(config: &StateStoreConfig) -> Result<Box<dyn StateStore>> {
    config.validate()?;

    match config {
        StateStoreConfig::File {
            pool_path,
            assignments_path,
        } => {
            tracing::debug!("Opening file state store: {}, {}", pool_path, assignments_path);
            let store = FileStateStore::new(pool_path, assignments_path).await?;
            Ok(Box::new(store))
        }
        StateStoreConfig::Memory => {
            tracing::debug!("Opening memory state store");
            Ok(Box::new(MemoryStateStore::new()))
        }
    }
}
