//! Configuration types for the alias engine
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main alias engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Addressing convention seeds must follow
    #[serde(default)]
    pub address: AddressPolicy,

    /// State store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Identity of the single authorized operator
    ///
    /// `None` disables the access check.
    #[serde(default)]
    pub owner_id: Option<i64>,
}

impl AliasConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.address.validate()?;
        self.state_store.validate()?;
        Ok(())
    }
}

/// Provider addressing convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPolicy {
    /// Domain every seed (and therefore every alias) must use
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Longest accepted local part
    ///
    /// A local part of N characters yields 2^(N-1) aliases, so this bounds
    /// the size of the pool.
    #[serde(default = "default_max_local_part_len")]
    pub max_local_part_len: usize,
}

impl AddressPolicy {
    /// Create a policy for a domain with the default length limit
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            max_local_part_len: default_max_local_part_len(),
        }
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.is_empty() {
            return Err(crate::Error::config("Address domain cannot be empty"));
        }
        if self.domain.contains('@') {
            return Err(crate::Error::config(
                "Address domain must not contain '@'",
            ));
        }
        if !(1..=MAX_LOCAL_PART_LEN_LIMIT).contains(&self.max_local_part_len) {
            return Err(crate::Error::config(format!(
                "max_local_part_len must be between 1 and {}",
                MAX_LOCAL_PART_LEN_LIMIT
            )));
        }
        Ok(())
    }
}

impl Default for AddressPolicy {
    fn default() -> Self {
        Self::new(default_domain())
    }
}

/// Upper bound for `max_local_part_len` (2^25 aliases)
pub const MAX_LOCAL_PART_LEN_LIMIT: usize = 26;

/// State store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the newline-delimited pool file
        #[serde(default = "default_pool_path")]
        pool_path: String,
        /// Path to the JSON assignment document
        #[serde(default = "default_assignments_path")]
        assignments_path: String,
    },

    /// In-memory state store (not persistent)
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File {
                pool_path,
                assignments_path,
            } => {
                if pool_path.is_empty() {
                    return Err(crate::Error::config("Pool file path cannot be empty"));
                }
                if assignments_path.is_empty() {
                    return Err(crate::Error::config(
                        "Assignment file path cannot be empty",
                    ));
                }
                if pool_path == assignments_path {
                    return Err(crate::Error::config(
                        "Pool file and assignment file must be different paths",
                    ));
                }
                Ok(())
            }
            StateStoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StateStoreConfig::File { .. } => "file",
            StateStoreConfig::Memory => "memory",
        }
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        StateStoreConfig::File {
            pool_path: default_pool_path(),
            assignments_path: default_assignments_path(),
        }
    }
}

fn default_domain() -> String {
    "gmail.com".to_string()
}

fn default_max_local_part_len() -> usize {
    20
}

/// Pool file used when none is configured
pub const DEFAULT_POOL_PATH: &str = "gmails.txt";

/// Assignment file used when none is configured
pub const DEFAULT_ASSIGNMENTS_PATH: &str = "services_data.json";

fn default_pool_path() -> String {
    DEFAULT_POOL_PATH.to_string()
}

fn default_assignments_path() -> String {
    DEFAULT_ASSIGNMENTS_PATH.to_string()
}
