//! Value types shared by the pool and the assignment record
//!
//! - [`Alias`]: one generated address variant
//! - [`ServiceName`]: lowercase-normalized service key
//! - [`SeedAddress`]: a validated canonical address to generate a pool from

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AddressPolicy;
use crate::error::{Error, Result};

/// Separator inserted into the local part to form a variant
pub const SEPARATOR: char = '.';

/// One addressing variant of a canonical account address
///
/// Aliases are produced by pool generation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    /// Wrap an address string
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Alias {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Alias {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<&str> for Alias {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Case-insensitive service key
///
/// The inner string is always lowercase and trimmed, so two names that differ
/// only in case address the same assignment entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Normalize a raw service name
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the raw key was already in normalized form
    pub fn is_normalized(raw: &str) -> bool {
        raw.trim().to_lowercase() == raw
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

/// Validated canonical address used as a pool seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAddress {
    local_part: String,
    domain: String,
}

impl SeedAddress {
    /// Parse and validate a seed against the provider's addressing policy
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] when:
    /// - the input is not exactly `<localpart>@<domain>`
    /// - the domain is not the policy's domain
    /// - the local part is empty (once separators are removed), contains
    ///   whitespace, or is longer than the policy allows
    ///
    /// Separators already present in the local part are dropped: the provider
    /// ignores them, so `john.doe` and `johndoe` seed the same pool.
    pub fn parse(input: &str, policy: &AddressPolicy) -> Result<Self> {
        let input = input.trim();

        let (local_part, domain) = input.split_once('@').ok_or_else(|| {
            Error::invalid_address(format!(
                "'{}' is not an address, expected <name>@{}",
                input, policy.domain
            ))
        })?;

        if !domain.eq_ignore_ascii_case(&policy.domain) {
            return Err(Error::invalid_address(format!(
                "address must end with @{}, got '{}'",
                policy.domain, input
            )));
        }

        let local_part: String = local_part.chars().filter(|&c| c != SEPARATOR).collect();
        if local_part.is_empty() {
            return Err(Error::invalid_address("local part cannot be empty"));
        }

        if local_part.chars().any(|c| c.is_whitespace()) {
            return Err(Error::invalid_address(format!(
                "local part '{}' contains whitespace",
                local_part
            )));
        }

        let len = local_part.chars().count();
        if len > policy.max_local_part_len {
            return Err(Error::invalid_address(format!(
                "local part is {} characters long (max {})",
                len, policy.max_local_part_len
            )));
        }

        Ok(Self {
            local_part,
            domain: policy.domain.to_ascii_lowercase(),
        })
    }

    /// The part before `@`
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The provider domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The unmodified address
    pub fn to_alias(&self) -> Alias {
        Alias::new(format!("{}@{}", self.local_part, self.domain))
    }
}
