//! Single-owner access policy
//!
//! The engine has no notion of identity. Adapters check the caller with
//! [`OwnerPolicy`] before forwarding a request.

use crate::error::{Error, Result};

/// Allows exactly one operator, or everyone when no owner is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerPolicy {
    owner_id: Option<i64>,
}

impl OwnerPolicy {
    /// Policy for the given owner
    pub fn new(owner_id: Option<i64>) -> Self {
        Self { owner_id }
    }

    /// Configured owner
    pub fn owner_id(&self) -> Option<i64> {
        self.owner_id
    }

    /// Check whether `operator_id` may use the engine
    ///
    /// # Errors
    ///
    /// [`Error::Unauthorized`] if an owner is configured and the operator is
    /// someone else or unknown.
    pub fn authorize(&self, operator_id: Option<i64>) -> Result<()> {
        match (self.owner_id, operator_id) {
            (None, _) => Ok(()),
            (Some(owner), Some(operator)) if owner == operator => Ok(()),
            (Some(_), Some(operator)) => Err(Error::unauthorized(format!(
                "operator {} is not the owner",
                operator
            ))),
            (Some(_), None) => Err(Error::unauthorized("operator identity is unknown")),
        }
    }
}
