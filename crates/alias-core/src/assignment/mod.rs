//! Per-service alias assignments
//!
//! [`AssignmentRecord`] maps each [`ServiceName`] to the aliases handed to it,
//! oldest first. The last entry is the service's current alias.
//!
//! ## Persisted shape
//!
//! ```json
//! {
//!     "groq": ["abc@gmail.com", "a.bc@gmail.com"],
//!     "openai": "abc@gmail.com"
//! }
//! ```
//!
//! The bare-string value is the legacy single-alias format. It is accepted on
//! load through [`StoredAliases`] and always written back as a list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::alias::{Alias, ServiceName};
use crate::pool::AliasPool;

/// Raw assignment document as found on disk
pub type AssignmentDocument = BTreeMap<String, StoredAliases>;

/// One persisted value: legacy single alias or current list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredAliases {
    /// Legacy format
    Single(Alias),
    /// Current format
    List(Vec<Alias>),
}

impl StoredAliases {
    fn into_vec(self) -> Vec<Alias> {
        match self {
            StoredAliases::Single(alias) => vec![alias],
            StoredAliases::List(aliases) => aliases,
        }
    }
}

/// Mapping from service to the ordered aliases bound to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentRecord {
    services: BTreeMap<ServiceName, Vec<Alias>>,
}

impl AssignmentRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a persisted document into a record
    ///
    /// Returns the record and whether anything had to be upgraded: a legacy
    /// single-alias value, a non-lowercase key, or a duplicate alias within
    /// one service. A `true` flag means the caller should persist the record
    /// before doing anything else.
    pub fn from_document(document: AssignmentDocument) -> (Self, bool) {
        let mut record = Self::new();
        let mut migrated = false;

        for (raw_name, stored) in document {
            if matches!(stored, StoredAliases::Single(_)) {
                migrated = true;
            }
            if !ServiceName::is_normalized(&raw_name) {
                migrated = true;
            }

            let name = ServiceName::new(&raw_name);
            let entry = record.services.entry(name).or_default();
            for alias in stored.into_vec() {
                if entry.contains(&alias) {
                    migrated = true;
                } else {
                    entry.push(alias);
                }
            }
        }

        (record, migrated)
    }

    /// Export in the current persisted format
    pub fn to_document(&self) -> AssignmentDocument {
        self.services
            .iter()
            .map(|(name, aliases)| {
                (
                    name.as_str().to_string(),
                    StoredAliases::List(aliases.clone()),
                )
            })
            .collect()
    }

    /// Aliases bound to a service, oldest first
    ///
    /// Unknown services yield an empty slice.
    pub fn list_for_service(&self, name: &ServiceName) -> &[Alias] {
        self.services.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The most recently bound alias of a service
    pub fn latest_for_service(&self, name: &ServiceName) -> Option<&Alias> {
        self.list_for_service(name).last()
    }

    /// First pool alias this service has not been given yet
    ///
    /// Exhaustion is scoped to the service: an alias bound to another
    /// service is still a candidate.
    pub fn next_unused_for_service<'p>(
        &self,
        pool: &'p AliasPool,
        name: &ServiceName,
    ) -> Option<&'p Alias> {
        let used: HashSet<&Alias> = self.list_for_service(name).iter().collect();
        pool.first_unused(&used)
    }

    /// Bind `alias` to a service
    ///
    /// Returns `true` if the record changed. Binding an alias the service
    /// already holds is a no-op.
    pub fn assign(&mut self, name: &ServiceName, alias: Alias) -> bool {
        let aliases = self.services.entry(name.clone()).or_default();
        if aliases.contains(&alias) {
            return false;
        }
        aliases.push(alias);
        true
    }

    /// Every alias bound to any service
    pub fn all_used(&self) -> HashSet<Alias> {
        self.services.values().flatten().cloned().collect()
    }

    /// Known service names in sorted order
    pub fn services(&self) -> impl Iterator<Item = &ServiceName> {
        self.services.keys()
    }

    /// Drop every service entry
    pub fn clear(&mut self) {
        self.services.clear();
    }

    /// Number of services with at least one alias
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service has an alias
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AddressPolicy;

    fn pool() -> AliasPool {
        AliasPool::generate("ab@gmail.com", &AddressPolicy::default()).unwrap()
    }

    fn svc(name: &str) -> ServiceName {
        ServiceName::new(name)
    }

    #[test]
    fn test_unknown_service_is_empty() {
        let record = AssignmentRecord::new();
        assert!(record.list_for_service(&svc("groq")).is_empty());
        assert!(record.latest_for_service(&svc("groq")).is_none());
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut record = AssignmentRecord::new();
        assert!(record.assign(&svc("groq"), Alias::from("ab@gmail.com")));
        assert!(!record.assign(&svc("GROQ"), Alias::from("ab@gmail.com")));
        assert_eq!(record.list_for_service(&svc("groq")), &[Alias::from("ab@gmail.com")]);
    }

    #[test]
    fn test_latest_is_last_assigned() {
        let mut record = AssignmentRecord::new();
        record.assign(&svc("groq"), Alias::from("ab@gmail.com"));
        record.assign(&svc("groq"), Alias::from("a.b@gmail.com"));
        assert_eq!(
            record.latest_for_service(&svc("Groq")),
            Some(&Alias::from("a.b@gmail.com"))
        );
    }

    #[test]
    fn test_next_unused_is_scoped_per_service() {
        let pool = pool();
        let mut record = AssignmentRecord::new();
        record.assign(&svc("openai"), Alias::from("ab@gmail.com"));

        // Used by another service, still the first candidate here
        assert_eq!(
            record.next_unused_for_service(&pool, &svc("groq")),
            Some(&Alias::from("ab@gmail.com"))
        );
        assert_eq!(
            record.next_unused_for_service(&pool, &svc("openai")),
            Some(&Alias::from("a.b@gmail.com"))
        );

        record.assign(&svc("openai"), Alias::from("a.b@gmail.com"));
        assert!(record.next_unused_for_service(&pool, &svc("openai")).is_none());
    }

    #[test]
    fn test_legacy_document_is_migrated() {
        let json = r#"{ "groq": "ab@gmail.com", "openai": ["ab@gmail.com", "a.b@gmail.com"] }"#;
        let document: AssignmentDocument = serde_json::from_str(json).unwrap();

        let (record, migrated) = AssignmentRecord::from_document(document);
        assert!(migrated);
        assert_eq!(record.list_for_service(&svc("groq")), &[Alias::from("ab@gmail.com")]);
        assert_eq!(record.list_for_service(&svc("openai")).len(), 2);

        let exported = serde_json::to_value(record.to_document()).unwrap();
        assert_eq!(exported["groq"], serde_json::json!(["ab@gmail.com"]));
    }

    #[test]
    fn test_current_document_is_not_migrated() {
        let json = r#"{ "groq": ["ab@gmail.com"] }"#;
        let document: AssignmentDocument = serde_json::from_str(json).unwrap();
        let (_, migrated) = AssignmentRecord::from_document(document);
        assert!(!migrated);
    }

    #[test]
    fn test_mixed_case_keys_are_merged() {
        let json = r#"{ "Groq": ["ab@gmail.com"], "groq": ["ab@gmail.com", "a.b@gmail.com"] }"#;
        let document: AssignmentDocument = serde_json::from_str(json).unwrap();

        let (record, migrated) = AssignmentRecord::from_document(document);
        assert!(migrated);
        assert_eq!(record.len(), 1);
        assert_eq!(
            record.list_for_service(&svc("groq")),
            &[Alias::from("ab@gmail.com"), Alias::from("a.b@gmail.com")]
        );
    }

    #[test]
    fn test_all_used_spans_services() {
        let mut record = AssignmentRecord::new();
        record.assign(&svc("groq"), Alias::from("ab@gmail.com"));
        record.assign(&svc("openai"), Alias::from("ab@gmail.com"));
        record.assign(&svc("openai"), Alias::from("a.b@gmail.com"));
        assert_eq!(record.all_used().len(), 2);

        record.clear();
        assert!(record.is_empty());
    }
}
