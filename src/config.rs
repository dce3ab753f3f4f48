//! Construction-time configuration for `EquivalenceStore`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What `insert` does when an element's key is already represented.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DuplicatePolicy {
    /// Keep the stored representative and drop the incoming value.
    #[default]
    FirstWins,
    /// Evict the stored representative and store the incoming value as a
    /// fresh entry with a new `EntryId`.
    LastWins,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreConfig {
    pub policy: DuplicatePolicy,
    /// Number of entries to allocate for up front.
    pub initial_capacity: usize,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_first_wins_without_preallocation() {
        let c = StoreConfig::default();
        assert_eq!(c.policy, DuplicatePolicy::FirstWins);
        assert_eq!(c.initial_capacity, 0);
    }

    #[test]
    fn builder_setters_chain() {
        let c = StoreConfig::new()
            .policy(DuplicatePolicy::LastWins)
            .initial_capacity(32);
        assert_eq!(c.policy, DuplicatePolicy::LastWins);
        assert_eq!(c.initial_capacity, 32);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_missing_fields_defaulted() {
        let c: StoreConfig = serde_json::from_str(r#"{"policy":"last_wins"}"#).unwrap();
        assert_eq!(c, StoreConfig::new().policy(DuplicatePolicy::LastWins));

        let empty: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, StoreConfig::default());
    }
}
