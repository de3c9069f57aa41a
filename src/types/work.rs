//! Work items, batch progress, and cooperative cancellation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// An opaque unit of batch work.
///
/// Identified by a stable key (a URL or keyword string); the payload is
/// whatever the caller's worker needs. Duplicate keys submitted within
/// one batch run twice; there is no implicit dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Stable key identifying this item (URL or keyword)
    pub key: String,

    /// Caller-supplied payload, opaque to the runner
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WorkItem {
    /// Create a work item with an empty payload.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// Payload is JSON and not hashable; identity is the key alone. Equal
// items always share a key, so this stays consistent with PartialEq.
impl std::hash::Hash for WorkItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Progress through one batch run.
///
/// `current` counts items that have settled (success, failure, or
/// per-item cancellation), never items merely started. Monotonically
/// non-decreasing across the run, with `current <= total` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Items settled so far
    pub current: usize,

    /// Items in the batch
    pub total: usize,
}

/// Caller-owned set of work-item keys that have been asked to stop.
///
/// Cancellation is cooperative and advisory: the batch runner reads the
/// set before dispatching each item and skips items whose key is present;
/// it never mutates the set. Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct CancellationSet {
    keys: Arc<RwLock<HashSet<String>>>,
}

impl CancellationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the item with this key to stop.
    pub fn cancel(&self, key: impl Into<String>) {
        self.keys.write().unwrap().insert(key.into());
    }

    /// Check whether a key has been asked to stop.
    pub fn is_cancelled(&self, key: &str) -> bool {
        self.keys.read().unwrap().contains(key)
    }

    /// Remove a key, allowing the item to run again.
    pub fn clear_key(&self, key: &str) {
        self.keys.write().unwrap().remove(key);
    }

    /// Remove all keys.
    pub fn clear(&self) {
        self.keys.write().unwrap().clear();
    }

    /// Number of keys currently marked.
    pub fn len(&self) -> usize {
        self.keys.read().unwrap().len()
    }

    /// Whether no keys are marked.
    pub fn is_empty(&self) -> bool {
        self.keys.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_set_shared_across_clones() {
        let set = CancellationSet::new();
        let clone = set.clone();

        set.cancel("https://example.com/a");
        assert!(clone.is_cancelled("https://example.com/a"));
        assert!(!clone.is_cancelled("https://example.com/b"));

        clone.clear_key("https://example.com/a");
        assert!(set.is_empty());
    }

    #[test]
    fn test_work_item_key_equality() {
        let a = WorkItem::new("keyword");
        let b = WorkItem::new("keyword");
        assert_eq!(a, b);

        let c = WorkItem::new("keyword").with_payload(serde_json::json!({"x": 1}));
        assert_ne!(a, c);
    }
}
