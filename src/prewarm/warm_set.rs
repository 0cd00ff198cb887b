//! Warm Set
//!
//! Membership store for the resources currently loaded. The set serializes
//! itself as a JSON array of identifiers for a [`PersistenceStore`]; the
//! owner decides when to write that blob, so no store I/O happens while the
//! set is locked.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::domain::{PersistenceStore, ResourceId};
use crate::error::Result;

/// Set of warm resource identifiers.
///
/// Iteration order is lexical by identifier.
#[derive(Debug, Default)]
pub struct WarmSet {
    entries: BTreeSet<ResourceId>,
}

impl WarmSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the set from the store.
    ///
    /// Absent, unreadable or malformed data all yield an empty set.
    pub fn restore(store: &dyn PersistenceStore) -> Self {
        let entries = match store.load_blob() {
            Ok(Some(blob)) => decode(&blob).unwrap_or_else(|e| {
                debug!("Discarding malformed warm set blob: {}", e);
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read persisted warm set: {}", e);
                BTreeSet::new()
            }
        };

        if !entries.is_empty() {
            debug!(count = entries.len(), "Restored warm set");
        }

        Self { entries }
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains(id)
    }

    /// Add an entry. Returns false if already present.
    pub fn insert(&mut self, id: ResourceId) -> bool {
        self.entries.insert(id)
    }

    /// Remove an entry. Returns false if absent.
    pub fn remove(&mut self, id: &ResourceId) -> bool {
        self.entries.remove(id)
    }

    /// Snapshot of the current members
    pub fn all(&self) -> BTreeSet<ResourceId> {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the members in the persisted format
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.entries)?)
    }
}

fn decode(blob: &[u8]) -> Result<BTreeSet<ResourceId>> {
    Ok(serde_json::from_slice(blob)?)
}

// =============================================================================
// Tests
// =============================================================================
