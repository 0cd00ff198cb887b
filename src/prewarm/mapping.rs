//! Task-to-resource mapping table.
//!
//! Snapshots are immutable; the orchestrator swaps whole tables behind an
//! `Arc` so readers never observe a half-applied update.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ResourceId, TaskType};

/// Maps each task type to at most one resource identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    entries: HashMap<TaskType, ResourceId>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, task_type: TaskType) -> Option<&ResourceId> {
        self.entries.get(&task_type)
    }

    /// Copy of this table with one entry added or replaced
    pub fn with_entry(&self, task_type: TaskType, id: ResourceId) -> Self {
        let mut next = self.clone();
        next.entries.insert(task_type, id);
        next
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskType, &ResourceId)> {
        self.entries.iter()
    }
}

impl FromIterator<(TaskType, ResourceId)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (TaskType, ResourceId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    #[test]
    fn test_resolve_misses_unmapped_task() {
        let table: MappingTable = [(TaskType::CodeGen, rid("code-model"))]
            .into_iter()
            .collect();

        assert_eq!(table.resolve(TaskType::CodeGen), Some(&rid("code-model")));
        assert_eq!(table.resolve(TaskType::Math), None);
    }

    #[test]
    fn test_with_entry_leaves_original_untouched() {
        let original: MappingTable = [(TaskType::Math, rid("math-v1"))].into_iter().collect();
        let updated = original.with_entry(TaskType::Math, rid("math-v2"));

        assert_eq!(original.resolve(TaskType::Math), Some(&rid("math-v1")));
        assert_eq!(updated.resolve(TaskType::Math), Some(&rid("math-v2")));
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn test_yaml_document_shape() {
        let table: MappingTable =
            serde_yaml::from_str("code_gen: code-model\nmath: math-model\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(TaskType::Math), Some(&rid("math-model")));
    }
}
