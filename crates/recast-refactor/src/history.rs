//! Refactoring history: the append-only log of executed descriptors.
//!
//! Records are the only thing persisted; replaying one goes back through
//! the contribution registry so the history survives restarts and travels
//! between workspaces as plain JSON.

use serde::{Deserialize, Serialize};

use crate::contribution::ContributionRegistry;
use crate::descriptor::DescriptorRecord;
use crate::refactoring::{RefactorError, Refactoring};
use crate::resource::Workspace;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefactoringHistory {
    records: Vec<DescriptorRecord>,
}

impl RefactoringHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DescriptorRecord) {
        tracing::debug!(id = %record.id, "recording refactoring");
        self.records.push(record);
    }

    pub fn records(&self) -> &[DescriptorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            records: serde_json::from_str(json)?,
        })
    }

    /// Rebuild the executor for entry `index` against the given workspace.
    pub fn replay(
        &self,
        index: usize,
        registry: &ContributionRegistry,
        workspace: &dyn Workspace,
    ) -> Result<Box<dyn Refactoring>, RefactorError> {
        let record = self.records.get(index).ok_or_else(|| {
            RefactorError::InvalidDescriptor(format!("no history entry at index {index}"))
        })?;
        registry.replay(record, workspace)
    }
}
