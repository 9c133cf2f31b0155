//! Run and group persistence.
//!
//! The engine needs strong read-after-write consistency within a single
//! process; [`InMemoryRunStore`] provides that behind the [`RunStore`]
//! trait so a database-backed implementation can be swapped in by the
//! surrounding service.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::AllocationError;
use crate::models::{AllocationRun, CandidateGroup};

/// Storage for runs and their candidate groups.
pub trait RunStore {
    /// Persists a new run.
    fn insert_run(&self, run: AllocationRun);

    /// Fetches a run by id.
    fn get_run(&self, run_id: &str) -> Result<AllocationRun, AllocationError>;

    /// Persists a new candidate group.
    fn insert_group(&self, group: CandidateGroup);

    /// Fetches a group by id.
    fn get_group(&self, group_id: &str) -> Result<CandidateGroup, AllocationError>;

    /// Replaces a stored group with an updated record.
    fn update_group(&self, group: CandidateGroup) -> Result<(), AllocationError>;

    /// All groups of a run, in creation order.
    fn groups_for_run(&self, run_id: &str) -> Vec<CandidateGroup>;
}

/// Process-local store backed by `RwLock`ed maps.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<String, AllocationRun>>,
    groups: RwLock<HashMap<String, CandidateGroup>>,
    // Creation order per run, since HashMap iteration is unordered
    group_order: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for InMemoryRunStore {
    fn insert_run(&self, run: AllocationRun) {
        self.runs.write().insert(run.id.clone(), run);
    }

    fn get_run(&self, run_id: &str) -> Result<AllocationRun, AllocationError> {
        self.runs
            .read()
            .get(run_id)
            .cloned()
            .ok_or_else(|| AllocationError::NotFound(format!("allocation run {run_id}")))
    }

    fn insert_group(&self, group: CandidateGroup) {
        self.group_order
            .write()
            .entry(group.run_id.clone())
            .or_default()
            .push(group.id.clone());
        self.groups.write().insert(group.id.clone(), group);
    }

    fn get_group(&self, group_id: &str) -> Result<CandidateGroup, AllocationError> {
        self.groups
            .read()
            .get(group_id)
            .cloned()
            .ok_or_else(|| AllocationError::NotFound(format!("candidate group {group_id}")))
    }

    fn update_group(&self, group: CandidateGroup) -> Result<(), AllocationError> {
        let mut groups = self.groups.write();
        if !groups.contains_key(&group.id) {
            return Err(AllocationError::NotFound(format!(
                "candidate group {}",
                group.id
            )));
        }
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    fn groups_for_run(&self, run_id: &str) -> Vec<CandidateGroup> {
        let groups = self.groups.read();
        self.group_order
            .read()
            .get(run_id)
            .map(|ids| ids.iter().filter_map(|id| groups.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}
