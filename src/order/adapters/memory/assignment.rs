//! In-memory assignment repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, RwLock};

use crate::order::{
    domain::{AgentId, Assignment, StoreId},
    ports::{
        AssignmentOutcome, AssignmentRepository, AssignmentRepositoryError,
        AssignmentRepositoryResult,
    },
};

/// Thread-safe in-memory assignment repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssignmentRepository {
    assignments: Arc<RwLock<Vec<Assignment>>>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> AssignmentRepositoryError {
    AssignmentRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn create(
        &self,
        assignment: &Assignment,
    ) -> AssignmentRepositoryResult<AssignmentOutcome> {
        let mut assignments = self.assignments.write().map_err(lock_error)?;
        if assignments.iter().any(|existing| existing.same_slot(assignment)) {
            return Ok(AssignmentOutcome::AlreadyAssigned);
        }
        assignments.push(assignment.clone());
        Ok(AssignmentOutcome::Created)
    }

    async fn for_date(&self, date: NaiveDate) -> AssignmentRepositoryResult<Vec<Assignment>> {
        let assignments = self.assignments.read().map_err(lock_error)?;
        let mut matching: Vec<Assignment> = assignments
            .iter()
            .filter(|assignment| assignment.date() == date)
            .cloned()
            .collect();
        matching.sort_by_key(|assignment| (assignment.created_at(), assignment.id()));
        Ok(matching)
    }

    async fn stores_for_agent(
        &self,
        agent_id: AgentId,
        date: NaiveDate,
    ) -> AssignmentRepositoryResult<Vec<StoreId>> {
        let assignments = self.assignments.read().map_err(lock_error)?;
        Ok(assignments
            .iter()
            .filter(|assignment| assignment.date() == date && assignment.agent_id() == agent_id)
            .map(Assignment::store_id)
            .collect())
    }
}
