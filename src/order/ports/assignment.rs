//! Repository port for daily store-to-agent assignments.

use crate::order::domain::{AgentId, Assignment, StoreId};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

/// Result type for assignment repository operations.
pub type AssignmentRepositoryResult<T> = Result<T, AssignmentRepositoryError>;

/// Result of recording an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// A new assignment row was written.
    Created,
    /// The store, agent, and date were already assigned.
    AlreadyAssigned,
}

/// Assignment persistence contract.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Records an assignment; repeated slots are idempotent no-ops.
    async fn create(&self, assignment: &Assignment)
    -> AssignmentRepositoryResult<AssignmentOutcome>;

    /// Returns every assignment for `date`, oldest first.
    async fn for_date(&self, date: NaiveDate) -> AssignmentRepositoryResult<Vec<Assignment>>;

    /// Returns the stores assigned to an agent on `date`.
    async fn stores_for_agent(
        &self,
        agent_id: AgentId,
        date: NaiveDate,
    ) -> AssignmentRepositoryResult<Vec<StoreId>>;
}

/// Errors returned by assignment repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AssignmentRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AssignmentRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
