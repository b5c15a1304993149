//! Daily store assignments and distribution of pending orders.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use thiserror::Error;
use tracing::info;

use crate::order::{
    domain::{AgentId, Assignment, AssignmentMap, StoreId},
    ports::{
        AssignmentOutcome, AssignmentRepository, AssignmentRepositoryError, OrderRepository,
        OrderRepositoryError,
    },
};

/// Service-level errors for assignment planning.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Assignment storage failed.
    #[error(transparent)]
    Assignments(#[from] AssignmentRepositoryError),
    /// Order storage failed.
    #[error(transparent)]
    Orders(#[from] OrderRepositoryError),
}

/// Result type for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Summary of one distribution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionReport {
    /// Date whose assignments were applied.
    pub date: NaiveDate,
    /// Orders moved from pending to assigned.
    pub distributed: usize,
    /// Orders still pending after the run.
    pub remaining_pending: u64,
    /// Orders handed to each agent.
    pub per_agent: BTreeMap<AgentId, usize>,
}

/// Assigns stores to agents and distributes pending orders accordingly.
#[derive(Clone)]
pub struct AssignmentPlanner<O, A, C>
where
    O: OrderRepository,
    A: AssignmentRepository,
    C: Clock + Send + Sync,
{
    orders: Arc<O>,
    assignments: Arc<A>,
    clock: Arc<C>,
}

impl<O, A, C> AssignmentPlanner<O, A, C>
where
    O: OrderRepository,
    A: AssignmentRepository,
    C: Clock + Send + Sync,
{
    /// Creates a planner.
    #[must_use]
    pub const fn new(orders: Arc<O>, assignments: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            orders,
            assignments,
            clock,
        }
    }

    /// Returns the calendar date distribution works against: the clock's
    /// local date, so a shift that starts after midnight local time uses the
    /// new day's assignments even while UTC is still on the previous one.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.local().date_naive()
    }

    /// Gives `agent_id` the orders of `store_id` for `date` (today when
    /// `None`). Repeating an existing assignment is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Assignments`] when storage fails.
    pub async fn assign_store(
        &self,
        store_id: StoreId,
        agent_id: AgentId,
        date: Option<NaiveDate>,
    ) -> PlannerResult<AssignmentOutcome> {
        let day = date.unwrap_or_else(|| self.today());
        let assignment = Assignment::new(store_id, agent_id, day, &*self.clock);
        let outcome = self.assignments.create(&assignment).await?;
        info!(store_id = %store_id, agent_id = %agent_id, date = %day, ?outcome, "store assigned");
        Ok(outcome)
    }

    /// Returns the assignments for `date`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Assignments`] when storage fails.
    pub async fn assignments_for(&self, date: NaiveDate) -> PlannerResult<Vec<Assignment>> {
        Ok(self.assignments.for_date(date).await?)
    }

    /// Returns the stores an agent covers on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Assignments`] when storage fails.
    pub async fn stores_for_agent(
        &self,
        agent_id: AgentId,
        date: NaiveDate,
    ) -> PlannerResult<Vec<StoreId>> {
        Ok(self.assignments.stores_for_agent(agent_id, date).await?)
    }

    /// Assigns every pending order whose store has an agent today.
    ///
    /// When several agents share a store, the earliest-created assignment
    /// receives the orders. Orders that are not pending are never touched,
    /// so repeated runs are safe.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError`] when assignments or orders cannot be read or
    /// written; no order is partially assigned.
    pub async fn distribute(&self) -> PlannerResult<DistributionReport> {
        let date = self.today();
        let assignments = self.assignments.for_date(date).await?;
        let map = AssignmentMap::from_assignments(&assignments);

        let mut report = DistributionReport {
            date,
            distributed: 0,
            remaining_pending: 0,
            per_agent: BTreeMap::new(),
        };
        if !map.is_empty() {
            let assigned = self.orders.assign_pending(&map, self.clock.utc()).await?;
            for order in &assigned {
                if let Some(agent_id) = order.assigned_to() {
                    let count = report.per_agent.entry(agent_id).or_insert(0);
                    *count = count.saturating_add(1);
                }
            }
            report.distributed = assigned.len();
        }
        report.remaining_pending = self.orders.count_by_status().await?.pending;

        info!(
            date = %date,
            assignments = assignments.len(),
            distributed = report.distributed,
            remaining_pending = report.remaining_pending,
            "distributed pending orders"
        );
        Ok(report)
    }
}
