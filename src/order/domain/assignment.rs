//! Daily store-to-agent assignments and the map distribution reads them from.

use super::{AgentId, AssignmentId, StoreId};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// "This agent owns new orders from this store on this date."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    store_id: StoreId,
    agent_id: AgentId,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Assignment {
    /// Creates an assignment for the given calendar date.
    #[must_use]
    pub fn new(store_id: StoreId, agent_id: AgentId, date: NaiveDate, clock: &impl Clock) -> Self {
        Self {
            id: AssignmentId::new(),
            store_id,
            agent_id,
            date,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an assignment from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: AssignmentId,
        store_id: StoreId,
        agent_id: AgentId,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            store_id,
            agent_id,
            date,
            created_at,
        }
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the assigned store.
    #[must_use]
    pub const fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// Returns the assigned agent.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Returns the calendar date the assignment covers.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether `other` covers the same store, agent, and date.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.store_id == other.store_id && self.agent_id == other.agent_id && self.date == other.date
    }
}

/// Store-to-agents lookup for one date.
///
/// Agents for a store are kept in assignment creation order; when several
/// agents share a store the earliest-created assignment wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentMap {
    agents_by_store: HashMap<StoreId, Vec<AgentId>>,
}

impl AssignmentMap {
    /// Builds the map from a date's assignments.
    #[must_use]
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        let mut ordered: Vec<&Assignment> = assignments.iter().collect();
        ordered.sort_by_key(|assignment| (assignment.created_at(), assignment.id()));

        let mut agents_by_store: HashMap<StoreId, Vec<AgentId>> = HashMap::new();
        for assignment in ordered {
            let agents = agents_by_store.entry(assignment.store_id()).or_default();
            if !agents.contains(&assignment.agent_id()) {
                agents.push(assignment.agent_id());
            }
        }
        Self { agents_by_store }
    }

    /// Returns the agent who receives new orders from `store_id`.
    #[must_use]
    pub fn agent_for(&self, store_id: StoreId) -> Option<AgentId> {
        self.agents_by_store
            .get(&store_id)
            .and_then(|agents| agents.first())
            .copied()
    }

    /// Returns every agent assigned to `store_id`, in precedence order.
    #[must_use]
    pub fn agents_for(&self, store_id: StoreId) -> &[AgentId] {
        self.agents_by_store
            .get(&store_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Returns whether the map has no assignments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents_by_store.is_empty()
    }
}
