//! In-memory order and call log store for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::order::{
    domain::{
        AgentId, AssignmentMap, CallLog, ExternalOrderId, Order, OrderId, OrderStatus,
        OrderVersion,
    },
    ports::{
        InsertOutcome, OrderRepository, OrderRepositoryError, OrderRepositoryResult, StatusCounts,
    },
};

/// Thread-safe in-memory order repository.
///
/// Orders and call logs share one lock so a disposition and its log are
/// written together.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, Order>,
    external_index: HashMap<ExternalOrderId, OrderId>,
    insertion_order: Vec<OrderId>,
    call_logs: Vec<CallLog>,
}

impl InMemoryOrderStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> OrderRepositoryResult<RwLockReadGuard<'_, InMemoryOrderState>> {
        self.state.read().map_err(|err| {
            OrderRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> OrderRepositoryResult<RwLockWriteGuard<'_, InMemoryOrderState>> {
        self.state.write().map_err(|err| {
            OrderRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn check_version(
    state: &InMemoryOrderState,
    order: &Order,
    expected: OrderVersion,
) -> OrderRepositoryResult<()> {
    let stored = state
        .orders
        .get(&order.id())
        .ok_or(OrderRepositoryError::NotFound(order.id()))?;
    if stored.version() != expected {
        return Err(OrderRepositoryError::VersionConflict {
            order_id: order.id(),
            expected,
        });
    }
    Ok(())
}

fn by_creation(orders: &mut [Order]) {
    orders.sort_by_key(|order| (order.created_at(), order.id()));
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn insert_if_absent(&self, order: &Order) -> OrderRepositoryResult<InsertOutcome> {
        let mut state = self.write()?;
        if state.external_index.contains_key(order.external_id()) {
            return Ok(InsertOutcome::Duplicate);
        }
        state
            .external_index
            .insert(order.external_id().clone(), order.id());
        state.insertion_order.push(order.id());
        state.orders.insert(order.id(), order.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_id(&self, id: OrderId) -> OrderRepositoryResult<Option<Order>> {
        let state = self.read()?;
        Ok(state.orders.get(&id).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalOrderId,
    ) -> OrderRepositoryResult<Option<Order>> {
        let state = self.read()?;
        Ok(state
            .external_index
            .get(external_id)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn update(&self, order: &Order, expected: OrderVersion) -> OrderRepositoryResult<()> {
        let mut state = self.write()?;
        check_version(&state, order, expected)?;
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn record_call(
        &self,
        order: &Order,
        expected: OrderVersion,
        call_log: &CallLog,
    ) -> OrderRepositoryResult<()> {
        let mut state = self.write()?;
        check_version(&state, order, expected)?;
        state.orders.insert(order.id(), order.clone());
        state.call_logs.push(call_log.clone());
        Ok(())
    }

    async fn assign_pending(
        &self,
        map: &AssignmentMap,
        assigned_at: DateTime<Utc>,
    ) -> OrderRepositoryResult<Vec<Order>> {
        let mut state = self.write()?;
        let candidates: Vec<OrderId> = state.insertion_order.clone();
        let mut assigned = Vec::new();
        for id in candidates {
            let Some(order) = state.orders.get_mut(&id) else {
                continue;
            };
            if order.status() != OrderStatus::Pending {
                continue;
            }
            let Some(agent_id) = order.store_id().and_then(|store| map.agent_for(store)) else {
                continue;
            };
            order
                .assign(agent_id, assigned_at)
                .map_err(OrderRepositoryError::invalid_persisted_data)?;
            assigned.push(order.clone());
        }
        Ok(assigned)
    }

    async fn queue_for_agent(&self, agent_id: AgentId) -> OrderRepositoryResult<Vec<Order>> {
        let state = self.read()?;
        let mut queue: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.assigned_to() == Some(agent_id))
            .filter(|order| {
                matches!(order.status(), OrderStatus::Assigned | OrderStatus::Calling)
            })
            .cloned()
            .collect();
        by_creation(&mut queue);
        Ok(queue)
    }

    async fn call_logs_for_order(&self, order_id: OrderId) -> OrderRepositoryResult<Vec<CallLog>> {
        let state = self.read()?;
        Ok(state
            .call_logs
            .iter()
            .rev()
            .filter(|log| log.order_id() == order_id)
            .cloned()
            .collect())
    }

    async fn call_logs_for_agent(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> OrderRepositoryResult<Vec<CallLog>> {
        let state = self.read()?;
        Ok(state
            .call_logs
            .iter()
            .rev()
            .filter(|log| log.agent_id() == agent_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_by_status(&self) -> OrderRepositoryResult<StatusCounts> {
        let state = self.read()?;
        let mut counts = StatusCounts::default();
        for order in state.orders.values() {
            counts.add(order.status(), 1);
        }
        Ok(counts)
    }

    async fn purge_all(&self) -> OrderRepositoryResult<u64> {
        let mut state = self.write()?;
        let removed = u64::try_from(state.orders.len()).unwrap_or(u64::MAX);
        *state = InMemoryOrderState::default();
        Ok(removed)
    }
}
