//! Repository port for order and call log persistence.

use crate::order::domain::{
    AgentId, AssignmentMap, CallLog, ExternalOrderId, Order, OrderId, OrderStatus, OrderVersion,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for order repository operations.
pub type OrderRepositoryResult<T> = Result<T, OrderRepositoryError>;

/// Result of inserting an order keyed by external identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// A row with the same external identifier already exists; nothing
    /// changed.
    Duplicate,
}

/// Number of orders in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Orders waiting for an agent.
    pub pending: u64,
    /// Orders in agent queues.
    pub assigned: u64,
    /// Orders currently being called.
    pub calling: u64,
    /// Confirmed orders.
    pub confirmed: u64,
    /// Cancelled orders.
    pub cancelled: u64,
}

impl StatusCounts {
    /// Adds `count` orders to the bucket for `status`.
    pub const fn add(&mut self, status: OrderStatus, count: u64) {
        let bucket = match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Assigned => &mut self.assigned,
            OrderStatus::Calling => &mut self.calling,
            OrderStatus::Confirmed => &mut self.confirmed,
            OrderStatus::Cancelled => &mut self.cancelled,
        };
        *bucket = bucket.saturating_add(count);
    }

    /// Returns the total number of orders.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pending
            .saturating_add(self.assigned)
            .saturating_add(self.calling)
            .saturating_add(self.confirmed)
            .saturating_add(self.cancelled)
    }
}

/// Order persistence contract.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order unless its external identifier is already known.
    ///
    /// An existing order is never overwritten, whatever its status.
    async fn insert_if_absent(&self, order: &Order) -> OrderRepositoryResult<InsertOutcome>;

    /// Finds an order by internal identifier.
    async fn find_by_id(&self, id: OrderId) -> OrderRepositoryResult<Option<Order>>;

    /// Finds an order by source-assigned identifier.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalOrderId,
    ) -> OrderRepositoryResult<Option<Order>>;

    /// Persists changes to an existing order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderRepositoryError::NotFound`] when the order does not
    /// exist and [`OrderRepositoryError::VersionConflict`] when the stored
    /// revision is not `expected`.
    async fn update(&self, order: &Order, expected: OrderVersion) -> OrderRepositoryResult<()>;

    /// Persists an order change and appends its call log atomically.
    ///
    /// # Errors
    ///
    /// Same as [`OrderRepository::update`]; on error neither the order nor
    /// the call log is written.
    async fn record_call(
        &self,
        order: &Order,
        expected: OrderVersion,
        call_log: &CallLog,
    ) -> OrderRepositoryResult<()>;

    /// Assigns every pending order whose store appears in `map`.
    ///
    /// Selection and update happen in one atomic step so concurrent runs never
    /// assign an order twice. Returns the orders that were assigned.
    async fn assign_pending(
        &self,
        map: &AssignmentMap,
        assigned_at: DateTime<Utc>,
    ) -> OrderRepositoryResult<Vec<Order>>;

    /// Returns the agent's assigned and in-call orders, oldest `created_at`
    /// first.
    async fn queue_for_agent(&self, agent_id: AgentId) -> OrderRepositoryResult<Vec<Order>>;

    /// Returns the call logs for an order, newest first.
    async fn call_logs_for_order(&self, order_id: OrderId) -> OrderRepositoryResult<Vec<CallLog>>;

    /// Returns up to `limit` of an agent's most recent call logs.
    async fn call_logs_for_agent(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> OrderRepositoryResult<Vec<CallLog>>;

    /// Counts orders per status.
    async fn count_by_status(&self) -> OrderRepositoryResult<StatusCounts>;

    /// Deletes every order and call log. Returns the number of orders removed.
    async fn purge_all(&self) -> OrderRepositoryResult<u64>;
}

/// Errors returned by order repository implementations.
#[derive(Debug, Clone, Error)]
pub enum OrderRepositoryError {
    /// The order was not found.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The order changed since it was read.
    #[error("order {order_id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        /// Order identifier.
        order_id: OrderId,
        /// Revision the caller read.
        expected: OrderVersion,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted order data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl OrderRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
