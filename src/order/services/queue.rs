//! Read-side operations for agent queues and dashboards.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::order::{
    domain::{AgentId, CallLog, ExternalOrderId, Order, OrderDomainError},
    ports::{OrderRepository, OrderRepositoryError, StatusCounts},
};

/// Upper bound on call logs returned by [`QueueService::agent_calls`].
pub const MAX_AGENT_CALLS: usize = 500;

/// Service-level errors for queue reads.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The external identifier was blank.
    #[error(transparent)]
    Domain(#[from] OrderDomainError),
    /// No order has the given external identifier.
    #[error("order not found: {0}")]
    OrderNotFound(ExternalOrderId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] OrderRepositoryError),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Queue, history, and administrative reads over the order store.
#[derive(Clone)]
pub struct QueueService<O>
where
    O: OrderRepository,
{
    orders: Arc<O>,
}

impl<O> QueueService<O>
where
    O: OrderRepository,
{
    /// Creates a queue service.
    #[must_use]
    pub const fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }

    /// Returns the orders an agent should call, oldest order first.
    ///
    /// Orders are ranked by when they were ingested, not when they reached
    /// the agent, so a late-assigned older order still comes first.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Repository`] when the read fails.
    pub async fn queue_for_agent(&self, agent_id: AgentId) -> QueueResult<Vec<Order>> {
        Ok(self.orders.queue_for_agent(agent_id).await?)
    }

    /// Returns every call attempt made against an order, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::OrderNotFound`] for unknown orders.
    pub async fn call_history(&self, external_id: &str) -> QueueResult<Vec<CallLog>> {
        let id = ExternalOrderId::new(external_id)?;
        let order = self
            .orders
            .find_by_external_id(&id)
            .await?
            .ok_or(QueueError::OrderNotFound(id))?;
        Ok(self.orders.call_logs_for_order(order.id()).await?)
    }

    /// Returns an agent's most recent calls, capped at [`MAX_AGENT_CALLS`].
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Repository`] when the read fails.
    pub async fn agent_calls(&self, agent_id: AgentId, limit: usize) -> QueueResult<Vec<CallLog>> {
        let bounded = limit.min(MAX_AGENT_CALLS);
        Ok(self.orders.call_logs_for_agent(agent_id, bounded).await?)
    }

    /// Returns the number of orders in each status.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Repository`] when the read fails.
    pub async fn status_counts(&self) -> QueueResult<StatusCounts> {
        Ok(self.orders.count_by_status().await?)
    }

    /// Deletes every order and call log. Returns the number of orders
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Repository`] when the purge fails; nothing is
    /// deleted in that case.
    pub async fn bulk_reset(&self) -> QueueResult<u64> {
        let removed = self.orders.purge_all().await?;
        warn!(removed, "all orders and call logs deleted");
        Ok(removed)
    }
}
