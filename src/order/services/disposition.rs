//! Service layer for recording call outcomes.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::info;

use super::sync::{OutboundSyncGateway, SyncChange, SyncIntent, stamp_synced};
use crate::order::{
    domain::{
        AgentId, CallLog, CallTiming, DispositionCode, ExternalOrderId, Order, OrderDomainError,
    },
    ports::{OrderRepository, OrderRepositoryError},
};

/// Request payload for submitting a call outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDispositionRequest {
    external_id: String,
    disposition: String,
    agent_id: AgentId,
    timing: CallTiming,
    notes: String,
}

impl RecordDispositionRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        external_id: impl Into<String>,
        disposition: impl Into<String>,
        agent_id: AgentId,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            disposition: disposition.into(),
            agent_id,
            timing: CallTiming::default(),
            notes: String::new(),
        }
    }

    /// Sets the call timing reported by the agent client.
    #[must_use]
    pub const fn with_timing(mut self, timing: CallTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Sets free-text agent notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Result of an accepted disposition.
#[derive(Debug, Clone)]
pub struct DispositionReceipt {
    /// Order after the transition, including any sync stamp.
    pub order: Order,
    /// The appended call log.
    pub call_log: CallLog,
    /// Intent handed to the sync gateway.
    pub intent: SyncIntent,
    /// Whether the source system accepted the outcome tag.
    pub synced: bool,
}

/// Service-level errors for disposition operations.
#[derive(Debug, Error)]
pub enum DispositionError {
    /// Validation or lifecycle rules rejected the request.
    #[error(transparent)]
    Domain(#[from] OrderDomainError),
    /// No order has the given external identifier.
    #[error("order not found: {0}")]
    OrderNotFound(ExternalOrderId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] OrderRepositoryError),
}

/// Result type for disposition operations.
pub type DispositionResult<T> = Result<T, DispositionError>;

/// Applies call outcomes to orders and pushes outcome tags upstream.
#[derive(Clone)]
pub struct DispositionService<O, C>
where
    O: OrderRepository,
    C: Clock + Send + Sync,
{
    orders: Arc<O>,
    gateway: Arc<OutboundSyncGateway>,
    clock: Arc<C>,
}

impl<O, C> DispositionService<O, C>
where
    O: OrderRepository,
    C: Clock + Send + Sync,
{
    /// Creates a disposition service.
    #[must_use]
    pub const fn new(orders: Arc<O>, gateway: Arc<OutboundSyncGateway>, clock: Arc<C>) -> Self {
        Self {
            orders,
            gateway,
            clock,
        }
    }

    /// Marks an assigned order as being dialed.
    ///
    /// # Errors
    ///
    /// Returns [`DispositionError::OrderNotFound`] for unknown orders,
    /// [`DispositionError::Domain`] unless the order is assigned, and
    /// [`DispositionError::Repository`] when the update fails.
    pub async fn start_call(&self, external_id: &str) -> DispositionResult<Order> {
        let mut order = self.load(external_id).await?;
        let expected = order.version();
        order.begin_call(&*self.clock)?;
        self.orders.update(&order, expected).await?;
        Ok(order)
    }

    /// Records the outcome of one call attempt.
    ///
    /// The disposition code is validated before anything is read. The status
    /// change, attempt increment, and call log commit together. The outcome
    /// tag is pushed afterwards; a failed push leaves the local change in
    /// place and is reported through [`DispositionReceipt::synced`].
    ///
    /// # Errors
    ///
    /// Returns [`DispositionError::Domain`] for unknown codes and lifecycle
    /// violations, [`DispositionError::OrderNotFound`] for unknown orders,
    /// and [`DispositionError::Repository`] when the transaction fails. No
    /// state changes on error.
    pub async fn record_disposition(
        &self,
        request: RecordDispositionRequest,
    ) -> DispositionResult<DispositionReceipt> {
        let code = DispositionCode::try_from(request.disposition.as_str())?;
        let mut order = self.load(&request.external_id).await?;

        let expected = order.version();
        let outcome = order.record_disposition(code, &*self.clock)?;
        let call_log = CallLog::new(
            order.id(),
            request.agent_id,
            order.dial_phone(),
            request.timing,
            code,
            &*self.clock,
        )
        .with_notes(request.notes);
        self.orders.record_call(&order, expected, &call_log).await?;
        info!(
            order = %order.external_id(),
            agent_id = %request.agent_id,
            disposition = code.label(),
            status = %order.status(),
            attempts = order.attempts(),
            "disposition recorded"
        );

        let intent = SyncIntent {
            order_id: order.id(),
            external_id: order.external_id().clone(),
            store_id: order.store_id(),
            change: SyncChange::Tag(outcome.sync_tag()),
        };
        let synced = self.gateway.push(&intent).await.is_synced();
        if synced {
            stamp_synced(&*self.orders, &mut order, &*self.clock).await;
        }

        Ok(DispositionReceipt {
            order,
            call_log,
            intent,
            synced,
        })
    }

    async fn load(&self, external_id: &str) -> DispositionResult<Order> {
        let id = ExternalOrderId::new(external_id)?;
        self.orders
            .find_by_external_id(&id)
            .await?
            .ok_or(DispositionError::OrderNotFound(id))
    }
}
