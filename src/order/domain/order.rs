//! Order aggregate root and its status state machine.

use super::{
    AgentId, CallOutcome, ContactEdit, DispositionCode, ExternalOrderId, OrderDomainError,
    OrderId, OrderSource, OrderVersion, ParseOrderStatusError, StoreId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Ingested and waiting for an agent.
    Pending,
    /// Sitting in an agent's queue.
    Assigned,
    /// An agent is on the phone with the customer.
    Calling,
    /// Customer confirmed the order.
    Confirmed,
    /// Customer cancelled the order.
    Cancelled,
}

impl OrderStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Calling => "calling",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether no further transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }

    /// Returns whether a transition to `target` is part of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Assigned)
                | (Self::Assigned, Self::Calling)
                | (
                    Self::Assigned | Self::Calling,
                    Self::Assigned | Self::Confirmed | Self::Cancelled
                )
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = ParseOrderStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "calling" => Ok(Self::Calling),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseOrderStatusError(value.to_owned())),
        }
    }
}

/// Contact and payload fields as originally ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// Customer display name.
    pub customer_name: String,
    /// Customer phone number.
    pub phone: String,
    /// Delivery address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// Description of the ordered product.
    pub product_name: String,
    /// Unit price.
    pub unit_price: f64,
    /// Ordered quantity.
    pub quantity: u32,
    /// Timestamp reported by the source system.
    pub ordered_at: Option<DateTime<Utc>>,
}

/// Order aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    external_id: ExternalOrderId,
    store_id: Option<StoreId>,
    source: OrderSource,
    details: OrderDetails,
    edit: Option<ContactEdit>,
    edited_at: Option<DateTime<Utc>>,
    status: OrderStatus,
    final_status: Option<DispositionCode>,
    attempts: u32,
    assigned_to: Option<AgentId>,
    assigned_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    synced_at: Option<DateTime<Utc>>,
    version: OrderVersion,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted order aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedOrderData {
    /// Persisted order identifier.
    pub id: OrderId,
    /// Persisted external identifier.
    pub external_id: ExternalOrderId,
    /// Persisted store reference.
    pub store_id: Option<StoreId>,
    /// Persisted lead kind.
    pub source: OrderSource,
    /// Persisted original details.
    pub details: OrderDetails,
    /// Persisted agent correction, if any.
    pub edit: Option<ContactEdit>,
    /// Persisted correction timestamp.
    pub edited_at: Option<DateTime<Utc>>,
    /// Persisted lifecycle status.
    pub status: OrderStatus,
    /// Persisted last disposition code.
    pub final_status: Option<DispositionCode>,
    /// Persisted call attempt count.
    pub attempts: u32,
    /// Persisted assignee.
    pub assigned_to: Option<AgentId>,
    /// Persisted assignment timestamp.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted last successful source sync.
    pub synced_at: Option<DateTime<Utc>>,
    /// Persisted revision counter.
    pub version: OrderVersion,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order from normalized source data.
    #[must_use]
    pub fn ingest(
        external_id: ExternalOrderId,
        store_id: Option<StoreId>,
        source: OrderSource,
        details: OrderDetails,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: OrderId::new(),
            external_id,
            store_id,
            source,
            details,
            edit: None,
            edited_at: None,
            status: OrderStatus::Pending,
            final_status: None,
            attempts: 0,
            assigned_to: None,
            assigned_at: None,
            completed_at: None,
            synced_at: None,
            version: OrderVersion::INITIAL,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an order from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOrderData) -> Self {
        Self {
            id: data.id,
            external_id: data.external_id,
            store_id: data.store_id,
            source: data.source,
            details: data.details,
            edit: data.edit,
            edited_at: data.edited_at,
            status: data.status,
            final_status: data.final_status,
            attempts: data.attempts,
            assigned_to: data.assigned_to,
            assigned_at: data.assigned_at,
            completed_at: data.completed_at,
            synced_at: data.synced_at,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the internal identifier.
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the source-assigned identifier.
    #[must_use]
    pub const fn external_id(&self) -> &ExternalOrderId {
        &self.external_id
    }

    /// Returns the owning store, if known.
    #[must_use]
    pub const fn store_id(&self) -> Option<StoreId> {
        self.store_id
    }

    /// Returns the lead kind.
    #[must_use]
    pub const fn source(&self) -> OrderSource {
        self.source
    }

    /// Returns the details as originally ingested.
    #[must_use]
    pub const fn details(&self) -> &OrderDetails {
        &self.details
    }

    /// Returns the agent correction, if any.
    #[must_use]
    pub const fn edit(&self) -> Option<&ContactEdit> {
        self.edit.as_ref()
    }

    /// Returns when the order was last corrected.
    #[must_use]
    pub const fn edited_at(&self) -> Option<DateTime<Utc>> {
        self.edited_at
    }

    /// Returns the phone number agents should dial: the corrected one when
    /// present, otherwise the ingested one.
    #[must_use]
    pub fn dial_phone(&self) -> &str {
        self.edit
            .as_ref()
            .map_or(self.details.phone.as_str(), |edit| edit.phone().as_str())
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the most recent disposition code.
    #[must_use]
    pub const fn final_status(&self) -> Option<DispositionCode> {
        self.final_status
    }

    /// Returns the number of recorded call attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the assigned agent, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<AgentId> {
        self.assigned_to
    }

    /// Returns when the order was assigned.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns when the order reached a terminal status.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns when the order was last pushed to its source system.
    #[must_use]
    pub const fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    /// Returns the revision counter.
    #[must_use]
    pub const fn version(&self) -> OrderVersion {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Hands a pending order to an agent.
    ///
    /// The timestamp is supplied by the caller because distribution runs
    /// inside a storage transaction with one timestamp for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::InvalidStatusTransition`] unless the order
    /// is pending.
    pub fn assign(
        &mut self,
        agent_id: AgentId,
        assigned_at: DateTime<Utc>,
    ) -> Result<(), OrderDomainError> {
        self.ensure_transition(OrderStatus::Assigned)?;
        if self.status != OrderStatus::Pending {
            return Err(self.invalid_transition(OrderStatus::Assigned));
        }
        self.status = OrderStatus::Assigned;
        self.assigned_to = Some(agent_id);
        self.assigned_at = Some(assigned_at);
        self.updated_at = assigned_at;
        self.version = self.version.next();
        Ok(())
    }

    /// Marks that an agent has started dialing the customer.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::TerminalOrder`] for settled orders and
    /// [`OrderDomainError::InvalidStatusTransition`] unless the order is
    /// assigned.
    pub fn begin_call(&mut self, clock: &impl Clock) -> Result<(), OrderDomainError> {
        self.ensure_transition(OrderStatus::Calling)?;
        self.status = OrderStatus::Calling;
        self.touch(clock);
        Ok(())
    }

    /// Applies an accepted disposition.
    ///
    /// Increments the attempt counter and moves the order to the status the
    /// code's outcome maps to. Terminal outcomes stamp `completed_at`; retry
    /// outcomes return the order to its agent's queue.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::TerminalOrder`] when the order is already
    /// confirmed or cancelled and
    /// [`OrderDomainError::InvalidStatusTransition`] when it was never
    /// assigned. The order is left unchanged on error.
    pub fn record_disposition(
        &mut self,
        code: DispositionCode,
        clock: &impl Clock,
    ) -> Result<CallOutcome, OrderDomainError> {
        let outcome = code.outcome();
        self.ensure_transition(outcome.resulting_status())?;

        let timestamp = clock.utc();
        self.attempts = self.attempts.saturating_add(1);
        self.status = outcome.resulting_status();
        self.final_status = Some(code);
        if outcome.is_terminal() {
            self.completed_at = Some(timestamp);
        }
        self.updated_at = timestamp;
        self.version = self.version.next();
        Ok(outcome)
    }

    /// Stores an agent correction in the edited shadow fields.
    ///
    /// The originally ingested details are never overwritten.
    pub fn apply_edit(&mut self, edit: ContactEdit, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.edit = Some(edit);
        self.edited_at = Some(timestamp);
        self.updated_at = timestamp;
        self.version = self.version.next();
    }

    /// Records a successful push to the source system.
    pub fn mark_synced(&mut self, clock: &impl Clock) {
        self.synced_at = Some(clock.utc());
        self.touch(clock);
    }

    fn ensure_transition(&self, target: OrderStatus) -> Result<(), OrderDomainError> {
        if self.status.is_terminal() {
            return Err(OrderDomainError::TerminalOrder {
                order_id: self.external_id.clone(),
                status: self.status,
            });
        }
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(target));
        }
        Ok(())
    }

    fn invalid_transition(&self, target: OrderStatus) -> OrderDomainError {
        OrderDomainError::InvalidStatusTransition {
            order_id: self.external_id.clone(),
            from: self.status,
            to: target,
        }
    }

    /// Updates the `updated_at` timestamp and bumps the revision.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.version = self.version.next();
    }
}
