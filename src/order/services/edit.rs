//! Service layer for agent corrections to customer contact details.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::info;

use super::sync::{OutboundSyncGateway, SyncChange, SyncIntent, stamp_synced};
use crate::order::{
    domain::{ContactEdit, ExternalOrderId, Order, OrderDomainError},
    ports::{OrderRepository, OrderRepositoryError},
};

/// Request payload for correcting an order's contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOrderRequest {
    external_id: String,
    customer_name: String,
    phone: String,
    address: String,
    postal_code: String,
}

impl EditOrderRequest {
    /// Creates an edit request; every field is required.
    #[must_use]
    pub fn new(
        external_id: impl Into<String>,
        customer_name: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            customer_name: customer_name.into(),
            phone: phone.into(),
            address: address.into(),
            postal_code: postal_code.into(),
        }
    }
}

/// Result of an accepted edit.
#[derive(Debug, Clone)]
pub struct EditReceipt {
    /// Order carrying the corrected details.
    pub order: Order,
    /// Whether the source system accepted the correction.
    pub synced: bool,
}

/// Service-level errors for edit operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// Field validation failed.
    #[error(transparent)]
    Domain(#[from] OrderDomainError),
    /// No order has the given external identifier.
    #[error("order not found: {0}")]
    OrderNotFound(ExternalOrderId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] OrderRepositoryError),
}

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// Stores contact corrections and pushes them to the source system.
#[derive(Clone)]
pub struct EditService<O, C>
where
    O: OrderRepository,
    C: Clock + Send + Sync,
{
    orders: Arc<O>,
    gateway: Arc<OutboundSyncGateway>,
    clock: Arc<C>,
}

impl<O, C> EditService<O, C>
where
    O: OrderRepository,
    C: Clock + Send + Sync,
{
    /// Creates an edit service.
    #[must_use]
    pub const fn new(orders: Arc<O>, gateway: Arc<OutboundSyncGateway>, clock: Arc<C>) -> Self {
        Self {
            orders,
            gateway,
            clock,
        }
    }

    /// Validates and stores corrected contact details.
    ///
    /// Over-long text is truncated; the phone must hold 10 to 15 digits. The
    /// original ingested values are kept. The correction is then pushed to
    /// the source system; a failed push never undoes the edit.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Domain`] for missing fields or a bad phone,
    /// before anything is read or written, [`EditError::OrderNotFound`] for
    /// unknown orders, and [`EditError::Repository`] when the update fails.
    pub async fn edit_order(&self, request: EditOrderRequest) -> EditResult<EditReceipt> {
        let edit = ContactEdit::new(
            &request.customer_name,
            &request.phone,
            &request.address,
            &request.postal_code,
        )?;
        let external_id = ExternalOrderId::new(request.external_id)?;
        let mut order = self
            .orders
            .find_by_external_id(&external_id)
            .await?
            .ok_or(EditError::OrderNotFound(external_id))?;

        let expected = order.version();
        order.apply_edit(edit.clone(), &*self.clock);
        self.orders.update(&order, expected).await?;
        info!(order = %order.external_id(), "contact details edited");

        let intent = SyncIntent {
            order_id: order.id(),
            external_id: order.external_id().clone(),
            store_id: order.store_id(),
            change: SyncChange::Contact(edit),
        };
        let synced = self.gateway.push(&intent).await.is_synced();
        if synced {
            stamp_synced(&*self.orders, &mut order, &*self.clock).await;
        }

        Ok(EditReceipt { order, synced })
    }
}
