//! Best-effort propagation of local changes to source systems.
//!
//! The gateway never fails its caller: missing bindings, transport errors,
//! and timeouts are logged and reported as a [`SyncOutcome`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{debug, warn};

use crate::order::{
    domain::{ContactEdit, ExternalOrderId, Order, OrderId, StoreId, SyncTag},
    ports::{OrderRepository, SourceClient, SourceClientError},
};

/// Source clients resolved per store at startup.
#[derive(Clone, Default)]
pub struct StoreBindings {
    clients: HashMap<StoreId, Arc<dyn SourceClient>>,
}

impl StoreBindings {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `client` to `store_id`, replacing any earlier binding.
    #[must_use]
    pub fn with_client(mut self, store_id: StoreId, client: Arc<dyn SourceClient>) -> Self {
        self.bind(store_id, client);
        self
    }

    /// Binds `client` to `store_id`, replacing any earlier binding.
    pub fn bind(&mut self, store_id: StoreId, client: Arc<dyn SourceClient>) {
        self.clients.insert(store_id, client);
    }

    /// Returns the client bound to `store_id`.
    #[must_use]
    pub fn client_for(&self, store_id: StoreId) -> Option<Arc<dyn SourceClient>> {
        self.clients.get(&store_id).cloned()
    }

    /// Iterates over every binding.
    pub fn iter(&self) -> impl Iterator<Item = (StoreId, &Arc<dyn SourceClient>)> {
        self.clients.iter().map(|(store_id, client)| (*store_id, client))
    }

    /// Returns the number of bound stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns whether no store is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl fmt::Debug for StoreBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBindings")
            .field("stores", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Change to push to a source system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncChange {
    /// Append an outcome tag.
    Tag(SyncTag),
    /// Overwrite customer contact details.
    Contact(ContactEdit),
}

/// A pending push for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncIntent {
    /// Local order identifier.
    pub order_id: OrderId,
    /// Identifier the source system knows the order by.
    pub external_id: ExternalOrderId,
    /// Store whose client receives the push.
    pub store_id: Option<StoreId>,
    /// What to push.
    pub change: SyncChange,
}

impl SyncIntent {
    /// Returns the outcome tag, when the intent carries one.
    #[must_use]
    pub const fn tag(&self) -> Option<SyncTag> {
        match self.change {
            SyncChange::Tag(tag) => Some(tag),
            SyncChange::Contact(_) => None,
        }
    }
}

/// Why a push was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The order has no store.
    NoStore,
    /// No client is bound to the order's store.
    NoClient,
}

/// Result of one push attempt.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The source system accepted the change.
    Synced,
    /// No push was attempted.
    Skipped(SkipReason),
    /// The push failed; local state is unaffected.
    Failed(SourceClientError),
}

impl SyncOutcome {
    /// Returns whether the change reached the source system.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

/// Routes sync intents to the client bound to each order's store.
#[derive(Debug, Clone)]
pub struct OutboundSyncGateway {
    bindings: StoreBindings,
    timeout: Duration,
}

impl OutboundSyncGateway {
    /// Creates a gateway that waits at most `timeout` per push.
    #[must_use]
    pub const fn new(bindings: StoreBindings, timeout: Duration) -> Self {
        Self { bindings, timeout }
    }

    /// Returns the store bindings.
    #[must_use]
    pub const fn bindings(&self) -> &StoreBindings {
        &self.bindings
    }

    /// Pushes one intent, absorbing every failure.
    pub async fn push(&self, intent: &SyncIntent) -> SyncOutcome {
        let Some(store_id) = intent.store_id else {
            debug!(order = %intent.external_id, "order has no store, skipping sync");
            return SyncOutcome::Skipped(SkipReason::NoStore);
        };
        let Some(client) = self.bindings.client_for(store_id) else {
            debug!(order = %intent.external_id, store = %store_id, "no client bound, skipping sync");
            return SyncOutcome::Skipped(SkipReason::NoClient);
        };

        let call = async {
            match &intent.change {
                SyncChange::Tag(tag) => client.add_tags(&intent.external_id, &[*tag]).await,
                SyncChange::Contact(edit) => {
                    client.update_customer_info(&intent.external_id, edit).await
                }
            }
        };
        let result = tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_elapsed| Err(SourceClientError::Timeout(self.timeout.as_secs())));

        match result {
            Ok(()) => {
                debug!(order = %intent.external_id, store = %store_id, "synced to source");
                SyncOutcome::Synced
            }
            Err(err) => {
                warn!(
                    order = %intent.external_id,
                    store = %store_id,
                    error = %err,
                    "source sync failed; local change kept"
                );
                SyncOutcome::Failed(err)
            }
        }
    }
}

/// Stores the sync timestamp after a successful push.
///
/// A failure here only loses the timestamp, so it is logged and ignored.
pub(super) async fn stamp_synced<O, C>(orders: &O, order: &mut Order, clock: &C)
where
    O: OrderRepository + ?Sized,
    C: Clock,
{
    let expected = order.version();
    let mut stamped = order.clone();
    stamped.mark_synced(clock);
    match orders.update(&stamped, expected).await {
        Ok(()) => *order = stamped,
        Err(err) => {
            warn!(order = %order.external_id(), error = %err, "could not record sync time");
        }
    }
}
