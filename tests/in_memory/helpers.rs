//! Shared wiring for in-memory order lifecycle tests.

use std::sync::Arc;
use std::time::Duration;

use codline::order::{
    adapters::memory::{
        InMemoryAssignmentRepository, InMemoryOrderStore, InMemoryRoster, InMemorySourceClient,
    },
    domain::{Agent, SourceRecord, Store},
    ports::SourceClient,
    services::{
        AssignmentPlanner, DispositionService, EditService, IngestionService,
        OutboundSyncGateway, QueueService, RosterService, StoreBindings, StoreSpec,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Boxed error used by fallible test helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Services built over one set of in-memory adapters.
pub struct CallCenter {
    pub orders: Arc<InMemoryOrderStore>,
    pub roster: Arc<InMemoryRoster>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub clock: Arc<DefaultClock>,
    pub source: InMemorySourceClient,
    pub bindings: StoreBindings,
}

/// Provides an empty call center.
#[fixture]
pub fn call_center() -> CallCenter {
    CallCenter {
        orders: Arc::new(InMemoryOrderStore::new()),
        roster: Arc::new(InMemoryRoster::new()),
        assignments: Arc::new(InMemoryAssignmentRepository::new()),
        clock: Arc::new(DefaultClock),
        source: InMemorySourceClient::new(),
        bindings: StoreBindings::new(),
    }
}

impl CallCenter {
    /// Registers a store and binds the scripted source client to it.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub async fn open_store(&mut self, name: &str) -> Result<Store, BoxError> {
        let stores = self
            .roster_service()
            .ensure_stores(&[StoreSpec::new(name, name.to_lowercase())])
            .await?;
        let store = stores.into_iter().next().ok_or("store was not returned")?;
        let client: Arc<dyn SourceClient> = Arc::new(self.source.clone());
        self.bindings.bind(store.id(), client);
        Ok(store)
    }

    /// Registers an agent.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub async fn hire(&self, name: &str, pin: &str) -> Result<Agent, BoxError> {
        Ok(self.roster_service().register_agent(name, pin).await?)
    }

    #[must_use]
    pub fn roster_service(&self) -> RosterService<InMemoryRoster, DefaultClock> {
        RosterService::new(Arc::clone(&self.roster), Arc::clone(&self.clock))
    }

    #[must_use]
    pub fn planner(
        &self,
    ) -> AssignmentPlanner<InMemoryOrderStore, InMemoryAssignmentRepository, DefaultClock> {
        AssignmentPlanner::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
    }

    #[must_use]
    pub fn ingestion(
        &self,
    ) -> IngestionService<
        InMemoryOrderStore,
        InMemoryRoster,
        InMemoryAssignmentRepository,
        DefaultClock,
    > {
        IngestionService::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.roster),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
        .with_bindings(self.bindings.clone())
    }

    fn gateway(&self) -> Arc<OutboundSyncGateway> {
        Arc::new(OutboundSyncGateway::new(self.bindings.clone(), Duration::from_secs(2)))
    }

    #[must_use]
    pub fn dispositions(&self) -> DispositionService<InMemoryOrderStore, DefaultClock> {
        DispositionService::new(
            Arc::clone(&self.orders),
            self.gateway(),
            Arc::clone(&self.clock),
        )
    }

    #[must_use]
    pub fn edits(&self) -> EditService<InMemoryOrderStore, DefaultClock> {
        EditService::new(
            Arc::clone(&self.orders),
            self.gateway(),
            Arc::clone(&self.clock),
        )
    }

    #[must_use]
    pub fn queue(&self) -> QueueService<InMemoryOrderStore> {
        QueueService::new(Arc::clone(&self.orders))
    }
}

/// Builds a storefront record for `channel`.
#[must_use]
pub fn storefront_record(external_id: &str, phone: &str, channel: &str) -> SourceRecord {
    SourceRecord {
        external_id: external_id.to_owned(),
        channel: Some(channel.to_owned()),
        customer_name: "Kavya Iyer".to_owned(),
        phone: phone.to_owned(),
        address: "4 Residency Road, Bengaluru".to_owned(),
        postal_code: "560025".to_owned(),
        product_name: "Cotton Throw".to_owned(),
        price: "899.00".to_owned(),
        quantity: "1".to_owned(),
        ordered_at: "2026-10-15T10:00:00Z".to_owned(),
        ..SourceRecord::default()
    }
}
