//! Shared world state for order lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use codline::order::{
    adapters::memory::{
        InMemoryAssignmentRepository, InMemoryOrderStore, InMemoryRoster, InMemorySourceClient,
    },
    domain::{Agent, ExternalOrderId, Order, Store},
    ports::{OrderRepository, SourceClient},
    services::{
        AssignmentPlanner, DispositionError, DispositionReceipt, DispositionService, EditError,
        EditReceipt, EditService, IngestionService, OutboundSyncGateway, StoreBindings,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Ingestion service type used by the BDD world.
pub type TestIngestion =
    IngestionService<InMemoryOrderStore, InMemoryRoster, InMemoryAssignmentRepository, DefaultClock>;

/// Scenario world for order lifecycle behaviour tests.
pub struct OrderLifecycleWorld {
    pub orders: Arc<InMemoryOrderStore>,
    pub roster: Arc<InMemoryRoster>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub clock: Arc<DefaultClock>,
    pub source: InMemorySourceClient,
    pub bindings: StoreBindings,
    pub stores: HashMap<String, Store>,
    pub agents: HashMap<String, Agent>,
    pub last_disposition: Option<Result<DispositionReceipt, DispositionError>>,
    pub last_edit: Option<Result<EditReceipt, EditError>>,
}

impl OrderLifecycleWorld {
    /// Creates a world with empty adapters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            roster: Arc::new(InMemoryRoster::new()),
            assignments: Arc::new(InMemoryAssignmentRepository::new()),
            clock: Arc::new(DefaultClock),
            source: InMemorySourceClient::new(),
            bindings: StoreBindings::new(),
            stores: HashMap::new(),
            agents: HashMap::new(),
            last_disposition: None,
            last_edit: None,
        }
    }

    /// Binds the scripted source client to `store`.
    pub fn bind_source(&mut self, store: &Store) {
        let client: Arc<dyn SourceClient> = Arc::new(self.source.clone());
        self.bindings.bind(store.id(), client);
    }

    /// Builds an ingestion service over the world's adapters.
    #[must_use]
    pub fn ingestion(&self) -> TestIngestion {
        IngestionService::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.roster),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
        .with_bindings(self.bindings.clone())
    }

    /// Builds an assignment planner over the world's adapters.
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

    fn gateway(&self) -> Arc<OutboundSyncGateway> {
        Arc::new(OutboundSyncGateway::new(self.bindings.clone(), Duration::from_secs(2)))
    }

    /// Builds a disposition service over the world's adapters.
    #[must_use]
    pub fn dispositions(&self) -> DispositionService<InMemoryOrderStore, DefaultClock> {
        DispositionService::new(
            Arc::clone(&self.orders),
            self.gateway(),
            Arc::clone(&self.clock),
        )
    }

    /// Builds an edit service over the world's adapters.
    #[must_use]
    pub fn edits(&self) -> EditService<InMemoryOrderStore, DefaultClock> {
        EditService::new(
            Arc::clone(&self.orders),
            self.gateway(),
            Arc::clone(&self.clock),
        )
    }

    /// Returns the agent registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when no such agent was registered.
    pub fn agent(&self, name: &str) -> Result<&Agent, eyre::Report> {
        self.agents
            .get(name)
            .ok_or_else(|| eyre::eyre!("agent {name} is not in the scenario world"))
    }

    /// Returns the store registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when no such store was registered.
    pub fn store(&self, name: &str) -> Result<&Store, eyre::Report> {
        self.stores
            .get(name)
            .ok_or_else(|| eyre::eyre!("store {name} is not in the scenario world"))
    }

    /// Loads the stored order with `external_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails or the order is missing.
    pub fn order(&self, external_id: &str) -> Result<Order, eyre::Report> {
        let id = ExternalOrderId::new(external_id)?;
        run_async(self.orders.find_by_external_id(&id))?
            .ok_or_else(|| eyre::eyre!("order {external_id} is not stored"))
    }
}

impl Default for OrderLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrderLifecycleWorld {
    OrderLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
