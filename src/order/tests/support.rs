//! Shared wiring for service tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;

use crate::order::{
    adapters::memory::{
        InMemoryAssignmentRepository, InMemoryOrderStore, InMemoryRoster, InMemorySourceClient,
    },
    domain::{
        Agent, AgentPin, ContactEdit, ExternalOrderId, Order, OrderSource, SourceRecord, Store,
        StoreName, SyncTag,
    },
    ports::{OrderRepository, RosterRepository, SourceClient, SourceClientResult},
    services::{
        AssignmentPlanner, DispositionService, EditService, IngestionBatch, IngestionReport,
        IngestionService, OutboundSyncGateway, QueueService, StoreBindings,
    },
};

pub(super) type TestIngestion =
    IngestionService<InMemoryOrderStore, InMemoryRoster, InMemoryAssignmentRepository, DefaultClock>;
pub(super) type TestPlanner =
    AssignmentPlanner<InMemoryOrderStore, InMemoryAssignmentRepository, DefaultClock>;

pub(super) const SYNC_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds a record with the fields ingestion requires.
pub(super) fn record(external_id: &str, phone: &str) -> SourceRecord {
    SourceRecord {
        external_id: external_id.to_owned(),
        customer_name: "Asha Rao".to_owned(),
        phone: phone.to_owned(),
        address: "12 MG Road, Pune".to_owned(),
        postal_code: "411001".to_owned(),
        product_name: "Steel Bottle".to_owned(),
        price: "499".to_owned(),
        quantity: "1".to_owned(),
        ..SourceRecord::default()
    }
}

/// Source client whose pushes take longer than any test timeout.
pub(super) struct SlowSourceClient;

#[async_trait]
impl SourceClient for SlowSourceClient {
    async fn fetch_orders(&self, _since_days: u32) -> SourceClientResult<Vec<SourceRecord>> {
        Ok(Vec::new())
    }

    async fn fetch_abandoned_carts(
        &self,
        _since_days: u32,
    ) -> SourceClientResult<Vec<SourceRecord>> {
        Ok(Vec::new())
    }

    async fn update_customer_info(
        &self,
        _external_id: &ExternalOrderId,
        _edit: &ContactEdit,
    ) -> SourceClientResult<()> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    async fn add_tags(
        &self,
        _external_id: &ExternalOrderId,
        _tags: &[SyncTag],
    ) -> SourceClientResult<()> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

/// In-memory adapters plus one registered store ("Store1") and agent
/// ("Agent7"), with a scripted source client bound to the store.
pub(super) struct Harness {
    pub orders: Arc<InMemoryOrderStore>,
    pub roster: Arc<InMemoryRoster>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub clock: Arc<DefaultClock>,
    pub source: InMemorySourceClient,
    pub store: Store,
    pub agent: Agent,
}

impl Harness {
    pub(super) async fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let roster = Arc::new(InMemoryRoster::new());
        let store = Store::new(
            StoreName::new("Store1").expect("valid store name"),
            "store-1",
            &*clock,
        );
        let agent = Agent::new(
            "Agent7",
            AgentPin::new("7777").expect("valid pin"),
            &*clock,
        )
        .expect("valid agent");
        roster
            .register_store(&store)
            .await
            .expect("store registration should succeed");
        roster
            .register_agent(&agent)
            .await
            .expect("agent registration should succeed");

        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            roster,
            assignments: Arc::new(InMemoryAssignmentRepository::new()),
            clock,
            source: InMemorySourceClient::new(),
            store,
            agent,
        }
    }

    pub(super) fn bindings(&self) -> StoreBindings {
        let client: Arc<dyn SourceClient> = Arc::new(self.source.clone());
        StoreBindings::new().with_client(self.store.id(), client)
    }

    pub(super) fn gateway(&self) -> Arc<OutboundSyncGateway> {
        Arc::new(OutboundSyncGateway::new(self.bindings(), SYNC_TIMEOUT))
    }

    pub(super) fn ingestion(&self) -> TestIngestion {
        IngestionService::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.roster),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
        .with_bindings(self.bindings())
    }

    pub(super) fn planner(&self) -> TestPlanner {
        AssignmentPlanner::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
    }

    pub(super) fn dispositions(&self) -> DispositionService<InMemoryOrderStore, DefaultClock> {
        DispositionService::new(
            Arc::clone(&self.orders),
            self.gateway(),
            Arc::clone(&self.clock),
        )
    }

    pub(super) fn edits(&self) -> EditService<InMemoryOrderStore, DefaultClock> {
        EditService::new(
            Arc::clone(&self.orders),
            self.gateway(),
            Arc::clone(&self.clock),
        )
    }

    pub(super) fn queue(&self) -> QueueService<InMemoryOrderStore> {
        QueueService::new(Arc::clone(&self.orders))
    }

    /// Ingests records with no default store; they resolve to Store1.
    pub(super) async fn ingest(&self, records: Vec<SourceRecord>) -> IngestionReport {
        self.ingestion()
            .ingest(IngestionBatch::new(records, OrderSource::StorefrontOrder))
            .await
            .expect("ingestion should succeed")
    }

    /// Assigns Store1 to Agent7 for today.
    pub(super) async fn assign_today(&self) {
        self.planner()
            .assign_store(self.store.id(), self.agent.id(), None)
            .await
            .expect("assignment should succeed");
    }

    /// Returns an order already assigned to Agent7.
    pub(super) async fn assigned_order(&self, external_id: &str) -> Order {
        self.assign_today().await;
        self.ingest(vec![record(external_id, "9876543210")]).await;
        let order = self.order(external_id).await;
        assert_eq!(order.assigned_to(), Some(self.agent.id()));
        order
    }

    pub(super) async fn order(&self, external_id: &str) -> Order {
        let id = ExternalOrderId::new(external_id).expect("valid external id");
        self.orders
            .find_by_external_id(&id)
            .await
            .expect("lookup should succeed")
            .expect("order should exist")
    }

    pub(super) async fn call_log_count(&self, order: &Order) -> usize {
        self.orders
            .call_logs_for_order(order.id())
            .await
            .expect("call log lookup should succeed")
            .len()
    }
}
