//! Services wired over the `PostgreSQL` adapters.

use std::sync::Arc;
use std::time::Duration;

use codline::order::{
    adapters::{
        memory::InMemorySourceClient,
        postgres::{PostgresAssignmentRepository, PostgresOrderRepository, PostgresRosterRepository},
    },
    domain::{OrderSource, OrderStatus, SourceRecord},
    ports::SourceClient,
    services::{
        AssignmentPlanner, DispositionService, IngestionBatch, IngestionService,
        OutboundSyncGateway, QueueService, RecordDispositionRequest, RosterService,
        StoreBindings, StoreSpec,
    },
};
use mockable::DefaultClock;
use rstest::rstest;

use super::helpers::{BoxError, TestDatabase, test_database};

fn record(external_id: &str) -> SourceRecord {
    SourceRecord {
        external_id: external_id.to_owned(),
        customer_name: "Asha Rao".to_owned(),
        phone: "9876543210".to_owned(),
        address: "12 MG Road, Pune".to_owned(),
        postal_code: "411001".to_owned(),
        product_name: "Steel Bottle".to_owned(),
        price: "499".to_owned(),
        quantity: "1".to_owned(),
        ..SourceRecord::default()
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn orders_are_ingested_distributed_and_settled(
    test_database: Result<TestDatabase, BoxError>,
) -> Result<(), BoxError> {
    let db = test_database?;
    let orders: Arc<PostgresOrderRepository> = Arc::new(db.orders());
    let roster: Arc<PostgresRosterRepository> = Arc::new(db.roster());
    let assignments: Arc<PostgresAssignmentRepository> = Arc::new(db.assignments());
    let clock = Arc::new(DefaultClock);
    let source = InMemorySourceClient::new();

    let roster_service = RosterService::new(Arc::clone(&roster), Arc::clone(&clock));
    let stores = roster_service
        .ensure_stores(&[StoreSpec::new("Store1", "store-1")])
        .await?;
    let store = stores.first().ok_or("store should be registered")?;
    let agent = roster_service.register_agent("Agent7", "7777").await?;
    let client: Arc<dyn SourceClient> = Arc::new(source.clone());
    let bindings = StoreBindings::new().with_client(store.id(), client);

    AssignmentPlanner::new(
        Arc::clone(&orders),
        Arc::clone(&assignments),
        Arc::clone(&clock),
    )
    .assign_store(store.id(), agent.id(), None)
    .await?;
    let ingestion = IngestionService::new(
        Arc::clone(&orders),
        Arc::clone(&roster),
        Arc::clone(&assignments),
        Arc::clone(&clock),
    );
    let report = ingestion
        .ingest(IngestionBatch::new(
            vec![record("EXT-101"), record("EXT-101"), record("EXT-102")],
            OrderSource::StorefrontOrder,
        ))
        .await?;
    assert_eq!(report.imported, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(
        report.distribution.map(|distribution| distribution.distributed),
        Some(2)
    );

    let dispositions = DispositionService::new(
        Arc::clone(&orders),
        Arc::new(OutboundSyncGateway::new(bindings, Duration::from_secs(2))),
        Arc::clone(&clock),
    );
    let receipt = dispositions
        .record_disposition(RecordDispositionRequest::new(
            "EXT-101",
            "Confirm on Call",
            agent.id(),
        ))
        .await?;
    assert_eq!(receipt.order.status(), OrderStatus::Confirmed);
    assert!(receipt.synced);

    let queue = QueueService::new(Arc::clone(&orders));
    let open = queue.queue_for_agent(agent.id()).await?;
    assert_eq!(open.len(), 1);
    assert_eq!(queue.call_history("EXT-101").await?.len(), 1);
    let counts = queue.status_counts().await?;
    assert_eq!((counts.assigned, counts.confirmed), (1, 1));
    assert_eq!(source.pushes().len(), 1);

    Ok(())
}
