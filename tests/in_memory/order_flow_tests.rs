//! End-to-end order lifecycle over in-memory adapters.

use codline::order::{
    adapters::memory::RecordedPush,
    domain::{DispositionCode, OrderSource, OrderStatus, SyncTag},
    services::{EditOrderRequest, IngestionBatch, RecordDispositionRequest},
};
use rstest::rstest;

use super::helpers::{BoxError, CallCenter, call_center, storefront_record};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn orders_flow_from_ingestion_to_settlement(
    #[from(call_center)] mut center: CallCenter,
) -> Result<(), BoxError> {
    let kitchen = center.open_store("Kitchen Hub").await?;
    let decor = center.open_store("Home Decor").await?;
    let meera = center.hire("Meera", "4321").await?;
    let kabir = center.hire("Kabir", "5678").await?;
    let planner = center.planner();
    planner.assign_store(kitchen.id(), meera.id(), None).await?;
    planner.assign_store(decor.id(), kabir.id(), None).await?;

    let report = center
        .ingestion()
        .ingest(IngestionBatch::new(
            vec![
                storefront_record("KH-1", "9876543210", "Kitchen Hub"),
                storefront_record("HD-1", "9876543211", "home decor"),
                storefront_record("HD-2", "9876543212", "HOME DECOR"),
            ],
            OrderSource::StorefrontOrder,
        ))
        .await?;

    assert_eq!(report.imported, 3);
    let distribution = report.distribution.ok_or("distribution should run")?;
    assert_eq!(distribution.distributed, 3);
    assert_eq!(distribution.per_agent.get(&meera.id()), Some(&1));
    assert_eq!(distribution.per_agent.get(&kabir.id()), Some(&2));

    let queue = center.queue();
    let kabir_queue = queue.queue_for_agent(kabir.id()).await?;
    let ids: Vec<&str> = kabir_queue
        .iter()
        .map(|order| order.external_id().as_str())
        .collect();
    assert_eq!(ids, vec!["HD-1", "HD-2"]);

    let dispositions = center.dispositions();
    let retry = dispositions
        .record_disposition(RecordDispositionRequest::new(
            "HD-1",
            "Not Received",
            kabir.id(),
        ))
        .await?;
    assert_eq!(retry.order.status(), OrderStatus::Assigned);

    center
        .edits()
        .edit_order(EditOrderRequest::new(
            "HD-1",
            "Kavya I.",
            "9123456789",
            "9 Church Street, Bengaluru",
            "560001",
        ))
        .await?;

    let confirmed = dispositions
        .record_disposition(
            RecordDispositionRequest::new("HD-1", "Confirm on Call", kabir.id())
                .with_notes("address checked"),
        )
        .await?;
    assert_eq!(confirmed.order.status(), OrderStatus::Confirmed);
    assert_eq!(confirmed.order.attempts(), 2);
    assert_eq!(confirmed.call_log.phone_dialed(), "9123456789");

    let history = queue.call_history("HD-1").await?;
    let codes: Vec<DispositionCode> = history.iter().map(|log| log.disposition()).collect();
    assert_eq!(
        codes,
        vec![DispositionCode::ConfirmOnCall, DispositionCode::NotReceived]
    );

    let remaining = queue.queue_for_agent(kabir.id()).await?;
    assert_eq!(remaining.len(), 1);

    let counts = queue.status_counts().await?;
    assert_eq!(counts.assigned, 2);
    assert_eq!(counts.confirmed, 1);
    assert_eq!(counts.total(), 3);

    let tags: Vec<Vec<SyncTag>> = center
        .source
        .pushes()
        .into_iter()
        .filter_map(|push| match push {
            RecordedPush::Tags { tags, .. } => Some(tags),
            RecordedPush::CustomerInfo { .. } => None,
        })
        .collect();
    assert_eq!(tags, vec![vec![SyncTag::Retry], vec![SyncTag::Confirmed]]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn orders_wait_until_their_store_is_staffed(
    #[from(call_center)] mut center: CallCenter,
) -> Result<(), BoxError> {
    let kitchen = center.open_store("Kitchen Hub").await?;
    let meera = center.hire("Meera", "4321").await?;

    let report = center
        .ingestion()
        .ingest(IngestionBatch::new(
            vec![storefront_record("KH-9", "9876543210", "Kitchen Hub")],
            OrderSource::AbandonedCart,
        ))
        .await?;
    let distribution = report.distribution.ok_or("distribution should run")?;
    assert_eq!(distribution.distributed, 0);
    assert_eq!(distribution.remaining_pending, 1);

    center
        .planner()
        .assign_store(kitchen.id(), meera.id(), None)
        .await?;
    let later = center.planner().distribute().await?;

    assert_eq!(later.distributed, 1);
    assert_eq!(later.remaining_pending, 0);
    let queue = center.queue().queue_for_agent(meera.id()).await?;
    let order = queue.first().ok_or("order should be queued")?;
    assert_eq!(order.source(), OrderSource::AbandonedCart);
    assert_eq!(order.store_id(), Some(kitchen.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn source_pull_feeds_the_queue(
    #[from(call_center)] mut center: CallCenter,
) -> Result<(), BoxError> {
    let kitchen = center.open_store("Kitchen Hub").await?;
    let meera = center.hire("Meera", "4321").await?;
    center
        .planner()
        .assign_store(kitchen.id(), meera.id(), None)
        .await?;
    center.source.set_orders(vec![
        storefront_record("KH-20", "9876543210", ""),
        storefront_record("KH-21", "", ""),
    ]);
    center
        .source
        .set_carts(vec![storefront_record("KH-22", "9876543212", "")]);

    let report = center.ingestion().pull_from_sources(10).await?;

    assert_eq!(report.total, 3);
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);
    let queue = center.queue().queue_for_agent(meera.id()).await?;
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|order| order.store_id() == Some(kitchen.id())));
    Ok(())
}
