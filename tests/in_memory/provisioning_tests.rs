//! Configuration-driven store provisioning.

use std::sync::Arc;

use codline::config::{build_store_bindings, load_config_from_str};
use codline::order::{
    domain::{OrderSource, Store},
    services::{IngestionBatch, IngestionService},
};
use rstest::rstest;

use super::helpers::{BoxError, CallCenter, call_center, storefront_record};

const CONFIG: &str = r#"
[ingestion]
default_store = "Home Decor"
preview_limit = 1

[[stores]]
name = "Kitchen Hub"
handle = "kitchen-hub"
kind = "shopify"
shop_name = "kitchen-hub"
access_token = "shpat_test"

[[stores]]
name = "Home Decor"
handle = "home-decor"
kind = "shiprocket"
email = "ops@example.com"
password = "secret"
"#;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_stores_are_registered_and_bound(
    #[from(call_center)] center: CallCenter,
) -> Result<(), BoxError> {
    let config = load_config_from_str(CONFIG)?;
    let roster = center.roster_service();

    let stores = roster.ensure_stores(&config.store_specs()).await?;
    let again = roster.ensure_stores(&config.store_specs()).await?;
    let bindings = build_store_bindings(&config, &stores)?;

    assert_eq!(stores, again);
    assert_eq!(bindings.len(), 2);
    assert!(stores.iter().all(|store| bindings.client_for(store.id()).is_some()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_stores_stay_unbound(
    #[from(call_center)] center: CallCenter,
) -> Result<(), BoxError> {
    let config = load_config_from_str(CONFIG)?;
    let specs = config.store_specs();
    let kitchen_only = specs.get(..1).ok_or("config should name a store")?;

    let stores = center.roster_service().ensure_stores(kitchen_only).await?;
    let bindings = build_store_bindings(&config, &stores)?;

    assert_eq!(bindings.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_default_store_catches_unlabelled_orders(
    #[from(call_center)] center: CallCenter,
) -> Result<(), BoxError> {
    let config = load_config_from_str(CONFIG)?;
    let stores = center
        .roster_service()
        .ensure_stores(&config.store_specs())
        .await?;
    let default_name = config
        .ingestion
        .default_store
        .as_deref()
        .ok_or("default store should be configured")?;
    let default_store = stores
        .iter()
        .find(|store| store.name().as_str() == default_name)
        .map(Store::id);
    let ingestion = IngestionService::new(
        Arc::clone(&center.orders),
        Arc::clone(&center.roster),
        Arc::clone(&center.assignments),
        Arc::clone(&center.clock),
    )
    .with_default_store(default_store)
    .with_preview_limit(config.ingestion.preview_limit);

    let report = ingestion
        .ingest(IngestionBatch::new(
            vec![
                storefront_record("PV-1", "9876543210", "Marketplace"),
                storefront_record("PV-2", "9876543211", "Kitchen Hub"),
            ],
            OrderSource::StorefrontOrder,
        ))
        .await?;

    assert_eq!(report.imported, 2);
    assert_eq!(report.preview.len(), 1);
    let unlabelled = report.preview.first().ok_or("preview should list PV-1")?;
    assert_eq!(unlabelled.external_id().as_str(), "PV-1");
    assert_eq!(unlabelled.store_id(), default_store);
    Ok(())
}
