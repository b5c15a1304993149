//! Ingestion of source records into pending orders.

use std::io::Read;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::planner::{AssignmentPlanner, DistributionReport};
use super::sync::StoreBindings;
use crate::order::{
    adapters::spreadsheet::{SpreadsheetError, read_spreadsheet},
    domain::{
        ExternalOrderId, Order, OrderDetails, OrderDomainError, OrderSource, SourceRecord, Store,
        StoreId, parse_price, parse_quantity, parse_timestamp, resolve_store,
    },
    ports::{
        AssignmentRepository, InsertOutcome, OrderRepository, RosterRepository,
        RosterRepositoryError, SourceClientError, SourceClientResult,
    },
};

/// Number of imported orders echoed back for operator confirmation.
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

/// Service-level errors for ingestion.
///
/// Per-record problems never surface here; they are counted in the
/// [`IngestionReport`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The store roster could not be loaded.
    #[error(transparent)]
    Roster(#[from] RosterRepositoryError),
    /// The spreadsheet as a whole could not be read.
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
}

/// Result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// A batch of raw records from one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionBatch {
    records: Vec<SourceRecord>,
    default_source: OrderSource,
    default_store: Option<StoreId>,
}

impl IngestionBatch {
    /// Creates a batch whose records default to `default_source` when they
    /// do not name a lead kind.
    #[must_use]
    pub const fn new(records: Vec<SourceRecord>, default_source: OrderSource) -> Self {
        Self {
            records,
            default_source,
            default_store: None,
        }
    }

    /// Sets the store used when a record's channel matches no store name.
    #[must_use]
    pub const fn with_default_store(mut self, store_id: Option<StoreId>) -> Self {
        self.default_store = store_id;
        self
    }
}

/// Partial-success summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionReport {
    /// Records presented.
    pub total: usize,
    /// New orders written.
    pub imported: usize,
    /// Records not written: invalid input plus duplicates.
    pub skipped: usize,
    /// Records whose external identifier was already stored.
    pub duplicates: usize,
    /// Records lost to storage failures.
    pub failed: usize,
    /// The first imported orders.
    pub preview: Vec<Order>,
    /// Distribution triggered after the batch, when it succeeded.
    pub distribution: Option<DistributionReport>,
}

impl IngestionReport {
    fn merge(&mut self, other: Self, preview_limit: usize) {
        self.total = self.total.saturating_add(other.total);
        self.imported = self.imported.saturating_add(other.imported);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.duplicates = self.duplicates.saturating_add(other.duplicates);
        self.failed = self.failed.saturating_add(other.failed);
        let room = preview_limit.saturating_sub(self.preview.len());
        self.preview.extend(other.preview.into_iter().take(room));
    }
}

/// Normalizes source records into orders and distributes them.
#[derive(Clone)]
pub struct IngestionService<O, R, A, C>
where
    O: OrderRepository,
    R: RosterRepository,
    A: AssignmentRepository,
    C: Clock + Send + Sync,
{
    orders: Arc<O>,
    roster: Arc<R>,
    planner: AssignmentPlanner<O, A, C>,
    bindings: StoreBindings,
    clock: Arc<C>,
    preview_limit: usize,
    default_store: Option<StoreId>,
}

impl<O, R, A, C> IngestionService<O, R, A, C>
where
    O: OrderRepository,
    R: RosterRepository,
    A: AssignmentRepository,
    C: Clock + Send + Sync,
{
    /// Creates an ingestion service with no bound source clients.
    #[must_use]
    pub fn new(orders: Arc<O>, roster: Arc<R>, assignments: Arc<A>, clock: Arc<C>) -> Self {
        let planner = AssignmentPlanner::new(Arc::clone(&orders), assignments, Arc::clone(&clock));
        Self {
            orders,
            roster,
            planner,
            bindings: StoreBindings::new(),
            clock,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            default_store: None,
        }
    }

    /// Sets the store clients used by [`Self::pull_from_sources`].
    #[must_use]
    pub fn with_bindings(mut self, bindings: StoreBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Sets how many imported orders a report echoes back.
    #[must_use]
    pub const fn with_preview_limit(mut self, preview_limit: usize) -> Self {
        self.preview_limit = preview_limit;
        self
    }

    /// Sets the fallback store for batches that do not name one.
    #[must_use]
    pub const fn with_default_store(mut self, store_id: Option<StoreId>) -> Self {
        self.default_store = store_id;
        self
    }

    /// Returns the planner run after each batch.
    #[must_use]
    pub const fn planner(&self) -> &AssignmentPlanner<O, A, C> {
        &self.planner
    }

    /// Ingests one batch and then distributes pending orders.
    ///
    /// Records without an external identifier or phone are skipped, known
    /// external identifiers are skipped as duplicates without touching the
    /// stored order, and storage failures are counted as failed. None of
    /// these abort the batch. A failed distribution is logged and leaves
    /// [`IngestionReport::distribution`] empty.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Roster`] when the store roster cannot be
    /// loaded.
    pub async fn ingest(&self, batch: IngestionBatch) -> IngestionResult<IngestionReport> {
        let stores = self.roster.active_stores().await?;
        let mut report = self.ingest_records(batch, &stores).await;
        report.distribution = self.distribute_after_batch().await;
        Ok(report)
    }

    /// Reads a CSV payload and ingests its rows as one batch.
    ///
    /// Rows the reader cannot parse count towards both `total` and
    /// `skipped`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Spreadsheet`] when the file has no usable
    /// header and [`IngestionError::Roster`] when stores cannot be loaded.
    pub async fn import_spreadsheet(
        &self,
        input: impl Read,
        default_store: Option<StoreId>,
    ) -> IngestionResult<IngestionReport> {
        let import = read_spreadsheet(input)?;
        let batch = IngestionBatch::new(import.records, OrderSource::StorefrontOrder)
            .with_default_store(default_store);
        let mut report = self.ingest(batch).await?;
        report.total = report.total.saturating_add(import.unreadable);
        report.skipped = report.skipped.saturating_add(import.unreadable);
        Ok(report)
    }

    /// Pulls storefront orders and abandoned carts from every bound store.
    ///
    /// A feed that fails or is unsupported contributes no records. Records
    /// default to the store they were fetched from. Distribution runs once
    /// after all stores are ingested.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Roster`] when the store roster cannot be
    /// loaded.
    pub async fn pull_from_sources(&self, since_days: u32) -> IngestionResult<IngestionReport> {
        let stores = self.roster.active_stores().await?;
        let mut report = IngestionReport::default();

        for (store_id, client) in self.bindings.iter() {
            let orders = records_or_empty(client.fetch_orders(since_days).await, store_id, "orders");
            let carts = records_or_empty(
                client.fetch_abandoned_carts(since_days).await,
                store_id,
                "abandoned carts",
            );

            let order_batch = IngestionBatch::new(orders, OrderSource::StorefrontOrder)
                .with_default_store(Some(store_id));
            let order_report = self.ingest_records(order_batch, &stores).await;
            report.merge(order_report, self.preview_limit);

            let cart_batch = IngestionBatch::new(carts, OrderSource::AbandonedCart)
                .with_default_store(Some(store_id));
            let cart_report = self.ingest_records(cart_batch, &stores).await;
            report.merge(cart_report, self.preview_limit);
        }

        report.distribution = self.distribute_after_batch().await;
        info!(
            stores = self.bindings.len(),
            total = report.total,
            imported = report.imported,
            skipped = report.skipped,
            "pulled orders from sources"
        );
        Ok(report)
    }

    async fn ingest_records(&self, batch: IngestionBatch, stores: &[Store]) -> IngestionReport {
        let default_store = batch.default_store.or(self.default_store);
        let mut report = IngestionReport {
            total: batch.records.len(),
            ..IngestionReport::default()
        };

        for record in batch.records {
            let order = match normalize(
                record,
                stores,
                default_store,
                batch.default_source,
                &*self.clock,
            ) {
                Ok(order) => order,
                Err(err) => {
                    debug!(error = %err, "skipping unusable record");
                    report.skipped = report.skipped.saturating_add(1);
                    continue;
                }
            };

            match self.orders.insert_if_absent(&order).await {
                Ok(InsertOutcome::Inserted) => {
                    report.imported = report.imported.saturating_add(1);
                    if report.preview.len() < self.preview_limit {
                        report.preview.push(order);
                    }
                }
                Ok(InsertOutcome::Duplicate) => {
                    debug!(order = %order.external_id(), "order already ingested");
                    report.skipped = report.skipped.saturating_add(1);
                    report.duplicates = report.duplicates.saturating_add(1);
                }
                Err(err) => {
                    warn!(order = %order.external_id(), error = %err, "failed to store order");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        info!(
            total = report.total,
            imported = report.imported,
            skipped = report.skipped,
            duplicates = report.duplicates,
            failed = report.failed,
            "ingested batch"
        );
        report
    }

    async fn distribute_after_batch(&self) -> Option<DistributionReport> {
        self.planner
            .distribute()
            .await
            .inspect_err(|err| warn!(error = %err, "distribution after ingestion failed"))
            .ok()
    }
}

fn records_or_empty(
    result: SourceClientResult<Vec<SourceRecord>>,
    store_id: StoreId,
    feed: &'static str,
) -> Vec<SourceRecord> {
    result.unwrap_or_else(|err| {
        if matches!(err, SourceClientError::Unsupported(_)) {
            debug!(store_id = %store_id, feed, "feed not offered by source");
        } else {
            warn!(store_id = %store_id, feed, error = %err, "source fetch failed");
        }
        Vec::new()
    })
}

/// Converts a raw record into a pending order.
fn normalize(
    record: SourceRecord,
    stores: &[Store],
    default_store: Option<StoreId>,
    default_source: OrderSource,
    clock: &impl Clock,
) -> Result<Order, OrderDomainError> {
    let external_id = ExternalOrderId::new(record.external_id)?;
    let phone = record.phone.trim();
    if phone.is_empty() {
        return Err(OrderDomainError::EmptyPhone);
    }

    let store_id = resolve_store(stores, record.channel.as_deref(), default_store);
    let details = OrderDetails {
        customer_name: record.customer_name.trim().to_owned(),
        phone: phone.to_owned(),
        address: record.address.trim().to_owned(),
        postal_code: record.postal_code.trim().to_owned(),
        product_name: record.product_name.trim().to_owned(),
        unit_price: parse_price(&record.price),
        quantity: parse_quantity(&record.quantity),
        ordered_at: parse_timestamp(&record.ordered_at),
    };
    Ok(Order::ingest(
        external_id,
        store_id,
        record.source.unwrap_or(default_source),
        details,
        clock,
    ))
}
