//! `PostgreSQL` repository for orders and call logs.

use super::{
    blocking::{BlockingError, OrderPgPool, PooledConn, run_blocking},
    models::{CallLogRow, NewOrderRow, OrderChangesRow, OrderRow},
    schema::{call_logs, orders},
};
use crate::order::{
    domain::{
        AgentId, AssignmentMap, CallLog, CallLogId, CallTiming, ContactEdit, DispositionCode,
        ExternalOrderId, Order, OrderDetails, OrderId, OrderSource, OrderStatus, OrderVersion,
        PersistedCallLogData, PersistedOrderData, StoreId,
    },
    ports::{
        InsertOutcome, OrderRepository, OrderRepositoryError, OrderRepositoryResult, StatusCounts,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use tracing::debug;

impl From<BlockingError> for OrderRepositoryError {
    fn from(err: BlockingError) -> Self {
        Self::persistence(err)
    }
}

impl From<DieselError> for OrderRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed order repository.
#[derive(Debug, Clone)]
pub struct PostgresOrderRepository {
    pool: OrderPgPool,
}

impl PostgresOrderRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: OrderPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert_if_absent(&self, order: &Order) -> OrderRepositoryResult<InsertOutcome> {
        let new_row = to_new_row(order)?;
        run_blocking(&self.pool, move |connection| {
            let inserted = diesel::insert_into(orders::table)
                .values(&new_row)
                .on_conflict(orders::external_id)
                .do_nothing()
                .execute(connection)?;
            Ok(if inserted == 0 {
                InsertOutcome::Duplicate
            } else {
                InsertOutcome::Inserted
            })
        })
        .await
    }

    async fn find_by_id(&self, id: OrderId) -> OrderRepositoryResult<Option<Order>> {
        run_blocking(&self.pool, move |connection| {
            let row = orders::table
                .filter(orders::id.eq(id.into_inner()))
                .select(OrderRow::as_select())
                .first::<OrderRow>(connection)
                .optional()?;
            row.map(row_to_order).transpose()
        })
        .await
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalOrderId,
    ) -> OrderRepositoryResult<Option<Order>> {
        let lookup = external_id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = orders::table
                .filter(orders::external_id.eq(lookup))
                .select(OrderRow::as_select())
                .first::<OrderRow>(connection)
                .optional()?;
            row.map(row_to_order).transpose()
        })
        .await
    }

    async fn update(&self, order: &Order, expected: OrderVersion) -> OrderRepositoryResult<()> {
        let order_id = order.id();
        let changes = to_changes_row(order)?;
        run_blocking(&self.pool, move |connection| {
            update_versioned(connection, order_id, expected, &changes)
        })
        .await
    }

    async fn record_call(
        &self,
        order: &Order,
        expected: OrderVersion,
        call_log: &CallLog,
    ) -> OrderRepositoryResult<()> {
        let order_id = order.id();
        let changes = to_changes_row(order)?;
        let log_row = to_call_log_row(call_log)?;
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, OrderRepositoryError, _>(|tx| {
                update_versioned(tx, order_id, expected, &changes)?;
                diesel::insert_into(call_logs::table)
                    .values(&log_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn assign_pending(
        &self,
        map: &AssignmentMap,
        assigned_at: DateTime<Utc>,
    ) -> OrderRepositoryResult<Vec<Order>> {
        let assignment_map = map.clone();
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, OrderRepositoryError, _>(|tx| {
                let rows = orders::table
                    .filter(orders::status.eq(OrderStatus::Pending.as_str()))
                    .filter(orders::store_id.is_not_null())
                    .order((orders::created_at.asc(), orders::id.asc()))
                    .select(OrderRow::as_select())
                    .for_update()
                    .skip_locked()
                    .load::<OrderRow>(tx)?;

                let mut assigned = Vec::new();
                for row in rows {
                    let mut order = row_to_order(row)?;
                    let Some(agent_id) = order
                        .store_id()
                        .and_then(|store| assignment_map.agent_for(store))
                    else {
                        continue;
                    };
                    let expected = order.version();
                    order
                        .assign(agent_id, assigned_at)
                        .map_err(OrderRepositoryError::invalid_persisted_data)?;
                    update_versioned(tx, order.id(), expected, &to_changes_row(&order)?)?;
                    assigned.push(order);
                }
                debug!(count = assigned.len(), "assigned pending orders");
                Ok(assigned)
            })
        })
        .await
    }

    async fn queue_for_agent(&self, agent_id: AgentId) -> OrderRepositoryResult<Vec<Order>> {
        run_blocking(&self.pool, move |connection| {
            let rows = orders::table
                .filter(orders::assigned_to.eq(agent_id.into_inner()))
                .filter(orders::status.eq_any(vec![
                    OrderStatus::Assigned.as_str(),
                    OrderStatus::Calling.as_str(),
                ]))
                .order((orders::created_at.asc(), orders::id.asc()))
                .select(OrderRow::as_select())
                .load::<OrderRow>(connection)?;
            rows.into_iter().map(row_to_order).collect()
        })
        .await
    }

    async fn call_logs_for_order(&self, order_id: OrderId) -> OrderRepositoryResult<Vec<CallLog>> {
        run_blocking(&self.pool, move |connection| {
            let rows = call_logs::table
                .filter(call_logs::order_id.eq(order_id.into_inner()))
                .order(call_logs::created_at.desc())
                .select(CallLogRow::as_select())
                .load::<CallLogRow>(connection)?;
            rows.into_iter().map(row_to_call_log).collect()
        })
        .await
    }

    async fn call_logs_for_agent(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> OrderRepositoryResult<Vec<CallLog>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        run_blocking(&self.pool, move |connection| {
            let rows = call_logs::table
                .filter(call_logs::agent_id.eq(agent_id.into_inner()))
                .order(call_logs::created_at.desc())
                .limit(row_limit)
                .select(CallLogRow::as_select())
                .load::<CallLogRow>(connection)?;
            rows.into_iter().map(row_to_call_log).collect()
        })
        .await
    }

    async fn count_by_status(&self) -> OrderRepositoryResult<StatusCounts> {
        run_blocking(&self.pool, move |connection| {
            let rows = orders::table
                .group_by(orders::status)
                .select((orders::status, diesel::dsl::count_star()))
                .load::<(String, i64)>(connection)?;
            let mut counts = StatusCounts::default();
            for (status, count) in rows {
                let parsed = OrderStatus::try_from(status.as_str())
                    .map_err(OrderRepositoryError::invalid_persisted_data)?;
                counts.add(parsed, u64::try_from(count).unwrap_or(0));
            }
            Ok(counts)
        })
        .await
    }

    async fn purge_all(&self) -> OrderRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, OrderRepositoryError, _>(|tx| {
                diesel::delete(call_logs::table).execute(tx)?;
                let removed = diesel::delete(orders::table).execute(tx)?;
                Ok(u64::try_from(removed).unwrap_or(u64::MAX))
            })
        })
        .await
    }
}

fn update_versioned(
    connection: &mut PooledConn,
    order_id: OrderId,
    expected: OrderVersion,
    changes: &OrderChangesRow,
) -> OrderRepositoryResult<()> {
    let expected_raw = version_to_db(expected)?;
    let updated = diesel::update(
        orders::table
            .filter(orders::id.eq(order_id.into_inner()))
            .filter(orders::version.eq(expected_raw)),
    )
    .set(changes)
    .execute(connection)?;
    if updated > 0 {
        return Ok(());
    }

    let exists: i64 = orders::table
        .filter(orders::id.eq(order_id.into_inner()))
        .count()
        .get_result(connection)?;
    if exists == 0 {
        Err(OrderRepositoryError::NotFound(order_id))
    } else {
        Err(OrderRepositoryError::VersionConflict { order_id, expected })
    }
}

fn version_to_db(version: OrderVersion) -> OrderRepositoryResult<i64> {
    i64::try_from(version.value()).map_err(OrderRepositoryError::persistence)
}

fn to_new_row(order: &Order) -> OrderRepositoryResult<NewOrderRow> {
    let details = order.details();
    Ok(NewOrderRow {
        id: order.id().into_inner(),
        external_id: order.external_id().as_str().to_owned(),
        store_id: order.store_id().map(StoreId::into_inner),
        source: order.source().as_str().to_owned(),
        customer_name: details.customer_name.clone(),
        phone: details.phone.clone(),
        address: details.address.clone(),
        postal_code: details.postal_code.clone(),
        product_name: details.product_name.clone(),
        unit_price: details.unit_price,
        quantity: i32::try_from(details.quantity).map_err(OrderRepositoryError::persistence)?,
        ordered_at: details.ordered_at,
        status: order.status().as_str().to_owned(),
        attempts: i32::try_from(order.attempts()).map_err(OrderRepositoryError::persistence)?,
        version: version_to_db(order.version())?,
        created_at: order.created_at(),
        updated_at: order.updated_at(),
    })
}

fn to_changes_row(order: &Order) -> OrderRepositoryResult<OrderChangesRow> {
    let edit = order.edit();
    Ok(OrderChangesRow {
        edited_customer_name: edit.map(|value| value.customer_name().to_owned()),
        edited_phone: edit.map(|value| value.phone().as_str().to_owned()),
        edited_address: edit.map(|value| value.address().to_owned()),
        edited_postal_code: edit.map(|value| value.postal_code().to_owned()),
        edited_at: order.edited_at(),
        status: order.status().as_str().to_owned(),
        final_status: order.final_status().map(|code| code.label().to_owned()),
        attempts: i32::try_from(order.attempts()).map_err(OrderRepositoryError::persistence)?,
        assigned_to: order.assigned_to().map(AgentId::into_inner),
        assigned_at: order.assigned_at(),
        completed_at: order.completed_at(),
        synced_at: order.synced_at(),
        version: version_to_db(order.version())?,
        updated_at: order.updated_at(),
    })
}

fn to_call_log_row(call_log: &CallLog) -> OrderRepositoryResult<CallLogRow> {
    let timing = call_log.timing();
    Ok(CallLogRow {
        id: call_log.id().into_inner(),
        order_id: call_log.order_id().into_inner(),
        agent_id: call_log.agent_id().into_inner(),
        phone_dialed: call_log.phone_dialed().to_owned(),
        started_at: timing.started_at,
        ended_at: timing.ended_at,
        duration_secs: i32::try_from(timing.duration_secs)
            .map_err(OrderRepositoryError::persistence)?,
        disposition: call_log.disposition().label().to_owned(),
        notes: call_log.notes().map(str::to_owned),
        created_at: call_log.created_at(),
    })
}

fn row_to_order(row: OrderRow) -> OrderRepositoryResult<Order> {
    let external_id =
        ExternalOrderId::new(row.external_id).map_err(OrderRepositoryError::invalid_persisted_data)?;
    let source = OrderSource::try_from(row.source.as_str())
        .map_err(OrderRepositoryError::invalid_persisted_data)?;
    let status = OrderStatus::try_from(row.status.as_str())
        .map_err(OrderRepositoryError::invalid_persisted_data)?;
    let final_status = row
        .final_status
        .as_deref()
        .map(DispositionCode::try_from)
        .transpose()
        .map_err(OrderRepositoryError::invalid_persisted_data)?;
    let edit = match (
        row.edited_customer_name,
        row.edited_phone,
        row.edited_address,
        row.edited_postal_code,
    ) {
        (Some(name), Some(phone), Some(address), Some(postal_code)) => {
            Some(ContactEdit::from_persisted(name, phone, address, postal_code))
        }
        _ => None,
    };

    let data = PersistedOrderData {
        id: OrderId::from_uuid(row.id),
        external_id,
        store_id: row.store_id.map(StoreId::from_uuid),
        source,
        details: OrderDetails {
            customer_name: row.customer_name,
            phone: row.phone,
            address: row.address,
            postal_code: row.postal_code,
            product_name: row.product_name,
            unit_price: row.unit_price,
            quantity: u32::try_from(row.quantity)
                .map_err(OrderRepositoryError::invalid_persisted_data)?,
            ordered_at: row.ordered_at,
        },
        edit,
        edited_at: row.edited_at,
        status,
        final_status,
        attempts: u32::try_from(row.attempts)
            .map_err(OrderRepositoryError::invalid_persisted_data)?,
        assigned_to: row.assigned_to.map(AgentId::from_uuid),
        assigned_at: row.assigned_at,
        completed_at: row.completed_at,
        synced_at: row.synced_at,
        version: OrderVersion::new(
            u64::try_from(row.version).map_err(OrderRepositoryError::invalid_persisted_data)?,
        ),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Order::from_persisted(data))
}

fn row_to_call_log(row: CallLogRow) -> OrderRepositoryResult<CallLog> {
    let disposition = DispositionCode::try_from(row.disposition.as_str())
        .map_err(OrderRepositoryError::invalid_persisted_data)?;
    Ok(CallLog::from_persisted(PersistedCallLogData {
        id: CallLogId::from_uuid(row.id),
        order_id: OrderId::from_uuid(row.order_id),
        agent_id: AgentId::from_uuid(row.agent_id),
        phone_dialed: row.phone_dialed,
        timing: CallTiming {
            started_at: row.started_at,
            ended_at: row.ended_at,
            duration_secs: u32::try_from(row.duration_secs)
                .map_err(OrderRepositoryError::invalid_persisted_data)?,
        },
        disposition,
        notes: row.notes,
        created_at: row.created_at,
    }))
}
