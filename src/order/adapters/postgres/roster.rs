//! `PostgreSQL` repository for stores and agents.

use super::{
    blocking::{BlockingError, OrderPgPool, run_blocking},
    models::{StoreRow, UserRow},
    schema::{stores, users},
};
use crate::order::{
    domain::{Agent, AgentId, AgentPin, Store, StoreId, StoreName},
    ports::{RosterRepository, RosterRepositoryError, RosterRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

const AGENT_ROLE: &str = "agent";

impl From<BlockingError> for RosterRepositoryError {
    fn from(err: BlockingError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed roster repository.
#[derive(Debug, Clone)]
pub struct PostgresRosterRepository {
    pool: OrderPgPool,
}

impl PostgresRosterRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: OrderPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PostgresRosterRepository {
    async fn register_store(&self, store: &Store) -> RosterRepositoryResult<()> {
        let name = store.name().clone();
        let row = StoreRow {
            id: store.id().into_inner(),
            name: store.name().as_str().to_owned(),
            handle: store.handle().to_owned(),
            active: store.is_active(),
            created_at: store.created_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(stores::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RosterRepositoryError::DuplicateStoreName(name.clone())
                    }
                    _ => RosterRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn register_agent(&self, agent: &Agent) -> RosterRepositoryResult<()> {
        let row = UserRow {
            id: agent.id().into_inner(),
            name: agent.name().to_owned(),
            pin: agent.pin().as_str().to_owned(),
            role: AGENT_ROLE.to_owned(),
            active: agent.is_active(),
            created_at: agent.created_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RosterRepositoryError::DuplicatePin
                    }
                    _ => RosterRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn active_stores(&self) -> RosterRepositoryResult<Vec<Store>> {
        run_blocking(&self.pool, move |connection| {
            let rows = stores::table
                .filter(stores::active.eq(true))
                .order((stores::created_at.asc(), stores::id.asc()))
                .select(StoreRow::as_select())
                .load::<StoreRow>(connection)
                .map_err(RosterRepositoryError::persistence)?;
            rows.into_iter().map(row_to_store).collect()
        })
        .await
    }

    async fn find_store(&self, id: StoreId) -> RosterRepositoryResult<Option<Store>> {
        run_blocking(&self.pool, move |connection| {
            let row = stores::table
                .filter(stores::id.eq(id.into_inner()))
                .select(StoreRow::as_select())
                .first::<StoreRow>(connection)
                .optional()
                .map_err(RosterRepositoryError::persistence)?;
            row.map(row_to_store).transpose()
        })
        .await
    }

    async fn find_store_by_name(&self, name: &StoreName) -> RosterRepositoryResult<Option<Store>> {
        let lookup = name.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = stores::table
                .filter(stores::name.eq(lookup))
                .select(StoreRow::as_select())
                .first::<StoreRow>(connection)
                .optional()
                .map_err(RosterRepositoryError::persistence)?;
            row.map(row_to_store).transpose()
        })
        .await
    }

    async fn active_agents(&self) -> RosterRepositoryResult<Vec<Agent>> {
        run_blocking(&self.pool, move |connection| {
            let rows = users::table
                .filter(users::active.eq(true))
                .filter(users::role.eq(AGENT_ROLE))
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load::<UserRow>(connection)
                .map_err(RosterRepositoryError::persistence)?;
            rows.into_iter().map(row_to_agent).collect()
        })
        .await
    }

    async fn find_agent_by_pin(&self, pin: &AgentPin) -> RosterRepositoryResult<Option<Agent>> {
        let lookup = pin.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = users::table
                .filter(users::pin.eq(lookup))
                .filter(users::active.eq(true))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(RosterRepositoryError::persistence)?;
            row.map(row_to_agent).transpose()
        })
        .await
    }
}

fn row_to_store(row: StoreRow) -> RosterRepositoryResult<Store> {
    let name = StoreName::new(row.name).map_err(RosterRepositoryError::invalid_persisted_data)?;
    Ok(Store::from_persisted(
        StoreId::from_uuid(row.id),
        name,
        row.handle,
        row.active,
        row.created_at,
    ))
}

fn row_to_agent(row: UserRow) -> RosterRepositoryResult<Agent> {
    let pin = AgentPin::new(row.pin).map_err(RosterRepositoryError::invalid_persisted_data)?;
    Ok(Agent::from_persisted(
        AgentId::from_uuid(row.id),
        row.name,
        pin,
        row.active,
        row.created_at,
    ))
}
