//! `PostgreSQL` repository for daily store assignments.

use super::{
    blocking::{BlockingError, OrderPgPool, run_blocking},
    models::AssignmentRow,
    schema::store_assignments,
};
use crate::order::{
    domain::{AgentId, Assignment, AssignmentId, StoreId},
    ports::{
        AssignmentOutcome, AssignmentRepository, AssignmentRepositoryError,
        AssignmentRepositoryResult,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;

impl From<BlockingError> for AssignmentRepositoryError {
    fn from(err: BlockingError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed assignment repository.
#[derive(Debug, Clone)]
pub struct PostgresAssignmentRepository {
    pool: OrderPgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: OrderPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn create(
        &self,
        assignment: &Assignment,
    ) -> AssignmentRepositoryResult<AssignmentOutcome> {
        let row = AssignmentRow {
            id: assignment.id().into_inner(),
            store_id: assignment.store_id().into_inner(),
            agent_id: assignment.agent_id().into_inner(),
            assigned_date: assignment.date(),
            created_at: assignment.created_at(),
        };
        run_blocking(&self.pool, move |connection| {
            let inserted = diesel::insert_into(store_assignments::table)
                .values(&row)
                .on_conflict((
                    store_assignments::store_id,
                    store_assignments::agent_id,
                    store_assignments::assigned_date,
                ))
                .do_nothing()
                .execute(connection)
                .map_err(AssignmentRepositoryError::persistence)?;
            Ok(if inserted == 0 {
                AssignmentOutcome::AlreadyAssigned
            } else {
                AssignmentOutcome::Created
            })
        })
        .await
    }

    async fn for_date(&self, date: NaiveDate) -> AssignmentRepositoryResult<Vec<Assignment>> {
        run_blocking(&self.pool, move |connection| {
            let rows = store_assignments::table
                .filter(store_assignments::assigned_date.eq(date))
                .order((store_assignments::created_at.asc(), store_assignments::id.asc()))
                .select(AssignmentRow::as_select())
                .load::<AssignmentRow>(connection)
                .map_err(AssignmentRepositoryError::persistence)?;
            Ok(rows
                .into_iter()
                .map(|row| {
                    Assignment::from_persisted(
                        AssignmentId::from_uuid(row.id),
                        StoreId::from_uuid(row.store_id),
                        AgentId::from_uuid(row.agent_id),
                        row.assigned_date,
                        row.created_at,
                    )
                })
                .collect())
        })
        .await
    }

    async fn stores_for_agent(
        &self,
        agent_id: AgentId,
        date: NaiveDate,
    ) -> AssignmentRepositoryResult<Vec<StoreId>> {
        run_blocking(&self.pool, move |connection| {
            let ids = store_assignments::table
                .filter(store_assignments::agent_id.eq(agent_id.into_inner()))
                .filter(store_assignments::assigned_date.eq(date))
                .order(store_assignments::created_at.asc())
                .select(store_assignments::store_id)
                .load::<uuid::Uuid>(connection)
                .map_err(AssignmentRepositoryError::persistence)?;
            Ok(ids.into_iter().map(StoreId::from_uuid).collect())
        })
        .await
    }
}
