//! `PostgreSQL` adapters for order lifecycle persistence.

mod assignment;
mod blocking;
mod models;
mod order;
mod roster;
mod schema;

pub use assignment::PostgresAssignmentRepository;
pub use blocking::{BlockingError, OrderPgPool};
pub use order::PostgresOrderRepository;
pub use roster::PostgresRosterRepository;

use diesel::connection::SimpleConnection;

use crate::order::ports::{OrderRepositoryError, OrderRepositoryResult};

/// SQL creating every table and index the adapters use.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_order_tables/up.sql");

/// Applies [`CREATE_SCHEMA_SQL`] to an empty database.
///
/// # Errors
///
/// Returns [`OrderRepositoryError::Persistence`] when a connection cannot be
/// obtained or any statement fails, including when the tables exist.
pub async fn create_schema(pool: &OrderPgPool) -> OrderRepositoryResult<()> {
    blocking::run_blocking(pool, |connection| {
        connection
            .batch_execute(CREATE_SCHEMA_SQL)
            .map_err(OrderRepositoryError::persistence)
    })
    .await
}
