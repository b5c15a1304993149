//! Blocking operation helpers for `PostgreSQL` repositories.
//!
//! Diesel is synchronous, so every query runs on tokio's blocking pool.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};

/// `PostgreSQL` connection pool type shared by order adapters.
pub type OrderPgPool = Pool<ConnectionManager<PgConnection>>;

pub(super) type PooledConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Infrastructure failures raised around a query rather than by it.
#[derive(Debug, thiserror::Error)]
pub enum BlockingError {
    /// No connection could be checked out.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs `f` with a pooled connection on the blocking thread pool.
///
/// Pool checkout and join failures are converted with `E::from`.
pub(super) async fn run_blocking<F, T, E>(pool: &OrderPgPool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PooledConn) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<BlockingError> + Send + 'static,
{
    let worker_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = worker_pool.get().map_err(|err| E::from(BlockingError::Pool(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| E::from(BlockingError::Join(err)))?
}
