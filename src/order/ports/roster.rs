//! Repository port for stores and agents.

use crate::order::domain::{Agent, AgentPin, Store, StoreId, StoreName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for roster repository operations.
pub type RosterRepositoryResult<T> = Result<T, RosterRepositoryError>;

/// Store and agent persistence contract.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Stores a new store.
    ///
    /// # Errors
    ///
    /// Returns [`RosterRepositoryError::DuplicateStoreName`] when the name is
    /// taken.
    async fn register_store(&self, store: &Store) -> RosterRepositoryResult<()>;

    /// Stores a new agent.
    ///
    /// # Errors
    ///
    /// Returns [`RosterRepositoryError::DuplicatePin`] when the PIN is taken.
    async fn register_agent(&self, agent: &Agent) -> RosterRepositoryResult<()>;

    /// Returns active stores in registration order.
    async fn active_stores(&self) -> RosterRepositoryResult<Vec<Store>>;

    /// Finds a store by identifier.
    async fn find_store(&self, id: StoreId) -> RosterRepositoryResult<Option<Store>>;

    /// Finds a store by exact name.
    async fn find_store_by_name(&self, name: &StoreName) -> RosterRepositoryResult<Option<Store>>;

    /// Returns active agents in registration order.
    async fn active_agents(&self) -> RosterRepositoryResult<Vec<Agent>>;

    /// Finds an active agent by PIN.
    async fn find_agent_by_pin(&self, pin: &AgentPin) -> RosterRepositoryResult<Option<Agent>>;
}

/// Errors returned by roster repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RosterRepositoryError {
    /// A store with the same name already exists.
    #[error("duplicate store name: {0}")]
    DuplicateStoreName(StoreName),

    /// An agent with the same PIN already exists.
    #[error("duplicate agent PIN")]
    DuplicatePin,

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted roster data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RosterRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
