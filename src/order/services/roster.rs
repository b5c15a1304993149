//! Provisioning of stores and agents.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::info;

use crate::order::{
    domain::{Agent, AgentPin, OrderDomainError, Store, StoreName},
    ports::{RosterRepository, RosterRepositoryError},
};

/// A store that should exist, by name and source-system handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSpec {
    /// Display name, also matched against record channel labels.
    pub name: String,
    /// Source-system handle, such as a shop subdomain.
    pub handle: String,
}

impl StoreSpec {
    /// Creates a store specification.
    #[must_use]
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: handle.into(),
        }
    }
}

/// Service-level errors for roster operations.
#[derive(Debug, Error)]
pub enum RosterServiceError {
    /// A name or PIN failed validation.
    #[error(transparent)]
    Domain(#[from] OrderDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RosterRepositoryError),
}

/// Result type for roster operations.
pub type RosterServiceResult<T> = Result<T, RosterServiceError>;

/// Registers stores and agents.
#[derive(Clone)]
pub struct RosterService<R, C>
where
    R: RosterRepository,
    C: Clock + Send + Sync,
{
    roster: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RosterService<R, C>
where
    R: RosterRepository,
    C: Clock + Send + Sync,
{
    /// Creates a roster service.
    #[must_use]
    pub const fn new(roster: Arc<R>, clock: Arc<C>) -> Self {
        Self { roster, clock }
    }

    /// Registers each store that is not yet known by name.
    ///
    /// Returns the stores in the order given, existing or new.
    ///
    /// # Errors
    ///
    /// Returns [`RosterServiceError::Domain`] for blank names and
    /// [`RosterServiceError::Repository`] when storage fails.
    pub async fn ensure_stores(&self, specs: &[StoreSpec]) -> RosterServiceResult<Vec<Store>> {
        let mut stores = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = StoreName::new(spec.name.as_str())?;
            let existing = self.roster.find_store_by_name(&name).await?;
            let store = match existing {
                Some(store) => store,
                None => {
                    let created = Store::new(name, spec.handle.as_str(), &*self.clock);
                    self.roster.register_store(&created).await?;
                    info!(store_id = %created.id(), name = %created.name(), "store registered");
                    created
                }
            };
            stores.push(store);
        }
        Ok(stores)
    }

    /// Provisions an active agent.
    ///
    /// # Errors
    ///
    /// Returns [`RosterServiceError::Domain`] for a blank name or a PIN that
    /// is not 4 to 6 digits, and [`RosterServiceError::Repository`] when the
    /// PIN is taken or storage fails.
    pub async fn register_agent(&self, name: &str, pin: &str) -> RosterServiceResult<Agent> {
        let agent = Agent::new(name, AgentPin::new(pin)?, &*self.clock)?;
        self.roster.register_agent(&agent).await?;
        info!(agent_id = %agent.id(), name = agent.name(), "agent registered");
        Ok(agent)
    }

    /// Resolves an active agent by PIN.
    ///
    /// # Errors
    ///
    /// Returns [`RosterServiceError::Domain`] for malformed PINs.
    pub async fn find_agent_by_pin(&self, pin: &str) -> RosterServiceResult<Option<Agent>> {
        let parsed = AgentPin::new(pin)?;
        Ok(self.roster.find_agent_by_pin(&parsed).await?)
    }

    /// Returns the active stores.
    ///
    /// # Errors
    ///
    /// Returns [`RosterServiceError::Repository`] when storage fails.
    pub async fn stores(&self) -> RosterServiceResult<Vec<Store>> {
        Ok(self.roster.active_stores().await?)
    }

    /// Returns the active agents.
    ///
    /// # Errors
    ///
    /// Returns [`RosterServiceError::Repository`] when storage fails.
    pub async fn agents(&self) -> RosterServiceResult<Vec<Agent>> {
        Ok(self.roster.active_agents().await?)
    }
}
