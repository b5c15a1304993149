//! In-memory store and agent roster.

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::order::{
    domain::{Agent, AgentPin, Store, StoreId, StoreName},
    ports::{RosterRepository, RosterRepositoryError, RosterRepositoryResult},
};

/// Thread-safe in-memory roster repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    state: Arc<RwLock<RosterState>>,
}

#[derive(Debug, Default)]
struct RosterState {
    stores: Vec<Store>,
    agents: Vec<Agent>,
}

impl InMemoryRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RosterRepositoryResult<RwLockReadGuard<'_, RosterState>> {
        self.state.read().map_err(|err| {
            RosterRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> RosterRepositoryResult<RwLockWriteGuard<'_, RosterState>> {
        self.state.write().map_err(|err| {
            RosterRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl RosterRepository for InMemoryRoster {
    async fn register_store(&self, store: &Store) -> RosterRepositoryResult<()> {
        let mut state = self.write()?;
        if state.stores.iter().any(|existing| existing.name() == store.name()) {
            return Err(RosterRepositoryError::DuplicateStoreName(
                store.name().clone(),
            ));
        }
        state.stores.push(store.clone());
        Ok(())
    }

    async fn register_agent(&self, agent: &Agent) -> RosterRepositoryResult<()> {
        let mut state = self.write()?;
        if state.agents.iter().any(|existing| existing.pin() == agent.pin()) {
            return Err(RosterRepositoryError::DuplicatePin);
        }
        state.agents.push(agent.clone());
        Ok(())
    }

    async fn active_stores(&self) -> RosterRepositoryResult<Vec<Store>> {
        let state = self.read()?;
        Ok(state
            .stores
            .iter()
            .filter(|store| store.is_active())
            .cloned()
            .collect())
    }

    async fn find_store(&self, id: StoreId) -> RosterRepositoryResult<Option<Store>> {
        let state = self.read()?;
        Ok(state.stores.iter().find(|store| store.id() == id).cloned())
    }

    async fn find_store_by_name(&self, name: &StoreName) -> RosterRepositoryResult<Option<Store>> {
        let state = self.read()?;
        Ok(state
            .stores
            .iter()
            .find(|store| store.name() == name)
            .cloned())
    }

    async fn active_agents(&self) -> RosterRepositoryResult<Vec<Agent>> {
        let state = self.read()?;
        Ok(state
            .agents
            .iter()
            .filter(|agent| agent.is_active())
            .cloned()
            .collect())
    }

    async fn find_agent_by_pin(&self, pin: &AgentPin) -> RosterRepositoryResult<Option<Agent>> {
        let state = self.read()?;
        Ok(state
            .agents
            .iter()
            .find(|agent| agent.is_active() && agent.pin() == pin)
            .cloned())
    }
}
