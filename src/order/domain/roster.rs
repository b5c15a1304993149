//! Stores and agents known to the call center.

use super::{AgentId, OrderDomainError, StoreId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-empty store display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreName(String);

impl StoreName {
    /// Creates a validated store name.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::EmptyStoreName`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, OrderDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OrderDomainError::EmptyStoreName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether `label` names this store.
    ///
    /// The comparison is case-insensitive and succeeds when the label is a
    /// substring of the store name. A longer label that merely contains the
    /// name does not match.
    #[must_use]
    pub fn matches_label(&self, label: &str) -> bool {
        let needle = label.trim().to_lowercase();
        !needle.is_empty() && self.0.to_lowercase().contains(&needle)
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source-system store that orders belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    id: StoreId,
    name: StoreName,
    handle: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl Store {
    /// Creates an active store.
    #[must_use]
    pub fn new(name: StoreName, handle: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: StoreId::new(),
            name,
            handle: handle.into(),
            active: true,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a store from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: StoreId,
        name: StoreName,
        handle: String,
        active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            handle,
            active,
            created_at,
        }
    }

    /// Returns the store identifier.
    #[must_use]
    pub const fn id(&self) -> StoreId {
        self.id
    }

    /// Returns the store name.
    #[must_use]
    pub const fn name(&self) -> &StoreName {
        &self.name
    }

    /// Returns the source-system handle, such as a shop domain.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns whether the store is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Short numeric PIN an agent signs in with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentPin(String);

impl AgentPin {
    /// Creates a validated PIN.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::InvalidAgentPin`] unless the value is 4 to
    /// 6 ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, OrderDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let valid = (4..=6).contains(&trimmed.len()) && trimmed.chars().all(|ch| ch.is_ascii_digit());
        if !valid {
            return Err(OrderDomainError::InvalidAgentPin(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the PIN as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone operator who calls customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    name: String,
    pin: AgentPin,
    active: bool,
    created_at: DateTime<Utc>,
}

impl Agent {
    /// Creates an active agent.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::EmptyAgentName`] when the name is blank.
    pub fn new(
        name: impl Into<String>,
        pin: AgentPin,
        clock: &impl Clock,
    ) -> Result<Self, OrderDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OrderDomainError::EmptyAgentName);
        }
        Ok(Self {
            id: AgentId::new(),
            name: trimmed.to_owned(),
            pin,
            active: true,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs an agent from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: AgentId,
        name: String,
        pin: AgentPin,
        active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            pin,
            active,
            created_at,
        }
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sign-in PIN.
    #[must_use]
    pub const fn pin(&self) -> &AgentPin {
        &self.pin
    }

    /// Returns whether the agent may receive work.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Picks the store an incoming record belongs to.
///
/// Resolution order: the first store whose name matches the record's channel
/// label, then `default_store` when it names a known store, then the first
/// store in `stores`. Returns `None` only when `stores` is empty.
#[must_use]
pub fn resolve_store(
    stores: &[Store],
    channel: Option<&str>,
    default_store: Option<StoreId>,
) -> Option<StoreId> {
    let by_label = channel.and_then(|label| {
        stores
            .iter()
            .find(|store| store.name().matches_label(label))
            .map(Store::id)
    });
    by_label
        .or_else(|| default_store.filter(|id| stores.iter().any(|store| store.id() == *id)))
        .or_else(|| stores.first().map(Store::id))
}
