//! Immutable record of a single call attempt.

use super::{AgentId, CallLogId, DispositionCode, OrderId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Timing reported by the agent client for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTiming {
    /// When dialing started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the call ended.
    pub ended_at: Option<DateTime<Utc>>,
    /// Reported talk time in seconds.
    pub duration_secs: u32,
}

/// One call attempt against an order. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLog {
    id: CallLogId,
    order_id: OrderId,
    agent_id: AgentId,
    phone_dialed: String,
    timing: CallTiming,
    disposition: DispositionCode,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCallLogData {
    /// Persisted identifier.
    pub id: CallLogId,
    /// Persisted order reference.
    pub order_id: OrderId,
    /// Persisted agent reference.
    pub agent_id: AgentId,
    /// Persisted dialed number.
    pub phone_dialed: String,
    /// Persisted call timing.
    pub timing: CallTiming,
    /// Persisted disposition code.
    pub disposition: DispositionCode,
    /// Persisted agent notes.
    pub notes: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CallLog {
    /// Creates a call log for a submitted disposition.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        agent_id: AgentId,
        phone_dialed: impl Into<String>,
        timing: CallTiming,
        disposition: DispositionCode,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: CallLogId::new(),
            order_id,
            agent_id,
            phone_dialed: phone_dialed.into(),
            timing,
            disposition,
            notes: None,
            created_at: clock.utc(),
        }
    }

    /// Attaches free-text agent notes; blank notes are dropped.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let text = notes.into();
        let trimmed = text.trim();
        self.notes = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Reconstructs a call log from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCallLogData) -> Self {
        Self {
            id: data.id,
            order_id: data.order_id,
            agent_id: data.agent_id,
            phone_dialed: data.phone_dialed,
            timing: data.timing,
            disposition: data.disposition,
            notes: data.notes,
            created_at: data.created_at,
        }
    }

    /// Returns the call log identifier.
    #[must_use]
    pub const fn id(&self) -> CallLogId {
        self.id
    }

    /// Returns the order the call was made for.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the agent who made the call.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Returns the number that was dialed.
    #[must_use]
    pub fn phone_dialed(&self) -> &str {
        &self.phone_dialed
    }

    /// Returns the reported call timing.
    #[must_use]
    pub const fn timing(&self) -> CallTiming {
        self.timing
    }

    /// Returns the recorded disposition.
    #[must_use]
    pub const fn disposition(&self) -> DispositionCode {
        self.disposition
    }

    /// Returns agent notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
