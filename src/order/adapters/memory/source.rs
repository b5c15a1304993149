//! Scripted source client for tests and offline runs.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::order::{
    domain::{ContactEdit, ExternalOrderId, SourceRecord, SyncTag},
    ports::{SourceClient, SourceClientError, SourceClientResult},
};

/// A push the client received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedPush {
    /// Contact details written back.
    CustomerInfo {
        /// Target order.
        external_id: ExternalOrderId,
        /// Written details.
        edit: ContactEdit,
    },
    /// Tags appended.
    Tags {
        /// Target order.
        external_id: ExternalOrderId,
        /// Appended tags.
        tags: Vec<SyncTag>,
    },
}

#[derive(Debug, Default)]
struct ScriptState {
    orders: Vec<SourceRecord>,
    carts: Vec<SourceRecord>,
    pushes: Vec<RecordedPush>,
    failure: Option<SourceClientError>,
}

/// In-memory [`SourceClient`] returning canned records and recording pushes.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceClient {
    state: Arc<RwLock<ScriptState>>,
}

impl InMemorySourceClient {
    /// Creates a client with no records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the records returned by [`SourceClient::fetch_orders`].
    pub fn set_orders(&self, records: Vec<SourceRecord>) {
        if let Ok(mut state) = self.state.write() {
            state.orders = records;
        }
    }

    /// Replaces the records returned by [`SourceClient::fetch_abandoned_carts`].
    pub fn set_carts(&self, records: Vec<SourceRecord>) {
        if let Ok(mut state) = self.state.write() {
            state.carts = records;
        }
    }

    /// Makes every subsequent call fail with `error`; `None` clears it.
    pub fn fail_with(&self, error: Option<SourceClientError>) {
        if let Ok(mut state) = self.state.write() {
            state.failure = error;
        }
    }

    /// Returns the pushes received so far.
    #[must_use]
    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.state
            .read()
            .map(|state| state.pushes.clone())
            .unwrap_or_default()
    }

    fn guard(&self) -> SourceClientResult<()> {
        let state = self
            .state
            .read()
            .map_err(|err| SourceClientError::http(std::io::Error::other(err.to_string())))?;
        state.failure.clone().map_or(Ok(()), Err)
    }

    fn record(&self, push: RecordedPush) -> SourceClientResult<()> {
        self.guard()?;
        let mut state = self
            .state
            .write()
            .map_err(|err| SourceClientError::http(std::io::Error::other(err.to_string())))?;
        state.pushes.push(push);
        Ok(())
    }
}

#[async_trait]
impl SourceClient for InMemorySourceClient {
    async fn fetch_orders(&self, _since_days: u32) -> SourceClientResult<Vec<SourceRecord>> {
        self.guard()?;
        Ok(self
            .state
            .read()
            .map(|state| state.orders.clone())
            .unwrap_or_default())
    }

    async fn fetch_abandoned_carts(
        &self,
        _since_days: u32,
    ) -> SourceClientResult<Vec<SourceRecord>> {
        self.guard()?;
        Ok(self
            .state
            .read()
            .map(|state| state.carts.clone())
            .unwrap_or_default())
    }

    async fn update_customer_info(
        &self,
        external_id: &ExternalOrderId,
        edit: &ContactEdit,
    ) -> SourceClientResult<()> {
        self.record(RecordedPush::CustomerInfo {
            external_id: external_id.clone(),
            edit: edit.clone(),
        })
    }

    async fn add_tags(
        &self,
        external_id: &ExternalOrderId,
        tags: &[SyncTag],
    ) -> SourceClientResult<()> {
        self.record(RecordedPush::Tags {
            external_id: external_id.clone(),
            tags: tags.to_vec(),
        })
    }
}
