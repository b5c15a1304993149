//! Source-system client port.
//!
//! One implementation exists per external system version. Clients are bound
//! to stores at configuration time through
//! [`StoreBindings`](crate::order::services::StoreBindings).

use crate::order::domain::{ContactEdit, ExternalOrderId, SourceRecord, SyncTag};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for source client operations.
pub type SourceClientResult<T> = Result<T, SourceClientError>;

/// Contract for pulling leads from, and pushing outcomes to, a source system.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetches storefront orders created in the last `since_days` days.
    async fn fetch_orders(&self, since_days: u32) -> SourceClientResult<Vec<SourceRecord>>;

    /// Fetches abandoned carts created in the last `since_days` days.
    async fn fetch_abandoned_carts(&self, since_days: u32)
    -> SourceClientResult<Vec<SourceRecord>>;

    /// Writes corrected contact details back to the source order.
    async fn update_customer_info(
        &self,
        external_id: &ExternalOrderId,
        edit: &ContactEdit,
    ) -> SourceClientResult<()>;

    /// Adds tags to the source order, keeping existing ones.
    async fn add_tags(&self, external_id: &ExternalOrderId, tags: &[SyncTag])
    -> SourceClientResult<()>;
}

/// Errors returned by source clients.
#[derive(Debug, Clone, Error)]
pub enum SourceClientError {
    /// The request could not be sent or completed.
    #[error("source request failed: {0}")]
    Http(Arc<dyn std::error::Error + Send + Sync>),

    /// The source system answered with a non-success status.
    #[error("source returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("could not decode source response: {0}")]
    Decode(String),

    /// The source system has no such order.
    #[error("order {0} not found in source system")]
    NotFound(ExternalOrderId),

    /// The operation is not offered by this source system.
    #[error("operation not supported by {0}")]
    Unsupported(&'static str),

    /// The call did not finish within the configured bound.
    #[error("source call timed out after {0} seconds")]
    Timeout(u64),
}

impl SourceClientError {
    /// Wraps a transport error.
    pub fn http(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Http(Arc::new(err))
    }
}
