//! Error types for order domain validation and parsing.

use super::{ExternalOrderId, OrderStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating order domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderDomainError {
    /// The external order identifier is empty after trimming.
    #[error("external order id must not be empty")]
    EmptyExternalId,

    /// The ingested phone number is empty after trimming.
    #[error("phone number must not be empty")]
    EmptyPhone,

    /// The disposition code is not one of the known codes.
    #[error("invalid disposition code: {0}")]
    InvalidDisposition(String),

    /// The phone number does not contain 10 to 15 digits.
    #[error("invalid phone number '{0}', expected 10 to 15 digits")]
    InvalidPhone(String),

    /// A required field is missing or blank.
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    /// The store name is empty after trimming.
    #[error("store name must not be empty")]
    EmptyStoreName,

    /// The agent display name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// The agent PIN is not a 4 to 6 digit number.
    #[error("invalid agent PIN '{0}', expected 4 to 6 digits")]
    InvalidAgentPin(String),

    /// The order is confirmed or cancelled and accepts no further calls.
    #[error("order {order_id} is already {status} and cannot change")]
    TerminalOrder {
        /// External identifier of the order.
        order_id: ExternalOrderId,
        /// Terminal status the order is in.
        status: OrderStatus,
    },

    /// The requested status change is not part of the lifecycle.
    #[error("invalid status transition for order {order_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// External identifier of the order.
        order_id: ExternalOrderId,
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// Error returned while parsing order statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

/// Error returned while parsing order source types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown order source: {0}")]
pub struct ParseOrderSourceError(pub String);
