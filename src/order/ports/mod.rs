//! Port contracts for the order lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by order services.

mod assignment;
mod repository;
mod roster;
mod source;

pub use assignment::{
    AssignmentOutcome, AssignmentRepository, AssignmentRepositoryError,
    AssignmentRepositoryResult,
};
pub use repository::{
    InsertOutcome, OrderRepository, OrderRepositoryError, OrderRepositoryResult, StatusCounts,
};
pub use roster::{RosterRepository, RosterRepositoryError, RosterRepositoryResult};
#[cfg(test)]
pub use source::MockSourceClient;
pub use source::{SourceClient, SourceClientError, SourceClientResult};
