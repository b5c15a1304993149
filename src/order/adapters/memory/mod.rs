//! In-memory adapter implementations for testing.
//!
//! These adapters provide simple, thread-safe implementations suitable for
//! unit tests and database-free local runs.

mod assignment;
mod order;
mod roster;
mod source;

pub use assignment::InMemoryAssignmentRepository;
pub use order::InMemoryOrderStore;
pub use roster::InMemoryRoster;
pub use source::{InMemorySourceClient, RecordedPush};
