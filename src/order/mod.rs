//! Order lifecycle and distribution engine.
//!
//! Orders arrive from storefront feeds, abandoned-cart feeds, and
//! spreadsheets. They are stored once per external identifier, handed to
//! agents through daily store assignments, and settled by call
//! dispositions whose outcome is pushed back to the source system on a
//! best-effort basis. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
