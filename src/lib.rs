//! Codline: call-center engine for cash-on-delivery order verification.
//!
//! Orders and abandoned carts are pulled from storefronts, distributed to
//! telephone agents under a daily store assignment map, called, and settled
//! with a disposition whose outcome is pushed back to the storefront.
//!
//! # Architecture
//!
//! Codline follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`order`]: Order ingestion, distribution, dispositions, and sync
//! - [`config`]: Layered configuration and store client bindings

pub mod config;
pub mod order;
