//! Adapters for the order lifecycle ports.
//!
//! # Available Adapters
//!
//! - [`memory`]: thread-safe in-memory repositories and a scripted source
//!   client for tests and database-free runs
//! - [`postgres`]: `PostgreSQL` persistence using Diesel
//! - [`shopify::ShopifyClient`]: storefront orders and checkouts over the
//!   Shopify Admin REST API
//! - [`shiprocket::ShiprocketClient`]: abandoned carts from Shiprocket
//! - [`spreadsheet`]: CSV bulk import with header alias resolution

pub mod memory;
pub mod postgres;
pub mod shiprocket;
pub mod shopify;
pub mod spreadsheet;
