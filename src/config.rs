//! Layered configuration for the call-center engine.
//!
//! Values merge in this order, later sources winning:
//!
//! 1. Compiled defaults
//! 2. A TOML file (`codline.toml` unless a path is given)
//! 3. `CODLINE_*` environment variables, e.g. `CODLINE_DATABASE_URL` for
//!    `database.url` or `CODLINE_SYNC_TIMEOUT_SECS` for `sync.timeout_secs`
//!
//! [`build_store_bindings`] turns the `[[stores]]` entries into the source
//! clients injected into ingestion and the sync gateway.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::order::{
    adapters::{
        shiprocket::{DEFAULT_CARTS_ENDPOINT, ShiprocketClient},
        shopify::ShopifyClient,
    },
    domain::Store,
    ports::{SourceClient, SourceClientError},
    services::{StoreBindings, StoreSpec},
};

/// File read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "codline.toml";

/// Errors raised while loading configuration or building clients.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value had the wrong shape.
    #[error("invalid configuration: {0}")]
    Load(Box<figment::Error>),

    /// A store entry could not be turned into a client.
    #[error("store '{store}' has an unusable client configuration: {source}")]
    Client {
        /// Store name from the configuration.
        store: String,
        /// Underlying client construction failure.
        source: SourceClientError,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodlineConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Ingestion behaviour.
    pub ingestion: IngestionConfig,
    /// Outbound sync behaviour.
    pub sync: SyncConfig,
    /// Stores and their source-system credentials.
    pub stores: Vec<StoreConfig>,
}

impl CodlineConfig {
    /// Returns the roster entries for every configured store.
    #[must_use]
    pub fn store_specs(&self) -> Vec<StoreSpec> {
        self.stores
            .iter()
            .map(|store| StoreSpec::new(store.name.as_str(), store.handle.as_str()))
            .collect()
    }
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/codline".to_owned(),
            pool_size: 8,
        }
    }
}

/// `[ingestion]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestionConfig {
    /// Store name used when a record's channel matches no store.
    pub default_store: Option<String>,
    /// Imported orders echoed back per batch.
    pub preview_limit: usize,
    /// How many days back source pulls reach.
    pub fetch_days: u32,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            default_store: None,
            preview_limit: 5,
            fetch_days: 10,
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Upper bound on each outbound call, in seconds.
    pub timeout_secs: u64,
}

impl SyncConfig {
    /// Returns the outbound call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// One `[[stores]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store display name.
    pub name: String,
    /// Source-system handle recorded with the store.
    #[serde(default)]
    pub handle: String,
    /// Source system the store's orders come from.
    #[serde(flatten)]
    pub source: StoreSource,
}

/// Source-system client settings, selected by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreSource {
    /// Shopify Admin API.
    Shopify {
        /// Shop subdomain.
        shop_name: String,
        /// Admin API access token.
        access_token: String,
    },
    /// Shiprocket abandoned-cart API.
    Shiprocket {
        /// Account e-mail.
        email: String,
        /// Account password.
        password: String,
        /// Path segment of the abandoned-cart listing.
        #[serde(default = "default_carts_endpoint")]
        carts_endpoint: String,
    },
}

fn default_carts_endpoint() -> String {
    DEFAULT_CARTS_ENDPOINT.to_owned()
}

/// Loads configuration from defaults, `codline.toml`, and the environment.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when a source is malformed.
pub fn load_config() -> Result<CodlineConfig, ConfigError> {
    load_config_from_path(Path::new(DEFAULT_CONFIG_FILE))
}

/// Loads configuration from defaults, the file at `path`, and the
/// environment. A missing file is treated as empty.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when a source is malformed.
pub fn load_config_from_path(path: &Path) -> Result<CodlineConfig, ConfigError> {
    Ok(Figment::new()
        .merge(Serialized::defaults(CodlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()?)
}

/// Loads configuration from defaults and a TOML string only.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when the TOML is malformed.
pub fn load_config_from_str(toml: &str) -> Result<CodlineConfig, ConfigError> {
    Ok(Figment::new()
        .merge(Serialized::defaults(CodlineConfig::default()))
        .merge(Toml::string(toml))
        .extract()?)
}

/// Maps `CODLINE_SECTION_KEY` onto `section.key`.
///
/// Only the section prefix is split so keys keep their underscores.
fn env_provider() -> Env {
    Env::prefixed("CODLINE_").map(|key| {
        key.as_str()
            .replacen("database_", "database.", 1)
            .replacen("ingestion_", "ingestion.", 1)
            .replacen("sync_", "sync.", 1)
            .into()
    })
}

/// Builds a source client for every configured store present in `roster`.
///
/// Configured stores missing from the roster are logged and left unbound.
///
/// # Errors
///
/// Returns [`ConfigError::Client`] when a client cannot be constructed.
pub fn build_store_bindings(
    config: &CodlineConfig,
    roster: &[Store],
) -> Result<StoreBindings, ConfigError> {
    let timeout = config.sync.timeout();
    let mut bindings = StoreBindings::new();
    for entry in &config.stores {
        let Some(store) = find_store(roster, &entry.name) else {
            warn!(store = entry.name.as_str(), "configured store is not registered");
            continue;
        };
        let client = build_client(&entry.source, timeout).map_err(|source| ConfigError::Client {
            store: entry.name.clone(),
            source,
        })?;
        bindings.bind(store.id(), client);
    }
    Ok(bindings)
}

fn find_store<'a>(roster: &'a [Store], name: &str) -> Option<&'a Store> {
    let wanted = name.trim();
    roster
        .iter()
        .find(|store| store.name().as_str().eq_ignore_ascii_case(wanted))
}

fn build_client(
    source: &StoreSource,
    timeout: Duration,
) -> Result<Arc<dyn SourceClient>, SourceClientError> {
    let client: Arc<dyn SourceClient> = match source {
        StoreSource::Shopify {
            shop_name,
            access_token,
        } => Arc::new(ShopifyClient::new(shop_name.as_str(), access_token, timeout)?),
        StoreSource::Shiprocket {
            email,
            password,
            carts_endpoint,
        } => Arc::new(ShiprocketClient::new(
            email.as_str(),
            password.as_str(),
            carts_endpoint.as_str(),
            timeout,
        )?),
    };
    Ok(client)
}
