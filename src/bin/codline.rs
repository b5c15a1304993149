//! Administrative command line for the order lifecycle engine.
//!
//! Usage:
//!
//! ```text
//! codline [--config codline.toml] <command>
//! ```
//!
//! Commands operate on the `PostgreSQL` database named by `database.url`
//! (or `CODLINE_DATABASE_URL`). Results are reported through the log, whose
//! verbosity follows `RUST_LOG` and defaults to `info`.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use codline::config::{CodlineConfig, ConfigError, build_store_bindings, load_config_from_path};
use codline::order::{
    adapters::postgres::{
        OrderPgPool, PostgresAssignmentRepository, PostgresOrderRepository,
        PostgresRosterRepository, create_schema,
    },
    domain::{Store, StoreId},
    ports::OrderRepositoryError,
    services::{
        AssignmentPlanner, IngestionError, IngestionReport, IngestionService, PlannerError,
        QueueError, QueueService, RosterService, RosterServiceError,
    },
};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use mockable::DefaultClock;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Ingestion = IngestionService<
    PostgresOrderRepository,
    PostgresRosterRepository,
    PostgresAssignmentRepository,
    DefaultClock,
>;

#[derive(Debug, Parser)]
#[command(name = "codline", version, about)]
struct Cli {
    /// Configuration file layered over the defaults.
    #[arg(long, default_value = codline::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database tables.
    Migrate,
    /// Register the configured stores that are not yet known.
    Provision,
    /// Register an agent.
    AddAgent {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Sign-in PIN of 4 to 6 digits.
        #[arg(long)]
        pin: String,
    },
    /// Give an agent a store's orders for a day.
    Assign {
        /// Store name.
        #[arg(long)]
        store: String,
        /// Agent PIN.
        #[arg(long)]
        pin: String,
        /// Day the assignment covers; today when omitted.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Assign pending orders to today's agents.
    Distribute,
    /// Pull orders and abandoned carts from every configured store.
    Pull {
        /// Days to look back; defaults to `ingestion.fetch_days`.
        #[arg(long)]
        days: Option<u32>,
    },
    /// Import orders from a CSV file.
    Import {
        /// CSV file to read.
        file: PathBuf,
        /// Store for rows whose channel matches no store.
        #[arg(long)]
        store: Option<String>,
    },
    /// Show how many orders are in each status.
    Counts,
    /// Delete every order and call log.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not open database pool: {0}")]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Orders(#[from] OrderRepositoryError),
    #[error(transparent)]
    Roster(#[from] RosterServiceError),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("no active store named '{0}'")]
    UnknownStore(String),
    #[error("no active agent has that PIN")]
    UnknownAgent,
    #[error("refusing to delete all orders without --yes")]
    NotConfirmed,
}

struct App {
    config: CodlineConfig,
    pool: OrderPgPool,
    orders: Arc<PostgresOrderRepository>,
    roster: Arc<PostgresRosterRepository>,
    assignments: Arc<PostgresAssignmentRepository>,
    clock: Arc<DefaultClock>,
}

impl App {
    fn connect(config: CodlineConfig) -> Result<Self, CliError> {
        let manager = ConnectionManager::<PgConnection>::new(config.database.url.as_str());
        let pool = Pool::builder()
            .max_size(config.database.pool_size)
            .build(manager)?;
        Ok(Self {
            orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
            roster: Arc::new(PostgresRosterRepository::new(pool.clone())),
            assignments: Arc::new(PostgresAssignmentRepository::new(pool.clone())),
            clock: Arc::new(DefaultClock),
            pool,
            config,
        })
    }

    fn roster_service(&self) -> RosterService<PostgresRosterRepository, DefaultClock> {
        RosterService::new(Arc::clone(&self.roster), Arc::clone(&self.clock))
    }

    fn planner(
        &self,
    ) -> AssignmentPlanner<PostgresOrderRepository, PostgresAssignmentRepository, DefaultClock>
    {
        AssignmentPlanner::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
    }

    fn ingestion(&self, stores: &[Store]) -> Result<Ingestion, CliError> {
        let default_store = self
            .config
            .ingestion
            .default_store
            .as_deref()
            .map(|name| store_named(stores, name))
            .transpose()?;
        let bindings = build_store_bindings(&self.config, stores)?;
        Ok(IngestionService::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.roster),
            Arc::clone(&self.assignments),
            Arc::clone(&self.clock),
        )
        .with_bindings(bindings)
        .with_preview_limit(self.config.ingestion.preview_limit)
        .with_default_store(default_store))
    }

    async fn run(&self, command: Command) -> Result<(), CliError> {
        match command {
            Command::Migrate => {
                create_schema(&self.pool).await?;
                info!("schema created");
            }
            Command::Provision => {
                let stores = self
                    .roster_service()
                    .ensure_stores(&self.config.store_specs())
                    .await?;
                info!(stores = stores.len(), "stores provisioned");
            }
            Command::AddAgent { name, pin } => {
                let agent = self.roster_service().register_agent(&name, &pin).await?;
                info!(agent_id = %agent.id(), name = agent.name(), "agent added");
            }
            Command::Assign { store, pin, date } => self.assign(&store, &pin, date).await?,
            Command::Distribute => {
                let report = self.planner().distribute().await?;
                info!(
                    date = %report.date,
                    distributed = report.distributed,
                    remaining_pending = report.remaining_pending,
                    "distribution finished"
                );
            }
            Command::Pull { days } => {
                let stores = self.roster_service().stores().await?;
                let since_days = days.unwrap_or(self.config.ingestion.fetch_days);
                let report = self
                    .ingestion(&stores)?
                    .pull_from_sources(since_days)
                    .await?;
                log_report("pull", &report);
            }
            Command::Import { file, store } => {
                let stores = self.roster_service().stores().await?;
                let default_store = store
                    .as_deref()
                    .map(|name| store_named(&stores, name))
                    .transpose()?;
                let input = File::open(&file).map_err(|source| CliError::Io {
                    path: file.clone(),
                    source,
                })?;
                let report = self
                    .ingestion(&stores)?
                    .import_spreadsheet(input, default_store)
                    .await?;
                log_report("import", &report);
            }
            Command::Counts => {
                let counts = QueueService::new(Arc::clone(&self.orders))
                    .status_counts()
                    .await?;
                info!(
                    pending = counts.pending,
                    assigned = counts.assigned,
                    calling = counts.calling,
                    confirmed = counts.confirmed,
                    cancelled = counts.cancelled,
                    total = counts.total(),
                    "order counts"
                );
            }
            Command::Reset { yes } => {
                if !yes {
                    return Err(CliError::NotConfirmed);
                }
                QueueService::new(Arc::clone(&self.orders))
                    .bulk_reset()
                    .await?;
            }
        }
        Ok(())
    }

    async fn assign(
        &self,
        store_name: &str,
        pin: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), CliError> {
        let roster = self.roster_service();
        let stores = roster.stores().await?;
        let store_id = store_named(&stores, store_name)?;
        let agent = roster
            .find_agent_by_pin(pin)
            .await?
            .ok_or(CliError::UnknownAgent)?;
        let outcome = self
            .planner()
            .assign_store(store_id, agent.id(), date)
            .await?;
        info!(store = store_name, agent = agent.name(), ?outcome, "assignment saved");
        Ok(())
    }
}

fn store_named(stores: &[Store], name: &str) -> Result<StoreId, CliError> {
    stores
        .iter()
        .find(|store| store.name().as_str().eq_ignore_ascii_case(name.trim()))
        .map(Store::id)
        .ok_or_else(|| CliError::UnknownStore(name.to_owned()))
}

fn log_report(run: &str, report: &IngestionReport) {
    info!(
        run,
        total = report.total,
        imported = report.imported,
        skipped = report.skipped,
        duplicates = report.duplicates,
        failed = report.failed,
        distributed = report.distribution.as_ref().map_or(0, |dist| dist.distributed),
        "ingestion finished"
    );
    for order in &report.preview {
        info!(
            order = %order.external_id(),
            customer = order.details().customer_name.as_str(),
            product = order.details().product_name.as_str(),
            "imported"
        );
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config_from_path(&cli.config)?;
    let app = App::connect(config)?;
    app.run(cli.command).await?;
    Ok(())
}
