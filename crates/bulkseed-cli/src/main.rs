mod config;
mod registry;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use bulkseed_core::{Error as CoreError, RecordCountPlan, gib_to_bytes, redact_connection_string};
use bulkseed_generate::{GenerationEngine, GenerationError, LiveFeedScheduler};
use bulkseed_storage::{StorageEngine, StorageOptions};
use config::{BulkseedConfig, GenerateSettings, Overrides, load_config};
use registry::{RunContext, init_logging, start_run, write_report};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("config file error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "bulkseed", version, about = "Bulk relational test-data generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tables and indexes, then exit.
    Migrate(MigrateArgs),
    /// Migrate, bulk-generate, then keep a live feed running until Ctrl-C.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Database connection string (postgres://, postgresql:// or memory://).
    #[arg(
        long,
        env = "DATABASE_URL",
        value_name = "CONNECTION_STRING",
        hide_env_values = true
    )]
    conn: String,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Target storage size in GiB.
    #[arg(long, value_name = "GIB")]
    target_gib: Option<f64>,
    /// Records per bulk insert.
    #[arg(long)]
    batch_size: Option<u64>,
    /// Maximum batches in flight.
    #[arg(long)]
    concurrency: Option<usize>,
    /// Seconds between live-feed firings.
    #[arg(long)]
    interval_secs: Option<u64>,
    /// Seed for reproducible field values.
    #[arg(long)]
    seed: Option<u64>,
    /// TOML settings file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output directory for run artifacts.
    #[arg(long, value_name = "DIR")]
    run_dir: Option<PathBuf>,
    /// Stop after the bulk phase.
    #[arg(long, default_value_t = false)]
    no_live_feed: bool,
}

impl GenerateArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            target_gib: self.target_gib,
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            interval_secs: self.interval_secs,
            seed: self.seed,
            run_dir: self.run_dir.clone(),
            no_live_feed: self.no_live_feed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // `.env` must be loaded before clap reads DATABASE_URL.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => run_migrate(args).await,
        Command::Generate(args) => run_generate(args).await,
    }
}

async fn run_migrate(args: MigrateArgs) -> Result<(), CliError> {
    let conn = args.connection.conn;
    let engine = detect_engine(&conn)?;
    init_logging(None)?;

    let connection = redact_connection_string(&conn);
    tracing::info!(
        event = "migrate_started",
        engine = engine.as_str(),
        connection = %connection.redacted
    );

    let storage = bulkseed_storage::connect(&conn, &StorageOptions::default()).await?;
    storage.migrate().await?;

    tracing::info!(event = "migrate_finished", engine = storage.engine());
    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BulkseedConfig::default(),
    };
    let settings = GenerateSettings::resolve(config, args.overrides())?;
    let conn = args.connection.conn;
    let engine_kind = detect_engine(&conn)?;

    let run_id = Uuid::new_v4().to_string();
    let connection = redact_connection_string(&conn);
    let plan = RecordCountPlan::estimate(
        gib_to_bytes(settings.target_gib),
        settings.row_sizes,
        settings.ratio,
    );

    let run_paths = match &settings.run_dir {
        Some(run_dir) => Some(start_run(&RunContext {
            run_id: run_id.clone(),
            started_at: chrono::Utc::now(),
            engine: engine_kind.as_str().to_string(),
            run_dir: run_dir.clone(),
            plan,
            settings: settings.clone(),
            connection: connection.clone(),
        })?),
        None => None,
    };
    init_logging(run_paths.as_ref().map(|paths| paths.logs_path.as_path()))?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        engine = engine_kind.as_str(),
        connection = %connection.redacted
    );
    tracing::info!(
        event = "plan_computed",
        target_gib = settings.target_gib,
        users = plan.users,
        products = plan.products,
        orders = plan.orders
    );

    let timer = Instant::now();
    let storage = bulkseed_storage::connect(&conn, &settings.storage_options()).await?;
    storage.migrate().await?;

    let engine =
        GenerationEngine::with_run_id(Arc::clone(&storage), settings.options.clone(), &run_id);
    let report = engine.run(&plan).await?;

    if let Some(paths) = &run_paths {
        write_report(paths, &report)?;
        tracing::info!(event = "report_written", path = %paths.report_path.display());
    }

    if settings.live_feed {
        let cancel = CancellationToken::new();
        tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

        let feed =
            LiveFeedScheduler::new(storage, engine.fields().live(), settings.interval(), timer);
        feed.run(cancel).await;
    }

    tracing::info!(
        event = "run_finished",
        status = "success",
        failed_batches = report.failed_batches(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(event = "shutdown_requested"),
        Err(err) => tracing::warn!(event = "signal_unavailable", error = %err),
    }
    cancel.cancel();
}

fn detect_engine(conn: &str) -> Result<StorageEngine, CliError> {
    StorageEngine::detect(conn)
        .ok_or_else(|| CliError::UnsupportedEngine(redact_connection_string(conn).redacted))
}
