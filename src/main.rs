//! Provider-Sweep main entry point
//!
//! This is the command-line interface for the Provider-Sweep catalog scanner.

use clap::{Parser, Subcommand};
use futures::StreamExt;
use provider_sweep::config::{load_config_with_hash, Config};
use provider_sweep::output::{load_statistics, print_statistics};
use provider_sweep::scanner::{validate_filters, CatalogClient, RetryPolicy, SSE_CONTENT_TYPE};
use provider_sweep::schedule::ScanScheduler;
use provider_sweep::storage::open_storage;
use provider_sweep::{RunSummary, ScanCoordinator, ScanService};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Provider-Sweep: a bounded-concurrency catalog scanner
///
/// Provider-Sweep walks a range of provider IDs against the training
/// catalog, stores every provider it finds, and logs a summary per run.
#[derive(Parser, Debug)]
#[command(name = "provider-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A bounded-concurrency catalog scanner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a manual sweep and wait for its summary
    Scan {
        /// First provider ID (defaults to the scheduled range)
        #[arg(long)]
        start: Option<i64>,

        /// Last provider ID, inclusive (defaults to the scheduled range)
        #[arg(long)]
        end: Option<i64>,
    },

    /// Run a manual sweep and print its progress as server-sent events
    Stream {
        #[arg(long)]
        start: i64,

        #[arg(long)]
        end: i64,
    },

    /// Run the daily scheduled sweep until interrupted
    Schedule,

    /// Show recent runs and provider totals from the database
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Ask the catalog how many result pages a filtered search has
    Probe {
        /// Catalog filter as KEY=VALUE (repeatable)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Scan { start, end } => {
            let start = start.unwrap_or(config.schedule.start_id);
            let end = end.unwrap_or(config.schedule.end_id);
            handle_scan(&config, config_hash, start, end).await?;
        }
        Command::Stream { start, end } => handle_stream(&config, config_hash, start, end).await?,
        Command::Schedule => handle_schedule(&config, config_hash).await?,
        Command::Runs { limit } => handle_runs(&config, limit).await?,
        Command::Probe { filters } => handle_probe(&config, &filters).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("provider_sweep=info,warn"),
            1 => EnvFilter::new("provider_sweep=debug,info"),
            2 => EnvFilter::new("provider_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn build_service(config: &Config, config_hash: String) -> Result<ScanService, Box<dyn std::error::Error>> {
    let storage = Arc::new(open_storage(Path::new(&config.output.database_path))?);
    let coordinator = ScanCoordinator::from_config(config, Some(config_hash), storage)?;
    Ok(ScanService::new(coordinator))
}

fn print_summary(summary: &RunSummary) {
    let c = &summary.counters;
    println!("\n=== Run Summary ===\n");
    println!("  Status: {}", summary.status);
    println!("  Trigger: {}", summary.trigger_kind);
    println!("  Processed: {}", c.processed);
    println!("  New or updated: {}", c.new_or_updated);
    println!("  New providers: {}", c.new_providers);
    println!("  Timeouts: {}", c.timeouts);
    println!(
        "  Not found: {}, malformed: {}, HTTP errors: {}, transport errors: {}, sink errors: {}",
        c.not_found, c.malformed, c.http_errors, c.transport_errors, c.sink_errors
    );
    println!("  Duration: {:.1}s", summary.duration_seconds);
}

/// Handles the scan command: manual trigger, then wait for the summary
async fn handle_scan(
    config: &Config,
    config_hash: String,
    start: i64,
    end: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config, config_hash)?;
    let ack = service.trigger_manual(start, end)?;
    println!("{}", ack.message());

    let interrupt = service.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight IDs");
            interrupt.shutdown();
        }
    });

    let summary = ack.wait().await?;
    print_summary(&summary);

    Ok(())
}

/// Handles the stream command: writes every outcome line as an SSE frame
async fn handle_stream(
    config: &Config,
    config_hash: String,
    start: i64,
    end: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config, config_hash)?;
    let mut frames = service.stream(start, end)?.into_sse();

    tracing::debug!("Streaming progress as {}", SSE_CONTENT_TYPE);

    let stdout = std::io::stdout();
    while let Some(frame) = frames.next().await {
        let mut out = stdout.lock();
        out.write_all(frame.as_bytes())?;
        out.flush()?;
    }

    Ok(())
}

/// Handles the schedule command: daily sweeps until Ctrl-C
async fn handle_schedule(config: &Config, config_hash: String) -> Result<(), Box<dyn std::error::Error>> {
    if !config.schedule.enabled {
        println!("Scheduling is disabled in the configuration.");
        return Ok(());
    }

    let service = build_service(config, config_hash)?;
    let scheduler = ScanScheduler::start(service.clone(), &config.schedule).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");

    scheduler.shutdown().await?;
    service.shutdown();

    Ok(())
}

/// Handles the runs command: shows statistics from the database
async fn handle_runs(config: &Config, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, limit).await?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the probe command: reports the size of a filtered search
async fn handle_probe(
    config: &Config,
    filters: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error>> {
    validate_filters(filters)?;

    let client = CatalogClient::new(&config.catalog, RetryPolicy::from_config(&config.scanner))?;
    let count = client.count_pages(filters).await?;

    println!("Total pages: {}", count.total_pages);
    println!("Total elements: {}", count.total_elements);

    Ok(())
}
