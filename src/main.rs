//! Paperfetch main entry point
//!
//! This is the command-line interface for the paperfetch harvester. The
//! job file supplies the query, sources, and paths; every field can be
//! overridden from the command line.

use anyhow::Context;
use clap::Parser;
use paperfetch::config::{parse_config, validate, JobConfig};
use paperfetch::crawler::{Orchestrator, Shutdown};
use paperfetch::source::SourceId;
use paperfetch::store::CsvStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Fetch research papers from various search backends
#[derive(Parser, Debug)]
#[command(name = "paperfetch")]
#[command(version = "1.0.0")]
#[command(about = "Harvest paper titles and URLs from search backends", long_about = None)]
struct Cli {
    /// Path to the TOML job file
    #[arg(short, long, value_name = "CONFIG", default_value = "job.toml")]
    config: PathBuf,

    /// The query to search papers with (overrides the job file)
    #[arg(long)]
    query: Option<String>,

    /// The sources to fetch papers from (overrides the job file)
    #[arg(long, num_args = 1.., value_name = "SOURCE")]
    sources: Option<Vec<SourceId>>,

    /// Max results per source (overrides the job file)
    #[arg(long)]
    max_results: Option<u64>,

    /// Path to save the CSV file (overrides the job file)
    #[arg(long)]
    csv_file: Option<PathBuf>,

    /// Path to save the log file (overrides the job file)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Google Custom Search API key (overrides the job file)
    #[arg(long)]
    api_key: Option<String>,

    /// Google Custom Search engine id (overrides the job file)
    #[arg(long)]
    cse_id: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the job and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = parse_config(&cli.config)
        .with_context(|| format!("failed to load job file {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid job configuration")?;

    if cli.dry_run {
        print_job(&config);
        return Ok(());
    }

    setup_logging(cli.verbose, cli.quiet, Some(config.log_file.as_path()))?;
    tracing::info!(
        "Logging started. Logs will be saved to {}",
        config.log_file.display()
    );

    let store = CsvStore::open(&config.csv_file)
        .with_context(|| format!("failed to open sink {}", config.csv_file.display()))?;

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested; finishing the in-flight page");
                shutdown.request();
            }
        });
    }

    let csv_file = config.csv_file.clone();
    let mut orchestrator = Orchestrator::new(config, store, shutdown);
    let unique = orchestrator.run().await?;

    println!(
        "Fetched and saved {} unique papers to {}.",
        unique,
        csv_file.display()
    );
    Ok(())
}

/// Applies command-line overrides on top of the parsed job file
fn apply_overrides(config: &mut JobConfig, cli: &Cli) {
    if let Some(query) = &cli.query {
        config.query = query.clone();
    }
    if let Some(sources) = &cli.sources {
        config.sources = sources.clone();
    }
    if let Some(max_results) = cli.max_results {
        config.max_results = Some(max_results);
    }
    if let Some(csv_file) = &cli.csv_file {
        config.csv_file = csv_file.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file = log_file.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(cse_id) = &cli.cse_id {
        config.cse_id = Some(cse_id.clone());
    }
}

/// Sets up the tracing subscriber: console layer plus a file layer when a
/// log path is configured
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paperfetch=info,warn"),
            1 => EnvFilter::new("paperfetch=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(console).init();
    }

    Ok(())
}

/// Handles --dry-run: shows the validated job without crawling
fn print_job(config: &JobConfig) {
    println!("=== Paperfetch Dry Run ===\n");
    println!("Query: {}", config.query);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        match source.site_domain() {
            Some(domain) => println!("  - {} (site:{})", source, domain),
            None => println!("  - {} (scraped)", source),
        }
    }

    match config.max_results {
        Some(cap) => println!("\nMax results per source: {}", cap),
        None => println!("\nMax results per source: unbounded"),
    }

    println!("\nOutput:");
    println!("  CSV sink: {}", config.csv_file.display());
    println!("  Log file: {}", config.log_file.display());

    if config.needs_api_credentials() {
        println!("\nAPI credentials: present");
    }

    println!("\n✓ Job is valid");
}
