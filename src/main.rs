//! MitoEnrich - gene list annotation and enrichment
//!
//! A CLI tool that normalizes mitochondrial gene aliases, maps the genes
//! with MyGene.info and runs enrichment with Enrichr and g:Profiler,
//! writing every table as TSV.
//!
//! Exit codes:
//!   0 - Success (also when some or all services returned nothing)
//!   1 - Invalid option values, unreadable config, bad input file, or write failure
//!   2 - Unparsable command line (reported by clap)

mod analysis;
mod cli;
mod config;
mod genes;
mod models;
mod pipeline;
mod report;
mod services;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use pipeline::{Pipeline, RunSummary};
use report::OutputPaths;
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so it can set the log level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("MitoEnrich v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(&args, &config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n[ERROR] {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .mitoenrich.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change libraries, service URLs, timeouts and aliases.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete pipeline for the given arguments.
async fn run(args: &Args, config: &Config) -> Result<RunSummary> {
    let input = args.input_path();
    let paths = OutputPaths::new(args.output_prefix());

    println!("Input: {}", input.display());
    println!("Output prefix: {}", args.output_prefix());
    println!("Enrichr libraries: {}", config.enrichment.libraries.join(", "));
    println!("Timeout: {}s", config.services.timeout_seconds);

    let pipeline = Pipeline::from_config(config)?;
    pipeline.run_file(&input, &paths).await
}

/// Load configuration from file or use defaults, with the file it came from.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location; a file that exists but cannot be parsed is fatal
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(DEFAULT_CONFIG_FILE))),
        None => (Config::default(), None),
    })
}

/// Print the end-of-run report.
fn print_summary(summary: &RunSummary) {
    println!("\nRun Summary:");
    println!(
        "   Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "   Identifiers: {} ({} aliases fixed, {} distinct)",
        summary.identifiers, summary.rewritten, summary.symbols
    );
    println!("   Mapped: {}/{}", summary.mapped, summary.symbols);
    println!(
        "   Enrichr libraries: {} ok, {} failed",
        summary.libraries_ok, summary.libraries_failed
    );
    println!("   g:Profiler terms: {}", summary.gprofiler_terms);
    if summary.summary_rows == 0 {
        println!("   Summary: no results to summarize");
    } else {
        println!("   Summary rows: {}", summary.summary_rows);
    }
    println!("   Duration: {:.1}s", summary.duration_seconds);

    println!("\nFiles written:");
    for file in &summary.files {
        println!("   - {}", file.display());
    }
}
