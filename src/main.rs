//! Bridge-Resolver main entry point
//!
//! This is the command-line interface for batch bridge pair resolution.

use anyhow::Context;
use bridge_resolver::config::{load_config_with_hash, Config};
use bridge_resolver::input::source_for;
use bridge_resolver::output::{build_sinks, print_summary};
use bridge_resolver::{ResolutionEngine, Strategy};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bridge-Resolver: batch lookup of cross-chain bridge pairs
///
/// Reads transaction hashes from a CSV column or a text file, resolves each
/// one against the lookup service, and writes the bridge pairs to CSV (and
/// optionally SQLite).
#[derive(Parser, Debug)]
#[command(name = "bridge-resolver")]
#[command(version = "1.0.0")]
#[command(about = "Batch resolver for cross-chain bridge pairs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Resolution strategy: http or browser
    #[arg(long, default_value_t = Strategy::Http)]
    strategy: Strategy,

    /// Override the input file from the config
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Override the CSV output file from the config
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and load identifiers without resolving anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context(format!("invalid configuration {}", cli.config.display()));
        }
    };

    if let Some(input) = &cli.input {
        config.input.path = input.display().to_string();
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.strategy)
    } else {
        handle_resolve(config, cli.strategy).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bridge_resolver=info,warn"),
            1 => EnvFilter::new("bridge_resolver=debug,info"),
            2 => EnvFilter::new("bridge_resolver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be resolved
fn handle_dry_run(config: &Config, strategy: Strategy) -> anyhow::Result<()> {
    println!("=== Bridge-Resolver Dry Run ===\n");

    println!("Target:");
    println!("  Base URL: {}", config.target.base_url);
    println!("  User agent: {}", config.target.user_agent);
    println!("  Cookies: {}", config.target.cookies.len());

    println!("\nStrategy: {}", strategy);
    match strategy {
        Strategy::Http => {
            println!("  Concurrency: {}", config.http.concurrency);
            println!("  Request timeout: {}ms", config.http.timeout_ms);
        }
        Strategy::Browser => {
            println!("  Workers: {}", config.browser.workers);
            println!("  Headless: {}", config.browser.headless);
            println!(
                "  Navigation timeout: {}ms",
                config.browser.navigation_timeout_ms
            );
            println!("  Element timeout: {}ms", config.browser.element_timeout_ms);
        }
    }

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms doubling, capped at {}ms",
        config.retry.initial_backoff_ms, config.retry.max_backoff_ms
    );

    println!("\nProxies ({}):", config.proxy.len());
    for proxy in &config.proxy {
        let auth = if proxy.has_credentials() {
            " (with credentials)"
        } else {
            ""
        };
        println!("  - {}{}", proxy.server, auth);
    }

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    if let Some(database_path) = &config.output.database_path {
        println!("  Database: {}", database_path);
    }

    let source = source_for(&config.input);
    let identifiers = source
        .load()
        .with_context(|| format!("failed to load identifiers from {}", source.name()))?;

    println!("\nInput: {}", source.name());
    for identifier in identifiers.iter().take(10) {
        println!("  * {}", identifier);
    }
    if identifiers.len() > 10 {
        println!("  ... and {} more", identifiers.len() - 10);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would resolve {} identifier(s) with the {} strategy",
        identifiers.len(),
        strategy
    );

    Ok(())
}

/// Handles the main resolution run
async fn handle_resolve(config: Config, strategy: Strategy) -> anyhow::Result<()> {
    let source = source_for(&config.input);
    let mut sinks = build_sinks(&config.output).context("failed to open output sinks")?;

    let engine = ResolutionEngine::new(config);

    let cancel = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight lookups");
            cancel.cancel();
        }
    });

    match engine.run(source.as_ref(), &mut sinks, strategy).await {
        Ok(result) => {
            tracing::info!("Resolution run completed");
            print_summary(&result);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Resolution run failed: {}", e);
            Err(e.into())
        }
    }
}
