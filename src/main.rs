//! Ripcrawl main entry point
//!
//! This is the command-line interface for the Ripcrawl crawler.

use anyhow::{bail, Context};
use clap::Parser;
use ripcrawl::config::{load_config, Config, ProxyConfig};
use ripcrawl::crawler::Coordinator;
use ripcrawl::http::ProxyAddress;
use ripcrawl::output::print_statistics;
use ripcrawl::url::parse_http_url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripcrawl: a concurrent web crawler
///
/// Ripcrawl fetches the seed URL over plain HTTP/1.1, follows every link it
/// finds and fetches each discovered URL exactly once. Successfully fetched
/// pages are saved to the output directory, named after the last segment of
/// their path.
#[derive(Parser, Debug)]
#[command(name = "ripcrawl")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent web crawler", long_about = None)]
struct Cli {
    /// Number of workers fetching in parallel
    #[arg(value_name = "POOL_SIZE", value_parser = clap::value_parser!(u16).range(1..))]
    pool_size: u16,

    /// URL the crawl starts from
    #[arg(value_name = "SEED_URL")]
    seed_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory fetched pages are written to (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Route every request through an HTTP proxy
    #[arg(long, value_name = "HOST:PORT")]
    proxy: Option<ProxyAddress>,

    /// Do not write fetched pages to disk
    #[arg(long)]
    no_save: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = parse_http_url(&cli.seed_url) {
        bail!("Invalid seed URL: {}", e);
    }

    let config = build_config(&cli)?;
    tracing::info!(
        "Crawling {} with {} workers",
        cli.seed_url,
        config.pool.size
    );

    let coordinator = Coordinator::new(config).context("Failed to set up crawl")?;

    // Ctrl-C stops dequeuing; fetches in flight still finish
    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight fetches");
            shutdown.shutdown();
        }
    });

    match coordinator.run(&cli.seed_url).await {
        Ok(stats) => {
            if !cli.quiet {
                println!();
                print_statistics(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Loads the optional config file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    config.pool.size = usize::from(cli.pool_size);
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
    if cli.no_save {
        config.output.save_pages = false;
    }
    if let Some(proxy) = &cli.proxy {
        config.proxy = Some(ProxyConfig {
            host: proxy.host.clone(),
            port: proxy.port,
        });
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripcrawl=info,warn"),
            1 => EnvFilter::new("ripcrawl=debug,info"),
            2 => EnvFilter::new("ripcrawl=trace,debug"),
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
