//! Ripcrawl file server entry point
//!
//! Serves a directory over plain HTTP/1.1, for example as a local target
//! for the crawler.

use anyhow::Context;
use clap::Parser;
use ripcrawl::server::{FileServer, ServerOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Ripcrawl-serve: a minimal HTTP/1.1 file server
///
/// Answers `GET /<path> HTTP/1.1` requests with files below ROOT and stops
/// once no connection has arrived for the idle timeout.
#[derive(Parser, Debug)]
#[command(name = "ripcrawl-serve")]
#[command(version = "1.0.0")]
#[command(about = "A minimal HTTP/1.1 file server", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(value_name = "PORT")]
    port: u16,

    /// Directory to serve
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Number of connections handled concurrently
    #[arg(value_name = "POOL_SIZE", default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pool_size: u16,

    /// Stop after this many seconds without a new connection
    #[arg(long, value_name = "SECS", default_value_t = 40)]
    idle_timeout_secs: u64,

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
    setup_logging(cli.verbose, cli.quiet);

    let options = ServerOptions {
        root: cli.root.clone(),
        workers: usize::from(cli.pool_size),
        idle_timeout: Duration::from_secs(cli.idle_timeout_secs),
    };

    let server = FileServer::bind(("0.0.0.0", cli.port), options)
        .await
        .with_context(|| format!("Failed to start server on port {}", cli.port))?;
    server.run().await.context("Server failed")?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripcrawl=info,warn"),
            1 => EnvFilter::new("ripcrawl=debug,info"),
            _ => EnvFilter::new("ripcrawl=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
