//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The fetch seam between workers and the HTTP client
//! - HTML link extraction
//! - The worker pool and its termination detection
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, ShutdownHandle};
pub use fetcher::Fetch;
pub use parser::{extract_links, HtmlLinkExtractor, LinkExtractor};
pub use scheduler::{
    CrawlContext, PoolOptions, PoolReport, WorkerPool, WorkerState, WorkerStats,
};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and the seed URL
/// 2. Build the HTTP client and output writer
/// 3. Run the worker pool until no work remains
/// 4. Return the aggregated statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - The first URL to fetch
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed
/// * `Err(CrawlError)` - Setup failed before any work began
pub async fn crawl(config: Config, seed: &str) -> Result<CrawlStatistics, CrawlError> {
    run_crawl(config, seed).await
}
