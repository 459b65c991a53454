//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the configured collaborators together:
//! - Building the fetch client (timeouts, proxy) and the link extractor
//! - Preparing the page writer for the output directory
//! - Seeding the frontier and running the worker pool to completion
//! - Turning the pool report into crawl statistics

use crate::config::{validate, Config};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::scheduler::{CrawlContext, PoolOptions, WorkerPool};
use crate::crawler::fetcher::Fetch;
use crate::frontier::Frontier;
use crate::http::{FetchClient, ProxyAddress};
use crate::output::{CrawlStatistics, PageWriter};
use crate::url::parse_http_url;
use crate::{CrawlError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Requests a cooperative stop of a running crawl
///
/// Fetches already in flight finish; no further URLs are dequeued.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    frontier: Frontier,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        tracing::info!("Shutdown requested");
        self.frontier.terminate();
    }

    pub fn is_shutdown(&self) -> bool {
        self.frontier.is_terminated()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    frontier: Frontier,
    fetcher: Arc<dyn Fetch>,
    extractor: Arc<dyn LinkExtractor>,
    writer: Option<PageWriter>,
    options: PoolOptions,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Invalid configuration or unusable output directory
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let mut client = FetchClient::new(
            Duration::from_millis(config.fetch.connect_timeout_ms),
            Duration::from_millis(config.fetch.read_timeout_ms),
        );
        if let Some(proxy) = &config.proxy {
            tracing::info!("Routing requests through proxy {}:{}", proxy.host, proxy.port);
            client = client.with_proxy(ProxyAddress {
                host: proxy.host.clone(),
                port: proxy.port,
            });
        }

        let writer = if config.output.save_pages {
            let writer = PageWriter::new(&config.output.directory).map_err(|e| {
                CrawlError::Setup(format!(
                    "cannot use output directory '{}': {}",
                    config.output.directory, e
                ))
            })?;
            Some(writer)
        } else {
            None
        };

        let options = PoolOptions {
            size: config.pool.size,
            shutdown_grace: Duration::from_millis(config.pool.shutdown_grace_ms),
            progress_interval: Duration::from_millis(config.pool.progress_interval_ms),
        };

        Ok(Self::with_parts(
            Arc::new(client),
            Arc::new(HtmlLinkExtractor::new()),
            writer,
            options,
        ))
    }

    /// Creates a coordinator from explicit collaborators
    pub fn with_parts(
        fetcher: Arc<dyn Fetch>,
        extractor: Arc<dyn LinkExtractor>,
        writer: Option<PageWriter>,
        options: PoolOptions,
    ) -> Self {
        Self {
            frontier: Frontier::new(),
            fetcher,
            extractor,
            writer,
            options,
        }
    }

    /// Handle that stops the crawl from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            frontier: self.frontier.clone(),
        }
    }

    /// Crawls everything reachable from `seed`
    ///
    /// Returns once no URL is pending and no fetch is in flight, or after
    /// a shutdown request, with every worker joined or aborted.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - The crawl ran; individual fetch failures are counted, not returned
    /// * `Err(CrawlError)` - The seed is not an http(s) URL or the pool could not start
    pub async fn run(self, seed: &str) -> Result<CrawlStatistics> {
        parse_http_url(seed)?;
        self.frontier.enqueue(seed);

        tracing::info!(
            "Starting crawl from {} with {} workers",
            seed,
            self.options.size
        );
        if let Some(writer) = &self.writer {
            tracing::info!("Saving pages to {}", writer.directory().display());
        }

        let mut context = CrawlContext::new(self.fetcher, self.extractor);
        if let Some(writer) = self.writer {
            context = context.with_writer(writer);
        }

        let started_at = Utc::now();
        let pool = WorkerPool::start(self.frontier, context, self.options)?;
        let workers = pool.size();
        let report = pool.run().await;
        let finished_at = Utc::now();

        let stats = CrawlStatistics::from_report(&report, workers, started_at, finished_at);
        tracing::info!(
            "Crawl {} after {} fetches ({} URLs seen)",
            if stats.completed {
                "completed"
            } else {
                "stopped"
            },
            stats.fetches,
            stats.urls_seen
        );
        Ok(stats)
    }
}

/// Runs a complete crawl operation with the given configuration
pub async fn run_crawl(config: Config, seed: &str) -> Result<CrawlStatistics> {
    Coordinator::new(config)?.run(seed).await
}
