//! Worker pool: runs a fixed number of workers against the frontier
//!
//! Each worker repeatedly:
//! 1. Dequeues a URL (or exits on termination)
//! 2. Fetches it
//! 3. Saves 2xx bodies and extracts their links
//! 4. Offers every extracted link back to the frontier
//! 5. Drops its work item, marking the URL complete
//!
//! The pool itself does not poll workers. It waits on the frontier until
//! nothing is pending and nothing is in flight, evaluated under the
//! frontier's lock, then terminates the frontier and joins the workers
//! within a grace period.

use crate::crawler::fetcher::Fetch;
use crate::crawler::parser::LinkExtractor;
use crate::frontier::{Dequeued, Frontier};
use crate::http::ResponseClass;
use crate::output::PageWriter;
use crate::{CrawlError, FailureKind};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

/// What a worker is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting on the frontier
    Idle,

    /// Processing a URL
    Fetching,
}

/// Per-worker counters, returned when the worker exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Worker identity
    pub worker_id: usize,

    /// URLs dequeued and attempted
    pub fetches: u64,

    /// Completed responses by class
    pub responses: HashMap<ResponseClass, u64>,

    /// Failed fetches by failure class
    pub failures: HashMap<FailureKind, u64>,

    /// Pages written to the output directory
    pub pages_saved: u64,

    /// Pages that could not be written
    pub save_failures: u64,

    /// Links produced by the extractor
    pub links_found: u64,

    /// Links the frontier accepted as new
    pub links_accepted: u64,

    /// URLs whose processing panicked
    pub panics: u64,
}

/// Collaborators shared by all workers
pub struct CrawlContext {
    pub fetcher: Arc<dyn Fetch>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub writer: Option<PageWriter>,
}

impl CrawlContext {
    pub fn new(fetcher: Arc<dyn Fetch>, extractor: Arc<dyn LinkExtractor>) -> Self {
        Self {
            fetcher,
            extractor,
            writer: None,
        }
    }

    /// Saves 2xx bodies through `writer`
    pub fn with_writer(mut self, writer: PageWriter) -> Self {
        self.writer = Some(writer);
        self
    }
}

/// Worker pool sizing and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Number of workers
    pub size: usize,

    /// How long to wait for workers to exit after termination
    pub shutdown_grace: Duration,

    /// Interval between progress log lines
    pub progress_interval: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            size: 4,
            shutdown_grace: Duration::from_millis(500),
            progress_interval: Duration::from_secs(5),
        }
    }
}

/// Outcome of a pool run
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Stats of every worker that exited on its own
    pub workers: Vec<WorkerStats>,

    /// True if the crawl ended by quiescence rather than by a shutdown request
    pub completed: bool,

    /// Workers aborted after the grace period
    pub aborted_workers: usize,

    /// Workers that panicked
    pub panicked_workers: usize,

    /// URLs still pending when the pool stopped
    pub pending_left: usize,

    /// URLs ever accepted by the frontier
    pub urls_seen: usize,
}

type StateBoard = Mutex<Vec<WorkerState>>;

/// A fixed-size pool of crawl workers
pub struct WorkerPool {
    frontier: Frontier,
    board: Arc<StateBoard>,
    handles: Vec<JoinHandle<WorkerStats>>,
    options: PoolOptions,
}

impl WorkerPool {
    /// Starts `options.size` workers pulling from `frontier`
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(WorkerPool)` - All workers are running
    /// * `Err(CrawlError::Setup)` - The pool size is zero or no runtime is available
    pub fn start(
        frontier: Frontier,
        context: CrawlContext,
        options: PoolOptions,
    ) -> Result<Self, CrawlError> {
        if options.size == 0 {
            return Err(CrawlError::Setup(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        if options.progress_interval.is_zero() {
            return Err(CrawlError::Setup(
                "progress interval must be greater than zero".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CrawlError::Setup(format!("cannot start workers: {}", e)))?;

        let context = Arc::new(context);
        let board = Arc::new(Mutex::new(vec![WorkerState::Idle; options.size]));
        let handles = (0..options.size)
            .map(|id| {
                let worker = Worker {
                    id,
                    frontier: frontier.clone(),
                    context: Arc::clone(&context),
                    board: Arc::clone(&board),
                    stats: WorkerStats {
                        worker_id: id,
                        ..WorkerStats::default()
                    },
                };
                runtime.spawn(worker.run())
            })
            .collect();

        tracing::info!("Started worker pool with {} workers", options.size);

        Ok(Self {
            frontier,
            board,
            handles,
            options,
        })
    }

    /// Number of workers
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Current state of every worker, indexed by worker id
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Waits for quiescence (or a shutdown request), then stops the pool
    pub async fn run(self) -> PoolReport {
        let mut progress = tokio::time::interval(self.options.progress_interval);
        progress.tick().await;

        let completed = loop {
            tokio::select! {
                quiescent = self.frontier.wait_quiescent() => break quiescent,
                _ = progress.tick() => self.log_progress(),
            }
        };

        if completed {
            tracing::info!("Frontier drained and no fetch in flight, stopping workers");
        } else {
            tracing::info!("Shutdown requested, stopping workers");
        }
        self.frontier.terminate();

        let mut report = PoolReport {
            completed,
            ..PoolReport::default()
        };

        let deadline = Instant::now() + self.options.shutdown_grace;
        for (id, mut handle) in self.handles.into_iter().enumerate() {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(stats)) => report.workers.push(stats),
                Ok(Err(e)) => {
                    tracing::error!("Worker {} failed: {}", id, e);
                    report.panicked_workers += 1;
                }
                Err(_) => {
                    tracing::warn!("Worker {} did not exit within the grace period, aborting", id);
                    handle.abort();
                    report.aborted_workers += 1;
                }
            }
        }

        let snapshot = self.frontier.snapshot();
        report.pending_left = snapshot.pending;
        report.urls_seen = snapshot.seen;
        report
    }

    fn log_progress(&self) {
        let snapshot = self.frontier.snapshot();
        let busy = self
            .worker_states()
            .iter()
            .filter(|state| **state == WorkerState::Fetching)
            .count();
        tracing::info!(
            "Progress: {} pending, {} in flight, {}/{} workers busy, {} URLs seen",
            snapshot.pending,
            snapshot.in_flight,
            busy,
            self.size(),
            snapshot.seen
        );
    }
}

struct Worker {
    id: usize,
    frontier: Frontier,
    context: Arc<CrawlContext>,
    board: Arc<StateBoard>,
    stats: WorkerStats,
}

impl Worker {
    async fn run(mut self) -> WorkerStats {
        tracing::debug!("Worker {} started", self.id);

        loop {
            let item = match self.frontier.dequeue().await {
                Dequeued::Work(item) => item,
                Dequeued::Terminated => break,
            };

            self.set_state(WorkerState::Fetching);
            // A panicking fetcher, extractor or writer costs this URL only;
            // the worker keeps draining the frontier.
            let outcome = AssertUnwindSafe(self.process(item.url()))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                self.stats.panics += 1;
                tracing::error!("Worker {} panicked while processing {}", self.id, item.url());
            }
            // Links found above are already enqueued; completing the item
            // may now make the crawl quiescent.
            drop(item);
            self.set_state(WorkerState::Idle);
        }

        tracing::debug!("Worker {} exiting after {} fetches", self.id, self.stats.fetches);
        self.stats
    }

    async fn process(&mut self, url: &str) {
        self.stats.fetches += 1;
        tracing::debug!("Worker {} fetching {}", self.id, url);

        let result = match self.context.fetcher.fetch(url).await {
            Ok(result) => result,
            Err(e) => {
                *self.stats.failures.entry(e.kind()).or_default() += 1;
                if e.is_url_level() {
                    tracing::debug!("Discarding {}: {}", url, e);
                } else {
                    tracing::warn!("Fetch failed for {}: {}", url, e);
                }
                return;
            }
        };

        *self.stats.responses.entry(result.class).or_default() += 1;
        if !result.is_success() {
            tracing::info!(
                "Skipping {}: {} {} ({})",
                url,
                result.status,
                result.reason,
                result.class
            );
            return;
        }

        if let Some(writer) = &self.context.writer {
            match writer.save(url, &result.body).await {
                Ok(path) => {
                    self.stats.pages_saved += 1;
                    tracing::debug!("Saved {} to {}", url, path.display());
                }
                Err(e) => {
                    self.stats.save_failures += 1;
                    tracing::warn!("Failed to save {}: {}", url, e);
                }
            }
        }

        let links = self.context.extractor.extract(url, &result.body);
        for link in links {
            self.stats.links_found += 1;
            if self.frontier.enqueue(link) {
                self.stats.links_accepted += 1;
            }
        }
    }

    fn set_state(&self, state: WorkerState) {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = board.get_mut(self.id) {
            *slot = state;
        }
    }
}
