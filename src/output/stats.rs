//! Crawl statistics
//!
//! This module aggregates the counters every worker returns into one
//! summary and prints it.

use crate::crawler::PoolReport;
use crate::http::ResponseClass;
use crate::FailureKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// When the pool started
    pub started_at: DateTime<Utc>,

    /// When the last worker was joined
    pub finished_at: DateTime<Utc>,

    /// True if the crawl ran until no work remained
    pub completed: bool,

    /// Number of workers the pool ran
    pub workers: usize,

    /// Workers aborted after the shutdown grace period
    pub aborted_workers: usize,

    /// Workers that panicked
    pub panicked_workers: usize,

    /// URLs ever accepted by the frontier
    pub urls_seen: usize,

    /// URLs never dequeued because the crawl was stopped
    pub pending_left: usize,

    /// Fetches attempted
    pub fetches: u64,

    /// Completed responses by class
    pub responses: HashMap<ResponseClass, u64>,

    /// Failed fetches by failure class
    pub failures: HashMap<FailureKind, u64>,

    /// Pages written to disk
    pub pages_saved: u64,

    /// Pages that could not be written
    pub save_failures: u64,

    /// Links produced by the extractor
    pub links_found: u64,

    /// Links accepted as new
    pub links_accepted: u64,

    /// URLs whose processing panicked
    pub processing_panics: u64,
}

impl CrawlStatistics {
    /// Sums the counters of every joined worker
    pub fn from_report(
        report: &PoolReport,
        workers: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let mut stats = Self {
            started_at,
            finished_at,
            completed: report.completed,
            workers,
            aborted_workers: report.aborted_workers,
            panicked_workers: report.panicked_workers,
            urls_seen: report.urls_seen,
            pending_left: report.pending_left,
            fetches: 0,
            responses: HashMap::new(),
            failures: HashMap::new(),
            pages_saved: 0,
            save_failures: 0,
            links_found: 0,
            links_accepted: 0,
            processing_panics: 0,
        };

        for worker in &report.workers {
            stats.fetches += worker.fetches;
            stats.pages_saved += worker.pages_saved;
            stats.save_failures += worker.save_failures;
            stats.links_found += worker.links_found;
            stats.links_accepted += worker.links_accepted;
            stats.processing_panics += worker.panics;
            for (class, count) in &worker.responses {
                *stats.responses.entry(*class).or_default() += count;
            }
            for (kind, count) in &worker.failures {
                *stats.failures.entry(*kind).or_default() += count;
            }
        }

        stats
    }

    /// Wall-clock duration of the crawl
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Number of failed fetches
    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Number of 2xx responses
    pub fn successes(&self) -> u64 {
        self.responses
            .get(&ResponseClass::Success)
            .copied()
            .unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    println!("  Finished: {}", stats.finished_at.to_rfc3339());
    println!(
        "  Duration: {:.3}s",
        stats.duration().num_milliseconds() as f64 / 1000.0
    );
    println!(
        "  Outcome: {}",
        if stats.completed {
            "completed"
        } else {
            "interrupted"
        }
    );
    println!("  Workers: {}", stats.workers);
    println!("  URLs seen: {}", stats.urls_seen);
    println!("  Fetches attempted: {}", stats.fetches);
    println!(
        "  Links found: {} ({} new)",
        stats.links_found, stats.links_accepted
    );
    println!("  Pages saved: {}", stats.pages_saved);
    if stats.save_failures > 0 {
        println!("  Pages not saved: {}", stats.save_failures);
    }
    if stats.pending_left > 0 {
        println!("  URLs left unvisited: {}", stats.pending_left);
    }
    println!();

    if !stats.responses.is_empty() {
        println!("Responses by Class:");
        let mut classes: Vec<_> = stats.responses.iter().collect();
        classes.sort();
        for (class, count) in classes {
            println!("  {}: {}", class, count);
        }
        println!();
    }

    if !stats.failures.is_empty() {
        println!("Failure Summary:");
        // Most frequent first
        let mut failures: Vec<_> = stats.failures.iter().collect();
        failures.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (kind, count) in failures {
            println!("  {:?}: {}", kind, count);
        }
        println!();
    }

    if stats.processing_panics > 0 {
        println!("URLs abandoned after a panic: {}", stats.processing_panics);
        println!();
    }

    if stats.aborted_workers > 0 || stats.panicked_workers > 0 {
        println!(
            "Workers aborted: {}, panicked: {}",
            stats.aborted_workers, stats.panicked_workers
        );
        println!();
    }

    let success_rate = if stats.fetches > 0 {
        (stats.successes() as f64 / stats.fetches as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetches returned 2xx)",
        success_rate,
        stats.successes(),
        stats.fetches
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::WorkerStats;

    fn worker(id: usize, fetches: u64, ok: u64, timeouts: u64) -> WorkerStats {
        let mut stats = WorkerStats {
            worker_id: id,
            fetches,
            pages_saved: ok,
            links_found: 3 * ok,
            links_accepted: ok,
            ..WorkerStats::default()
        };
        stats.responses.insert(ResponseClass::Success, ok);
        if timeouts > 0 {
            stats.failures.insert(FailureKind::Timeout, timeouts);
        }
        stats
    }

    #[test]
    fn test_aggregates_worker_counters() {
        let mut panicked = worker(1, 3, 2, 1);
        panicked.panics = 1;
        let report = PoolReport {
            workers: vec![worker(0, 5, 4, 1), panicked],
            completed: true,
            urls_seen: 8,
            ..PoolReport::default()
        };
        let started = Utc::now();
        let finished = started + chrono::Duration::milliseconds(1500);

        let stats = CrawlStatistics::from_report(&report, 2, started, finished);

        assert_eq!(stats.fetches, 8);
        assert_eq!(stats.successes(), 6);
        assert_eq!(stats.total_failures(), 2);
        assert_eq!(stats.failures.get(&FailureKind::Timeout), Some(&2));
        assert_eq!(stats.pages_saved, 6);
        assert_eq!(stats.links_found, 18);
        assert_eq!(stats.links_accepted, 6);
        assert_eq!(stats.urls_seen, 8);
        assert_eq!(stats.processing_panics, 1);
        assert_eq!(stats.duration().num_milliseconds(), 1500);
        assert!(stats.completed);
    }

    #[test]
    fn test_empty_report() {
        let now = Utc::now();
        let stats = CrawlStatistics::from_report(&PoolReport::default(), 4, now, now);
        assert_eq!(stats.fetches, 0);
        assert_eq!(stats.successes(), 0);
        assert!(stats.responses.is_empty());
        print_statistics(&stats);
    }
}
