//! Output module for fetched pages and crawl statistics
//!
//! This module handles:
//! - Writing successfully fetched pages to the output directory
//! - Aggregating per-worker counters into crawl statistics

pub mod stats;
mod writer;

pub use stats::{print_statistics, CrawlStatistics};
pub use writer::PageWriter;
