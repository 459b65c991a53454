//! Configuration module for Ripcrawl
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so an empty file (or no
//! file at all) is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use ripcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripcrawl.toml")).unwrap();
//! println!("Workers: {}", config.pool.size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, OutputConfig, PoolConfig, ProxyConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, MAX_POOL_SIZE};
