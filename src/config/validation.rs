use crate::config::types::{Config, FetchConfig, OutputConfig, PoolConfig, ProxyConfig};
use crate::ConfigError;

/// Largest accepted worker pool
pub const MAX_POOL_SIZE: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }
    validate_pool_config(&config.pool)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates fetch timeouts
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.read_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "read_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() || config.host.contains(|c: char| c.is_whitespace() || c == '/') {
        return Err(ConfigError::InvalidUrl(format!(
            "Invalid proxy host '{}'",
            config.host
        )));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation(
            "proxy port must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool configuration
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.size < 1 || config.size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "pool size must be between 1 and {}, got {}",
            MAX_POOL_SIZE, config.size
        )));
    }

    if config.progress_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "progress_interval_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
