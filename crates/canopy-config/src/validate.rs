//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest lock wait accepted, in milliseconds (ten minutes).
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_database(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_database(config: &Config) -> ConfigResult<()> {
    let db = &config.database;
    if db.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".to_owned(),
            message: "must not be empty".to_owned(),
        });
    }
    if db.busy_timeout_ms == 0 || db.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
        return Err(ConfigError::ValidationError {
            field: "database.busy_timeout_ms".to_owned(),
            message: format!(
                "must be between 1 and {MAX_BUSY_TIMEOUT_MS}, got {}",
                db.busy_timeout_ms
            ),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    if config
        .logging
        .directory
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "logging.directory".to_owned(),
            message: "must not be empty when set".to_owned(),
        });
    }

    Ok(())
}
