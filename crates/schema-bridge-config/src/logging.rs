// crates/schema-bridge-config/src/logging.rs
// ============================================================================
// Module: Logging Initialisation
// Description: Installs the global tracing subscriber from configuration.
// Purpose: Route engine events to text or JSON output with a level filter.
// Dependencies: tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! A single global subscriber is installed per process. A second call returns
//! [`LoggingError::AlreadyInitialized`] rather than replacing the first one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::config::LoggingConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging initialisation errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

// ============================================================================
// SECTION: Initialisation
// ============================================================================

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| LoggingError::AlreadyInitialized(err.to_string()))?;
    debug!(level = %config.level, json = matches!(config.format, LogFormat::Json), "logging initialized");
    Ok(())
}

/// Parses the configured filter directive.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when the directive is invalid.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(&config.level).map_err(|err| LoggingError::Filter(err.to_string()))
}
