// crates/schema-bridge-config/tests/logging_init.rs
// ============================================================================
// Module: Logging Initialisation Tests
// Description: Global subscriber installation from configuration.
// Purpose: Ensure repeated initialisation reports an error.
// Dependencies: schema-bridge-config, tracing
// ============================================================================

//! ## Overview
//! Kept in its own test binary because the subscriber is process-global.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use schema_bridge_config::LogFormat;
use schema_bridge_config::LoggingConfig;
use schema_bridge_config::LoggingError;
use schema_bridge_config::build_filter;
use schema_bridge_config::init_logging;

/// Verifies the first install succeeds and the second is refused.
#[test]
fn second_initialisation_fails() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Json,
    };
    init_logging(&config).unwrap();
    tracing::info!(resource = "server", "subscriber installed");
    assert!(matches!(init_logging(&config), Err(LoggingError::AlreadyInitialized(_))));
}

/// Verifies invalid directives are reported as filter errors.
#[test]
fn invalid_filter_is_reported() {
    let config = LoggingConfig {
        level: "schema_bridge_core=loud".to_string(),
        format: LogFormat::Text,
    };
    assert!(matches!(build_filter(&config), Err(LoggingError::Filter(_))));
}
