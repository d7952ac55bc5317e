// crates/schema-bridge-config/src/lib.rs
// ============================================================================
// Module: Schema Bridge Config Library
// Description: Config model, validation, and logging initialisation.
// Purpose: Single source of truth for schema-bridge.toml semantics.
// Dependencies: schema-bridge-core, serde, toml, tracing-subscriber
// ============================================================================

//! ## Overview
//! `schema-bridge-config` loads `schema-bridge.toml`, validates it fail-closed,
//! and converts it into the core engine options. It also installs the
//! `tracing` subscriber used by the engine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod logging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use logging::LoggingError;
pub use logging::build_filter;
pub use logging::init_logging;
