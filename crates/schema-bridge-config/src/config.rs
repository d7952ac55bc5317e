// crates/schema-bridge-config/src/config.rs
// ============================================================================
// Module: Schema Bridge Configuration
// Description: Configuration loading and validation for the engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: schema-bridge-core, serde, toml, tracing-subscriber
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys and invalid values fail closed; a validated config converts
//! into the core [`EngineOptions`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use schema_bridge_core::ConversionOptions;
use schema_bridge_core::DEFAULT_CURRENT_PREFIX;
use schema_bridge_core::DEFAULT_DESIRED_PREFIX;
use schema_bridge_core::DEFAULT_IDENTIFIER_NAME;
use schema_bridge_core::DEFAULT_IDENTIFIER_SUFFIX;
use schema_bridge_core::DEFAULT_MAX_DEPTH;
use schema_bridge_core::DerivationLimits;
use schema_bridge_core::EngineOptions;
use schema_bridge_core::NamingPolicy;
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "schema-bridge.toml";
/// Environment variable naming the configuration path.
pub(crate) const CONFIG_ENV_VAR: &str = "SCHEMA_BRIDGE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Smallest accepted nesting depth.
pub(crate) const MIN_MAX_DEPTH: usize = 1;
/// Largest accepted nesting depth.
pub(crate) const MAX_MAX_DEPTH: usize = 256;
/// Maximum length of a naming prefix, identifier name, or suffix.
pub(crate) const MAX_NAME_LENGTH: usize = 64;
/// Default log filter directive.
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Schema bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Target naming rules.
    #[serde(default)]
    pub naming: NamingConfig,
    /// Derivation limits.
    #[serde(default)]
    pub derivation: DerivationConfig,
    /// Conversion flags for state reads.
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.naming.validate()?;
        self.derivation.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Converts the configuration into engine options.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            naming: NamingPolicy {
                desired_prefix: self.naming.desired_prefix.clone(),
                current_prefix: self.naming.current_prefix.clone(),
                identifier_name: self.naming.identifier_name.clone(),
                identifier_suffix: self.naming.identifier_suffix.clone(),
            },
            limits: DerivationLimits {
                max_depth: self.derivation.max_depth,
            },
            read_conversion: ConversionOptions {
                ignore_unknown: self.conversion.ignore_unknown,
                filter_unset: self.conversion.filter_unset,
            },
        }
    }
}

/// Naming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Prefix for the create-shaped half of a split attribute.
    #[serde(default = "default_desired_prefix")]
    pub desired_prefix: String,
    /// Prefix for the read-shaped half of a split attribute.
    #[serde(default = "default_current_prefix")]
    pub current_prefix: String,
    /// Exact field name treated as an identifier.
    #[serde(default = "default_identifier_name")]
    pub identifier_name: String,
    /// Field name suffix treated as an identifier.
    #[serde(default = "default_identifier_suffix")]
    pub identifier_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            desired_prefix: default_desired_prefix(),
            current_prefix: default_current_prefix(),
            identifier_name: default_identifier_name(),
            identifier_suffix: default_identifier_suffix(),
        }
    }
}

impl NamingConfig {
    /// Validates naming rules.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_target_fragment("naming.desired_prefix", &self.desired_prefix)?;
        validate_target_fragment("naming.current_prefix", &self.current_prefix)?;
        validate_target_fragment("naming.identifier_name", &self.identifier_name)?;
        validate_target_fragment("naming.identifier_suffix", &self.identifier_suffix)?;
        if self.desired_prefix == self.current_prefix {
            return Err(ConfigError::Invalid(
                "naming.desired_prefix and naming.current_prefix must differ".to_string(),
            ));
        }
        if self.identifier_name.starts_with(|ch: char| ch.is_ascii_digit()) {
            return Err(ConfigError::Invalid(
                "naming.identifier_name must not start with a digit".to_string(),
            ));
        }
        for (field, prefix) in
            [("naming.desired_prefix", &self.desired_prefix), ("naming.current_prefix", &self.current_prefix)]
        {
            if prefix.starts_with(|ch: char| ch.is_ascii_digit()) {
                return Err(ConfigError::Invalid(format!("{field} must not start with a digit")));
            }
        }
        Ok(())
    }
}

/// Derivation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivationConfig {
    /// Maximum nesting depth of objects and arrays.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl DerivationConfig {
    /// Validates derivation limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_MAX_DEPTH..=MAX_MAX_DEPTH).contains(&self.max_depth) {
            return Err(ConfigError::Invalid(format!(
                "derivation.max_depth must be between {MIN_MAX_DEPTH} and {MAX_MAX_DEPTH}"
            )));
        }
        Ok(())
    }
}

/// Conversion configuration for reads out of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Skip unknown values instead of failing.
    #[serde(default = "default_true")]
    pub ignore_unknown: bool,
    /// Drop keys whose value is unset.
    #[serde(default = "default_true")]
    pub filter_unset: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ignore_unknown: true,
            filter_unset: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `schema_bridge_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates the filter directive.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        EnvFilter::try_new(&self.level)
            .map_err(|err| ConfigError::Invalid(format!("logging.level is invalid: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a fragment of a target name: lowercase ASCII, digits, underscores.
fn validate_target_fragment(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if !value.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
        return Err(ConfigError::Invalid(format!(
            "{field} must contain only lowercase letters, digits, and underscores"
        )));
    }
    Ok(())
}

/// Default desired prefix.
fn default_desired_prefix() -> String {
    DEFAULT_DESIRED_PREFIX.to_string()
}

/// Default current prefix.
fn default_current_prefix() -> String {
    DEFAULT_CURRENT_PREFIX.to_string()
}

/// Default identifier name.
fn default_identifier_name() -> String {
    DEFAULT_IDENTIFIER_NAME.to_string()
}

/// Default identifier suffix.
fn default_identifier_suffix() -> String {
    DEFAULT_IDENTIFIER_SUFFIX.to_string()
}

/// Default nesting depth.
const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Serde default for opt-out flags.
const fn default_true() -> bool {
    true
}

/// Default log filter.
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
