// crates/schema-bridge-core/src/core/options.rs
// ============================================================================
// Module: Engine Options
// Description: Naming, limit, and conversion settings for the engine.
// Purpose: Carry validated configuration into derivation and conversion.
// Dependencies: convert_case, serde
// ============================================================================

//! ## Overview
//! Options are plain values; the config crate builds them from TOML and
//! tests build them directly. Defaults match the target tool's conventions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use convert_case::Case;
use convert_case::Casing;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default prefix for the create-shaped half of a split attribute.
pub const DEFAULT_DESIRED_PREFIX: &str = "desired_";
/// Default prefix for the read-shaped half of a split attribute.
pub const DEFAULT_CURRENT_PREFIX: &str = "current_";
/// Default identifier field name.
pub const DEFAULT_IDENTIFIER_NAME: &str = "id";
/// Default identifier suffix.
pub const DEFAULT_IDENTIFIER_SUFFIX: &str = "_id";
/// Default maximum schema nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Rules for target names and identifier detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPolicy {
    /// Prefix for the create-shaped half of a split attribute.
    pub desired_prefix: String,
    /// Prefix for the read-shaped half of a split attribute.
    pub current_prefix: String,
    /// Exact field name treated as an identifier.
    pub identifier_name: String,
    /// Field name suffix treated as an identifier.
    pub identifier_suffix: String,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            desired_prefix: DEFAULT_DESIRED_PREFIX.to_string(),
            current_prefix: DEFAULT_CURRENT_PREFIX.to_string(),
            identifier_name: DEFAULT_IDENTIFIER_NAME.to_string(),
            identifier_suffix: DEFAULT_IDENTIFIER_SUFFIX.to_string(),
        }
    }
}

impl NamingPolicy {
    /// Adapts a generic field name to the target tool's identifier rules.
    #[must_use]
    pub fn target_name(&self, name: &str) -> String {
        name.to_case(Case::Snake)
    }

    /// Returns the target name of the create-shaped split half.
    #[must_use]
    pub fn desired_name(&self, target_name: &str) -> String {
        format!("{}{target_name}", self.desired_prefix)
    }

    /// Returns the target name of the read-shaped split half.
    #[must_use]
    pub fn current_name(&self, target_name: &str) -> String {
        format!("{}{target_name}", self.current_prefix)
    }

    /// Returns true when the generic name looks like a remote-assigned identifier.
    #[must_use]
    pub fn is_identifier(&self, name: &str) -> bool {
        let target = self.target_name(name);
        target == self.identifier_name || target.ends_with(&self.identifier_suffix)
    }
}

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Bounds applied while deriving attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationLimits {
    /// Maximum nesting depth of objects and arrays.
    pub max_depth: usize,
}

impl Default for DerivationLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Flags controlling typed-to-generic conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Skip unknown values instead of failing.
    pub ignore_unknown: bool,
    /// Drop keys whose converted value is null.
    pub filter_unset: bool,
}

impl ConversionOptions {
    /// Options used when reading request parameters out of state.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            ignore_unknown: true,
            filter_unset: true,
        }
    }

    /// Options that reject unknown values and keep nulls.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            ignore_unknown: false,
            filter_unset: false,
        }
    }
}

// ============================================================================
// SECTION: Engine Options
// ============================================================================

/// Complete engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Target naming rules.
    pub naming: NamingPolicy,
    /// Derivation bounds.
    pub limits: DerivationLimits,
    /// Conversion flags for parameter reads.
    pub read_conversion: ConversionOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            naming: NamingPolicy::default(),
            limits: DerivationLimits::default(),
            read_conversion: ConversionOptions::lenient(),
        }
    }
}
