// crates/schema-bridge-core/src/core/value.rs
// ============================================================================
// Module: Typed Values
// Description: The declarative tool's typed value model and attribute paths.
// Purpose: Represent planned/applied state with explicit unknown and typed null.
// Dependencies: bigdecimal, serde, serde_json
// ============================================================================

//! ## Overview
//! [`TypedValue`] mirrors the value model of a state-diffing tool: every
//! value is either known, null, or unknown, and null/unknown carry the type
//! they stand in for. Numbers use [`BigDecimal`] so conversions can detect
//! precision loss instead of silently rounding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Serialize;
use serde_json::Number;

// ============================================================================
// SECTION: Value Types
// ============================================================================

/// Type of a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum ValueType {
    /// UTF-8 string.
    String,
    /// Arbitrary-precision number (integers included).
    Number,
    /// Boolean flag.
    Bool,
    /// Homogeneous list.
    List(Box<Self>),
    /// Object with fixed attribute types keyed by target name.
    Object(BTreeMap<String, Self>),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Bool => f.write_str("bool"),
            Self::List(element) => write!(f, "list({element})"),
            Self::Object(_) => f.write_str("object"),
        }
    }
}

// ============================================================================
// SECTION: Typed Values
// ============================================================================

/// Value in the declarative tool's typed representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// Not yet known during planning.
    Unknown(ValueType),
    /// Explicitly null.
    Null(ValueType),
    /// Known string.
    String(String),
    /// Known number.
    Number(BigDecimal),
    /// Known boolean.
    Bool(bool),
    /// Known list.
    List(Vec<Self>),
    /// Known object keyed by target name; absent keys read as null.
    Object(BTreeMap<String, Self>),
}

impl TypedValue {
    /// Creates a known string.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates a known number from an integer.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Number(BigDecimal::from(value))
    }

    /// Returns true when the value is unknown.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Returns true when the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Returns a short name of the value's variant.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Unknown(_) => "unknown",
            Self::Null(_) => "null",
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// Returns true when the value can be stored under `expected`.
    ///
    /// Unknown and null values must carry exactly the expected type.
    #[must_use]
    pub fn conforms_to(&self, expected: &ValueType) -> bool {
        match (self, expected) {
            (Self::Unknown(actual) | Self::Null(actual), _) => actual == expected,
            (Self::String(_), ValueType::String)
            | (Self::Number(_), ValueType::Number)
            | (Self::Bool(_), ValueType::Bool) => true,
            (Self::List(items), ValueType::List(element)) => {
                items.iter().all(|item| item.conforms_to(element))
            }
            (Self::Object(fields), ValueType::Object(types)) => fields
                .iter()
                .all(|(name, value)| types.get(name).is_some_and(|ty| value.conforms_to(ty))),
            _ => false,
        }
    }
}

/// Parses a JSON number into an exact decimal.
#[must_use]
pub fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

// ============================================================================
// SECTION: Attribute Paths
// ============================================================================

/// One step of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PathStep {
    /// Named attribute.
    Name(String),
    /// List element index.
    Index(usize),
}

/// Path into a typed state, rendered as `a.b[0].c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttributePath {
    /// Steps from the root.
    steps: Vec<PathStep>,
}

impl AttributePath {
    /// Returns the empty root path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            steps: Vec::new(),
        }
    }

    /// Returns a path of a single root attribute.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::root().at_name(name)
    }

    /// Extends the path with a named attribute.
    #[must_use]
    pub fn at_name(&self, name: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Name(name.into()));
        Self {
            steps,
        }
    }

    /// Extends the path with a list index.
    #[must_use]
    pub fn at_index(&self, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Index(index));
        Self {
            steps,
        }
    }

    /// Returns the steps.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Name(name) if index == 0 => f.write_str(name)?,
                PathStep::Name(name) => write!(f, ".{name}")?,
                PathStep::Index(position) => write!(f, "[{position}]")?,
            }
        }
        Ok(())
    }
}
