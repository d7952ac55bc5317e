// crates/schema-bridge-core/src/runtime/convert.rs
// ============================================================================
// Module: Value Converter
// Description: Typed state values to generic JSON values and back.
// Purpose: Build request payloads from state and write responses into state.
// Dependencies: bigdecimal, serde_json, thiserror, tracing, crate::core
// ============================================================================

//! ## Overview
//! Conversion is driven by the attribute tree: every step resolves the
//! attribute's kind and dispatches on it. Numbers pass through an exact
//! decimal and are rejected when the target representation would lose
//! precision.
//!
//! ## Invariants
//! - A conversion error aborts the whole call; no partial payload is returned.
//! - Nulls written into state always carry the declared type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::trace;

use crate::core::attribute::Attribute;
use crate::core::options::ConversionOptions;
use crate::core::resolver::SchemaResolutionError;
use crate::core::resolver::resolve_kind;
use crate::core::schema::SchemaKind;
use crate::core::state::State;
use crate::core::state::StateError;
use crate::core::value::AttributePath;
use crate::core::value::TypedValue;
use crate::core::value::decimal_from_number;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Conversion failures; each aborts the conversion call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Value is unknown and unknowns are not ignored.
    #[error("value at `{0}` is unknown")]
    UnknownValue(String),
    /// Value is null but the attribute is neither unset-able nor nullable.
    #[error("value at `{0}` is null but the attribute is not nullable")]
    UnexpectedNull(String),
    /// Numeric value does not fit the target representation exactly.
    #[error("value {value} at `{path}` cannot be represented as {kind} without precision loss")]
    PrecisionLoss {
        /// Attribute path.
        path: String,
        /// Offending value.
        value: String,
        /// Target kind.
        kind: SchemaKind,
    },
    /// Required object field is absent.
    #[error("required field `{0}` is missing")]
    MissingRequiredField(String),
    /// Value variant does not match the attribute's kind.
    #[error("value at `{path}` is {found}, expected {expected}")]
    TypeMismatch {
        /// Attribute path.
        path: String,
        /// Resolved attribute kind.
        expected: SchemaKind,
        /// Variant actually found.
        found: &'static str,
    },
    /// Array attribute has no element attribute.
    #[error("array attribute `{0}` has no element attribute")]
    MissingElementAttribute(String),
    /// Attribute type could not be resolved.
    #[error("type of `{path}` cannot be resolved: {source}")]
    Resolution {
        /// Attribute path.
        path: String,
        /// Resolver error.
        source: SchemaResolutionError,
    },
    /// Converted parameters do not satisfy the operation schema.
    #[error("parameters do not satisfy the operation schema: {0}")]
    SchemaValidation(String),
    /// State rejected a write.
    #[error(transparent)]
    State(#[from] StateError),
}

// ============================================================================
// SECTION: Conversion Result
// ============================================================================

/// Generic value plus whether it is fully known.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Converted value; null when unknown.
    pub value: Value,
    /// False when the value (or a list element) was unknown.
    pub known: bool,
}

impl Conversion {
    /// A known value.
    #[must_use]
    pub const fn known(value: Value) -> Self {
        Self {
            value,
            known: true,
        }
    }

    /// An unknown value.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            value: Value::Null,
            known: false,
        }
    }
}

// ============================================================================
// SECTION: Converter
// ============================================================================

/// Bidirectional converter between typed state and generic values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateConverter {
    /// Conversion flags.
    options: ConversionOptions,
}

impl StateConverter {
    /// Creates a converter.
    #[must_use]
    pub const fn new(options: ConversionOptions) -> Self {
        Self {
            options,
        }
    }

    /// Returns the conversion flags.
    #[must_use]
    pub const fn options(&self) -> ConversionOptions {
        self.options
    }

    /// Converts a typed value into a generic value.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] on unknown or null values the attribute
    /// does not accept, lossy numbers, missing required fields, or type
    /// mismatches.
    pub fn to_generic(
        &self,
        attribute: &Attribute,
        value: &TypedValue,
        path: &AttributePath,
    ) -> Result<Conversion, ConversionError> {
        match value {
            TypedValue::Unknown(_) => {
                if self.options.ignore_unknown {
                    return Ok(Conversion::unknown());
                }
                return Err(ConversionError::UnknownValue(path.to_string()));
            }
            TypedValue::Null(_) => {
                let unset = attribute.is_optional() && !attribute.is_computed();
                if unset || attribute.schema.is_nullable() {
                    return Ok(Conversion::known(Value::Null));
                }
                return Err(ConversionError::UnexpectedNull(path.to_string()));
            }
            _ => {}
        }

        let kind = resolve(attribute, path)?;
        match (kind, value) {
            (SchemaKind::String, TypedValue::String(text)) => {
                Ok(Conversion::known(Value::String(text.clone())))
            }
            (SchemaKind::Boolean, TypedValue::Bool(flag)) => Ok(Conversion::known(Value::Bool(*flag))),
            (SchemaKind::Integer, TypedValue::Number(decimal)) => {
                integer_to_json(decimal, path).map(Conversion::known)
            }
            (SchemaKind::Number, TypedValue::Number(decimal)) => {
                number_to_json(decimal, path).map(Conversion::known)
            }
            (SchemaKind::Array, TypedValue::List(items)) => self.list_to_generic(attribute, items, path),
            (SchemaKind::Object, TypedValue::Object(fields)) => {
                self.fields_to_generic(attribute.children.values(), fields, path)
            }
            (expected, other) => Err(ConversionError::TypeMismatch {
                path: path.to_string(),
                expected,
                found: other.variant_name(),
            }),
        }
    }

    /// Reads root attributes out of `state` into a generic map keyed by generic name.
    ///
    /// Attributes absent from the state's schema are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when any attribute fails to convert.
    pub fn read_map<'a, I>(&self, attributes: I, state: &State) -> Result<Map<String, Value>, ConversionError>
    where
        I: IntoIterator<Item = &'a Attribute>,
    {
        let mut out = Map::new();
        for attribute in attributes {
            let path = AttributePath::name(attribute.target_name.clone());
            if state.schema().attribute(&attribute.target_name).is_none() {
                trace!(field = %path, "attribute not in target schema; skipped");
                continue;
            }
            let value = state.get_attribute(&path)?;
            if let Some(converted) = self.field_to_generic(attribute, &value, &path)? {
                out.insert(attribute.name.clone(), converted);
            }
        }
        Ok(out)
    }

    /// Writes a generic value into `state` at `path`.
    ///
    /// Nulls are written as typed nulls. Object keys without a declared
    /// attribute are ignored, and attributes missing from the value keep
    /// their prior state.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] on type mismatches, lossy numbers, or
    /// rejected state writes.
    pub fn apply_generic(
        &self,
        value: &Value,
        attribute: &Attribute,
        state: &mut State,
        path: &AttributePath,
    ) -> Result<(), ConversionError> {
        if value.is_null() {
            let expected = state
                .schema()
                .type_at(path)
                .ok_or_else(|| StateError::UnknownPath(path.to_string()))?;
            state.set_attribute(path, TypedValue::Null(expected))?;
            return Ok(());
        }

        let kind = resolve(attribute, path)?;
        let typed = match (kind, value) {
            (SchemaKind::String, Value::String(text)) => TypedValue::String(text.clone()),
            (SchemaKind::Boolean, Value::Bool(flag)) => TypedValue::Bool(*flag),
            (SchemaKind::Integer, Value::Number(number)) => {
                let decimal = decimal_from_number(number)
                    .filter(|decimal| decimal.is_integer() && decimal.to_i64().is_some())
                    .ok_or_else(|| precision_loss(path, number, kind))?;
                TypedValue::Number(decimal)
            }
            (SchemaKind::Number, Value::Number(number)) => TypedValue::Number(
                decimal_from_number(number).ok_or_else(|| precision_loss(path, number, kind))?,
            ),
            (SchemaKind::Array, Value::Array(items)) => {
                let element = attribute
                    .element()
                    .ok_or_else(|| ConversionError::MissingElementAttribute(path.to_string()))?;
                state.set_attribute(path, TypedValue::List(Vec::new()))?;
                for (index, item) in items.iter().enumerate() {
                    self.apply_generic(item, element, state, &path.at_index(index))?;
                }
                return Ok(());
            }
            (SchemaKind::Object, Value::Object(fields)) => {
                if !matches!(state.get_attribute(path)?, TypedValue::Object(_)) {
                    state.set_attribute(path, TypedValue::Object(BTreeMap::new()))?;
                }
                return self.apply_fields(fields, attribute.children.values(), state, path);
            }
            (expected, other) => {
                return Err(ConversionError::TypeMismatch {
                    path: path.to_string(),
                    expected,
                    found: json_variant_name(other),
                });
            }
        };
        state.set_attribute(path, typed)?;
        Ok(())
    }

    /// Writes every declared field of a generic map into `state` under `path`.
    ///
    /// An empty `path` writes root attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when any field fails to apply.
    pub fn apply_fields<'a, I>(
        &self,
        fields: &Map<String, Value>,
        attributes: I,
        state: &mut State,
        path: &AttributePath,
    ) -> Result<(), ConversionError>
    where
        I: IntoIterator<Item = &'a Attribute>,
    {
        for attribute in attributes {
            let Some(field) = fields.get(&attribute.name) else {
                continue;
            };
            let field_path = path.at_name(attribute.target_name.clone());
            if state.schema().type_at(&field_path).is_none() {
                trace!(field = %field_path, "attribute not in target schema; skipped");
                continue;
            }
            self.apply_generic(field, attribute, state, &field_path)?;
        }
        Ok(())
    }

    /// Converts one object field, returning `None` when it should be omitted.
    fn field_to_generic(
        &self,
        attribute: &Attribute,
        value: &TypedValue,
        path: &AttributePath,
    ) -> Result<Option<Value>, ConversionError> {
        let converted = self.to_generic(attribute, value, path)?;
        if !converted.known || (self.options.filter_unset && converted.value.is_null()) {
            return Ok(None);
        }
        Ok(Some(converted.value))
    }

    /// Converts object fields keyed by target name into a generic map.
    fn fields_to_generic<'a, I>(
        &self,
        children: I,
        fields: &BTreeMap<String, TypedValue>,
        path: &AttributePath,
    ) -> Result<Conversion, ConversionError>
    where
        I: IntoIterator<Item = &'a Attribute>,
    {
        let mut out = Map::new();
        for child in children {
            let child_path = path.at_name(child.target_name.clone());
            let Some(field) = fields.get(&child.target_name) else {
                if child.is_required() {
                    return Err(ConversionError::MissingRequiredField(child_path.to_string()));
                }
                continue;
            };
            let converted = self.to_generic(child, field, &child_path)?;
            if !converted.known {
                if self.options.ignore_unknown {
                    continue;
                }
                return Ok(Conversion::unknown());
            }
            if self.options.filter_unset && converted.value.is_null() {
                continue;
            }
            out.insert(child.name.clone(), converted.value);
        }
        Ok(Conversion::known(Value::Object(out)))
    }

    /// Converts list items through the element attribute.
    fn list_to_generic(
        &self,
        attribute: &Attribute,
        items: &[TypedValue],
        path: &AttributePath,
    ) -> Result<Conversion, ConversionError> {
        let element = attribute
            .element()
            .ok_or_else(|| ConversionError::MissingElementAttribute(path.to_string()))?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = path.at_index(index);
            if item.is_unknown() {
                if self.options.ignore_unknown {
                    debug!(field = %item_path, "dropping unknown list element");
                    continue;
                }
                debug!(field = %item_path, "unknown list element; list is unknown");
                return Ok(Conversion::unknown());
            }
            let converted = self.to_generic(element, item, &item_path)?;
            if !converted.known {
                if self.options.ignore_unknown {
                    continue;
                }
                return Ok(Conversion::unknown());
            }
            out.push(converted.value);
        }
        Ok(Conversion::known(Value::Array(out)))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves an attribute's kind, tagging failures with the path.
fn resolve(attribute: &Attribute, path: &AttributePath) -> Result<SchemaKind, ConversionError> {
    resolve_kind(&attribute.schema).map(|resolved| resolved.kind).map_err(|source| {
        ConversionError::Resolution {
            path: path.to_string(),
            source,
        }
    })
}

/// Converts a decimal to a JSON integer without loss.
fn integer_to_json(decimal: &BigDecimal, path: &AttributePath) -> Result<Value, ConversionError> {
    if !decimal.is_integer() {
        return Err(decimal_loss(path, decimal, SchemaKind::Integer));
    }
    decimal
        .to_i64()
        .map(Value::from)
        .ok_or_else(|| decimal_loss(path, decimal, SchemaKind::Integer))
}

/// Converts a decimal to a JSON number without loss.
///
/// Values without fractional digits that fit in i64 stay integers; the rest
/// must survive an f64 round trip unchanged.
fn number_to_json(decimal: &BigDecimal, path: &AttributePath) -> Result<Value, ConversionError> {
    let (_, scale) = decimal.as_bigint_and_exponent();
    if scale <= 0
        && let Some(integer) = decimal.to_i64()
    {
        return Ok(Value::from(integer));
    }
    let number = decimal
        .to_string()
        .parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
        .ok_or_else(|| decimal_loss(path, decimal, SchemaKind::Number))?;
    if decimal_from_number(&number).as_ref() != Some(decimal) {
        return Err(decimal_loss(path, decimal, SchemaKind::Number));
    }
    Ok(Value::Number(number))
}

/// Builds a precision error for a decimal.
fn decimal_loss(path: &AttributePath, decimal: &BigDecimal, kind: SchemaKind) -> ConversionError {
    ConversionError::PrecisionLoss {
        path: path.to_string(),
        value: decimal.to_string(),
        kind,
    }
}

/// Builds a precision error for a JSON number.
fn precision_loss(path: &AttributePath, number: &Number, kind: SchemaKind) -> ConversionError {
    ConversionError::PrecisionLoss {
        path: path.to_string(),
        value: number.to_string(),
        kind,
    }
}

/// Returns a short name of a JSON value's variant.
const fn json_variant_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
