// crates/schema-bridge-core/src/core/state.rs
// ============================================================================
// Module: Typed State
// Description: Resource state values bound to a target schema.
// Purpose: Provide the read/write surface the value converter operates on.
// Dependencies: thiserror, crate::core::{declarative, value}
// ============================================================================

//! ## Overview
//! A [`State`] holds one resource instance's typed values. Writes are
//! checked against the target schema: a value (including null and unknown)
//! must carry the type declared at its path. Intermediate objects and list
//! slots are created on demand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::declarative::TargetSchema;
use crate::core::value::AttributePath;
use crate::core::value::PathStep;
use crate::core::value::TypedValue;
use crate::core::value::ValueType;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// State access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The path is not declared by the schema.
    #[error("attribute path `{0}` is not declared by the schema")]
    UnknownPath(String),
    /// The value does not carry the declared type.
    #[error("value at `{path}` does not match declared type {expected}")]
    TypeMismatch {
        /// Offending path.
        path: String,
        /// Declared type.
        expected: String,
    },
    /// The path does not start with a root attribute name.
    #[error("attribute path `{0}` is not addressable")]
    InvalidPath(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Typed values of one resource instance.
///
/// # Invariants
/// - Every stored value conforms to the schema type at its path.
/// - Attributes never written read as typed null.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Schema the values conform to.
    schema: Arc<TargetSchema>,
    /// Root values keyed by target name.
    values: BTreeMap<String, TypedValue>,
}

impl State {
    /// Creates an empty state; every attribute reads as typed null.
    #[must_use]
    pub const fn new(schema: Arc<TargetSchema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
        }
    }

    /// Creates a state where every computed root attribute is unknown.
    #[must_use]
    pub fn planned(schema: Arc<TargetSchema>) -> Self {
        let values = schema
            .attributes
            .iter()
            .filter(|(_, attribute)| attribute.computed)
            .map(|(name, attribute)| (name.clone(), TypedValue::Unknown(attribute.value_type())))
            .collect();
        Self {
            schema,
            values,
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &TargetSchema {
        &self.schema
    }

    /// Returns the stored root values.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, TypedValue> {
        &self.values
    }

    /// Returns the value at `path`, or a typed null when never written.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownPath`] when the schema does not declare `path`.
    pub fn get_attribute(&self, path: &AttributePath) -> Result<TypedValue, StateError> {
        let expected = self
            .schema
            .type_at(path)
            .ok_or_else(|| StateError::UnknownPath(path.to_string()))?;
        let Some((PathStep::Name(first), rest)) = path.steps().split_first() else {
            return Err(StateError::InvalidPath(path.to_string()));
        };
        let mut current = self.values.get(first);
        for step in rest {
            current = match (step, current) {
                (PathStep::Name(name), Some(TypedValue::Object(fields))) => fields.get(name),
                (PathStep::Index(index), Some(TypedValue::List(items))) => items.get(*index),
                (_, Some(TypedValue::Unknown(_))) => return Ok(TypedValue::Unknown(expected)),
                _ => None,
            };
        }
        Ok(current.cloned().unwrap_or(TypedValue::Null(expected)))
    }

    /// Writes `value` at `path`, creating intermediate containers.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the path is not declared or the value does
    /// not carry the declared type.
    pub fn set_attribute(&mut self, path: &AttributePath, value: TypedValue) -> Result<(), StateError> {
        let expected = self
            .schema
            .type_at(path)
            .ok_or_else(|| StateError::UnknownPath(path.to_string()))?;
        if !value.conforms_to(&expected) {
            return Err(StateError::TypeMismatch {
                path: path.to_string(),
                expected: expected.to_string(),
            });
        }
        let Some((PathStep::Name(first), rest)) = path.steps().split_first() else {
            return Err(StateError::InvalidPath(path.to_string()));
        };
        let root_type = self
            .schema
            .attribute(first)
            .map(|attribute| attribute.value_type())
            .ok_or_else(|| StateError::UnknownPath(path.to_string()))?;
        let slot =
            self.values.entry(first.clone()).or_insert_with(|| TypedValue::Null(root_type.clone()));
        place(slot, &root_type, rest, value, path)
    }
}

/// Descends into `slot` along `rest` and stores `value` at the end.
fn place(
    slot: &mut TypedValue,
    slot_type: &ValueType,
    rest: &[PathStep],
    value: TypedValue,
    path: &AttributePath,
) -> Result<(), StateError> {
    let Some((step, tail)) = rest.split_first() else {
        *slot = value;
        return Ok(());
    };
    match (step, slot_type) {
        (PathStep::Name(name), ValueType::Object(fields)) => {
            let field_type =
                fields.get(name).ok_or_else(|| StateError::UnknownPath(path.to_string()))?;
            if !matches!(slot, TypedValue::Object(_)) {
                *slot = TypedValue::Object(BTreeMap::new());
            }
            let TypedValue::Object(map) = slot else {
                return Err(StateError::InvalidPath(path.to_string()));
            };
            let child =
                map.entry(name.clone()).or_insert_with(|| TypedValue::Null(field_type.clone()));
            place(child, field_type, tail, value, path)
        }
        (PathStep::Index(index), ValueType::List(element)) => {
            if !matches!(slot, TypedValue::List(_)) {
                *slot = TypedValue::List(Vec::new());
            }
            let TypedValue::List(items) = slot else {
                return Err(StateError::InvalidPath(path.to_string()));
            };
            if items.len() <= *index {
                items.resize_with(index + 1, || TypedValue::Null((**element).clone()));
            }
            let Some(child) = items.get_mut(*index) else {
                return Err(StateError::InvalidPath(path.to_string()));
            };
            place(child, element, tail, value, path)
        }
        _ => Err(StateError::InvalidPath(path.to_string())),
    }
}
