// crates/schema-bridge-core/src/runtime/model.rs
// ============================================================================
// Module: Resource Model
// Description: Derived attributes and target schema of one resource type.
// Purpose: Bundle everything the runtime needs per resource type.
// Dependencies: tracing, crate::core
// ============================================================================

//! ## Overview
//! A [`ResourceModel`] is built once per resource type and is immutable
//! afterwards, so it can be shared across concurrent callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tracing::info;

use crate::core::attribute::Attribute;
use crate::core::attribute::SplitAttribute;
use crate::core::declarative::TargetSchema;
use crate::core::declarative::generate_target_schema;
use crate::core::derive::AttributeDeriver;
use crate::core::derive::DerivationError;
use crate::core::derive::DerivedAttributes;
use crate::core::derive::OperationRole;
use crate::core::derive::OperationSchemas;
use crate::core::diagnostics::Diagnostics;
use crate::core::options::ConversionOptions;
use crate::core::options::EngineOptions;
use crate::core::schema::SchemaNode;
use crate::core::state::State;

// ============================================================================
// SECTION: Model
// ============================================================================

/// Immutable attribute model of one resource type.
#[derive(Debug, Clone)]
pub struct ResourceModel {
    /// Resource type name.
    name: String,
    /// Derived attribute tree.
    derived: DerivedAttributes,
    /// Generated target schema.
    target_schema: Arc<TargetSchema>,
    /// Read result schema, used to recognise read-shaped operation results.
    read_result_schema: Arc<SchemaNode>,
    /// Derivation and generation findings.
    diagnostics: Diagnostics,
    /// Conversion flags for parameter reads.
    read_conversion: ConversionOptions,
}

impl ResourceModel {
    /// Derives attributes and generates the target schema.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError`] when derivation fails.
    pub fn build(
        name: impl Into<String>,
        schemas: &OperationSchemas,
        options: &EngineOptions,
    ) -> Result<Self, DerivationError> {
        let name = name.into();
        let read_result_schema = schemas
            .read_result
            .clone()
            .ok_or(DerivationError::MissingSchema(OperationRole::ReadResult))?;
        let derived = AttributeDeriver::new(options).derive(schemas)?;
        let mut diagnostics = derived.diagnostics.clone();
        let target_schema = generate_target_schema(&derived, &mut diagnostics);
        info!(
            resource = %name,
            attributes = target_schema.attributes.len(),
            splits = derived.splits.len(),
            diagnostics = diagnostics.len(),
            "built resource model"
        );
        Ok(Self {
            name,
            derived,
            target_schema: Arc::new(target_schema),
            read_result_schema,
            diagnostics,
            read_conversion: options.read_conversion,
        })
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the derived attribute tree.
    #[must_use]
    pub const fn derived(&self) -> &DerivedAttributes {
        &self.derived
    }

    /// Returns the target schema.
    #[must_use]
    pub fn target_schema(&self) -> &TargetSchema {
        &self.target_schema
    }

    /// Returns the read result schema.
    #[must_use]
    pub fn read_result_schema(&self) -> &SchemaNode {
        &self.read_result_schema
    }

    /// Returns derivation and generation findings.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns the conversion flags used for parameter reads.
    #[must_use]
    pub const fn read_conversion(&self) -> ConversionOptions {
        self.read_conversion
    }

    /// Returns a root attribute by target name.
    #[must_use]
    pub fn attribute(&self, target_name: &str) -> Option<&Attribute> {
        self.derived.attributes.get(target_name)
    }

    /// Iterates over attributes the caller supplies.
    pub fn input_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.derived.input_attributes()
    }

    /// Iterates over attributes reported by the remote system.
    pub fn output_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.derived.output_attributes()
    }

    /// Returns split attribute pairs.
    #[must_use]
    pub fn splits(&self) -> &[SplitAttribute] {
        &self.derived.splits
    }

    /// Creates an empty state bound to the target schema.
    #[must_use]
    pub fn new_state(&self) -> State {
        State::new(Arc::clone(&self.target_schema))
    }

    /// Creates a state as planned for a new instance: computed attributes
    /// read as unknown until the remote system reports them.
    #[must_use]
    pub fn planned_state(&self) -> State {
        State::planned(Arc::clone(&self.target_schema))
    }
}
