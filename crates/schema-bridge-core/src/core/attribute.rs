// crates/schema-bridge-core/src/core/attribute.rs
// ============================================================================
// Module: Attributes
// Description: Classified field metadata derived from operation schemas.
// Purpose: Describe each resource field's mutability for generation and conversion.
// Dependencies: indexmap, serde, crate::core::schema
// ============================================================================

//! ## Overview
//! An [`Attribute`] binds a generic field name to its schema and lifecycle
//! flags. Attributes form a tree that mirrors the schema: object properties
//! become named children and array elements live under [`ELEMENT_KEY`].
//! Trees are built once per resource type and shared read-only afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::schema::SchemaNode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Child key holding an array's element attribute.
pub const ELEMENT_KEY: &str = "0";

// ============================================================================
// SECTION: Attribute
// ============================================================================

/// Operation schemas that contributed to an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttributeSources {
    /// Present in the create parameters.
    pub create: bool,
    /// Present in the update parameters.
    pub update: bool,
    /// Present in the read result (or the create result).
    pub read: bool,
}

impl AttributeSources {
    /// Returns true when the caller supplies this field on create or update.
    #[must_use]
    pub const fn is_input(self) -> bool {
        self.create || self.update
    }

    /// Returns true when the remote system reports this field.
    #[must_use]
    pub const fn is_output(self) -> bool {
        self.read
    }
}

/// Lifecycle flags of one attribute.
///
/// # Invariants
/// - `required` implies `!optional` and `!computed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttributeFlags {
    /// Caller must supply a value.
    pub required: bool,
    /// Caller may supply a value.
    pub optional: bool,
    /// Remote system may determine the value.
    pub computed: bool,
    /// Changing the value forces resource replacement.
    pub requires_replace: bool,
}

impl AttributeFlags {
    /// Flags of a read-only field.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            required: false,
            optional: false,
            computed: true,
            requires_replace: false,
        }
    }
}

/// Classified field bound to one resource type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Generic field name as it appears in operation payloads.
    pub name: String,
    /// Field name adapted to the target tool.
    pub target_name: String,
    /// Field schema.
    pub schema: Arc<SchemaNode>,
    /// Child attributes keyed by target name; arrays use [`ELEMENT_KEY`].
    pub children: IndexMap<String, Self>,
    /// Field holds a remote-assigned identifier.
    pub is_identifier: bool,
    /// Lifecycle flags.
    pub flags: AttributeFlags,
    /// Contributing operation schemas.
    pub sources: AttributeSources,
}

impl Attribute {
    /// Returns true when the caller must supply a value.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.flags.required
    }

    /// Returns true when the caller may supply a value.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.flags.optional
    }

    /// Returns true when the remote system may determine the value.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.flags.computed
    }

    /// Returns true when changes force replacement.
    #[must_use]
    pub const fn requires_replace(&self) -> bool {
        self.flags.requires_replace
    }

    /// Returns the array element attribute.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        self.children.get(ELEMENT_KEY)
    }

    /// Returns a child attribute by target name.
    #[must_use]
    pub fn child(&self, target_name: &str) -> Option<&Self> {
        self.children.get(target_name)
    }
}

// ============================================================================
// SECTION: Split Attribute
// ============================================================================

/// A field whose create-time and read-time shapes are incompatible.
///
/// # Invariants
/// - Both halves share the same generic `name`.
/// - Target names carry the configured desired/current prefixes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitAttribute {
    /// Create-shaped half, sent on create/update.
    pub desired: Attribute,
    /// Read-shaped half, reported by the remote system.
    pub current: Attribute,
}
