// crates/schema-bridge-core/src/core/declarative.rs
// ============================================================================
// Module: Declarative Schema Generator
// Description: Target-tool schema attributes generated from derived attributes.
// Purpose: Expose the attribute model to a state-diffing tool's schema hook.
// Dependencies: indexmap, serde, serde_json, tracing, crate::core
// ============================================================================

//! ## Overview
//! Each [`Attribute`] maps to one [`TargetAttribute`]. Arrays of objects
//! become nested list attributes so per-item structure is preserved.
//! Attributes whose type cannot be resolved are dropped with a diagnostic;
//! the rest of the resource schema is still produced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::attribute::Attribute;
use crate::core::derive::DerivedAttributes;
use crate::core::diagnostics::DiagnosticCode;
use crate::core::diagnostics::Diagnostics;
use crate::core::resolver::resolve_kind;
use crate::core::schema::SchemaKind;
use crate::core::value::AttributePath;
use crate::core::value::PathStep;
use crate::core::value::TypedValue;
use crate::core::value::ValueType;
use crate::core::value::decimal_from_number;

// ============================================================================
// SECTION: Target Schema Types
// ============================================================================

/// Plan-time behaviour attached to an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// Keep the prior state value when the planned value is unknown.
    UseStateForUnknown,
    /// Changing the value forces resource replacement.
    RequiresReplace,
}

/// Concrete attribute type in the target schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetAttributeKind {
    /// String attribute.
    String,
    /// Floating-point number attribute.
    Number,
    /// 64-bit integer attribute.
    Int64,
    /// Boolean attribute.
    Bool,
    /// List of primitive or list values.
    List {
        /// Element type.
        element: ValueType,
    },
    /// List of objects with per-item attributes.
    ListNested {
        /// Item attributes keyed by target name.
        attributes: IndexMap<String, TargetAttribute>,
    },
    /// Single nested object.
    SingleNested {
        /// Nested attributes keyed by target name.
        attributes: IndexMap<String, TargetAttribute>,
    },
}

/// Attribute definition in the target tool's schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAttribute {
    /// Attribute type.
    pub kind: TargetAttributeKind,
    /// Description copied from the schema.
    pub description: Option<String>,
    /// Must be configured.
    pub required: bool,
    /// May be configured.
    pub optional: bool,
    /// May be set by the provider.
    pub computed: bool,
    /// Plan modifiers in application order.
    pub plan_modifiers: Vec<PlanModifier>,
    /// Static default for computed attributes.
    pub default: Option<TypedValue>,
}

impl TargetAttribute {
    /// Returns the value type stored for this attribute.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match &self.kind {
            TargetAttributeKind::String => ValueType::String,
            TargetAttributeKind::Number | TargetAttributeKind::Int64 => ValueType::Number,
            TargetAttributeKind::Bool => ValueType::Bool,
            TargetAttributeKind::List {
                element,
            } => ValueType::List(Box::new(element.clone())),
            TargetAttributeKind::ListNested {
                attributes,
            } => ValueType::List(Box::new(object_type(attributes))),
            TargetAttributeKind::SingleNested {
                attributes,
            } => object_type(attributes),
        }
    }

    /// Returns true when the modifier is attached.
    #[must_use]
    pub fn has_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    /// Returns nested attributes for object and list-of-object kinds.
    #[must_use]
    pub const fn nested_attributes(&self) -> Option<&IndexMap<String, Self>> {
        match &self.kind {
            TargetAttributeKind::ListNested {
                attributes,
            }
            | TargetAttributeKind::SingleNested {
                attributes,
            } => Some(attributes),
            _ => None,
        }
    }
}

/// Resource schema in the target tool's terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetSchema {
    /// Root attributes keyed by target name.
    pub attributes: IndexMap<String, TargetAttribute>,
}

impl TargetSchema {
    /// Returns a root attribute by target name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&TargetAttribute> {
        self.attributes.get(name)
    }

    /// Returns the object type of the whole resource.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        object_type(&self.attributes)
    }

    /// Returns the value type stored at `path`, if the path exists.
    #[must_use]
    pub fn type_at(&self, path: &AttributePath) -> Option<ValueType> {
        let (first, rest) = path.steps().split_first()?;
        let PathStep::Name(name) = first else {
            return None;
        };
        let mut current = self.attributes.get(name)?.value_type();
        for step in rest {
            current = match (step, current) {
                (PathStep::Name(name), ValueType::Object(mut fields)) => fields.remove(name)?,
                (PathStep::Index(_), ValueType::List(element)) => *element,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Builds an object type from attributes.
fn object_type(attributes: &IndexMap<String, TargetAttribute>) -> ValueType {
    ValueType::Object(
        attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.value_type()))
            .collect::<BTreeMap<_, _>>(),
    )
}

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Generates the target schema for a derived resource.
///
/// Attributes that cannot be resolved are omitted and reported through
/// `diagnostics`.
#[must_use]
pub fn generate_target_schema(
    derived: &DerivedAttributes,
    diagnostics: &mut Diagnostics,
) -> TargetSchema {
    let mut attributes = IndexMap::with_capacity(derived.attributes.len());
    for attribute in derived.attributes.values() {
        if let Some(target) = convert(attribute, &attribute.target_name, diagnostics) {
            attributes.insert(attribute.target_name.clone(), target);
        }
    }
    debug!(
        attributes = attributes.len(),
        dropped = derived.attributes.len() - attributes.len(),
        "generated target schema"
    );
    TargetSchema {
        attributes,
    }
}

/// Converts one attribute into a target attribute.
///
/// Returns `None` and records a diagnostic when the attribute's type cannot
/// be resolved.
#[must_use]
pub fn to_declarative_attribute(
    attribute: &Attribute,
    diagnostics: &mut Diagnostics,
) -> Option<TargetAttribute> {
    convert(attribute, &attribute.target_name, diagnostics)
}

/// Recursive conversion with a diagnostic path.
fn convert(attribute: &Attribute, path: &str, diagnostics: &mut Diagnostics) -> Option<TargetAttribute> {
    let resolved = match resolve_kind(&attribute.schema) {
        Ok(resolved) => resolved,
        Err(err) => {
            diagnostics.warning(
                DiagnosticCode::SchemaResolution,
                path,
                "attribute omitted from schema",
                err.to_string(),
            );
            return None;
        }
    };

    let kind = match resolved.kind {
        SchemaKind::String => TargetAttributeKind::String,
        SchemaKind::Number => TargetAttributeKind::Number,
        SchemaKind::Integer => TargetAttributeKind::Int64,
        SchemaKind::Boolean => TargetAttributeKind::Bool,
        SchemaKind::Array => {
            let Some(element) = attribute.element() else {
                diagnostics.warning(
                    DiagnosticCode::SchemaResolution,
                    path,
                    "attribute omitted from schema",
                    "array has no element schema",
                );
                return None;
            };
            let element = convert(element, &format!("{path}[0]"), diagnostics)?;
            let element_type = element.value_type();
            match element.kind {
                TargetAttributeKind::SingleNested {
                    attributes,
                } => TargetAttributeKind::ListNested {
                    attributes,
                },
                _ => TargetAttributeKind::List {
                    element: element_type,
                },
            }
        }
        SchemaKind::Object => {
            let mut attributes = IndexMap::with_capacity(attribute.children.len());
            for child in attribute.children.values() {
                let child_path = format!("{path}.{}", child.target_name);
                if let Some(target) = convert(child, &child_path, diagnostics) {
                    attributes.insert(child.target_name.clone(), target);
                }
            }
            TargetAttributeKind::SingleNested {
                attributes,
            }
        }
    };

    let mut plan_modifiers = Vec::new();
    if attribute.sources.read || attribute.sources.update {
        plan_modifiers.push(PlanModifier::UseStateForUnknown);
    }
    if attribute.requires_replace() {
        plan_modifiers.push(PlanModifier::RequiresReplace);
    }

    let default = if attribute.is_computed() {
        resolved
            .schema
            .default
            .as_ref()
            .and_then(|value| default_value(attribute, resolved.kind, value))
    } else {
        None
    };

    Some(TargetAttribute {
        kind,
        description: resolved.schema.description.clone(),
        required: attribute.is_required(),
        optional: attribute.is_optional(),
        computed: attribute.is_computed(),
        plan_modifiers,
        default,
    })
}

/// Converts a schema default into a typed value; mismatched defaults are ignored.
fn default_value(attribute: &Attribute, kind: SchemaKind, value: &Value) -> Option<TypedValue> {
    match (kind, value) {
        (SchemaKind::String, Value::String(text)) => Some(TypedValue::String(text.clone())),
        (SchemaKind::Boolean, Value::Bool(flag)) => Some(TypedValue::Bool(*flag)),
        (SchemaKind::Integer, Value::Number(number)) => number.as_i64().map(TypedValue::integer),
        (SchemaKind::Number, Value::Number(number)) => {
            decimal_from_number(number).map(TypedValue::Number)
        }
        (SchemaKind::Array, Value::Array(items)) => {
            let element = attribute.element()?;
            let element_kind = resolve_kind(&element.schema).ok()?.kind;
            items
                .iter()
                .map(|item| default_value(element, element_kind, item))
                .collect::<Option<Vec<_>>>()
                .map(TypedValue::List)
        }
        (SchemaKind::Object, Value::Object(fields)) => {
            let mut out = BTreeMap::new();
            for child in attribute.children.values() {
                let Some(field) = fields.get(&child.name) else {
                    continue;
                };
                let child_kind = resolve_kind(&child.schema).ok()?.kind;
                out.insert(child.target_name.clone(), default_value(child, child_kind, field)?);
            }
            Some(TypedValue::Object(out))
        }
        _ => None,
    }
}
