// crates/schema-bridge-core/src/core/resolver.rs
// ============================================================================
// Module: Type Resolver
// Description: Logical kind resolution through type, enum, and anyOf.
// Purpose: Give derivation, generation, and conversion one answer for a node's kind.
// Dependencies: serde_json, thiserror, crate::core::{cow, schema}
// ============================================================================

//! ## Overview
//! Resolution order is fixed: an explicit `type` wins, then the common type
//! of the `enum` literals, then the single non-null kind shared by every
//! `anyOf` entry. Object `anyOf` entries must be structural subsets of one
//! another and the entry with the most properties becomes canonical.
//!
//! The module also hosts the structural comparisons used elsewhere:
//! [`similar_schemas`] and [`structurally_compatible`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use crate::core::cow::CowSchema;
use crate::core::schema::JsonType;
use crate::core::schema::SchemaKind;
use crate::core::schema::SchemaNode;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a schema node has no single logical kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaResolutionError {
    /// Enum literals do not share one logical kind.
    #[error("enum literals do not share one type: {0}")]
    InconsistentEnumType(String),
    /// `anyOf` mixes more than one non-null kind.
    #[error("anyOf mixes incompatible types {first} and {second}")]
    IncompatibleAnyOf {
        /// Kind of the first non-null entry.
        first: SchemaKind,
        /// Conflicting kind.
        second: SchemaKind,
    },
    /// Object `anyOf` entries disagree on a property.
    #[error("anyOf object entries are not subsets of each other (property `{0}`)")]
    AnyOfNotSubsets(String),
    /// No type, enum, or anyOf determines the kind.
    #[error("schema has no resolvable type")]
    UnresolvableSchema,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Result of resolving a schema node.
///
/// # Invariants
/// - `schema` is the canonical node for `kind`: the node itself, or the
///   chosen `anyOf` entry with the merged nullable flag applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType<'a> {
    /// Logical kind.
    pub kind: SchemaKind,
    /// Whether null is accepted.
    pub nullable: bool,
    /// Canonical schema for the kind.
    pub schema: Cow<'a, SchemaNode>,
}

/// Resolves the logical kind of a schema node.
///
/// # Errors
///
/// Returns [`SchemaResolutionError`] when the node has no single kind.
pub fn resolve_kind(node: &SchemaNode) -> Result<ResolvedType<'_>, SchemaResolutionError> {
    if let Some(raw) = node.kind {
        let kind = raw.kind().ok_or(SchemaResolutionError::UnresolvableSchema)?;
        return Ok(ResolvedType {
            kind,
            nullable: node.nullable,
            schema: Cow::Borrowed(node),
        });
    }
    if !node.enum_values.is_empty() {
        let (kind, has_null) = enum_kind(&node.enum_values)?;
        return Ok(ResolvedType {
            kind,
            nullable: node.nullable || has_null,
            schema: Cow::Borrowed(node),
        });
    }
    if !node.any_of.is_empty() {
        return resolve_any_of(node);
    }
    Err(SchemaResolutionError::UnresolvableSchema)
}

/// Determines the common kind of enum literals.
///
/// Returns the kind and whether a `null` literal was present.
fn enum_kind(literals: &[Value]) -> Result<(SchemaKind, bool), SchemaResolutionError> {
    let mut kinds = BTreeSet::new();
    let mut has_null = false;
    for literal in literals {
        let kind = match literal {
            Value::Null => {
                has_null = true;
                continue;
            }
            Value::Bool(_) => SchemaKind::Boolean,
            Value::Number(number) if number.is_i64() || number.is_u64() => SchemaKind::Integer,
            Value::Number(_) => SchemaKind::Number,
            Value::String(_) => SchemaKind::String,
            Value::Array(_) | Value::Object(_) => {
                return Err(SchemaResolutionError::InconsistentEnumType(format!(
                    "unsupported literal {literal}"
                )));
            }
        };
        kinds.insert(kind);
    }
    let mut iter = kinds.iter();
    match (iter.next(), iter.next()) {
        (Some(kind), None) => Ok((*kind, has_null)),
        (None, _) => Err(SchemaResolutionError::UnresolvableSchema),
        (Some(_), Some(_)) => {
            let names = kinds.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(", ");
            Err(SchemaResolutionError::InconsistentEnumType(names))
        }
    }
}

/// Resolves an `anyOf` node to its single non-null kind.
fn resolve_any_of(node: &SchemaNode) -> Result<ResolvedType<'_>, SchemaResolutionError> {
    let mut nullable = node.nullable;
    let mut candidates: Vec<ResolvedType<'_>> = Vec::with_capacity(node.any_of.len());
    for variant in &node.any_of {
        if variant.kind == Some(JsonType::Null) {
            nullable = true;
            continue;
        }
        let resolved = resolve_kind(variant)?;
        if let Some(first) = candidates.first()
            && first.kind != resolved.kind
        {
            return Err(SchemaResolutionError::IncompatibleAnyOf {
                first: first.kind,
                second: resolved.kind,
            });
        }
        nullable |= resolved.nullable;
        candidates.push(resolved);
    }
    let kind = candidates.first().map(|candidate| candidate.kind);
    let Some(kind) = kind else {
        return Err(SchemaResolutionError::UnresolvableSchema);
    };

    let mut canonical = 0;
    if kind == SchemaKind::Object {
        for (index, candidate) in candidates.iter().enumerate() {
            for earlier in candidates.iter().take(index) {
                if let Some(property) =
                    subset_conflict(&earlier.schema, &candidate.schema, SubsetRule::Strict)
                {
                    return Err(SchemaResolutionError::AnyOfNotSubsets(property));
                }
            }
            let best = candidates.get(canonical).map_or(0, |best| best.schema.properties.len());
            if candidate.schema.properties.len() > best {
                canonical = index;
            }
        }
    }

    let chosen = candidates.swap_remove(canonical);
    let mut view = CowSchema::from_cow(chosen.schema);
    view.set_nullable(nullable);
    let (schema, _) = view.release();
    Ok(ResolvedType {
        kind,
        nullable,
        schema,
    })
}

// ============================================================================
// SECTION: Structural Comparison
// ============================================================================

/// Property comparison rule used by the subset test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubsetRule {
    /// Shared properties must agree on required-ness and be similar.
    Strict,
    /// Shared properties must be structurally compatible; required-ness is ignored.
    Relaxed,
}

/// Returns true when two schemas describe the same shape.
///
/// Kinds must match. Strings must share a format unless either leaves it
/// unset. Arrays compare items. Objects must declare the same number of
/// properties, each similar to its counterpart.
#[must_use]
pub fn similar_schemas(left: &SchemaNode, right: &SchemaNode) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    let (Ok(left), Ok(right)) = (resolve_kind(left), resolve_kind(right)) else {
        return false;
    };
    if left.kind != right.kind {
        return false;
    }
    match left.kind {
        SchemaKind::String => match (&left.schema.format, &right.schema.format) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        },
        SchemaKind::Number | SchemaKind::Integer | SchemaKind::Boolean => true,
        SchemaKind::Array => match (left.schema.items(), right.schema.items()) {
            (Some(a), Some(b)) => similar_schemas(a, b),
            (None, None) => true,
            _ => false,
        },
        SchemaKind::Object => {
            left.schema.properties.len() == right.schema.properties.len()
                && left.schema.properties.iter().all(|(name, property)| {
                    right.schema.property(name).is_some_and(|other| similar_schemas(property, other))
                })
        }
    }
}

/// Returns true when one object schema is a strict subset of the other.
///
/// The schema with fewer properties is the subset. Every subset property
/// must exist in the superset with the same required-ness and a similar
/// schema.
#[must_use]
pub fn objects_are_subsets(left: &SchemaNode, right: &SchemaNode) -> bool {
    subset_conflict(left, right, SubsetRule::Strict).is_none()
}

/// Returns true when two schemas can describe the same logical field.
///
/// Used to detect create/read shape divergence. Kinds must match, arrays
/// compare items, and objects must be subsets of each other without regard
/// to required-ness. Two unresolvable schemas are treated as compatible.
#[must_use]
pub fn structurally_compatible(left: &SchemaNode, right: &SchemaNode) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    let (left, right) = match (resolve_kind(left), resolve_kind(right)) {
        (Ok(left), Ok(right)) => (left, right),
        (Err(_), Err(_)) => return true,
        _ => return false,
    };
    if left.kind != right.kind {
        return false;
    }
    match left.kind {
        SchemaKind::String | SchemaKind::Number | SchemaKind::Integer | SchemaKind::Boolean => {
            true
        }
        SchemaKind::Array => match (left.schema.items(), right.schema.items()) {
            (Some(a), Some(b)) => structurally_compatible(a, b),
            _ => true,
        },
        SchemaKind::Object => subset_conflict(&left.schema, &right.schema, SubsetRule::Relaxed)
            .is_none(),
    }
}

/// Returns the first property that breaks the subset relation, if any.
fn subset_conflict(left: &SchemaNode, right: &SchemaNode, rule: SubsetRule) -> Option<String> {
    let (subset, superset) = if left.properties.len() <= right.properties.len() {
        (left, right)
    } else {
        (right, left)
    };
    for (name, property) in &subset.properties {
        let Some(other) = superset.property(name) else {
            return Some(name.clone());
        };
        let matches = match rule {
            SubsetRule::Strict => {
                subset.is_required(name) == superset.is_required(name)
                    && similar_schemas(property, other)
            }
            SubsetRule::Relaxed => structurally_compatible(property, other),
        };
        if !matches {
            return Some(name.clone());
        }
    }
    None
}
