// crates/schema-bridge-core/src/core/derive.rs
// ============================================================================
// Module: Attribute Derivation
// Description: Merges operation schemas into one classified attribute tree.
// Purpose: Decide required/optional/computed/replace flags for every field.
// Dependencies: indexmap, serde, thiserror, tracing, crate::core
// ============================================================================

//! ## Overview
//! Derivation walks the create parameters, update parameters, read result
//! and (optionally) create result of one resource type in lockstep. Every
//! property name seen at a level is classified exactly once, with create
//! taking precedence over update and update over read.
//!
//! Root-level fields whose create and read shapes are incompatible become
//! [`SplitAttribute`] pairs. Everything else that looks inconsistent is
//! recorded as a diagnostic and derivation continues.
//!
//! ## Invariants
//! - Output ordering follows first appearance: create, update, read, create result.
//! - Two runs over the same schemas produce identical trees.
//! - Identifier fields are never required.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::trace;

use crate::core::attribute::Attribute;
use crate::core::attribute::AttributeFlags;
use crate::core::attribute::AttributeSources;
use crate::core::attribute::ELEMENT_KEY;
use crate::core::attribute::SplitAttribute;
use crate::core::diagnostics::DiagnosticCode;
use crate::core::diagnostics::Diagnostics;
use crate::core::options::EngineOptions;
use crate::core::options::NamingPolicy;
use crate::core::resolver::ResolvedType;
use crate::core::resolver::resolve_kind;
use crate::core::resolver::similar_schemas;
use crate::core::resolver::structurally_compatible;
use crate::core::schema::JsonType;
use crate::core::schema::SchemaKind;
use crate::core::schema::SchemaNode;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Operation schema roles consumed by derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationRole {
    /// Create request parameters.
    CreateParams,
    /// Create response body.
    CreateResult,
    /// Read response body.
    ReadResult,
    /// Update request parameters.
    UpdateParams,
}

impl fmt::Display for OperationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateParams => "create parameters",
            Self::CreateResult => "create result",
            Self::ReadResult => "read result",
            Self::UpdateParams => "update parameters",
        })
    }
}

/// Operation schemas describing one resource type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSchemas {
    /// Create request parameters.
    pub create_params: Option<Arc<SchemaNode>>,
    /// Create response body, when it differs from the read result.
    pub create_result: Option<Arc<SchemaNode>>,
    /// Read response body.
    pub read_result: Option<Arc<SchemaNode>>,
    /// Update request parameters.
    pub update_params: Option<Arc<SchemaNode>>,
}

impl OperationSchemas {
    /// Builds the required create/read/update schema set.
    #[must_use]
    pub fn new(create_params: SchemaNode, read_result: SchemaNode, update_params: SchemaNode) -> Self {
        Self {
            create_params: Some(Arc::new(create_params)),
            create_result: None,
            read_result: Some(Arc::new(read_result)),
            update_params: Some(Arc::new(update_params)),
        }
    }

    /// Adds the create response schema.
    #[must_use]
    pub fn with_create_result(mut self, create_result: SchemaNode) -> Self {
        self.create_result = Some(Arc::new(create_result));
        self
    }
}

// ============================================================================
// SECTION: Outputs
// ============================================================================

/// Derivation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// A required operation schema was not supplied.
    #[error("missing {0} schema")]
    MissingSchema(OperationRole),
    /// An operation schema root is not an object.
    #[error("{0} schema root is not an object")]
    RootNotObject(OperationRole),
    /// Nesting exceeded the configured depth.
    #[error("schema nesting exceeds {max_depth} levels at `{path}`")]
    DepthExceeded {
        /// Field path where the limit was hit.
        path: String,
        /// Configured maximum depth.
        max_depth: usize,
    },
}

/// Derived attribute model of one resource type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedAttributes {
    /// Root attributes keyed by target name, including both split halves.
    pub attributes: IndexMap<String, Attribute>,
    /// Fields with incompatible create and read shapes.
    pub splits: Vec<SplitAttribute>,
    /// Non-fatal findings.
    pub diagnostics: Diagnostics,
}

impl DerivedAttributes {
    /// Iterates over attributes the caller supplies on create or update.
    pub fn input_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values().filter(|attribute| attribute.sources.is_input())
    }

    /// Iterates over attributes reported by the remote system.
    pub fn output_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values().filter(|attribute| attribute.sources.is_output())
    }
}

/// Derives attributes with default options.
///
/// # Errors
///
/// Returns [`DerivationError`] when a schema is missing or malformed.
pub fn derive_attributes(
    create_params: Option<Arc<SchemaNode>>,
    read_result: Option<Arc<SchemaNode>>,
    update_params: Option<Arc<SchemaNode>>,
) -> Result<DerivedAttributes, DerivationError> {
    let schemas = OperationSchemas {
        create_params,
        create_result: None,
        read_result,
        update_params,
    };
    AttributeDeriver::new(&EngineOptions::default()).derive(&schemas)
}

// ============================================================================
// SECTION: Views
// ============================================================================

/// Object nodes at the same relative path in each operation schema.
#[derive(Debug, Clone, Copy, Default)]
struct Views<'s> {
    /// Create parameters view.
    create: Option<&'s SchemaNode>,
    /// Update parameters view.
    update: Option<&'s SchemaNode>,
    /// Read result view.
    read_result: Option<&'s SchemaNode>,
    /// Create result view.
    create_result: Option<&'s SchemaNode>,
}

/// Property handles for one name across the views.
#[derive(Debug, Clone, Copy)]
struct Lookup<'s> {
    /// Property in the create parameters.
    create: Option<&'s Arc<SchemaNode>>,
    /// Property in the update parameters.
    update: Option<&'s Arc<SchemaNode>>,
    /// Property in the read result.
    read_result: Option<&'s Arc<SchemaNode>>,
    /// Property in the create result.
    create_result: Option<&'s Arc<SchemaNode>>,
}

impl<'s> Lookup<'s> {
    /// Looks up `name` in every view.
    fn new(name: &str, views: Views<'s>) -> Self {
        Self {
            create: views.create.and_then(|node| node.property_arc(name)),
            update: views.update.and_then(|node| node.property_arc(name)),
            read_result: views.read_result.and_then(|node| node.property_arc(name)),
            create_result: views.create_result.and_then(|node| node.property_arc(name)),
        }
    }

    /// Returns the read-time schema, preferring the read result.
    fn read(self) -> Option<&'s Arc<SchemaNode>> {
        self.read_result.or(self.create_result)
    }

    /// Drops the read-time schemas.
    const fn without_read(self) -> Self {
        Self {
            read_result: None,
            create_result: None,
            ..self
        }
    }

    /// Keeps only the read-time schemas.
    const fn read_only(self) -> Self {
        Self {
            create: None,
            update: None,
            ..self
        }
    }
}

/// A classified field awaiting recursion.
#[derive(Debug, Clone, Copy)]
struct Classified<'s> {
    /// Generic field name.
    name: &'s str,
    /// Schema that determined the classification.
    schema: &'s Arc<SchemaNode>,
    /// Identifier heuristic result.
    is_identifier: bool,
    /// Lifecycle flags.
    flags: AttributeFlags,
    /// Contributing schemas.
    sources: AttributeSources,
    /// Field nodes used when recursing into children.
    nested: Lookup<'s>,
}

// ============================================================================
// SECTION: Deriver
// ============================================================================

/// Attribute deriver bound to engine options.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDeriver<'o> {
    /// Engine options.
    options: &'o EngineOptions,
}

impl<'o> AttributeDeriver<'o> {
    /// Creates a deriver.
    #[must_use]
    pub const fn new(options: &'o EngineOptions) -> Self {
        Self {
            options,
        }
    }

    /// Returns the naming policy in use.
    const fn naming(&self) -> &NamingPolicy {
        &self.options.naming
    }

    /// Derives the attribute model for one resource type.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError`] when create, read, or update schemas are
    /// missing, when a root is not an object, or when nesting is too deep.
    pub fn derive(&self, schemas: &OperationSchemas) -> Result<DerivedAttributes, DerivationError> {
        let views = Views {
            create: Some(root_object(OperationRole::CreateParams, schemas.create_params.as_ref())?),
            update: Some(root_object(OperationRole::UpdateParams, schemas.update_params.as_ref())?),
            read_result: Some(root_object(OperationRole::ReadResult, schemas.read_result.as_ref())?),
            create_result: match schemas.create_result.as_ref() {
                Some(node) => Some(root_object(OperationRole::CreateResult, Some(node))?),
                None => None,
            },
        };
        let mut diagnostics = Diagnostics::new();
        let mut splits = Vec::new();
        let attributes = self.derive_level(views, "", 0, &mut splits, &mut diagnostics)?;
        debug!(
            attributes = attributes.len(),
            splits = splits.len(),
            diagnostics = diagnostics.len(),
            "derived resource attributes"
        );
        Ok(DerivedAttributes {
            attributes,
            splits,
            diagnostics,
        })
    }

    /// Classifies and builds every property at one object level.
    fn derive_level(
        &self,
        views: Views<'_>,
        parent_path: &str,
        depth: usize,
        splits: &mut Vec<SplitAttribute>,
        diagnostics: &mut Diagnostics,
    ) -> Result<IndexMap<String, Attribute>, DerivationError> {
        let names = [views.create, views.update, views.read_result, views.create_result]
            .into_iter()
            .flatten()
            .flat_map(|node| node.properties.keys().map(String::as_str))
            .collect::<IndexSet<&str>>();

        let mut attributes = IndexMap::with_capacity(names.len());
        for name in names {
            let path = join_path(parent_path, name);
            let lookup = Lookup::new(name, views);

            if depth == 0
                && let (Some(create), Some(read)) = (lookup.create, lookup.read())
                && !structurally_compatible(create, read)
                && let Some(split) = self.split(name, lookup, views, &path, diagnostics)?
            {
                let desired = insert_unique(&mut attributes, split.desired.clone(), &path, diagnostics);
                let current = insert_unique(&mut attributes, split.current.clone(), &path, diagnostics);
                if desired && current {
                    splits.push(split);
                }
                continue;
            }

            let Some(field) = self.classify(name, lookup, views, &path, depth, diagnostics) else {
                continue;
            };
            let attribute = self.build(field, &path, depth, diagnostics)?;
            insert_unique(&mut attributes, attribute, &path, diagnostics);
        }
        Ok(attributes)
    }

    /// Applies the classification rules to one property.
    fn classify<'s>(
        &self,
        name: &'s str,
        lookup: Lookup<'s>,
        parent: Views<'_>,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Option<Classified<'s>> {
        let is_identifier = self.naming().is_identifier(name);
        let read = lookup.read();
        let sources = AttributeSources {
            create: lookup.create.is_some(),
            update: lookup.update.is_some(),
            read: read.is_some(),
        };
        let mut nested = lookup;

        if let Some(create) = lookup.create {
            let required = parent.create.is_some_and(|node| node.is_required(name)) && !is_identifier;
            if let Some(update) = lookup.update
                && !similar_schemas(create, update)
            {
                diagnostics.warning(
                    DiagnosticCode::ClassificationAmbiguity,
                    path,
                    "ignoring differing update schema",
                    format!("create and update schemas for `{name}` differ; keeping create classification"),
                );
            }
            if depth > 0 {
                nested = diverge_read(create, nested, path, diagnostics);
            }
            return Some(Classified {
                name,
                schema: create,
                is_identifier,
                flags: AttributeFlags {
                    required,
                    optional: !required,
                    computed: !required && read.is_some(),
                    requires_replace: lookup.update.is_none(),
                },
                sources,
                nested,
            });
        }

        if let Some(update) = lookup.update {
            let required = parent.update.is_some_and(|node| node.is_required(name)) && !is_identifier;
            nested = diverge_read(update, nested, path, diagnostics);
            return Some(Classified {
                name,
                schema: update,
                is_identifier,
                flags: AttributeFlags {
                    required,
                    optional: !required,
                    computed: !required || is_identifier,
                    requires_replace: false,
                },
                sources,
                nested,
            });
        }

        read.map(|schema| Classified {
            name,
            schema,
            is_identifier,
            flags: AttributeFlags::read_only(),
            sources,
            nested,
        })
    }

    /// Builds the desired/current pair for a root field with divergent shapes.
    fn split(
        &self,
        name: &str,
        lookup: Lookup<'_>,
        parent: Views<'_>,
        path: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<SplitAttribute>, DerivationError> {
        let desired = self.classify(name, lookup.without_read(), parent, path, 0, diagnostics);
        let current = self.classify(name, lookup.read_only(), parent, path, 0, diagnostics);
        let (Some(desired), Some(current)) = (desired, current) else {
            return Ok(None);
        };
        let mut desired = self.build(desired, path, 0, diagnostics)?;
        let mut current = self.build(current, path, 0, diagnostics)?;
        desired.target_name = self.naming().desired_name(&desired.target_name);
        current.target_name = self.naming().current_name(&current.target_name);
        debug!(
            field = %path,
            desired = %desired.target_name,
            current = %current.target_name,
            "split attribute on create/read shape divergence"
        );
        Ok(Some(SplitAttribute {
            desired,
            current,
        }))
    }

    /// Builds an attribute and its children.
    fn build(
        &self,
        field: Classified<'_>,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<Attribute, DerivationError> {
        let max_depth = self.options.limits.max_depth;
        if depth > max_depth {
            return Err(DerivationError::DepthExceeded {
                path: path.to_string(),
                max_depth,
            });
        }
        trace!(field = %path, flags = ?field.flags, "classified attribute");
        let children = self.derive_children(&field, path, depth, diagnostics)?;
        Ok(Attribute {
            name: field.name.to_string(),
            target_name: self.naming().target_name(field.name),
            schema: Arc::clone(field.schema),
            children,
            is_identifier: field.is_identifier,
            flags: field.flags,
            sources: field.sources,
        })
    }

    /// Recurses into object properties or the array element.
    fn derive_children(
        &self,
        field: &Classified<'_>,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<IndexMap<String, Attribute>, DerivationError> {
        let Ok(primary) = resolve_kind(field.schema) else {
            return Ok(IndexMap::new());
        };
        let nested = field.nested;
        let create = resolve_as(nested.create, primary.kind);
        let update = resolve_as(nested.update, primary.kind);
        let read_result = resolve_as(nested.read_result, primary.kind);
        let create_result = resolve_as(nested.create_result, primary.kind);

        match primary.kind {
            SchemaKind::Object => {
                let views = Views {
                    create: create.as_ref().map(|resolved| resolved.schema.as_ref()),
                    update: update.as_ref().map(|resolved| resolved.schema.as_ref()),
                    read_result: read_result.as_ref().map(|resolved| resolved.schema.as_ref()),
                    create_result: create_result.as_ref().map(|resolved| resolved.schema.as_ref()),
                };
                let mut nested_splits = Vec::new();
                self.derive_level(views, path, depth + 1, &mut nested_splits, diagnostics)
            }
            SchemaKind::Array => {
                let Some(items) = primary.schema.items.as_ref() else {
                    return Ok(IndexMap::new());
                };
                let element = Classified {
                    name: ELEMENT_KEY,
                    schema: items,
                    is_identifier: false,
                    flags: AttributeFlags {
                        requires_replace: false,
                        ..field.flags
                    },
                    sources: field.sources,
                    nested: Lookup {
                        create: items_of(create.as_ref()),
                        update: items_of(update.as_ref()),
                        read_result: items_of(read_result.as_ref()),
                        create_result: items_of(create_result.as_ref()),
                    },
                };
                let element_path = format!("{path}[0]");
                let attribute = self.build(element, &element_path, depth + 1, diagnostics)?;
                let mut children = IndexMap::with_capacity(1);
                children.insert(ELEMENT_KEY.to_string(), attribute);
                Ok(children)
            }
            SchemaKind::String | SchemaKind::Number | SchemaKind::Integer | SchemaKind::Boolean => {
                Ok(IndexMap::new())
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates that an operation schema root is an object.
fn root_object(
    role: OperationRole,
    node: Option<&Arc<SchemaNode>>,
) -> Result<&SchemaNode, DerivationError> {
    let node: &SchemaNode = node.ok_or(DerivationError::MissingSchema(role))?;
    match node.kind {
        Some(JsonType::Object) => Ok(node),
        None if !node.properties.is_empty() => Ok(node),
        _ => Err(DerivationError::RootNotObject(role)),
    }
}

/// Drops read-time nodes whose shape diverges from the primary schema.
fn diverge_read<'s>(
    primary: &SchemaNode,
    mut nested: Lookup<'s>,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Lookup<'s> {
    if let Some(read) = nested.read()
        && !structurally_compatible(primary, read)
    {
        diagnostics.warning(
            DiagnosticCode::ShapeDivergence,
            path,
            "nested read shape differs from input shape",
            "read-only sub-fields of this attribute are not tracked",
        );
        nested.read_result = None;
        nested.create_result = None;
    }
    nested
}

/// Resolves an optional node, keeping it only when it has the expected kind.
fn resolve_as(node: Option<&Arc<SchemaNode>>, kind: SchemaKind) -> Option<ResolvedType<'_>> {
    node.and_then(|node| resolve_kind(node).ok()).filter(|resolved| resolved.kind == kind)
}

/// Returns the array element schema of a resolved node.
fn items_of<'r>(resolved: Option<&'r ResolvedType<'_>>) -> Option<&'r Arc<SchemaNode>> {
    resolved.and_then(|resolved| resolved.schema.items.as_ref())
}

/// Inserts `attribute` unless its target name is taken; returns whether it was inserted.
///
/// Distinct generic names can adapt to the same target name (`fooBar` and
/// `foo_bar`). The first one wins and the later one is reported.
fn insert_unique(
    attributes: &mut IndexMap<String, Attribute>,
    attribute: Attribute,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> bool {
    if let Some(existing) = attributes.get(&attribute.target_name) {
        diagnostics.error(
            DiagnosticCode::NameCollision,
            path,
            "dropping field with a colliding target name",
            format!(
                "`{}` and `{}` both map to `{}`; keeping `{}`",
                existing.name, attribute.name, attribute.target_name, existing.name
            ),
        );
        return false;
    }
    attributes.insert(attribute.target_name.clone(), attribute);
    true
}

/// Joins a parent path and a field name.
fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() { name.to_string() } else { format!("{parent}.{name}") }
}
