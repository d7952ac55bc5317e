// crates/schema-bridge-core/src/core/schema.rs
// ============================================================================
// Module: Schema Nodes
// Description: Recursive JSON-Schema-like type descriptors for operation schemas.
// Purpose: Provide the shared, immutable schema tree consumed by derivation.
// Dependencies: indexmap, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`SchemaNode`] describes one value in an operation's parameter or result
//! payload. Nodes use JSON Schema keyword names on the wire so they can be
//! loaded directly from documents produced by the OpenAPI loader.
//!
//! Child nodes are held behind [`Arc`] so that many derived views can share
//! one loaded tree. Mutation goes through [`crate::core::cow::CowSchema`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Kinds
// ============================================================================

/// Raw JSON Schema `type` keyword values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// UTF-8 string.
    String,
    /// Floating-point number.
    Number,
    /// Whole number.
    Integer,
    /// Boolean flag.
    Boolean,
    /// Ordered list.
    Array,
    /// Keyed record.
    Object,
    /// Explicit null, only meaningful as an `anyOf` entry.
    Null,
}

impl JsonType {
    /// Returns the logical kind, or `None` for `null`.
    #[must_use]
    pub const fn kind(self) -> Option<SchemaKind> {
        match self {
            Self::String => Some(SchemaKind::String),
            Self::Number => Some(SchemaKind::Number),
            Self::Integer => Some(SchemaKind::Integer),
            Self::Boolean => Some(SchemaKind::Boolean),
            Self::Array => Some(SchemaKind::Array),
            Self::Object => Some(SchemaKind::Object),
            Self::Null => None,
        }
    }
}

/// Logical kind of a resolved schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// UTF-8 string.
    String,
    /// Floating-point number.
    Number,
    /// Whole number representable as i64.
    Integer,
    /// Boolean flag.
    Boolean,
    /// Ordered list with a single element schema.
    Array,
    /// Keyed record with declared properties.
    Object,
}

impl SchemaKind {
    /// Returns the JSON Schema keyword for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Schema Node
// ============================================================================

/// Recursive type descriptor for one value of an operation payload.
///
/// # Invariants
/// - When `kind` is `None`, the node is resolved through `enum` or `any_of`.
/// - `properties` and `required` are only meaningful for objects.
/// - `items` is only meaningful for arrays.
/// - `properties` preserves document insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Declared type keyword, when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<JsonType>,
    /// Whether null is accepted in addition to the declared type.
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    /// String format hint (for example `date-time`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enumerated literal values.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Alternative schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Arc<Self>>,
    /// Object properties in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Arc<Self>>,
    /// Names of required object properties.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required: BTreeSet<String>,
    /// Array element schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Arc<Self>>,
    /// Default value applied by the remote system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Serde helper for skipping false flags.
#[allow(clippy::trivially_copy_pass_by_ref, reason = "Signature is fixed by serde.")]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// Single step into a nested schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaStep {
    /// Named object property.
    Property(String),
    /// Array element schema.
    Items,
}

impl SchemaNode {
    /// Creates a node with the given primitive or container type.
    #[must_use]
    pub fn of_type(kind: JsonType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Creates a string node.
    #[must_use]
    pub fn string() -> Self {
        Self::of_type(JsonType::String)
    }

    /// Creates a number node.
    #[must_use]
    pub fn number() -> Self {
        Self::of_type(JsonType::Number)
    }

    /// Creates an integer node.
    #[must_use]
    pub fn integer() -> Self {
        Self::of_type(JsonType::Integer)
    }

    /// Creates a boolean node.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of_type(JsonType::Boolean)
    }

    /// Creates a null node.
    #[must_use]
    pub fn null() -> Self {
        Self::of_type(JsonType::Null)
    }

    /// Creates an array node with the given element schema.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            kind: Some(JsonType::Array),
            items: Some(Arc::new(items)),
            ..Self::default()
        }
    }

    /// Creates an object node from properties and required names.
    #[must_use]
    pub fn object<P, K, R, N>(properties: P, required: R) -> Self
    where
        P: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
        R: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            kind: Some(JsonType::Object),
            properties: properties
                .into_iter()
                .map(|(name, node)| (name.into(), Arc::new(node)))
                .collect(),
            required: required.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Creates an untyped node resolved through its `enum` literals.
    #[must_use]
    pub fn enumeration<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self {
            enum_values: values.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Creates an untyped node resolved through `anyOf` alternatives.
    #[must_use]
    pub fn any_of<I: IntoIterator<Item = Self>>(variants: I) -> Self {
        Self {
            any_of: variants.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }

    /// Marks the node as nullable.
    #[must_use]
    pub fn with_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the string format hint.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns a property schema by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Self> {
        self.properties.get(name).map(AsRef::as_ref)
    }

    /// Returns the shared handle of a property schema by name.
    #[must_use]
    pub fn property_arc(&self, name: &str) -> Option<&Arc<Self>> {
        self.properties.get(name)
    }

    /// Returns true when the property is listed as required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Returns the array element schema.
    #[must_use]
    pub fn items(&self) -> Option<&Self> {
        self.items.as_deref()
    }

    /// Returns true when null is an accepted value.
    ///
    /// A node is nullable when flagged explicitly, when an `anyOf` entry is
    /// the null type, or when `null` is one of the enumerated literals.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
            || self.kind == Some(JsonType::Null)
            || self.any_of.iter().any(|variant| variant.is_nullable())
            || self.enum_values.iter().any(Value::is_null)
    }

    /// Returns the direct child for one step.
    #[must_use]
    pub fn child(&self, step: &SchemaStep) -> Option<&Self> {
        match step {
            SchemaStep::Property(name) => self.property(name),
            SchemaStep::Items => self.items(),
        }
    }

    /// Walks a path of steps from this node.
    #[must_use]
    pub fn lookup(&self, path: &[SchemaStep]) -> Option<&Self> {
        path.iter().try_fold(self, |node, step| node.child(step))
    }

    /// Renders the node as a JSON Schema (draft 2020-12) document.
    ///
    /// Nullable nodes render their type as a `[type, "null"]` array.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        if let Some(kind) = self.kind {
            let name = Value::String(json_type_name(kind).to_string());
            if self.nullable && kind != JsonType::Null {
                out.insert("type".to_string(), Value::Array(vec![name, Value::from("null")]));
            } else {
                out.insert("type".to_string(), name);
            }
        }
        if let Some(format) = &self.format {
            out.insert("format".to_string(), Value::String(format.clone()));
        }
        if !self.enum_values.is_empty() {
            let mut literals = self.enum_values.clone();
            if self.nullable && !literals.iter().any(Value::is_null) {
                literals.push(Value::Null);
            }
            out.insert("enum".to_string(), Value::Array(literals));
        }
        if !self.any_of.is_empty() {
            let mut variants: Vec<Value> =
                self.any_of.iter().map(|variant| variant.to_json_schema()).collect();
            if self.nullable {
                variants.push(serde_json::json!({ "type": "null" }));
            }
            out.insert("anyOf".to_string(), Value::Array(variants));
        }
        if !self.properties.is_empty() {
            let properties = self
                .properties
                .iter()
                .map(|(name, node)| (name.clone(), node.to_json_schema()))
                .collect::<Map<String, Value>>();
            out.insert("properties".to_string(), Value::Object(properties));
        }
        if !self.required.is_empty() {
            let required = self.required.iter().cloned().map(Value::String).collect();
            out.insert("required".to_string(), Value::Array(required));
        }
        if let Some(items) = &self.items {
            out.insert("items".to_string(), items.to_json_schema());
        }
        Value::Object(out)
    }
}

/// Returns the JSON Schema keyword for a raw type.
const fn json_type_name(kind: JsonType) -> &'static str {
    match kind.kind() {
        Some(kind) => kind.as_str(),
        None => "null",
    }
}
