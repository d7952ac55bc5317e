// crates/schema-bridge-core/src/core/mod.rs
// ============================================================================
// Module: Schema Bridge Core Types
// Description: Schema nodes, attribute derivation, and the typed value model.
// Purpose: Provide the backend-agnostic model shared by the runtime.
// Dependencies: bigdecimal, convert_case, indexmap, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! Core types turn the JSON schemas of a resource's create, read and update
//! operations into one classified attribute tree, and describe the typed
//! state that tree is stored in. Nothing here performs I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod attribute;
pub mod cow;
pub mod declarative;
pub mod derive;
pub mod diagnostics;
pub mod options;
pub mod resolver;
pub mod schema;
pub mod state;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attribute::Attribute;
pub use attribute::AttributeFlags;
pub use attribute::AttributeSources;
pub use attribute::ELEMENT_KEY;
pub use attribute::SplitAttribute;
pub use cow::CowMap;
pub use cow::CowSchema;
pub use cow::CowVec;
pub use cow::EqualsFn;
pub use declarative::PlanModifier;
pub use declarative::TargetAttribute;
pub use declarative::TargetAttributeKind;
pub use declarative::TargetSchema;
pub use declarative::generate_target_schema;
pub use declarative::to_declarative_attribute;
pub use derive::AttributeDeriver;
pub use derive::DerivationError;
pub use derive::DerivedAttributes;
pub use derive::OperationRole;
pub use derive::OperationSchemas;
pub use derive::derive_attributes;
pub use diagnostics::Diagnostic;
pub use diagnostics::DiagnosticCode;
pub use diagnostics::Diagnostics;
pub use diagnostics::Severity;
pub use options::ConversionOptions;
pub use options::DEFAULT_CURRENT_PREFIX;
pub use options::DEFAULT_DESIRED_PREFIX;
pub use options::DEFAULT_IDENTIFIER_NAME;
pub use options::DEFAULT_IDENTIFIER_SUFFIX;
pub use options::DEFAULT_MAX_DEPTH;
pub use options::DerivationLimits;
pub use options::EngineOptions;
pub use options::NamingPolicy;
pub use resolver::ResolvedType;
pub use resolver::SchemaResolutionError;
pub use resolver::objects_are_subsets;
pub use resolver::resolve_kind;
pub use resolver::similar_schemas;
pub use resolver::structurally_compatible;
pub use schema::JsonType;
pub use schema::SchemaKind;
pub use schema::SchemaNode;
pub use schema::SchemaStep;
pub use state::State;
pub use state::StateError;
pub use value::AttributePath;
pub use value::PathStep;
pub use value::TypedValue;
pub use value::ValueType;
pub use value::decimal_from_number;
