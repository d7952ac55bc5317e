// crates/schema-bridge-core/src/runtime/apply.rs
// ============================================================================
// Module: Operation Application
// Description: Parameter reads before an operation, state writes after it.
// Purpose: Connect typed state to executor requests and responses.
// Dependencies: jsonschema, serde_json, thiserror, tracing, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Before an operation the caller reads a validated parameter map out of
//! state with [`read_operation_parameters`]. After the operation
//! [`apply_state_after`] writes the sent parameters and the observed result
//! back into state, then compares every split pair.
//!
//! ## Invariants
//! - Parameters are validated against the operation schema before use.
//! - Output attributes are applied after input attributes, so observed values win.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::core::diagnostics::DiagnosticCode;
use crate::core::diagnostics::Diagnostics;
use crate::core::options::ConversionOptions;
use crate::core::resolver::similar_schemas;
use crate::core::schema::SchemaNode;
use crate::core::state::State;
use crate::core::value::AttributePath;
use crate::interfaces::ExecutionResult;
use crate::interfaces::Executor;
use crate::interfaces::ExecutorError;
use crate::runtime::convert::ConversionError;
use crate::runtime::convert::StateConverter;
use crate::runtime::model::ResourceModel;

/// Link relation used to fetch the read-shaped result.
pub const READ_LINK: &str = "read";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while applying an operation result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Writing a value into state failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// The read follow-up failed.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    /// The observed result is not an object.
    #[error("operation result for `{0}` is not an object")]
    OutputNotObject(String),
    /// The result is not read-shaped and no read link exists.
    #[error("operation result for `{0}` is not read-shaped and no read link is available")]
    ReadLinkUnavailable(String),
    /// The read link needs parameters beyond the previous result.
    #[error("read link for `{resource}` requires additional parameters: {parameters}")]
    ReadLinkRequiresParameters {
        /// Resource type name.
        resource: String,
        /// Required parameter names.
        parameters: String,
    },
}

// ============================================================================
// SECTION: Parameter Reads
// ============================================================================

/// Reads the parameter map for one operation out of `state`.
///
/// Output attributes are read first and input attributes second, so a value
/// the caller configured overrides an observed one. Only properties declared
/// by `operation_schema` are included. Unknown and unset values are handled
/// per the model's read conversion flags.
///
/// # Errors
///
/// Returns [`ConversionError`] when a value cannot be converted or the map
/// does not satisfy `operation_schema`.
pub fn read_operation_parameters(
    model: &ResourceModel,
    state: &State,
    operation_schema: &SchemaNode,
) -> Result<Map<String, Value>, ConversionError> {
    let converter = StateConverter::new(model.read_conversion());
    let declared = |name: &str| operation_schema.property(name).is_some();
    let mut parameters = converter
        .read_map(model.output_attributes().filter(|attribute| declared(&attribute.name)), state)?;
    let inputs = converter
        .read_map(model.input_attributes().filter(|attribute| declared(&attribute.name)), state)?;
    parameters.extend(inputs);

    let validator = compile_schema(&operation_schema.to_json_schema())?;
    let instance = Value::Object(parameters);
    let messages: Vec<String> = validator.iter_errors(&instance).map(|err| err.to_string()).collect();
    if !messages.is_empty() {
        return Err(ConversionError::SchemaValidation(messages.join("; ")));
    }
    let Value::Object(parameters) = instance else {
        return Ok(Map::new());
    };
    debug!(resource = model.name(), parameters = parameters.len(), "read operation parameters");
    Ok(parameters)
}

/// Compiles a JSON schema for validation.
fn compile_schema(schema: &Value) -> Result<Validator, ConversionError> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| ConversionError::SchemaValidation(format!("invalid schema: {err}")))
}

// ============================================================================
// SECTION: State Application
// ============================================================================

/// Writes the outcome of a create or update into `state`.
///
/// When the result schema is not read-shaped, the executor's `read` link is
/// followed to obtain a read-shaped value. Split pairs whose desired and
/// current values differ are reported as warnings in `diagnostics`.
///
/// # Errors
///
/// Returns [`ApplyError`] when the read follow-up fails or a value cannot be
/// written into state.
pub fn apply_state_after(
    model: &ResourceModel,
    result: &ExecutionResult,
    executor: &dyn Executor,
    state: &mut State,
    diagnostics: &mut Diagnostics,
) -> Result<(), ApplyError> {
    let observed = read_shaped_value(model, result, executor)?;
    let Value::Object(observed) = observed else {
        return Err(ApplyError::OutputNotObject(model.name().to_string()));
    };

    let converter = StateConverter::new(ConversionOptions::strict());
    let root = AttributePath::root();
    converter.apply_fields(&result.parameters, model.input_attributes(), state, &root)?;
    converter.apply_fields(&observed, model.output_attributes(), state, &root)?;
    verify_current_desired_mismatch(model, &result.parameters, &observed, diagnostics);
    Ok(())
}

/// Returns the result value, following the read link when needed.
fn read_shaped_value(
    model: &ResourceModel,
    result: &ExecutionResult,
    executor: &dyn Executor,
) -> Result<Value, ApplyError> {
    if similar_schemas(&result.schema, model.read_result_schema()) {
        return Ok(result.value.clone());
    }
    let links = executor.links();
    let link =
        links.get(READ_LINK).ok_or_else(|| ApplyError::ReadLinkUnavailable(model.name().to_string()))?;
    let additional = link.additional_parameters_schema();
    if !additional.required.is_empty() {
        return Err(ApplyError::ReadLinkRequiresParameters {
            resource: model.name().to_string(),
            parameters: additional.required.iter().cloned().collect::<Vec<_>>().join(", "),
        });
    }
    debug!(resource = model.name(), "following read link for operation result");
    let read = link.create_executor(result)?;
    let outcome = read.execute(&Map::new(), &Map::new())?;
    Ok(outcome.value)
}

/// Records a warning for every split pair whose halves disagree.
pub fn verify_current_desired_mismatch(
    model: &ResourceModel,
    parameters: &Map<String, Value>,
    observed: &Map<String, Value>,
    diagnostics: &mut Diagnostics,
) {
    for split in model.splits() {
        let desired = parameters.get(&split.desired.name).unwrap_or(&Value::Null);
        let current = observed.get(&split.current.name).unwrap_or(&Value::Null);
        if desired != current {
            diagnostics.warning(
                DiagnosticCode::CurrentDesiredMismatch,
                split.desired.target_name.clone(),
                format!(
                    "`{}` and `{}` differ after the operation",
                    split.desired.target_name, split.current.target_name
                ),
                "the remote system reports this field in a different shape than it accepts; \
                 convergence cannot be verified",
            );
        }
    }
}
