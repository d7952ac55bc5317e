// crates/schema-bridge-core/tests/apply.rs
// ============================================================================
// Module: Operation Application Tests
// Description: Parameter reads, read-link follow-up, and mismatch warnings.
// Purpose: Exercise the runtime against fake executors.
// Dependencies: schema-bridge-core, serde_json
// ============================================================================

//! ## Overview
//! Drives a create of the `server` fixture: parameters are read out of state
//! and validated, a fake executor returns either a read-shaped value or a
//! receipt that requires following the `read` link, and the outcome is
//! written back into state.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use schema_bridge_core::ApplyError;
use schema_bridge_core::AttributePath;
use schema_bridge_core::ConversionError;
use schema_bridge_core::ConversionOptions;
use schema_bridge_core::DiagnosticCode;
use schema_bridge_core::Diagnostics;
use schema_bridge_core::EngineOptions;
use schema_bridge_core::Executor;
use schema_bridge_core::Linker;
use schema_bridge_core::OperationSchemas;
use schema_bridge_core::ResourceModel;
use schema_bridge_core::SchemaNode;
use schema_bridge_core::State;
use schema_bridge_core::StateConverter;
use schema_bridge_core::TypedValue;
use schema_bridge_core::apply_state_after;
use schema_bridge_core::read_operation_parameters;
use serde_json::Map;
use serde_json::json;

use crate::common::FixedExecutor;
use crate::common::LinkedExecutor;
use crate::common::ReadLinker;
use crate::common::create_params;
use crate::common::create_receipt;
use crate::common::object;
use crate::common::read_result;
use crate::common::server_parameters;
use crate::common::server_schemas;
use crate::common::server_value;
use crate::common::update_params;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the fixture model.
fn server_model() -> ResourceModel {
    ResourceModel::build("server", &server_schemas(), &EngineOptions::default()).unwrap()
}

/// Builds a state holding the planned create parameters.
fn planned_state(model: &ResourceModel) -> State {
    let mut state = model.planned_state();
    StateConverter::new(ConversionOptions::strict())
        .apply_fields(&server_parameters(), model.input_attributes(), &mut state, &AttributePath::root())
        .unwrap();
    state
}

/// Builds an executor whose create result needs the `read` link.
fn linked_create(additional: SchemaNode) -> LinkedExecutor {
    let linker: Arc<dyn Linker> = Arc::new(ReadLinker {
        additional: Arc::new(additional),
        value: server_value(),
    });
    LinkedExecutor {
        inner: FixedExecutor::new(create_params(), create_receipt(), json!({ "id": "srv-1" })),
        links: BTreeMap::from([("read".to_string(), linker)]),
    }
}

// ============================================================================
// SECTION: Parameter Reads
// ============================================================================

/// Verifies create parameters come from state and satisfy the schema.
#[test]
fn create_parameters_are_read_from_state() {
    let model = server_model();
    let state = planned_state(&model);
    let parameters = read_operation_parameters(&model, &state, &create_params()).unwrap();
    assert_eq!(parameters, server_parameters());
}

/// Verifies parameters are restricted to the operation's properties.
#[test]
fn update_parameters_exclude_create_only_fields() {
    let model = server_model();
    let state = planned_state(&model);
    let parameters = read_operation_parameters(&model, &state, &update_params()).unwrap();
    assert_eq!(parameters.len(), 4);
    assert!(!parameters.contains_key("zone"));
    assert!(!parameters.contains_key("type"));
}

/// Verifies parameters that do not satisfy the operation schema are rejected.
#[test]
fn unsatisfied_operation_schema_fails_validation() {
    let model = server_model();
    let state = planned_state(&model);
    let operation = SchemaNode::object(
        [("name", SchemaNode::string()), ("region", SchemaNode::string())],
        ["name", "region"],
    );
    let err = read_operation_parameters(&model, &state, &operation).unwrap_err();
    assert!(matches!(err, ConversionError::SchemaValidation(_)));
}

/// Verifies an unset required parameter is rejected before validation.
#[test]
fn unset_required_parameter_is_rejected() {
    let model = server_model();
    let mut state = model.planned_state();
    state.set_attribute(&AttributePath::name("name"), TypedValue::string("web")).unwrap();
    let err = read_operation_parameters(&model, &state, &create_params()).unwrap_err();
    assert_eq!(err, ConversionError::UnexpectedNull("desired_type".to_string()));
}

/// Verifies the model's read flags drive parameter reads.
#[test]
fn configured_read_flags_reject_unknowns() {
    let options = EngineOptions {
        read_conversion: ConversionOptions::strict(),
        ..EngineOptions::default()
    };
    let model = ResourceModel::build("server", &server_schemas(), &options).unwrap();
    assert_eq!(model.read_conversion(), ConversionOptions::strict());
    let state = planned_state(&model);
    let err = read_operation_parameters(&model, &state, &create_params()).unwrap_err();
    assert_eq!(err, ConversionError::UnknownValue("current_type".to_string()));
}

/// Verifies configured values win over observed ones.
#[test]
fn input_values_override_output_values() {
    let model = server_model();
    let mut state = planned_state(&model);
    let current = AttributePath::name("current_type").at_name("id");
    state.set_attribute(&current, TypedValue::string("large")).unwrap();
    let parameters = read_operation_parameters(&model, &state, &create_params()).unwrap();
    assert_eq!(parameters["type"], json!("small"));
}

// ============================================================================
// SECTION: State Application
// ============================================================================

/// Verifies a read-shaped create result is applied directly.
#[test]
fn read_shaped_result_is_applied_directly() {
    let model = server_model();
    let mut state = planned_state(&model);
    let executor = FixedExecutor::new(create_params(), read_result(), server_value());
    let result = executor.execute(&server_parameters(), &Map::new()).unwrap();
    let mut diagnostics = Diagnostics::new();

    apply_state_after(&model, &result, &executor, &mut state, &mut diagnostics).unwrap();

    assert_eq!(state.get_attribute(&AttributePath::name("id")).unwrap(), TypedValue::string("srv-1"));
    assert_eq!(
        state.get_attribute(&AttributePath::name("desired_type")).unwrap(),
        TypedValue::string("small")
    );
    assert_eq!(
        state.get_attribute(&AttributePath::name("current_type").at_name("id")).unwrap(),
        TypedValue::string("small")
    );
    assert_eq!(executor.calls(), 1);
}

/// Verifies split halves that differ produce a mismatch warning.
#[test]
fn split_mismatch_is_reported() {
    let model = server_model();
    let mut state = planned_state(&model);
    let executor = FixedExecutor::new(create_params(), read_result(), server_value());
    let result = executor.execute(&server_parameters(), &Map::new()).unwrap();
    let mut diagnostics = Diagnostics::new();

    apply_state_after(&model, &result, &executor, &mut state, &mut diagnostics).unwrap();

    let mismatches: Vec<_> = diagnostics.with_code(DiagnosticCode::CurrentDesiredMismatch).collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].path, "desired_type");
    assert!(!diagnostics.has_errors());
}

/// Verifies a receipt-shaped result follows the read link.
#[test]
fn receipt_follows_read_link() {
    let model = server_model();
    let mut state = planned_state(&model);
    let executor = linked_create(object::<String>([]));
    let result = executor.execute(&server_parameters(), &Map::new()).unwrap();
    let mut diagnostics = Diagnostics::new();

    apply_state_after(&model, &result, &executor, &mut state, &mut diagnostics).unwrap();

    assert_eq!(
        state.get_attribute(&AttributePath::name("zone")).unwrap(),
        TypedValue::string("eu-west")
    );
    assert_eq!(state.get_attribute(&AttributePath::name("id")).unwrap(), TypedValue::string("srv-1"));
}

/// Verifies a missing read link is an error.
#[test]
fn missing_read_link_fails() {
    let model = server_model();
    let mut state = planned_state(&model);
    let executor = FixedExecutor::new(create_params(), create_receipt(), json!({ "id": "srv-1" }));
    let result = executor.execute(&server_parameters(), &Map::new()).unwrap();
    let err = apply_state_after(&model, &result, &executor, &mut state, &mut Diagnostics::new())
        .unwrap_err();
    assert_eq!(err, ApplyError::ReadLinkUnavailable("server".to_string()));
}

/// Verifies a read link needing extra parameters is rejected.
#[test]
fn read_link_with_required_parameters_fails() {
    let model = server_model();
    let mut state = planned_state(&model);
    let additional = SchemaNode::object([("region", SchemaNode::string())], ["region"]);
    let executor = linked_create(additional);
    let result = executor.execute(&server_parameters(), &Map::new()).unwrap();
    let err = apply_state_after(&model, &result, &executor, &mut state, &mut Diagnostics::new())
        .unwrap_err();
    assert!(matches!(err, ApplyError::ReadLinkRequiresParameters { .. }));
}

/// Verifies a non-object result is rejected.
#[test]
fn non_object_result_fails() {
    let model = server_model();
    let mut state = planned_state(&model);
    let executor = FixedExecutor::new(create_params(), read_result(), json!([1, 2]));
    let result = executor.execute(&server_parameters(), &Map::new()).unwrap();
    let err = apply_state_after(&model, &result, &executor, &mut state, &mut Diagnostics::new())
        .unwrap_err();
    assert_eq!(err, ApplyError::OutputNotObject("server".to_string()));
}

/// Verifies operation schemas can be collected from executors.
#[test]
fn schemas_from_executors() {
    let create = FixedExecutor::new(create_params(), create_receipt(), json!({}));
    let read = FixedExecutor::new(object::<String>([]), read_result(), json!({}));
    let update = FixedExecutor::new(update_params(), read_result(), json!({}));
    let schemas = OperationSchemas::from_executors(&create, &read, &update);
    assert_eq!(schemas.create_result.as_deref(), Some(&create_receipt()));
    assert_eq!(schemas.read_result.as_deref(), Some(&read_result()));

    let same = FixedExecutor::new(create_params(), read_result(), json!({}));
    let schemas = OperationSchemas::from_executors(&same, &read, &update);
    assert!(schemas.create_result.is_none());
}
