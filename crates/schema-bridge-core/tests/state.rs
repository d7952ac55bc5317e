// crates/schema-bridge-core/tests/state.rs
// ============================================================================
// Module: Typed State Tests
// Description: Typed null reads, type-checked writes, and container creation.
// Purpose: Ensure state never holds a value of the wrong declared type.
// Dependencies: schema-bridge-core
// ============================================================================

//! ## Overview
//! Exercises [`State`] against the target schema of the `server` fixture.

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

use schema_bridge_core::AttributePath;
use schema_bridge_core::EngineOptions;
use schema_bridge_core::ResourceModel;
use schema_bridge_core::State;
use schema_bridge_core::StateError;
use schema_bridge_core::TypedValue;
use schema_bridge_core::ValueType;

use crate::common::server_schemas;

/// Creates an empty state for the fixture resource.
fn empty_state() -> State {
    ResourceModel::build("server", &server_schemas(), &EngineOptions::default()).unwrap().new_state()
}

/// Verifies unwritten attributes read as typed nulls.
#[test]
fn unwritten_attribute_reads_typed_null() {
    let state = empty_state();
    assert_eq!(
        state.get_attribute(&AttributePath::name("name")).unwrap(),
        TypedValue::Null(ValueType::String)
    );
    assert_eq!(
        state.get_attribute(&AttributePath::name("tags")).unwrap(),
        TypedValue::Null(ValueType::List(Box::new(ValueType::String)))
    );
}

/// Verifies writes of the wrong type are rejected.
#[test]
fn mismatched_write_is_rejected() {
    let mut state = empty_state();
    let err = state.set_attribute(&AttributePath::name("size"), TypedValue::string("big")).unwrap_err();
    assert!(matches!(err, StateError::TypeMismatch { .. }));

    let err = state
        .set_attribute(&AttributePath::name("size"), TypedValue::Null(ValueType::String))
        .unwrap_err();
    assert!(matches!(err, StateError::TypeMismatch { .. }));
    assert!(state.values().is_empty());
}

/// Verifies undeclared paths are rejected.
#[test]
fn undeclared_path_is_rejected() {
    let mut state = empty_state();
    let path = AttributePath::name("missing");
    assert_eq!(
        state.set_attribute(&path, TypedValue::string("x")).unwrap_err(),
        StateError::UnknownPath("missing".to_string())
    );
    assert!(matches!(state.get_attribute(&AttributePath::root()), Err(StateError::UnknownPath(_))));
}

/// Verifies nested writes create intermediate lists and objects.
#[test]
fn nested_write_creates_containers() {
    let mut state = empty_state();
    let port = AttributePath::name("rules").at_index(1).at_name("port");
    state.set_attribute(&port, TypedValue::integer(443)).unwrap();

    assert_eq!(state.get_attribute(&port).unwrap(), TypedValue::integer(443));
    let first = state.get_attribute(&AttributePath::name("rules").at_index(0)).unwrap();
    assert!(first.is_null());
    let TypedValue::List(items) = state.get_attribute(&AttributePath::name("rules")).unwrap() else {
        panic!("rules should be a list");
    };
    assert_eq!(items.len(), 2);
}

/// Verifies reads beneath an unknown container are unknown.
#[test]
fn unknown_container_propagates_to_children() {
    let mut state = empty_state();
    let current = AttributePath::name("current_type");
    let object_type = state.schema().type_at(&current).unwrap();
    state.set_attribute(&current, TypedValue::Unknown(object_type)).unwrap();
    assert_eq!(
        state.get_attribute(&current.at_name("id")).unwrap(),
        TypedValue::Unknown(ValueType::String)
    );
}

/// Verifies a known object write replaces the whole value.
#[test]
fn object_write_replaces_value() {
    let mut state = empty_state();
    let current = AttributePath::name("current_type");
    let fields = BTreeMap::from([("id".to_string(), TypedValue::string("small"))]);
    state.set_attribute(&current, TypedValue::Object(fields)).unwrap();
    assert_eq!(state.get_attribute(&current.at_name("id")).unwrap(), TypedValue::string("small"));
}
