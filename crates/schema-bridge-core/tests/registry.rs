// crates/schema-bridge-core/tests/registry.rs
// ============================================================================
// Module: Resource Registry Tests
// Description: Once-only model builds, reloads, and lookup failures.
// Purpose: Ensure concurrent first callers share a single immutable model.
// Dependencies: schema-bridge-core
// ============================================================================

//! ## Overview
//! Concurrency is exercised with scoped threads that all request the same
//! model before any of them has been built.

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

use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use schema_bridge_core::DerivationError;
use schema_bridge_core::EngineOptions;
use schema_bridge_core::OperationRole;
use schema_bridge_core::OperationSchemas;
use schema_bridge_core::RegistryError;
use schema_bridge_core::ResourceRegistry;
use schema_bridge_core::SchemaNode;

use crate::common::create_params;
use crate::common::object;
use crate::common::read_result;
use crate::common::server_schemas;
use crate::common::update_params;

/// Number of concurrent first callers.
const CALLERS: usize = 8;

/// Verifies concurrent first callers observe the same model.
#[test]
fn concurrent_first_build_is_shared() {
    let registry = ResourceRegistry::new(EngineOptions::default());
    registry.register("server", server_schemas()).unwrap();
    let definition = registry.definition("server").unwrap();
    assert!(!definition.is_built());

    let barrier = Barrier::new(CALLERS);
    let models = thread::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.model("server").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
    });

    assert!(definition.is_built());
    let first = &models[0];
    assert!(models.iter().all(|model| Arc::ptr_eq(model, first)));
    assert_eq!(first.name(), "server");
}

/// Verifies duplicate registrations are rejected.
#[test]
fn duplicate_registration_fails() {
    let registry = ResourceRegistry::default();
    registry.register("server", server_schemas()).unwrap();
    assert_eq!(
        registry.register("server", server_schemas()).unwrap_err(),
        RegistryError::Duplicate("server".to_string())
    );
}

/// Verifies unknown names are reported.
#[test]
fn unknown_resource_fails() {
    let registry = ResourceRegistry::default();
    assert_eq!(
        registry.model("volume").unwrap_err(),
        RegistryError::NotFound("volume".to_string())
    );
}

/// Verifies build failures are cached and reported.
#[test]
fn derivation_failure_is_reported() {
    let registry = ResourceRegistry::default();
    let schemas = OperationSchemas {
        update_params: None,
        ..server_schemas()
    };
    registry.register("broken", schemas).unwrap();
    let expected = RegistryError::Derivation(DerivationError::MissingSchema(OperationRole::UpdateParams));
    assert_eq!(registry.model("broken").unwrap_err(), expected);
    assert_eq!(registry.model("broken").unwrap_err(), expected);
    assert!(registry.definition("broken").unwrap().is_built());
}

/// Verifies reload rebuilds only the reloaded definition.
#[test]
fn reload_discards_only_that_cache() {
    let registry = ResourceRegistry::default();
    registry.register("server", server_schemas()).unwrap();
    registry.register("volume", server_schemas()).unwrap();
    let server = registry.model("server").unwrap();
    let volume = registry.model("volume").unwrap();

    let trimmed = object([("name", SchemaNode::string())]);
    registry.reload("server", OperationSchemas::new(trimmed, read_result(), update_params())).unwrap();

    let rebuilt = registry.model("server").unwrap();
    assert!(!Arc::ptr_eq(&server, &rebuilt));
    assert!(rebuilt.attribute("password").is_none());
    assert!(Arc::ptr_eq(&volume, &registry.model("volume").unwrap()));
    assert_eq!(registry.names().unwrap(), vec!["server".to_string(), "volume".to_string()]);
}

/// Verifies reload also registers new names.
#[test]
fn reload_registers_missing_name() {
    let registry = ResourceRegistry::default();
    let schemas = OperationSchemas::new(create_params(), read_result(), update_params());
    registry.reload("server", schemas).unwrap();
    assert!(registry.model("server").is_ok());
}
