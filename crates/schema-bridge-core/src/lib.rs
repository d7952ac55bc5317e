// crates/schema-bridge-core/src/lib.rs
// ============================================================================
// Module: Schema Bridge Core Library
// Description: Public API surface for the schema reconciliation engine.
// Purpose: Expose core types, executor interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Schema bridge reconciles the create, read and update schemas of a remote
//! resource into a single declarative attribute model, and converts values
//! between that model's typed state and the generic JSON values exchanged
//! with the remote API. It performs no I/O; executors supply the remote side.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ExecutionResult;
pub use interfaces::Executor;
pub use interfaces::ExecutorError;
pub use interfaces::Linker;
pub use runtime::ApplyError;
pub use runtime::Conversion;
pub use runtime::ConversionError;
pub use runtime::RegistryError;
pub use runtime::ResourceDefinition;
pub use runtime::ResourceModel;
pub use runtime::ResourceRegistry;
pub use runtime::StateConverter;
pub use runtime::apply_state_after;
pub use runtime::read_operation_parameters;
pub use runtime::verify_current_desired_mismatch;
