// crates/schema-bridge-core/src/runtime/mod.rs
// ============================================================================
// Module: Schema Bridge Runtime
// Description: Value conversion, resource models, and operation application.
// Purpose: Drive typed state through executor requests and responses.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules consume the derived attribute model: they convert typed
//! state into request parameters, write operation results back into state,
//! and cache one model per resource type.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod apply;
pub mod convert;
pub mod model;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use apply::ApplyError;
pub use apply::apply_state_after;
pub use apply::read_operation_parameters;
pub use apply::verify_current_desired_mismatch;
pub use convert::Conversion;
pub use convert::ConversionError;
pub use convert::StateConverter;
pub use model::ResourceModel;
pub use registry::RegistryError;
pub use registry::ResourceDefinition;
pub use registry::ResourceRegistry;
