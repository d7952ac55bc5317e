// crates/schema-bridge-core/src/interfaces/mod.rs
// ============================================================================
// Module: Schema Bridge Interfaces
// Description: Executor and linker contracts consumed by the runtime.
// Purpose: Keep HTTP and document loading outside the engine.
// Dependencies: serde_json, thiserror, crate::core
// ============================================================================

//! ## Overview
//! An [`Executor`] performs one remote operation and reports both the
//! parameters it sent and the value it received. A [`Linker`] builds a
//! follow-up executor from a previous result, for example the `read`
//! operation of a resource that was just created. The engine never performs
//! I/O itself; it only consumes these values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::derive::OperationSchemas;
use crate::core::schema::SchemaNode;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Outcome of a single remote operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Parameters as sent.
    pub parameters: Map<String, Value>,
    /// Connection configs as sent.
    pub configs: Map<String, Value>,
    /// Response body.
    pub value: Value,
    /// Schema of the response body.
    pub schema: Arc<SchemaNode>,
}

/// Executor errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The remote operation failed.
    #[error("executor error: {0}")]
    Failed(String),
    /// A linked executor could not be built.
    #[error("link error: {0}")]
    Link(String),
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Performs one remote operation of a resource type.
pub trait Executor: Send + Sync {
    /// Returns the request parameters schema.
    fn parameters_schema(&self) -> Arc<SchemaNode>;

    /// Returns the response body schema.
    fn result_schema(&self) -> Arc<SchemaNode>;

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the remote call fails.
    fn execute(
        &self,
        parameters: &Map<String, Value>,
        configs: &Map<String, Value>,
    ) -> Result<ExecutionResult, ExecutorError>;

    /// Returns follow-up operations keyed by relation name (`read`, `delete`).
    fn links(&self) -> BTreeMap<String, Arc<dyn Linker>> {
        BTreeMap::new()
    }
}

// ============================================================================
// SECTION: Linker
// ============================================================================

/// Builds a follow-up executor from a previous result.
pub trait Linker: Send + Sync {
    /// Returns the schema of parameters the link needs beyond the previous result.
    fn additional_parameters_schema(&self) -> Arc<SchemaNode>;

    /// Returns the response body schema of the linked operation.
    fn result_schema(&self) -> Arc<SchemaNode>;

    /// Creates the linked executor.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the previous result lacks the values the
    /// link needs.
    fn create_executor(&self, previous: &ExecutionResult) -> Result<Box<dyn Executor>, ExecutorError>;
}

// ============================================================================
// SECTION: Schema Extraction
// ============================================================================

impl OperationSchemas {
    /// Collects operation schemas from the create, read and update executors.
    ///
    /// The create result schema is kept only when it differs from the read
    /// result schema.
    #[must_use]
    pub fn from_executors(create: &dyn Executor, read: &dyn Executor, update: &dyn Executor) -> Self {
        let read_result = read.result_schema();
        let create_result = create.result_schema();
        let create_result = (create_result != read_result).then_some(create_result);
        Self {
            create_params: Some(create.parameters_schema()),
            create_result,
            read_result: Some(read_result),
            update_params: Some(update.parameters_schema()),
        }
    }
}
