// crates/schema-bridge-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Operation schemas and fake executors for a `server` resource.
// Purpose: Give integration tests one realistic resource to work against.
// Dependencies: schema-bridge-core, serde_json
// ============================================================================

//! ## Overview
//! The `server` fixture covers the interesting classification cases:
//! - `name` is required on create and updatable.
//! - `type` is a string on create but an object on read, so it splits.
//! - `zone` and `password` are create-only; `password` is never read back.
//! - `rules` is a list of objects with a required `port`.
//! - `id` and `status` are read-only.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures are not used by every test binary."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use schema_bridge_core::ExecutionResult;
use schema_bridge_core::Executor;
use schema_bridge_core::ExecutorError;
use schema_bridge_core::Linker;
use schema_bridge_core::OperationSchemas;
use schema_bridge_core::SchemaNode;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Builds an object node with no required properties.
pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, SchemaNode)>) -> SchemaNode {
    SchemaNode::object(properties, Vec::<String>::new())
}

/// Firewall rule item schema.
pub fn rule_schema() -> SchemaNode {
    SchemaNode::object(
        [("port", SchemaNode::integer()), ("protocol", SchemaNode::string())],
        ["port"],
    )
}

/// Create request parameters.
pub fn create_params() -> SchemaNode {
    SchemaNode::object(
        [
            ("name", SchemaNode::string().with_description("Server name.")),
            ("size", SchemaNode::integer().with_default(json!(2))),
            ("tags", SchemaNode::array(SchemaNode::string())),
            ("type", SchemaNode::string()),
            ("zone", SchemaNode::string()),
            ("password", SchemaNode::string()),
            ("rules", SchemaNode::array(rule_schema())),
        ],
        ["name", "type"],
    )
}

/// Update request parameters.
pub fn update_params() -> SchemaNode {
    object([
        ("name", SchemaNode::string()),
        ("size", SchemaNode::integer()),
        ("tags", SchemaNode::array(SchemaNode::string())),
        ("rules", SchemaNode::array(rule_schema())),
    ])
}

/// Read response body.
pub fn read_result() -> SchemaNode {
    SchemaNode::object(
        [
            ("id", SchemaNode::string()),
            ("name", SchemaNode::string()),
            ("size", SchemaNode::integer()),
            ("tags", SchemaNode::array(SchemaNode::string())),
            ("type", SchemaNode::object([("id", SchemaNode::string())], ["id"])),
            ("zone", SchemaNode::string()),
            ("rules", SchemaNode::array(rule_schema())),
            ("status", SchemaNode::string().with_nullable()),
        ],
        ["id"],
    )
}

/// Create response body that only echoes the identifier.
pub fn create_receipt() -> SchemaNode {
    SchemaNode::object([("id", SchemaNode::string())], ["id"])
}

/// Operation schemas of the `server` resource.
pub fn server_schemas() -> OperationSchemas {
    OperationSchemas::new(create_params(), read_result(), update_params())
}

/// A read response matching [`read_result`].
pub fn server_value() -> Value {
    json!({
        "id": "srv-1",
        "name": "web",
        "size": 4,
        "tags": ["blue"],
        "type": { "id": "small" },
        "zone": "eu-west",
        "rules": [{ "port": 22, "protocol": "tcp" }],
        "status": null
    })
}

/// Create parameters matching [`create_params`].
pub fn server_parameters() -> Map<String, Value> {
    match json!({
        "name": "web",
        "size": 4,
        "tags": ["blue"],
        "type": "small",
        "zone": "eu-west",
        "rules": [{ "port": 22, "protocol": "tcp" }]
    }) {
        Value::Object(map) => map,
        _ => unreachable!("fixture is an object"),
    }
}

// ============================================================================
// SECTION: Fake Executors
// ============================================================================

/// Executor returning a fixed value.
#[derive(Debug)]
pub struct FixedExecutor {
    /// Parameters schema.
    pub parameters: Arc<SchemaNode>,
    /// Result schema.
    pub result: Arc<SchemaNode>,
    /// Returned body.
    pub value: Value,
    /// Number of `execute` calls.
    pub calls: Mutex<usize>,
}

impl FixedExecutor {
    /// Creates an executor returning `value` under `result`.
    pub fn new(parameters: SchemaNode, result: SchemaNode, value: Value) -> Self {
        Self {
            parameters: Arc::new(parameters),
            result: Arc::new(result),
            value,
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of `execute` calls so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Executor for FixedExecutor {
    fn parameters_schema(&self) -> Arc<SchemaNode> {
        Arc::clone(&self.parameters)
    }

    fn result_schema(&self) -> Arc<SchemaNode> {
        Arc::clone(&self.result)
    }

    fn execute(
        &self,
        parameters: &Map<String, Value>,
        configs: &Map<String, Value>,
    ) -> Result<ExecutionResult, ExecutorError> {
        *self.calls.lock().unwrap() += 1;
        Ok(ExecutionResult {
            parameters: parameters.clone(),
            configs: configs.clone(),
            value: self.value.clone(),
            schema: Arc::clone(&self.result),
        })
    }
}

/// Executor that exposes a `read` link and returns a receipt.
pub struct LinkedExecutor {
    /// Inner executor producing the receipt.
    pub inner: FixedExecutor,
    /// Links by relation.
    pub links: BTreeMap<String, Arc<dyn Linker>>,
}

impl Executor for LinkedExecutor {
    fn parameters_schema(&self) -> Arc<SchemaNode> {
        self.inner.parameters_schema()
    }

    fn result_schema(&self) -> Arc<SchemaNode> {
        self.inner.result_schema()
    }

    fn execute(
        &self,
        parameters: &Map<String, Value>,
        configs: &Map<String, Value>,
    ) -> Result<ExecutionResult, ExecutorError> {
        self.inner.execute(parameters, configs)
    }

    fn links(&self) -> BTreeMap<String, Arc<dyn Linker>> {
        self.links.clone()
    }
}

/// Linker producing a read executor that returns a fixed value.
#[derive(Debug)]
pub struct ReadLinker {
    /// Extra parameters the link needs.
    pub additional: Arc<SchemaNode>,
    /// Value the linked read returns.
    pub value: Value,
}

impl Linker for ReadLinker {
    fn additional_parameters_schema(&self) -> Arc<SchemaNode> {
        Arc::clone(&self.additional)
    }

    fn result_schema(&self) -> Arc<SchemaNode> {
        Arc::new(read_result())
    }

    fn create_executor(&self, previous: &ExecutionResult) -> Result<Box<dyn Executor>, ExecutorError> {
        if previous.value.get("id").is_none() {
            return Err(ExecutorError::Link("previous result has no id".to_string()));
        }
        Ok(Box::new(FixedExecutor::new(object::<String>([]), read_result(), self.value.clone())))
    }
}
