// crates/schema-bridge-core/src/runtime/registry.rs
// ============================================================================
// Module: Resource Registry
// Description: Per-resource-type model cache built once on first use.
// Purpose: Share immutable resource models across concurrent callers.
// Dependencies: thiserror, tracing, crate::{core, runtime::model}
// ============================================================================

//! ## Overview
//! Each registered resource type owns a once-only cell. The first caller of
//! [`ResourceRegistry::model`] derives the model; concurrent first callers
//! block until that build completes and then share the same [`Arc`]. A
//! failed build is cached as well, so every caller sees the same outcome.
//!
//! ## Invariants
//! - A definition's model is built at most once per registration.
//! - Reloading a definition discards only that definition's cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::core::derive::DerivationError;
use crate::core::derive::OperationSchemas;
use crate::core::options::EngineOptions;
use crate::runtime::model::ResourceModel;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A definition with the same name is already registered.
    #[error("resource `{0}` is already registered")]
    Duplicate(String),
    /// No definition is registered under the name.
    #[error("resource `{0}` is not registered")]
    NotFound(String),
    /// The registry lock was poisoned.
    #[error("resource registry lock poisoned")]
    Poisoned,
    /// Building the model failed.
    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Operation schemas of one resource type plus its lazily built model.
#[derive(Debug)]
pub struct ResourceDefinition {
    /// Resource type name.
    name: String,
    /// Operation schemas.
    schemas: OperationSchemas,
    /// Build outcome, set once.
    model: OnceLock<Result<Arc<ResourceModel>, DerivationError>>,
}

impl ResourceDefinition {
    /// Creates a definition with an empty cache.
    #[must_use]
    pub fn new(name: impl Into<String>, schemas: OperationSchemas) -> Self {
        Self {
            name: name.into(),
            schemas,
            model: OnceLock::new(),
        }
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operation schemas.
    #[must_use]
    pub const fn schemas(&self) -> &OperationSchemas {
        &self.schemas
    }

    /// Returns true once the model has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.model.get().is_some()
    }

    /// Returns the model, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError`] when the build failed.
    pub fn model(&self, options: &EngineOptions) -> Result<Arc<ResourceModel>, DerivationError> {
        self.model
            .get_or_init(|| {
                debug!(resource = %self.name, "building resource model");
                ResourceModel::build(self.name.clone(), &self.schemas, options).map(Arc::new)
            })
            .clone()
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Thread-safe registry of resource definitions.
///
/// # Invariants
/// - All models are built with the registry's options.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    /// Options used for every build.
    options: EngineOptions,
    /// Definitions keyed by resource name.
    definitions: RwLock<BTreeMap<String, Arc<ResourceDefinition>>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            definitions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the engine options.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Registers a new resource type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is taken.
    pub fn register(&self, name: impl Into<String>, schemas: OperationSchemas) -> Result<(), RegistryError> {
        let name = name.into();
        let mut definitions = self.definitions.write().map_err(|_| RegistryError::Poisoned)?;
        if definitions.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        definitions.insert(name.clone(), Arc::new(ResourceDefinition::new(name.clone(), schemas)));
        info!(resource = %name, "registered resource");
        Ok(())
    }

    /// Replaces a resource type's schemas and discards its cached model.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn reload(&self, name: impl Into<String>, schemas: OperationSchemas) -> Result<(), RegistryError> {
        let name = name.into();
        let mut definitions = self.definitions.write().map_err(|_| RegistryError::Poisoned)?;
        let replaced = definitions
            .insert(name.clone(), Arc::new(ResourceDefinition::new(name.clone(), schemas)))
            .is_some();
        info!(resource = %name, replaced, "reloaded resource");
        Ok(())
    }

    /// Returns the definition registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when nothing is registered.
    pub fn definition(&self, name: &str) -> Result<Arc<ResourceDefinition>, RegistryError> {
        let definitions = self.definitions.read().map_err(|_| RegistryError::Poisoned)?;
        definitions.get(name).cloned().ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Returns the model for `name`, building it on first use.
    ///
    /// The registry lock is released before the build starts.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the name is unknown or the build failed.
    pub fn model(&self, name: &str) -> Result<Arc<ResourceModel>, RegistryError> {
        let definition = self.definition(name)?;
        Ok(definition.model(&self.options)?)
    }

    /// Returns registered names in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn names(&self) -> Result<Vec<String>, RegistryError> {
        let definitions = self.definitions.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(definitions.keys().cloned().collect())
    }
}
