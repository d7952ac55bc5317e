// crates/schema-bridge-core/src/core/cow.rs
// ============================================================================
// Module: Copy-on-Write Views
// Description: Borrowing wrappers that clone only on the first real mutation.
// Purpose: Let derivations tweak shared schemas without eager deep copies.
// Dependencies: indexmap, crate::core::schema
// ============================================================================

//! ## Overview
//! Each wrapper starts out borrowing its input. Mutating calls first compare
//! the new value against the current one using the supplied equality function
//! and only clone the borrowed value when the comparison fails.
//!
//! ## Invariants
//! - Before any effective mutation, `peek()` aliases the original input.
//! - After an effective mutation, `peek()` never aliases the original input.
//! - `is_changed()` stays true until `release()` resets the wrapper.
//!
//! The wrappers are not `Sync` by intent of use: each derivation pass owns
//! its own instances.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::hash::Hash;
use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::schema::JsonType;
use crate::core::schema::SchemaNode;
use crate::core::schema::SchemaStep;

/// Equality predicate used to suppress no-op writes.
pub type EqualsFn<V> = fn(&V, &V) -> bool;

// ============================================================================
// SECTION: Map
// ============================================================================

/// Copy-on-write view over an insertion-ordered map.
#[derive(Debug)]
pub struct CowMap<'a, K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Current map contents.
    map: Cow<'a, IndexMap<K, V>>,
    /// Whether a write diverged from the original.
    changed: bool,
    /// Value equality predicate.
    equals: EqualsFn<V>,
}

impl<'a, K, V> CowMap<'a, K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Wraps a borrowed map with a custom equality predicate.
    #[must_use]
    pub const fn new(map: &'a IndexMap<K, V>, equals: EqualsFn<V>) -> Self {
        Self {
            map: Cow::Borrowed(map),
            changed: false,
            equals,
        }
    }

    /// Returns the current map without copying.
    #[must_use]
    pub fn peek(&self) -> &IndexMap<K, V> {
        &self.map
    }

    /// Returns true once a write diverged from the original.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns a value by key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sets a value, copying the map only when the value differs.
    pub fn set(&mut self, key: K, value: V) {
        if self.map.get(&key).is_some_and(|existing| (self.equals)(existing, &value)) {
            return;
        }
        self.map.to_mut().insert(key, value);
        self.changed = true;
    }

    /// Removes a key, copying the map only when the key is present.
    pub fn remove(&mut self, key: &K) {
        if !self.map.contains_key(key) {
            return;
        }
        self.map.to_mut().shift_remove(key);
        self.changed = true;
    }

    /// Replaces the whole map unless it is equal to the current one.
    pub fn replace(&mut self, other: &IndexMap<K, V>) {
        let same = self.map.len() == other.len()
            && other.iter().all(|(key, value)| {
                self.map.get(key).is_some_and(|existing| (self.equals)(existing, value))
            });
        if same {
            return;
        }
        self.map = Cow::Owned(other.clone());
        self.changed = true;
    }

    /// Returns the current value and whether it diverged, resetting the view.
    pub fn release(&mut self) -> (Cow<'a, IndexMap<K, V>>, bool) {
        let changed = mem::replace(&mut self.changed, false);
        (mem::replace(&mut self.map, Cow::Owned(IndexMap::new())), changed)
    }
}

impl<'a, K, V> CowMap<'a, K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    /// Wraps a borrowed map using `PartialEq` for value comparison.
    #[must_use]
    pub fn with_eq(map: &'a IndexMap<K, V>) -> Self {
        Self::new(map, V::eq)
    }
}

// ============================================================================
// SECTION: Vec
// ============================================================================

/// Copy-on-write view over a slice.
#[derive(Debug)]
pub struct CowVec<'a, V: Clone> {
    /// Current contents.
    items: Cow<'a, [V]>,
    /// Whether a write diverged from the original.
    changed: bool,
    /// Value equality predicate.
    equals: EqualsFn<V>,
}

impl<'a, V: Clone> CowVec<'a, V> {
    /// Wraps a borrowed slice with a custom equality predicate.
    #[must_use]
    pub const fn new(items: &'a [V], equals: EqualsFn<V>) -> Self {
        Self {
            items: Cow::Borrowed(items),
            changed: false,
            equals,
        }
    }

    /// Returns the current slice without copying.
    #[must_use]
    pub fn peek(&self) -> &[V] {
        &self.items
    }

    /// Returns true once a write diverged from the original.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&V> {
        self.items.get(index)
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when the slice is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true when an equal element is present.
    #[must_use]
    pub fn contains(&self, value: &V) -> bool {
        self.items.iter().any(|existing| (self.equals)(existing, value))
    }

    /// Adds an element unless an equal one is already present.
    pub fn add(&mut self, value: V) {
        if self.contains(&value) {
            return;
        }
        self.append(value);
    }

    /// Appends an element unconditionally.
    pub fn append(&mut self, value: V) {
        self.items.to_mut().push(value);
        self.changed = true;
    }

    /// Removes every element equal to `value`.
    pub fn remove(&mut self, value: &V) {
        if !self.contains(value) {
            return;
        }
        let equals = self.equals;
        self.items.to_mut().retain(|existing| !equals(existing, value));
        self.changed = true;
    }

    /// Replaces the whole slice unless it is equal to the current one.
    pub fn replace(&mut self, other: &[V]) {
        let same = self.items.len() == other.len()
            && self.items.iter().zip(other).all(|(left, right)| (self.equals)(left, right));
        if same {
            return;
        }
        self.items = Cow::Owned(other.to_vec());
        self.changed = true;
    }

    /// Returns the current value and whether it diverged, resetting the view.
    pub fn release(&mut self) -> (Cow<'a, [V]>, bool) {
        let changed = mem::replace(&mut self.changed, false);
        (mem::replace(&mut self.items, Cow::Owned(Vec::new())), changed)
    }
}

impl<V: Clone + Default> CowVec<'_, V> {
    /// Sets the element at `index`, growing with defaults when needed.
    pub fn set(&mut self, index: usize, value: V) {
        if self.items.get(index).is_some_and(|existing| (self.equals)(existing, &value)) {
            return;
        }
        let items = self.items.to_mut();
        if items.len() <= index {
            items.resize_with(index + 1, V::default);
        }
        if let Some(slot) = items.get_mut(index) {
            *slot = value;
        }
        self.changed = true;
    }
}

impl<'a, V: Clone + PartialEq> CowVec<'a, V> {
    /// Wraps a borrowed slice using `PartialEq` for comparison.
    #[must_use]
    pub fn with_eq(items: &'a [V]) -> Self {
        Self::new(items, V::eq)
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Copy-on-write view over a schema node.
///
/// Nested writes clone only the nodes along the written path; untouched
/// subtrees stay shared through their [`Arc`] handles.
#[derive(Debug)]
pub struct CowSchema<'a> {
    /// Current node.
    node: Cow<'a, SchemaNode>,
    /// Whether a write diverged from the original.
    changed: bool,
}

impl<'a> CowSchema<'a> {
    /// Wraps a borrowed schema node.
    #[must_use]
    pub const fn new(node: &'a SchemaNode) -> Self {
        Self {
            node: Cow::Borrowed(node),
            changed: false,
        }
    }

    /// Wraps an existing copy-on-write value without marking it changed.
    #[must_use]
    pub const fn from_cow(node: Cow<'a, SchemaNode>) -> Self {
        Self {
            node,
            changed: false,
        }
    }

    /// Returns the current node without copying.
    #[must_use]
    pub fn peek(&self) -> &SchemaNode {
        &self.node
    }

    /// Returns true once a write diverged from the original.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns the current node and whether it diverged, resetting the view.
    pub fn release(&mut self) -> (Cow<'a, SchemaNode>, bool) {
        let changed = mem::replace(&mut self.changed, false);
        (mem::replace(&mut self.node, Cow::Owned(SchemaNode::default())), changed)
    }

    /// Replaces the node unless it is structurally equal.
    pub fn replace(&mut self, other: SchemaNode) {
        if *self.node == other {
            return;
        }
        self.node = Cow::Owned(other);
        self.changed = true;
    }

    /// Sets the declared type keyword.
    pub fn set_kind(&mut self, kind: Option<JsonType>) {
        if self.node.kind == kind {
            return;
        }
        self.node_mut().kind = kind;
    }

    /// Sets the nullable flag.
    pub fn set_nullable(&mut self, nullable: bool) {
        if self.node.nullable == nullable {
            return;
        }
        self.node_mut().nullable = nullable;
    }

    /// Adds or removes a name from the required set.
    pub fn set_required(&mut self, name: &str, required: bool) {
        if self.node.required.contains(name) == required {
            return;
        }
        let node = self.node_mut();
        if required {
            node.required.insert(name.to_string());
        } else {
            node.required.remove(name);
        }
    }

    /// Removes a property and its required entry.
    pub fn remove_property(&mut self, name: &str) {
        if !self.node.properties.contains_key(name) && !self.node.required.contains(name) {
            return;
        }
        let node = self.node_mut();
        node.properties.shift_remove(name);
        node.required.remove(name);
    }

    /// Writes a node at `path`, creating the final property if missing.
    ///
    /// Returns false when an intermediate step does not exist. An empty path
    /// replaces the root.
    pub fn set_at(&mut self, path: &[SchemaStep], value: SchemaNode) -> bool {
        let Some((last, parent_path)) = path.split_last() else {
            self.replace(value);
            return true;
        };
        let Some(parent) = self.node.lookup(parent_path) else {
            return false;
        };
        match (last, parent.child(last)) {
            (_, Some(existing)) if *existing == value => return true,
            (SchemaStep::Items, None) if parent.kind != Some(JsonType::Array) => return false,
            _ => {}
        }
        let Some(parent) = lookup_mut(self.node_mut(), parent_path) else {
            return false;
        };
        match last {
            SchemaStep::Property(name) => {
                parent.properties.insert(name.clone(), Arc::new(value));
            }
            SchemaStep::Items => parent.items = Some(Arc::new(value)),
        }
        true
    }

    /// Forces the copy and marks the view changed.
    fn node_mut(&mut self) -> &mut SchemaNode {
        self.changed = true;
        self.node.to_mut()
    }
}

/// Walks a path mutably, cloning shared nodes along the way.
fn lookup_mut<'n>(node: &'n mut SchemaNode, path: &[SchemaStep]) -> Option<&'n mut SchemaNode> {
    let Some((step, rest)) = path.split_first() else {
        return Some(node);
    };
    let child = match step {
        SchemaStep::Property(name) => node.properties.get_mut(name.as_str())?,
        SchemaStep::Items => node.items.as_mut()?,
    };
    lookup_mut(Arc::make_mut(child), rest)
}
