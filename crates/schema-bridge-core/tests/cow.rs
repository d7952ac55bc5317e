// crates/schema-bridge-core/tests/cow.rs
// ============================================================================
// Module: Copy-on-Write Tests
// Description: Aliasing behaviour of the copy-on-write views.
// Purpose: Prove no-op writes never copy and real writes always do.
// Dependencies: schema-bridge-core, indexmap
// ============================================================================

//! ## Overview
//! Aliasing is checked with pointer equality against the borrowed input.

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

use std::borrow::Cow;
use std::ptr;
use std::sync::Arc;

use indexmap::IndexMap;
use schema_bridge_core::CowMap;
use schema_bridge_core::CowSchema;
use schema_bridge_core::CowVec;
use schema_bridge_core::JsonType;
use schema_bridge_core::SchemaNode;
use schema_bridge_core::SchemaStep;

// ============================================================================
// SECTION: Map
// ============================================================================

/// Builds a two-entry map.
fn sample_map() -> IndexMap<String, u32> {
    IndexMap::from([("a".to_string(), 1), ("b".to_string(), 2)])
}

/// Verifies an equal set keeps the map aliased.
#[test]
fn map_equal_set_keeps_alias() {
    let original = sample_map();
    let mut view = CowMap::with_eq(&original);
    view.set("a".to_string(), 1);
    assert!(!view.is_changed());
    assert!(ptr::eq(view.peek(), &original));
}

/// Verifies a differing set copies the map.
#[test]
fn map_differing_set_copies() {
    let original = sample_map();
    let mut view = CowMap::with_eq(&original);
    view.set("a".to_string(), 7);
    assert!(view.is_changed());
    assert!(!ptr::eq(view.peek(), &original));
    assert_eq!(view.get(&"a".to_string()), Some(&7));
    assert_eq!(original["a"], 1);
}

/// Verifies a custom equality predicate suppresses writes.
#[test]
fn map_custom_equality_suppresses_writes() {
    let original = sample_map();
    let mut view = CowMap::new(&original, |_, _| true);
    view.set("b".to_string(), 99);
    assert!(!view.is_changed());
    view.set("c".to_string(), 3);
    assert!(view.is_changed());
    assert_eq!(view.len(), 3);
}

/// Verifies removing a missing key and replacing with an equal map are no-ops.
#[test]
fn map_remove_missing_key_is_noop() {
    let original = sample_map();
    let mut view = CowMap::with_eq(&original);
    view.remove(&"zzz".to_string());
    assert!(!view.is_changed());
    view.replace(&sample_map());
    assert!(!view.is_changed());
    assert!(ptr::eq(view.peek(), &original));
}

/// Verifies release hands back the value and resets the view.
#[test]
fn map_release_resets_view() {
    let original = sample_map();
    let mut view = CowMap::with_eq(&original);
    view.remove(&"a".to_string());
    let (released, changed) = view.release();
    assert!(changed);
    assert!(matches!(released, Cow::Owned(_)));
    assert_eq!(released.len(), 1);
    assert!(!view.is_changed());
    assert!(view.is_empty());
}

// ============================================================================
// SECTION: Vec
// ============================================================================

/// Verifies adding an existing element keeps the slice aliased.
#[test]
fn vec_add_existing_keeps_alias() {
    let original = vec!["x".to_string(), "y".to_string()];
    let mut view = CowVec::with_eq(&original);
    view.add("x".to_string());
    assert!(!view.is_changed());
    assert!(ptr::eq(view.peek(), original.as_slice()));
}

/// Verifies slice mutations copy and leave the original intact.
#[test]
fn vec_mutations_copy_once() {
    let original = vec![1_u32, 2, 3];
    let mut view = CowVec::with_eq(&original);
    view.set(1, 2);
    assert!(!view.is_changed());
    view.set(1, 5);
    assert!(view.is_changed());
    assert!(!ptr::eq(view.peek(), original.as_slice()));
    view.append(2);
    assert_eq!(view.peek(), &[1, 5, 3, 2]);
    view.remove(&1);
    assert!(!view.contains(&1));
    assert_eq!(original, vec![1, 2, 3]);
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Verifies equal schema writes keep the node aliased.
#[test]
fn schema_equal_writes_keep_alias() {
    let node = SchemaNode::object([("id", SchemaNode::string())], ["id"]);
    let mut view = CowSchema::new(&node);
    view.set_kind(Some(JsonType::Object));
    view.set_required("id", true);
    view.set_nullable(false);
    assert!(!view.set_at(&[SchemaStep::Property("missing".to_string()), SchemaStep::Items], SchemaNode::string()));
    assert!(view.set_at(&[SchemaStep::Property("id".to_string())], SchemaNode::string()));
    assert!(!view.is_changed());
    assert!(ptr::eq(view.peek(), &node));
}

/// Verifies nested writes share untouched subtrees.
#[test]
fn schema_nested_write_shares_untouched_subtrees() {
    let node = SchemaNode::object(
        [
            ("spec", SchemaNode::object([("size", SchemaNode::integer())], ["size"])),
            ("meta", SchemaNode::object([("label", SchemaNode::string())], ["label"])),
        ],
        ["spec"],
    );
    let mut view = CowSchema::new(&node);
    let path = [SchemaStep::Property("spec".to_string()), SchemaStep::Property("size".to_string())];
    assert!(view.set_at(&path, SchemaNode::number()));
    assert!(view.is_changed());
    assert!(!ptr::eq(view.peek(), &node));

    let updated = view.peek();
    assert_eq!(updated.lookup(&path).unwrap().kind, Some(JsonType::Number));
    assert_eq!(node.lookup(&path).unwrap().kind, Some(JsonType::Integer));
    assert!(Arc::ptr_eq(updated.property_arc("meta").unwrap(), node.property_arc("meta").unwrap()));
    assert!(!Arc::ptr_eq(updated.property_arc("spec").unwrap(), node.property_arc("spec").unwrap()));
}

/// Verifies removing a property also drops its required entry.
#[test]
fn schema_remove_property_drops_required_entry() {
    let node = SchemaNode::object([("id", SchemaNode::string())], ["id"]);
    let mut view = CowSchema::new(&node);
    view.remove_property("id");
    assert!(view.is_changed());
    assert!(view.peek().properties.is_empty());
    assert!(!view.peek().is_required("id"));
    assert!(node.is_required("id"));
}
