//! Leaf paths: flattening trees to scalar addresses and building them back.
//!
//! A leaf path is a string address of one scalar or null value inside a
//! nested tree: object keys joined with dots, array indexes in brackets
//! (`a.b[0].c`). Paths are the identity of leaves during diffing, so the
//! syntax only needs to be self-consistent and reversible, which it is for
//! keys that do not themselves contain the separator characters and are not
//! digit-only: a digit-only object key is indistinguishable from an array
//! index in path form and reads back as one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One scalar (or null) location inside a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaf {
    /// Dotted/bracketed address, e.g. `a.b[0].c`
    pub path: String,
    /// The scalar or null value at that address
    pub value: Value,
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Flatten a tree into its leaf paths, depth first.
///
/// Every scalar or null is a leaf; empty containers contribute no leaves.
/// A scalar at the root becomes a single leaf with an empty path.
pub fn flatten(tree: &Value) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    collect_leaves(tree, String::new(), &mut leaves);
    leaves
}

fn collect_leaves(node: &Value, path: String, leaves: &mut Vec<Leaf>) {
    match node {
        Value::Object(members) => {
            for (key, child) in members {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                collect_leaves(child, child_path, leaves);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_leaves(child, format!("{}[{}]", path, index), leaves);
            }
        }
        _ => leaves.push(Leaf {
            path,
            value: node.clone(),
        }),
    }
}

/// Split a leaf path into plain segments, normalizing bracket notation to
/// dot segments and dropping empties.
pub fn split_path(path: &str) -> Vec<String> {
    path.replace("['", ".")
        .replace("']", ".")
        .replace('[', ".")
        .replace(']', ".")
        .split('.')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_index(part: &str) -> Option<usize> {
    if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

/// Build a nested tree holding `leaf` at the address given by `parts`.
///
/// Segments are walked from the most specific outward. An all-digit segment
/// synthesizes an array of `index + 1` elements, null except at `index`; any
/// other segment wraps the value in a single-key object. An empty segment
/// terminates the walk early, leaving the value unwrapped further.
pub fn build_value(parts: &[String], leaf: Value) -> Value {
    let mut node = leaf;
    for part in parts.iter().rev() {
        if part.is_empty() {
            break;
        }
        match parse_index(part) {
            Some(index) => {
                let mut items = vec![Value::Null; index + 1];
                items[index] = node;
                node = Value::Array(items);
            }
            None => {
                let mut object = Map::new();
                object.insert(part.clone(), node);
                node = Value::Object(object);
            }
        }
    }
    node
}

/// Reconstruct one tree from a set of leaves by positional insertion.
///
/// Inverse of [`flatten`] for any tree whose containers are all non-empty:
/// `build_tree(&flatten(&t)) == t`. Unlike folding single-leaf builds
/// through [`deep_merge`], positional insertion keeps earlier array elements
/// when later leaves land at higher indexes.
pub fn build_tree(leaves: &[Leaf]) -> Value {
    let mut root = Value::Object(Map::new());
    for leaf in leaves {
        let parts = split_path(&leaf.path);
        insert_leaf(&mut root, &parts, leaf.value.clone());
    }
    root
}

fn insert_leaf(node: &mut Value, parts: &[String], value: Value) {
    let Some((head, rest)) = parts.split_first() else {
        *node = value;
        return;
    };
    match parse_index(head) {
        Some(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                while items.len() <= index {
                    items.push(Value::Null);
                }
                insert_leaf(&mut items[index], rest, value);
            }
        }
        None => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(members) = node {
                insert_leaf(members.entry(head.clone()).or_insert(Value::Null), rest, value);
            }
        }
    }
}

/// Recursively merge `patch` into `base`.
///
/// Object keys unify, recursing where both sides are objects. On conflicting
/// leaves the patch side wins, nulls included. Arrays are never merged
/// element-wise: a later array value fully replaces an earlier one.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_members), Value::Object(patch_members)) => {
            for (key, patch_child) in patch_members {
                deep_merge(
                    base_members.entry(key.clone()).or_insert(Value::Null),
                    patch_child,
                );
            }
        }
        (base_slot, patch_value) => *base_slot = patch_value.clone(),
    }
}

/// Left-fold a sequence of trees into one with [`deep_merge`], starting from
/// an empty object.
pub fn merge_all<I>(trees: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Value::Object(Map::new());
    for tree in trees {
        deep_merge(&mut merged, &tree);
    }
    merged
}

/// Group objects by the value of `key` and fold each group with
/// [`deep_merge`], preserving first-seen group order. Objects without the
/// key share a group keyed by null.
pub fn merge_grouped_by(objects: &[Value], key: &str) -> Vec<Value> {
    let mut groups: Vec<(Value, Value)> = Vec::new();
    for object in objects {
        let group_key = object.get(key).cloned().unwrap_or(Value::Null);
        match groups.iter_mut().find(|(existing, _)| *existing == group_key) {
            Some((_, merged)) => deep_merge(merged, object),
            None => groups.push((group_key, object.clone())),
        }
    }
    groups.into_iter().map(|(_, merged)| merged).collect()
}
