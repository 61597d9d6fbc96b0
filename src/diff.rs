//! Structural diffs between two versions of a tree.
//!
//! Both trees are flattened to leaf paths; the diff is a pure set partition
//! on path membership. The emitted delta rebuilds nested structure from the
//! added and updated leaves of the newer side; what happens to removed
//! leaves is a [`DeletionPolicy`] decision, because a partial snapshot that
//! omits a field may mean either "deleted" or "not reported".

use crate::{
    entity::{version_order, Versioned},
    error::{Error, Result},
    path::{build_tree, flatten, Leaf},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// How to interpret a leaf present in the older tree but absent from the
/// newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeletionPolicy {
    /// The leaf was simply not reported by this partial update; removed
    /// leaves are left out of the emitted delta (default).
    #[default]
    NotReported,
    /// The leaf was deleted; removed leaves are emitted as explicit nulls.
    Deleted,
}

/// Leaf-set difference between an older and a newer tree.
///
/// Partitioned purely by path membership: `updates` holds every leaf whose
/// path exists on both sides, valued from the newer side, whether or not the
/// value changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafDiff {
    /// Leaves whose path exists only in the newer tree
    pub added: Vec<Leaf>,
    /// Leaves whose path exists only in the older tree
    pub removed: Vec<Leaf>,
    /// Leaves whose path exists on both sides, newer values
    pub updates: Vec<Leaf>,
}

/// Partition the leaves of two trees by path membership.
pub fn diff_values(older: &Value, newer: &Value) -> LeafDiff {
    let older_leaves = flatten(older);
    let newer_leaves = flatten(newer);

    let older_paths: HashSet<&str> = older_leaves.iter().map(|l| l.path.as_str()).collect();
    let newer_paths: HashSet<&str> = newer_leaves.iter().map(|l| l.path.as_str()).collect();

    let mut added = Vec::new();
    let mut updates = Vec::new();
    for leaf in &newer_leaves {
        if older_paths.contains(leaf.path.as_str()) {
            updates.push(leaf.clone());
        } else {
            added.push(leaf.clone());
        }
    }

    let removed: Vec<Leaf> = older_leaves
        .iter()
        .filter(|leaf| !newer_paths.contains(leaf.path.as_str()))
        .cloned()
        .collect();

    LeafDiff {
        added,
        removed,
        updates,
    }
}

/// Emit the applyable delta for an older-to-newer transition: the tree
/// rebuilt from added and updated leaves, with removed leaves handled per
/// `policy`.
pub fn delta_values(older: &Value, newer: &Value, policy: DeletionPolicy) -> Value {
    let diff = diff_values(older, newer);

    let mut leaves = Vec::with_capacity(diff.added.len() + diff.updates.len());
    leaves.extend(diff.added);
    leaves.extend(diff.updates);
    if policy == DeletionPolicy::Deleted {
        leaves.extend(diff.removed.into_iter().map(|leaf| Leaf {
            path: leaf.path,
            value: Value::Null,
        }));
    }

    build_tree(&leaves)
}

/// Version-ordered delta between two records, default deletion policy.
///
/// Older/newer roles come from the version marker; on a tie `left` is the
/// newer side.
pub fn delta<T>(left: &T, right: &T) -> Result<Value>
where
    T: Versioned + Serialize,
{
    delta_with(left, right, DeletionPolicy::default())
}

/// Version-ordered delta with an explicit deletion policy.
pub fn delta_with<T>(left: &T, right: &T, policy: DeletionPolicy) -> Result<Value>
where
    T: Versioned + Serialize,
{
    let (older, newer) = version_order(left, right);
    let older_tree = serde_json::to_value(older).map_err(|e| Error::Serialize(e.to_string()))?;
    let newer_tree = serde_json::to_value(newer).map_err(|e| Error::Serialize(e.to_string()))?;
    Ok(delta_values(&older_tree, &newer_tree, policy))
}
