//! Append-only history of partial snapshots, folded on demand.
//!
//! A [`History`] keeps every partial snapshot ever pushed, in arrival order,
//! and derives current state by folding the snapshots' documents oldest to
//! newest. Nothing is ever collapsed in place, so per-field provenance stays
//! available: when a field changed, and through which values.

use crate::{
    entity::{SparseEntity, Versioned},
    error::{Error, Result},
    path::merge_all,
    Timestamp,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// An ordered log of partial snapshots of one logical entity.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    snapshots: Vec<T>,
}

impl<T> History<T> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }

    /// Append a snapshot. Order of arrival is fold order.
    pub fn push(&mut self, snapshot: T) {
        self.snapshots.push(snapshot);
    }

    /// Number of snapshots recorded.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check whether no snapshots have been recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The snapshot at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.snapshots.get(index)
    }

    /// Iterate snapshots oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.snapshots.iter()
    }
}

impl<T: SparseEntity> History<T> {
    /// Fold all snapshots into the current document, oldest first.
    ///
    /// Later snapshots win on conflicting fields; fields reported once stay
    /// visible forever. An empty history folds to an empty object.
    pub fn current_document(&self) -> Value {
        merge_all(self.snapshots.iter().map(|s| s.record().to_document()))
    }

    /// Fold into a typed current state.
    pub fn current_state(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.current_document())
            .map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// The value of `field` in the oldest snapshot that reports it, or the
    /// type's default when no snapshot does.
    pub fn first_value<V>(&self, field: &str) -> V
    where
        V: DeserializeOwned + Default,
    {
        self.snapshots
            .iter()
            .find(|s| s.record().contains(field))
            .map(|s| s.record().get(field))
            .unwrap_or_default()
    }

    /// The value of `field` in the newest snapshot that reports it, or the
    /// type's default when no snapshot does.
    pub fn last_value<V>(&self, field: &str) -> V
    where
        V: DeserializeOwned + Default,
    {
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.record().contains(field))
            .map(|s| s.record().get(field))
            .unwrap_or_default()
    }

    /// Every reported value of `field` in arrival order, paired with each
    /// reporting snapshot's version marker.
    pub fn field_history<V>(&self, field: &str) -> Vec<(V, Option<Timestamp>)>
    where
        V: DeserializeOwned + Default,
    {
        self.snapshots
            .iter()
            .filter(|s| s.record().contains(field))
            .map(|s| (s.record().get(field), s.version_marker()))
            .collect()
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for History<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            snapshots: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for History<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.snapshots.extend(iter);
    }
}

impl<T> IntoIterator for History<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a History<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
