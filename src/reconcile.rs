//! Identity-keyed reconciliation of record collections.
//!
//! Two snapshots of a collection are matched by entity identity and
//! partitioned into inserts, updates, and deletes. Matched pairs are reduced
//! to version-ordered deltas, so the resulting [`ChangeLog`] carries exactly
//! what a consumer needs to move from the previous snapshot to the current
//! one.

use crate::{
    diff::delta,
    entity::{Identified, Versioned},
    error::{Error, Result},
    EntityId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The outcome of reconciling two snapshots of a collection.
///
/// Every identity from either snapshot lands in exactly one of the three
/// maps: `inserts` for identities only in the current snapshot, `deletes`
/// for identities only in the previous one, and `updates` for identities in
/// both, holding the version-ordered delta rather than the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLog<T> {
    /// Records present only in the current snapshot
    pub inserts: BTreeMap<EntityId, T>,
    /// Deltas for records present in both snapshots
    pub updates: BTreeMap<EntityId, Value>,
    /// Records present only in the previous snapshot
    pub deletes: BTreeMap<EntityId, T>,
}

impl<T> ChangeLog<T> {
    /// Create an empty change log.
    pub fn new() -> Self {
        Self {
            inserts: BTreeMap::new(),
            updates: BTreeMap::new(),
            deletes: BTreeMap::new(),
        }
    }

    /// Check whether the log records no changes at all.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Total number of recorded changes across all three maps.
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }

    /// Fold another log into this one. On identity collision the other log's
    /// entry wins, so folding logs oldest-first keeps the latest change.
    pub fn merge_from(&mut self, other: ChangeLog<T>) {
        self.inserts.extend(other.inserts);
        self.updates.extend(other.updates);
        self.deletes.extend(other.deletes);
    }
}

impl<T> Default for ChangeLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold a sequence of change logs into one, oldest first.
pub fn merge_logs<T, I>(logs: I) -> ChangeLog<T>
where
    I: IntoIterator<Item = ChangeLog<T>>,
{
    let mut merged = ChangeLog::new();
    for log in logs {
        merged.merge_from(log);
    }
    merged
}

/// Index a slice of records by identity.
///
/// Every record must carry a non-empty identity, and identities must be
/// unique within the slice.
fn index_by_id<T: Identified>(records: &[T]) -> Result<BTreeMap<&str, &T>> {
    let mut index = BTreeMap::new();
    for record in records {
        let id = record.identity().ok_or(Error::MissingId)?;
        if index.insert(id, record).is_some() {
            return Err(Error::DuplicateId(id.to_string()));
        }
    }
    Ok(index)
}

/// Reconcile two snapshots of a collection into a [`ChangeLog`].
///
/// Records are matched by identity. Matched pairs produce a version-ordered
/// delta in `updates`; on a version tie the current snapshot's record wins.
/// Either snapshot containing a record without an identity, or two records
/// sharing one, fails the whole call.
pub fn reconcile<T>(previous: &[T], current: &[T]) -> Result<ChangeLog<T>>
where
    T: Identified + Versioned + Serialize + Clone,
{
    let previous_index = index_by_id(previous)?;
    let current_index = index_by_id(current)?;

    let mut log = ChangeLog::new();

    for (id, current_record) in &current_index {
        match previous_index.get(id) {
            Some(previous_record) => {
                // Current as the left operand so a version tie resolves in
                // its favor.
                let update = delta(*current_record, *previous_record)?;
                log.updates.insert(id.to_string(), update);
            }
            None => {
                log.inserts.insert(id.to_string(), (*current_record).clone());
            }
        }
    }

    for (id, previous_record) in &previous_index {
        if !current_index.contains_key(id) {
            log.deletes.insert(id.to_string(), (*previous_record).clone());
        }
    }

    Ok(log)
}
