//! # converge
//!
//! An incremental state reconciliation engine: sparse records, structural
//! diffs, identity-keyed list reconciliation, and history folding.
//!
//! The engine is built for systems that receive partial snapshots of state
//! from elsewhere and must work out what actually changed. A [`SparseRecord`]
//! stores only the fields a snapshot reported, distinguishing "not reported"
//! from "set to null"; structural diffing flattens trees to leaf paths and
//! partitions them by membership; [`reconcile`] matches whole collections by
//! identity; [`History`] keeps every snapshot and folds current state on
//! demand.
//!
//! ## Design principles
//!
//! - **Pure and deterministic**: no IO, no clocks, no global state. The same
//!   inputs always produce the same outputs, with map-backed storage keeping
//!   serialized order stable.
//! - **Sparseness is semantic**: an absent field means "not reported", never
//!   "default" or "deleted". Deletion is an explicit, opt-in interpretation
//!   ([`DeletionPolicy`]).
//! - **Versions decide, not argument order**: wherever two versions of a
//!   record meet, older/newer roles come from the `modified` marker.
//!
//! ## Core concepts
//!
//! - [`SparseRecord`]: loosely-typed sparse field store with synchronous
//!   change notification and a lossless extension bag for unknown members.
//! - [`Leaf`] / [`flatten`] / [`build_tree`]: trees as flat sets of
//!   path-addressed leaves, and back.
//! - [`diff_values`] / [`delta`]: leaf-set diffs and applyable deltas.
//! - [`apply_patch`] / [`Patchable`]: pruned, typed application of deltas to
//!   strongly-typed values.
//! - [`reconcile`] / [`ChangeLog`]: identity-keyed collection reconciliation.
//! - [`History`]: append-only snapshot log with fold-on-read state.
//!
//! ## Quick Start
//!
//! ```rust
//! use converge::{History, SparseRecord};
//! use serde_json::json;
//!
//! // Partial snapshots arrive over time; each reports only what it knows.
//! let first = SparseRecord::from_document(&json!({"name": "Alice"}))?;
//! let second = SparseRecord::from_document(&json!({"age": 30}))?;
//!
//! let mut history = History::new();
//! history.push(first);
//! history.push(second);
//!
//! // Current state is the fold of everything reported so far.
//! assert_eq!(history.current_document(), json!({"name": "Alice", "age": 30}));
//! # Ok::<(), converge::Error>(())
//! ```

pub mod diff;
pub mod entity;
pub mod error;
pub mod history;
pub mod patcher;
pub mod path;
pub mod reconcile;
pub mod record;

pub use diff::{delta, delta_values, delta_with, diff_values, DeletionPolicy, LeafDiff};
pub use entity::{
    version_order, Identified, SparseEntity, Versioned, ID_FIELD, MODIFIED_FIELD,
};
pub use error::{Error, Result};
pub use history::History;
pub use patcher::{apply_patch, Patchable};
pub use path::{
    build_tree, build_value, deep_merge, flatten, merge_all, merge_grouped_by, split_path, Leaf,
};
pub use reconcile::{merge_logs, reconcile, ChangeLog};
pub use record::{ChangeKind, FieldChange, ObserverId, SparseRecord};

// Macro-generated code references these through `$crate`.
#[doc(hidden)]
pub use serde;
#[doc(hidden)]
pub use serde_json;

/// Type aliases for clarity
pub type FieldName = String;
pub type EntityId = String;
pub type Timestamp = u64;
