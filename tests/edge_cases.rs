//! Edge case tests for converge
//!
//! These tests cover boundary conditions and unusual inputs.

use converge::{
    apply_patch, delta_values, diff_values, flatten, impl_patchable, merge_grouped_by, reconcile,
    sparse_fields, DeletionPolicy, Error, History, Identified, SparseEntity, SparseRecord,
};
use serde_json::{json, Value};

fn record(doc: Value) -> SparseRecord {
    SparseRecord::from_document(&doc).unwrap()
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_field_names_and_values() {
    let unicode_fields = vec![
        "日本語テスト",      // Japanese
        "Привет мир",        // Russian
        "مرحبا بالعالم",     // Arabic
        "🎉🚀💯",            // Emoji
        "Ω≈ç√∫",             // Math symbols
        "Hello\nWorld\tTab", // Whitespace
    ];

    let mut rec = SparseRecord::new();
    for (i, field) in unicode_fields.iter().enumerate() {
        rec.set(field.to_string(), i as i64);
    }

    for (i, field) in unicode_fields.iter().enumerate() {
        assert!(rec.contains(field), "Missing field: {}", field);
        assert_eq!(rec.get::<i64>(field), i as i64);
    }

    // Round-trips through the document form
    let doc = rec.to_document();
    let restored = SparseRecord::from_document(&doc).unwrap();
    assert_eq!(restored, rec);
}

#[test]
fn very_long_string_values() {
    // 1MB string
    let long_string = "x".repeat(1024 * 1024);

    let older = record(json!({"data": "short"}));
    let newer = record(json!({"data": long_string.clone()}));

    let delta = delta_values(
        &older.to_document(),
        &newer.to_document(),
        DeletionPolicy::NotReported,
    );
    assert_eq!(delta["data"].as_str().unwrap().len(), 1024 * 1024);
}

#[test]
fn empty_string_id_is_no_identity() {
    let mut rec = SparseRecord::new();
    rec.set("id", "");
    assert_eq!(rec.identity(), None);

    let err = reconcile(&[], &[rec]).unwrap_err();
    assert_eq!(err, Error::MissingId);
}

// ============================================================================
// Structural Edge Cases
// ============================================================================

#[test]
fn deeply_nested_trees() {
    // 50 levels of nesting
    let mut tree = json!(1);
    for i in 0..50 {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert(format!("level_{}", i), tree);
        tree = Value::Object(wrapper);
    }

    let leaves = flatten(&tree);
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].path.matches('.').count(), 49);

    let diff = diff_values(&tree, &tree);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert_eq!(diff.updates.len(), 1);
}

#[test]
fn large_flat_records() {
    let mut older = serde_json::Map::new();
    let mut newer = serde_json::Map::new();
    for i in 0..10_000 {
        older.insert(format!("field_{}", i), json!(i));
        // Every tenth field changes
        let value = if i % 10 == 0 { json!(i + 1) } else { json!(i) };
        newer.insert(format!("field_{}", i), value);
    }

    let diff = diff_values(&Value::Object(older), &Value::Object(newer));
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert_eq!(diff.updates.len(), 10_000);
}

#[test]
fn mixed_array_and_object_nesting() {
    let older = json!({"matrix": [[1, 2], [3, 4]]});
    let newer = json!({"matrix": [[1, 2], [3, 5], [6]]});

    let diff = diff_values(&older, &newer);
    let added: Vec<_> = diff.added.iter().map(|l| l.path.as_str()).collect();
    assert_eq!(added, vec!["matrix[2][0]"]);

    let delta = delta_values(&older, &newer, DeletionPolicy::NotReported);
    assert_eq!(delta, newer);
}

#[test]
fn null_leaves_survive_the_round_trip() {
    let tree = json!({"a": null, "b": {"c": null}});
    let leaves = flatten(&tree);
    assert_eq!(leaves.len(), 2);
    assert!(leaves.iter().all(|l| l.value.is_null()));

    let delta = delta_values(&json!({}), &tree, DeletionPolicy::NotReported);
    assert_eq!(delta, tree);
}

// ============================================================================
// Deletion Policy
// ============================================================================

#[test]
fn deletion_policy_on_whole_subtrees() {
    let older = json!({"profile": {"name": "Alice", "avatar": {"url": "http://x"}}});
    let newer = json!({"profile": {"name": "Alice"}});

    let silent = delta_values(&older, &newer, DeletionPolicy::NotReported);
    assert_eq!(silent, json!({"profile": {"name": "Alice"}}));

    let explicit = delta_values(&older, &newer, DeletionPolicy::Deleted);
    assert_eq!(
        explicit,
        json!({"profile": {"name": "Alice", "avatar": {"url": null}}})
    );
}

// ============================================================================
// Reconciliation Edge Cases
// ============================================================================

#[test]
fn reconcile_duplicate_ids_in_current_snapshot() {
    let current = vec![
        record(json!({"id": "X", "modified": 1})),
        record(json!({"id": "X", "modified": 2})),
    ];
    let err = reconcile(&[], &current).unwrap_err();
    assert_eq!(err, Error::DuplicateId("X".to_string()));
}

#[test]
fn reconcile_identical_snapshots_yields_self_deltas() {
    let snapshot = vec![record(json!({"id": "A", "modified": 100, "name": "a"}))];
    let log = reconcile(&snapshot, &snapshot).unwrap();

    assert!(log.inserts.is_empty());
    assert!(log.deletes.is_empty());
    // The record matched itself; its delta is the record's own tree.
    assert_eq!(log.updates["A"]["name"], json!("a"));
}

#[test]
fn reconcile_large_disjoint_snapshots() {
    let previous: Vec<SparseRecord> = (0..500)
        .map(|i| record(json!({"id": format!("old_{}", i), "modified": 1})))
        .collect();
    let current: Vec<SparseRecord> = (0..500)
        .map(|i| record(json!({"id": format!("new_{}", i), "modified": 2})))
        .collect();

    let log = reconcile(&previous, &current).unwrap();
    assert_eq!(log.inserts.len(), 500);
    assert_eq!(log.deletes.len(), 500);
    assert!(log.updates.is_empty());
}

// ============================================================================
// History Edge Cases
// ============================================================================

#[test]
fn history_with_many_snapshots() {
    let mut history: History<SparseRecord> = History::new();
    for i in 0..1_000i64 {
        history.push(record(json!({"counter": i})));
    }

    assert_eq!(history.len(), 1_000);
    assert_eq!(history.first_value::<i64>("counter"), 0);
    assert_eq!(history.last_value::<i64>("counter"), 999);
    assert_eq!(history.current_document()["counter"], json!(999));
    assert_eq!(history.field_history::<i64>("counter").len(), 1_000);
}

#[test]
fn history_fold_replaces_arrays_wholesale() {
    let mut history: History<SparseRecord> = History::new();
    history.push(record(json!({"tags": ["a", "b", "c"]})));
    history.push(record(json!({"tags": ["z"]})));

    assert_eq!(history.current_document(), json!({"tags": ["z"]}));
}

// ============================================================================
// Typed Entities From Outside the Crate
// ============================================================================

sparse_fields! {
    pub struct Device {
        id / set_id: String,
        label / set_label: String,
        modified / set_modified: u64,
    }
}

#[test]
fn generated_entity_round_trips_unknown_members() {
    let doc = json!({
        "id": "dev-1",
        "label": "sensor",
        "firmware": {"version": "1.2.3"}
    });

    let device: Device = serde_json::from_value(doc.clone()).unwrap();
    assert_eq!(device.identity(), Some("dev-1"));
    assert_eq!(device.label(), "sensor");
    assert_eq!(device.record().extension().len(), 1);
    assert_eq!(serde_json::to_value(&device).unwrap(), doc);
}

#[test]
fn generated_entities_reconcile() {
    let previous = vec![{
        let mut d = Device::new();
        d.set_id("dev-1".into());
        d.set_label("old label".into());
        d.set_modified(100);
        d
    }];
    let current = vec![{
        let mut d = Device::new();
        d.set_id("dev-1".into());
        d.set_label("new label".into());
        d.set_modified(200);
        d
    }];

    let log = reconcile(&previous, &current).unwrap();
    assert_eq!(log.updates["dev-1"]["label"], json!("new label"));
}

// ============================================================================
// Typed Patching From Outside the Crate
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Settings {
    theme: String,
    notifications: Option<Notifications>,
}

#[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Notifications {
    email: bool,
    push: bool,
}

impl_patchable!(Notifications { values { email: bool, push: bool } });
impl_patchable!(Settings {
    values { theme: String }
    nested { notifications: Notifications }
});

#[test]
fn patch_prunes_across_nesting_levels() {
    let mut settings = Settings {
        theme: "dark".into(),
        notifications: Some(Notifications {
            email: true,
            push: false,
        }),
    };

    let delta = json!({
        "theme": "dark",                       // equal, pruned
        "notifications": {"email": true, "push": true}, // push changes
        "vendor_extras": {"x": 1}              // unmatched, kept
    });

    let applied = apply_patch(&mut settings, &delta).unwrap();
    assert_eq!(
        applied,
        json!({
            "notifications": {"push": true},
            "vendor_extras": {"x": 1}
        })
    );
    assert!(settings.notifications.as_ref().unwrap().push);
}

#[test]
fn null_delta_clears_then_object_delta_rebuilds() {
    let mut settings = Settings {
        theme: "dark".into(),
        notifications: Some(Notifications {
            email: true,
            push: true,
        }),
    };

    let applied = apply_patch(&mut settings, &json!({"notifications": null})).unwrap();
    assert!(settings.notifications.is_none());
    assert_eq!(applied, json!({"notifications": null}));

    // A later object delta default-constructs the cleared member again.
    let applied =
        apply_patch(&mut settings, &json!({"notifications": {"email": true}})).unwrap();
    assert_eq!(
        settings.notifications,
        Some(Notifications {
            email: true,
            push: false,
        })
    );
    assert_eq!(applied, json!({"notifications": {"email": true}}));
}

// ============================================================================
// Grouped Merging
// ============================================================================

#[test]
fn merge_grouped_by_interleaved_identifiers() {
    let objects = vec![
        json!({"id": "a", "v": 1}),
        json!({"id": "b", "v": 10}),
        json!({"id": "a", "w": 2}),
        json!({"id": "b", "v": 11}),
        json!({"no_id": true}),
    ];

    let merged = merge_grouped_by(&objects, "id");
    assert_eq!(
        merged,
        vec![
            json!({"id": "a", "v": 1, "w": 2}),
            json!({"id": "b", "v": 11}),
            json!({"no_id": true}),
        ]
    );
}
