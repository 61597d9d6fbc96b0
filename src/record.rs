//! Sparse record storage with field-level change notification.
//!
//! A [`SparseRecord`] stores only explicitly-set fields; an absent field is
//! semantically distinct from a field set to null or to a type's default.
//! Unknown members encountered on read are preserved verbatim in an extension
//! bag and re-emitted on write, so documents mixing known and unknown keys
//! round-trip losslessly.

use crate::{
    error::{Error, Result},
    path::value_kind,
    FieldName,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Kind of change observed on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The field was not present before the write
    Added,
    /// The field was present with a different value
    Changed,
}

/// A single observed field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Name of the field that changed
    pub field: FieldName,
    /// Whether the field was added or overwritten
    pub kind: ChangeKind,
}

/// Handle for removing a registered observer.
pub type ObserverId = u64;

type Observer = Box<dyn FnMut(&FieldChange)>;

/// A sparse, loosely-typed record: a map of explicitly-set fields plus an
/// extension bag of unknown members, with synchronous change notification.
///
/// Re-setting a field to its current value is a no-op: no write is observable
/// and no event fires. Dispatch happens inline during [`SparseRecord::set`];
/// observers receive the change after the write has landed.
pub struct SparseRecord {
    fields: BTreeMap<FieldName, Value>,
    extension: BTreeMap<FieldName, Value>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: ObserverId,
}

impl SparseRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            extension: BTreeMap::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Typed read of a field. Absent, null, or non-decodable values yield the
    /// type's neutral default; this never errors.
    pub fn get<T>(&self, field: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.fields.get(field) {
            Some(value) if !value.is_null() => {
                serde_json::from_value(value.clone()).unwrap_or_default()
            }
            _ => T::default(),
        }
    }

    /// Raw read of a field's stored value.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Write a field and notify observers.
    ///
    /// Inserting fires [`ChangeKind::Added`], overwriting a different value
    /// fires [`ChangeKind::Changed`], and writing an equal value does nothing
    /// at all. Returns what happened, `None` for the no-op case.
    pub fn set(&mut self, field: impl Into<FieldName>, value: impl Into<Value>) -> Option<ChangeKind> {
        self.write(field.into(), value.into(), true)
    }

    /// Write a field without dispatching observers. The write itself follows
    /// the same rules as [`SparseRecord::set`].
    pub fn set_silent(
        &mut self,
        field: impl Into<FieldName>,
        value: impl Into<Value>,
    ) -> Option<ChangeKind> {
        self.write(field.into(), value.into(), false)
    }

    fn write(&mut self, field: FieldName, value: Value, notify: bool) -> Option<ChangeKind> {
        let kind = match self.fields.get(&field) {
            Some(existing) if *existing == value => return None,
            Some(_) => ChangeKind::Changed,
            None => ChangeKind::Added,
        };

        self.fields.insert(field.clone(), value);

        if notify {
            let change = FieldChange { field, kind };
            for (_, observer) in self.observers.iter_mut() {
                observer(&change);
            }
        }

        Some(kind)
    }

    /// Check whether a field has been explicitly set.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Remove a field, returning its value if it was set.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Names of all explicitly-set fields, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All explicitly-set fields with their values.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Count of explicitly-set fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Register an observer for field changes. Dispatch is synchronous,
    /// during the `set` call that caused the change.
    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&FieldChange) + 'static,
    {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a previously registered observer. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Copy every field present in `source` into this record and return the
    /// names that actually changed.
    ///
    /// The report comes from a temporary subscription to this record's own
    /// change events for the duration of the call, so it is exactly what any
    /// other observer saw: equal-valued fields contribute nothing.
    pub fn patch(&mut self, source: &SparseRecord) -> Vec<FieldName> {
        if source.is_empty() {
            return Vec::new();
        }

        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&observed);
        let subscription = self.subscribe(move |change: &FieldChange| {
            sink.borrow_mut().push(change.field.clone());
        });

        for (field, value) in source.fields() {
            self.set(field, value.clone());
        }

        self.unsubscribe(subscription);
        Rc::try_unwrap(observed)
            .map(RefCell::into_inner)
            .unwrap_or_default()
    }

    /// Unknown members preserved from deserialization, re-emitted verbatim.
    pub fn extension(&self) -> &BTreeMap<FieldName, Value> {
        &self.extension
    }

    /// Store an unknown member in the extension bag.
    pub fn insert_extension(&mut self, member: impl Into<FieldName>, value: impl Into<Value>) {
        self.extension.insert(member.into(), value.into());
    }

    /// Wire form: populated fields plus extension-bag members, fields winning
    /// on name collision.
    pub fn to_document(&self) -> Value {
        let mut document = serde_json::Map::new();
        for (member, value) in &self.extension {
            document.insert(member.clone(), value.clone());
        }
        for (field, value) in &self.fields {
            document.insert(field.clone(), value.clone());
        }
        Value::Object(document)
    }

    /// Read a document, treating every member as a known field.
    pub fn from_document(document: &Value) -> Result<Self> {
        let members = as_object(document)?;
        let mut record = Self::new();
        for (member, value) in members {
            record.fields.insert(member.clone(), value.clone());
        }
        Ok(record)
    }

    /// Read a document, routing members not in `known` into the extension
    /// bag. The extension bag re-emits verbatim on [`SparseRecord::to_document`],
    /// so mixed documents round-trip losslessly.
    pub fn from_document_with_known(document: &Value, known: &[&str]) -> Result<Self> {
        let members = as_object(document)?;
        let mut record = Self::new();
        for (member, value) in members {
            if known.contains(&member.as_str()) {
                record.fields.insert(member.clone(), value.clone());
            } else {
                record.extension.insert(member.clone(), value.clone());
            }
        }
        Ok(record)
    }
}

fn as_object(document: &Value) -> Result<&serde_json::Map<String, Value>> {
    document.as_object().ok_or_else(|| {
        Error::InvalidDocument(format!("expected an object, got {}", value_kind(document)))
    })
}

impl Default for SparseRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SparseRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseRecord")
            .field("fields", &self.fields)
            .field("extension", &self.extension)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Clone for SparseRecord {
    /// Observers are runtime wiring, not data; clones start with none.
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            extension: self.extension.clone(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }
}

impl PartialEq for SparseRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.extension == other.extension
    }
}

impl Serialize for SparseRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SparseRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SparseRecord::from_document(&value).map_err(serde::de::Error::custom)
    }
}
