//! Typed entity seams over the sparse store.
//!
//! Strongly-typed entities are thin wrappers around a [`SparseRecord`]:
//! generated getter/setter pairs delegate to the sparse store by field name,
//! so sparseness, change notification, and the extension bag come for free.
//! Identity and version ordering read the well-known `id` and `modified`
//! fields.

use crate::{record::SparseRecord, Timestamp};
use serde_json::Value;

/// Well-known identity field.
pub const ID_FIELD: &str = "id";

/// Well-known version-marker field.
pub const MODIFIED_FIELD: &str = "modified";

/// Access to the sparse store backing a typed entity.
pub trait SparseEntity {
    fn record(&self) -> &SparseRecord;
    fn record_mut(&mut self) -> &mut SparseRecord;
}

impl SparseEntity for SparseRecord {
    fn record(&self) -> &SparseRecord {
        self
    }

    fn record_mut(&mut self) -> &mut SparseRecord {
        self
    }
}

/// Identity-bearing records.
///
/// Two records are the same logical entity iff both identities are present,
/// non-empty, and equal. `None` means the record has no identity and is
/// never equal to anything, itself included.
pub trait Identified {
    fn identity(&self) -> Option<&str>;
}

/// Version-marked records, totally ordered by the marker.
pub trait Versioned {
    fn version_marker(&self) -> Option<Timestamp>;
}

impl<T: SparseEntity> Identified for T {
    fn identity(&self) -> Option<&str> {
        self.record()
            .value(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

impl<T: SparseEntity> Versioned for T {
    fn version_marker(&self) -> Option<Timestamp> {
        self.record().value(MODIFIED_FIELD).and_then(Value::as_u64)
    }
}

/// Assign older/newer roles by version marker.
///
/// Returns `(older, newer)`. Ties resolve with `left` as the newer side;
/// callers must treat tie order as implementation-defined. A record without
/// a marker is older than any record with one.
pub fn version_order<'a, T: Versioned>(left: &'a T, right: &'a T) -> (&'a T, &'a T) {
    if left.version_marker() >= right.version_marker() {
        (right, left)
    } else {
        (left, right)
    }
}

/// Generate a typed entity over a [`SparseRecord`].
///
/// Each `getter / setter : Type` line produces a getter reading the field by
/// name (neutral default when unset) and a setter writing through
/// [`SparseRecord::set`], so equal-value writes stay no-ops and change events
/// fire as usual. Field types must be `Serialize + DeserializeOwned + Default`;
/// a value that fails to serialize is not written and the setter returns
/// `None`.
///
/// The generated `Deserialize` impl routes document members outside the
/// declared field list into the extension bag; `Serialize` re-emits them
/// verbatim, preserving the lossless round-trip for unknown structure.
///
/// ```rust
/// use converge::{sparse_fields, Identified};
///
/// sparse_fields! {
///     pub struct Contact {
///         id / set_id: String,
///         name / set_name: String,
///         modified / set_modified: u64,
///     }
/// }
///
/// let mut contact = Contact::new();
/// contact.set_id("c-1".to_string());
/// contact.set_name("Alice".to_string());
/// assert_eq!(contact.name(), "Alice");
/// assert_eq!(contact.identity(), Some("c-1"));
/// ```
#[macro_export]
macro_rules! sparse_fields {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_meta:meta])* $getter:ident / $setter:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            record: $crate::SparseRecord,
        }

        impl $name {
            /// Fields this entity recognizes; all other document members land
            /// in the extension bag.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($getter)),+];

            pub fn new() -> Self {
                Self::default()
            }

            $(
                $(#[$field_meta])*
                pub fn $getter(&self) -> $ty {
                    self.record.get(stringify!($getter))
                }

                pub fn $setter(&mut self, value: $ty) -> Option<$crate::ChangeKind> {
                    match $crate::serde_json::to_value(value) {
                        Ok(value) => self.record.set(stringify!($getter), value),
                        Err(_) => None,
                    }
                }
            )+
        }

        impl $crate::SparseEntity for $name {
            fn record(&self) -> &$crate::SparseRecord {
                &self.record
            }

            fn record_mut(&mut self) -> &mut $crate::SparseRecord {
                &mut self.record
            }
        }

        impl From<$crate::SparseRecord> for $name {
            fn from(record: $crate::SparseRecord) -> Self {
                Self { record }
            }
        }

        impl $crate::serde::Serialize for $name {
            fn serialize<S: $crate::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                $crate::serde::Serialize::serialize(&self.record, serializer)
            }
        }

        impl<'de> $crate::serde::Deserialize<'de> for $name {
            fn deserialize<D: $crate::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let value = <$crate::serde_json::Value as $crate::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                let record =
                    $crate::SparseRecord::from_document_with_known(&value, Self::FIELDS)
                        .map_err($crate::serde::de::Error::custom)?;
                Ok(Self { record })
            }
        }
    };
}
