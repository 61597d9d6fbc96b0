//! Applying loosely-typed deltas to strongly-typed values.
//!
//! A delta is a JSON object whose members target the named members of a
//! [`Patchable`] value. Scalars and arrays assign directly; nested object
//! deltas recurse into nested patchable members, default-constructing them
//! when absent. The patcher prunes as it goes: the returned delta contains
//! only the members that actually changed something, so callers can forward
//! it as a minimal update.

use crate::{
    error::{Error, Result},
    path::value_kind,
};
use serde_json::{Map, Value};

/// A value whose members can be patched by name from a JSON delta.
///
/// Implement with [`impl_patchable!`](crate::impl_patchable) rather than by
/// hand: the macro derives member lookup, typed assignment, and nested
/// descent from a plain field list.
pub trait Patchable {
    /// Whether this value recognizes `member` as one of its own.
    fn has_member(&self, member: &str) -> bool;

    /// Current value of `member`, serialized, if the member is recognized
    /// and serializable.
    fn member(&self, member: &str) -> Option<Value>;

    /// Assign `value` to `member` via typed deserialization.
    fn set_member(&mut self, member: &str, value: &Value) -> Result<()>;

    /// Mutable access to a nested patchable member, default-constructing it
    /// if it is currently absent. `None` means the member is not a nested
    /// patchable.
    fn nested_mut(&mut self, member: &str) -> Option<&mut dyn Patchable>;
}

/// Apply `delta` to `target`, returning the pruned delta of members that
/// actually changed.
///
/// Member handling:
/// - Members the target does not recognize are skipped and left in the
///   returned delta untouched, so layered targets can each take their share.
/// - Scalar and array members assign when the current value differs and are
///   pruned from the result when it is already equal.
/// - Non-empty object members recurse into the nested patchable; the nested
///   result (possibly pruned to empty) replaces the member in the returned
///   delta.
pub fn apply_patch(target: &mut dyn Patchable, delta: &Value) -> Result<Value> {
    let members = delta.as_object().ok_or_else(|| Error::UnsupportedDeltaShape {
        member: "(root)".into(),
        got: value_kind(delta).into(),
    })?;

    let mut applied = members.clone();
    for (name, value) in members {
        if !target.has_member(name) {
            continue;
        }
        match value {
            Value::Object(nested_delta) if !nested_delta.is_empty() => {
                let nested = target
                    .nested_mut(name)
                    .ok_or_else(|| Error::UnsupportedDeltaShape {
                        member: name.clone(),
                        got: "object delta over a non-object member".into(),
                    })?;
                let nested_applied = apply_patch(nested, value)?;
                applied.insert(name.clone(), nested_applied);
            }
            Value::Object(_) => {} // empty object delta, nothing to do
            _ => {
                if target.member(name).as_ref() == Some(value) {
                    applied.remove(name);
                } else {
                    target.set_member(name, value)?;
                }
            }
        }
    }

    Ok(Value::Object(applied))
}

/// Implement [`Patchable`] for a struct from its field lists.
///
/// The `values` list names plainly-assignable members (scalars, arrays,
/// anything `Serialize + DeserializeOwned`); the `nested` list names members
/// of type `Option<T>` where `T: Patchable + Default + Serialize +
/// DeserializeOwned`, entered on object deltas and default-constructed when
/// `None`. A scalar delta leaf over a nested member assigns it directly, so
/// `null` clears the member back to `None`. A values-only form omits the
/// `nested` block.
///
/// ```rust
/// use converge::{apply_patch, impl_patchable};
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Profile {
///     name: String,
///     tags: Vec<String>,
/// }
///
/// impl_patchable!(Profile { values { name: String, tags: Vec<String> } });
///
/// let mut profile = Profile::default();
/// let applied = apply_patch(&mut profile, &json!({"name": "Alice"}))?;
/// assert_eq!(profile.name, "Alice");
/// assert_eq!(applied, json!({"name": "Alice"}));
/// # Ok::<(), converge::Error>(())
/// ```
#[macro_export]
macro_rules! impl_patchable {
    ($name:ty { values { $($field:ident : $fty:ty),* $(,)? } }) => {
        $crate::impl_patchable!($name {
            values { $($field : $fty),* }
            nested { }
        });
    };
    (
        $name:ty {
            values { $($field:ident : $fty:ty),* $(,)? }
            nested { $($nfield:ident : $nty:ty),* $(,)? }
        }
    ) => {
        impl $crate::Patchable for $name {
            fn has_member(&self, member: &str) -> bool {
                const MEMBERS: &[&str] =
                    &[$(stringify!($field),)* $(stringify!($nfield)),*];
                MEMBERS.contains(&member)
            }

            fn member(&self, member: &str) -> Option<$crate::serde_json::Value> {
                match member {
                    $(
                        stringify!($field) => {
                            $crate::serde_json::to_value(&self.$field).ok()
                        }
                    )*
                    $(
                        stringify!($nfield) => {
                            $crate::serde_json::to_value(&self.$nfield).ok()
                        }
                    )*
                    _ => None,
                }
            }

            fn set_member(
                &mut self,
                member: &str,
                value: &$crate::serde_json::Value,
            ) -> $crate::Result<()> {
                match member {
                    $(
                        stringify!($field) => {
                            self.$field = $crate::serde_json::from_value(value.clone())
                                .map_err(|e| $crate::Error::MemberAssign {
                                    member: member.to_string(),
                                    reason: e.to_string(),
                                })?;
                            Ok(())
                        }
                    )*
                    $(
                        stringify!($nfield) => {
                            self.$nfield = $crate::serde_json::from_value(value.clone())
                                .map_err(|e| $crate::Error::MemberAssign {
                                    member: member.to_string(),
                                    reason: e.to_string(),
                                })?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::Error::MemberAssign {
                        member: member.to_string(),
                        reason: "not an assignable member".to_string(),
                    }),
                }
            }

            #[allow(unused_variables)]
            fn nested_mut(
                &mut self,
                member: &str,
            ) -> Option<&mut dyn $crate::Patchable> {
                match member {
                    $(
                        stringify!($nfield) => {
                            Some(self.$nfield.get_or_insert_with(<$nty>::default))
                        }
                    )*
                    _ => None,
                }
            }
        }
    };
}
