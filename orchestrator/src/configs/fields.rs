//! Name-driven binding of decoded JSON values onto typed configuration fields.
//!
//! Every bindable type publishes an explicit table from field name to a
//! typed [`FieldSlot`]. Names absent from the table simply do not bind.

use serde_json::Value;

use crate::assets::{AssetKind, AssetRef, AssetResolver};

/// Values closer to zero than this coerce to `false`.
const BOOL_EPSILON: f64 = 1.0e-8;

/// An enumeration that can be assigned by variant name.
pub trait EnumField {
    /// Every legal variant name, in declaration order.
    fn names(&self) -> &'static [&'static str];

    /// Sets the variant at `index` of [`EnumField::names`].
    fn set_index(&mut self, index: usize);
}

/// A mutable view of one named field together with its kind.
pub enum FieldSlot<'a> {
    Bool(&'a mut bool),
    Int(&'a mut i32),
    Float(&'a mut f32),
    Enum(&'a mut dyn EnumField),
    IntArray(&'a mut Vec<i32>),
    Reference {
        slot: &'a mut Option<AssetRef>,
        kind: AssetKind,
    },
}

/// A configuration object whose fields can be set by name.
pub trait Bindable {
    /// Every name [`Bindable::field`] answers to.
    fn field_names(&self) -> &'static [&'static str];

    /// Looks up a field by name.
    ///
    /// # Returns
    /// `None` if the type has no field with that name.
    fn field(&mut self, name: &str) -> Option<FieldSlot<'_>>;
}

/// Applies JSON values to [`Bindable`] targets.
pub struct Binder<'r> {
    resolver: &'r dyn AssetResolver,
}

impl<'r> Binder<'r> {
    /// Creates a new `Binder`.
    ///
    /// # Args
    /// * `resolver` - Used to resolve object-reference fields.
    pub fn new(resolver: &'r dyn AssetResolver) -> Self {
        Self { resolver }
    }

    /// Coerces `value` to the kind of the field `name` on `target` and sets it.
    ///
    /// # Returns
    /// `false`, leaving `target` untouched, if the field is unknown or the
    /// value cannot be coerced to the field's kind.
    pub fn bind(&self, target: &mut dyn Bindable, name: &str, value: &Value) -> bool {
        match target.field(name) {
            Some(slot) => self.assign(slot, value),
            None => false,
        }
    }

    fn assign(&self, slot: FieldSlot<'_>, value: &Value) -> bool {
        match slot {
            FieldSlot::Bool(field) => set(field, to_bool(value)),
            FieldSlot::Int(field) => set(field, to_int(value)),
            FieldSlot::Float(field) => set(field, value.as_f64().map(|n| n as f32)),
            FieldSlot::Enum(field) => {
                let index = value
                    .as_str()
                    .and_then(|name| match_enum_name(field.names(), name));
                match index {
                    Some(index) => {
                        field.set_index(index);
                        true
                    }
                    None => false,
                }
            }
            FieldSlot::IntArray(field) => set(field, to_int_array(value)),
            FieldSlot::Reference { slot, kind } => {
                let asset = value
                    .as_str()
                    .and_then(|path| self.resolver.load(path, kind));
                set(slot, asset.map(Some))
            }
        }
    }
}

fn set<T>(field: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *field = value;
            true
        }
        None => false,
    }
}

/// Accepts booleans, and numbers by non-zero truthiness.
pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n.abs() > BOOL_EPSILON),
        _ => None,
    }
}

/// Accepts numbers, rounding to the nearest integer with halves rounded up.
pub fn to_int(value: &Value) -> Option<i32> {
    value.as_f64().map(round_to_int)
}

/// Accepts arrays, keeping only their numeric elements.
pub fn to_int_array(value: &Value) -> Option<Vec<i32>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_f64)
            .map(round_to_int)
            .collect(),
    )
}

fn round_to_int(n: f64) -> i32 {
    (n + 0.5).floor() as i32
}

/// Finds `name` among `names`, exact match first, then ignoring case.
pub fn match_enum_name(names: &[&str], name: &str) -> Option<usize> {
    names.iter().position(|n| *n == name).or_else(|| {
        let wanted = name.trim().to_uppercase();
        names.iter().position(|n| n.to_uppercase() == wanted)
    })
}
