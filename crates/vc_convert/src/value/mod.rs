//! The JSON-compatible value tree produced by reads and consumed by writes.
//!
//! ## Menu
//!
//! - [`Value`]: a node of the tree.
//! - [`Number`]: an integer or float, without loss for 64-bit integers.
//! - [`ObjectMap`]: an insertion-ordered string map with unique keys.
//! - [`to_value`] / [`from_value`]: bridges to any `serde` type.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::hash::FixedHashState;

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use de::{ValueDeserializer, from_value};
pub use ser::{ValueError, ValueSerializer, to_value};

pub(crate) use ser::{float_value, wide_int_value};

// -----------------------------------------------------------------------------
// Number

/// A JSON number.
///
/// Integers keep their full 64-bit range. [`NegInt`](Number::NegInt) only
/// ever holds negative values, so two equal integers always compare equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

impl Number {
    /// Returns the value as `u64` if it is a non-negative integer.
    #[inline]
    pub const fn as_u64(&self) -> Option<u64> {
        match *self {
            Number::PosInt(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer in range.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::PosInt(n) => i64::try_from(n).ok(),
            Number::NegInt(n) => Some(n),
            Number::Float(_) => None,
        }
    }

    /// Returns the value as `i128` if it is an integer, or a float with no
    /// fractional part.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Number::PosInt(n) => Some(i128::from(n)),
            Number::NegInt(n) => Some(i128::from(n)),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                // Saturating cast; values beyond `i128` are not representable anyway.
                Some(f as i128)
            }
            Number::Float(_) => None,
        }
    }

    /// Returns the value as `f64`, possibly losing precision.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::PosInt(n) => n as f64,
            Number::NegInt(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    #[inline]
    pub const fn is_integer(&self) -> bool {
        !matches!(self, Number::Float(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::PosInt(n) => fmt::Display::fmt(n, f),
            Number::NegInt(n) => fmt::Display::fmt(n, f),
            Number::Float(n) => fmt::Display::fmt(n, f),
        }
    }
}

macro_rules! impl_number_from {
    (unsigned: $($ty:ty),*) => {$(
        impl From<$ty> for Number {
            #[inline]
            fn from(value: $ty) -> Self {
                Number::PosInt(value as u64)
            }
        }
    )*};
    (signed: $($ty:ty),*) => {$(
        impl From<$ty> for Number {
            #[inline]
            fn from(value: $ty) -> Self {
                if value < 0 {
                    Number::NegInt(value as i64)
                } else {
                    Number::PosInt(value as u64)
                }
            }
        }
    )*};
}

impl_number_from!(unsigned: u8, u16, u32, u64, usize);
impl_number_from!(signed: i8, i16, i32, i64, isize);

impl From<f32> for Number {
    #[inline]
    fn from(value: f32) -> Self {
        Number::Float(f64::from(value))
    }
}

impl From<f64> for Number {
    #[inline]
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

// -----------------------------------------------------------------------------
// ObjectMap

/// An insertion-ordered map from strings to [`Value`]s.
///
/// Inserting an existing key replaces the value in place and keeps the
/// original position.
#[derive(Clone, Default)]
pub struct ObjectMap {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize, FixedHashState>,
}

impl ObjectMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, FixedHashState),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(&slot) = self.index.get(key.as_str()) {
            return Some(core::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.index.get(key).map(|&slot| &mut self.entries[slot].1)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Removes `key`, shifting later entries forward.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[inline]
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    #[inline]
    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl PartialEq for ObjectMap {
    /// Key order does not take part in equality.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|other| other == value))
    }
}

impl fmt::Debug for ObjectMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = ObjectMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>> Extend<(K, Value)> for ObjectMap {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, Value);
    type IntoIter = alloc::vec::IntoIter<(String, Value)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// -----------------------------------------------------------------------------
// Value

/// A node of a JSON-compatible value tree.
///
/// # Examples
///
/// ```
/// use vc_convert::value::{ObjectMap, Value};
///
/// let mut object = ObjectMap::new();
/// object.insert("name", Value::from("roland"));
/// object.insert("tags", Value::from(vec![Value::from("a"), Value::from("b")]));
/// let value = Value::Object(object);
///
/// assert_eq!(value.get("name").and_then(Value::as_str), Some("roland"));
/// assert_eq!(value.to_string(), r#"{"name":"roland","tags":["a","b"]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(ObjectMap),
}

impl Value {
    /// The name of this node's variant, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` if this is an object.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Looks up `index` if this is an array.
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Renders scalars as plain text and everything else as JSON.
    ///
    /// ```
    /// use vc_convert::value::Value;
    ///
    /// assert_eq!(Value::from("a/b").to_text(), "a/b");
    /// assert_eq!(Value::from(7_u8).to_text(), "7");
    /// assert_eq!(Value::Array(vec![Value::Null]).to_text(), "[null]");
    /// ```
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            Value::Number(n) => Cow::Owned(alloc::format!("{n}")),
            Value::Array(_) | Value::Object(_) => Cow::Owned(alloc::format!("{self}")),
        }
    }
}

impl fmt::Display for Value {
    /// Formats the value as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Number> for Value {
    #[inline]
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

macro_rules! impl_value_from_number {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Value::Number(Number::from(value))
            }
        }
    )*};
}

impl_value_from_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(String::from(value))
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Cow<'_, str>> for Value {
    #[inline]
    fn from(value: Cow<'_, str>) -> Self {
        Value::String(value.into_owned())
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ObjectMap> for Value {
    #[inline]
    fn from(value: ObjectMap) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().collect())
    }
}

vc_reflect::impl_reflect_opaque!(Value);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::{Number, ObjectMap, Value};

    #[test]
    fn object_keeps_insertion_order() {
        let mut map = ObjectMap::new();
        map.insert("b", Value::from(1_u8));
        map.insert("a", Value::from(2_u8));
        map.insert("b", Value::from(3_u8));

        assert_eq!(map.keys().collect::<vec::Vec<_>>(), ["b", "a"]);
        assert_eq!(map.get("b"), Some(&Value::from(3_u8)));

        assert_eq!(map.remove("b"), Some(Value::from(3_u8)));
        map.insert("c", Value::Null);
        assert_eq!(map.keys().collect::<vec::Vec<_>>(), ["a", "c"]);
        assert_eq!(map.get("c"), Some(&Value::Null));
    }

    #[test]
    fn object_equality_ignores_order() {
        let left: ObjectMap = [("x", Value::from(1_u8)), ("y", Value::Null)].into_iter().collect();
        let right: ObjectMap = [("y", Value::Null), ("x", Value::from(1_u8))].into_iter().collect();
        assert_eq!(left, right);
    }

    #[test]
    fn signed_numbers_normalize() {
        assert_eq!(Number::from(5_i32), Number::PosInt(5));
        assert_eq!(Number::from(-5_i32), Number::NegInt(-5));
        assert_eq!(Number::from(u64::MAX).as_i64(), None);
        assert_eq!(Number::Float(3.0).as_i128(), Some(3));
        assert_eq!(Number::Float(3.5).as_i128(), None);
    }

    #[test]
    fn display_is_compact_json() {
        let value: Value = [
            ("n", Value::from(-1_i8)),
            ("s", Value::from("q\"")),
            ("list", Value::from(vec![Value::Bool(true), Value::Null])),
        ]
        .into_iter()
        .collect();

        assert_eq!(value.to_string(), r#"{"n":-1,"s":"q\"","list":[true,null]}"#);
    }
}
