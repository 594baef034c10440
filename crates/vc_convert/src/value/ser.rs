use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde_core::ser::{self, Serialize, SerializeMap as _, SerializeSeq as _, Serializer};

use super::{Number, ObjectMap, Value};

// -----------------------------------------------------------------------------
// ValueError

/// An error raised while converting between [`Value`] and `serde` types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError(String);

impl ValueError {
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValueError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for ValueError {}

impl ser::Error for ValueError {
    #[inline]
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ValueError(msg.to_string())
    }
}

impl serde_core::de::Error for ValueError {
    #[inline]
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ValueError(msg.to_string())
    }
}

// -----------------------------------------------------------------------------
// Serialize for Value

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Number::PosInt(n) => serializer.serialize_u64(n),
            Number::NegInt(n) => serializer.serialize_i64(n),
            Number::Float(n) => serializer.serialize_f64(n),
        }
    }
}

impl Serialize for ObjectMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => map.serialize(serializer),
        }
    }
}

// -----------------------------------------------------------------------------
// to_value

/// Converts any `serde` serializable value into a [`Value`].
///
/// Enums use the externally tagged layout: a unit variant becomes its name,
/// other variants become `{ name: payload }`. Non-finite floats become the
/// strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
///
/// ```
/// use vc_convert::value::{Value, to_value};
///
/// let value = to_value(&(1_u8, "two", [3.5_f32])).unwrap();
/// assert_eq!(value.to_string(), r#"[1,"two",[3.5]]"#);
///
/// assert_eq!(to_value(&f64::NAN).unwrap(), Value::from("NaN"));
/// ```
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ValueError> {
    value.serialize(ValueSerializer)
}

/// Lowers a float, spelling out the values JSON has no literal for.
pub(crate) fn float_value(value: f64) -> Value {
    if value.is_finite() {
        Value::Number(Number::Float(value))
    } else if value.is_nan() {
        Value::String("NaN".to_owned())
    } else if value > 0.0 {
        Value::String("Infinity".to_owned())
    } else {
        Value::String("-Infinity".to_owned())
    }
}

pub(crate) fn wide_int_value(value: i128) -> Value {
    if let Ok(n) = u64::try_from(value) {
        Value::Number(Number::PosInt(n))
    } else if let Ok(n) = i64::try_from(value) {
        Value::Number(Number::NegInt(n))
    } else {
        Value::String(value.to_string())
    }
}

// -----------------------------------------------------------------------------
// ValueSerializer

/// A [`Serializer`] whose output is a [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ValueError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantMapBuilder;

    #[inline]
    fn serialize_bool(self, v: bool) -> Result<Value, ValueError> {
        Ok(Value::Bool(v))
    }

    #[inline]
    fn serialize_i8(self, v: i8) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_i16(self, v: i16) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_i32(self, v: i32) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_i64(self, v: i64) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_i128(self, v: i128) -> Result<Value, ValueError> {
        Ok(wide_int_value(v))
    }

    #[inline]
    fn serialize_u8(self, v: u8) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_u16(self, v: u16) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_u32(self, v: u32) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    #[inline]
    fn serialize_u64(self, v: u64) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, ValueError> {
        match u64::try_from(v) {
            Ok(n) => Ok(Value::from(n)),
            Err(_) => Ok(Value::String(v.to_string())),
        }
    }

    #[inline]
    fn serialize_f32(self, v: f32) -> Result<Value, ValueError> {
        Ok(float_value(f64::from(v)))
    }

    #[inline]
    fn serialize_f64(self, v: f64) -> Result<Value, ValueError> {
        Ok(float_value(v))
    }

    #[inline]
    fn serialize_char(self, v: char) -> Result<Value, ValueError> {
        Ok(Value::String(v.to_string()))
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<Value, ValueError> {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, ValueError> {
        Ok(v.iter().copied().map(Value::from).collect())
    }

    #[inline]
    fn serialize_none(self) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    #[inline]
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, ValueError> {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, ValueError> {
        Ok(Value::from(variant))
    }

    #[inline]
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        let mut map = ObjectMap::with_capacity(1);
        map.insert(variant, value.serialize(self)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqBuilder, ValueError> {
        Ok(VariantSeqBuilder {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, ValueError> {
        Ok(MapBuilder {
            map: ObjectMap::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder, ValueError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantMapBuilder, ValueError> {
        Ok(VariantMapBuilder {
            variant,
            map: ObjectMap::with_capacity(len),
        })
    }
}

// -----------------------------------------------------------------------------
// Compound builders

#[doc(hidden)]
pub struct SeqBuilder {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    #[inline]
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    #[inline]
    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    #[inline]
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    #[inline]
    fn end(self) -> Result<Value, ValueError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    #[inline]
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    #[inline]
    fn end(self) -> Result<Value, ValueError> {
        ser::SerializeSeq::end(self)
    }
}

#[doc(hidden)]
pub struct VariantSeqBuilder {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    #[inline]
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        let mut map = ObjectMap::with_capacity(1);
        map.insert(self.variant, Value::Array(self.items));
        Ok(Value::Object(map))
    }
}

#[doc(hidden)]
pub struct MapBuilder {
    map: ObjectMap,
    key: Option<String>,
}

/// Object keys must come out as text. Numbers and booleans are rendered,
/// anything structured is rejected.
fn key_text(key: Value) -> Result<String, ValueError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ValueError(alloc::format!(
            "map key must be a string, found {}",
            other.kind_name()
        ))),
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ValueError> {
        self.key = Some(key_text(key.serialize(ValueSerializer)?)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        let Some(key) = self.key.take() else {
            return Err(ValueError("map value serialized before its key".to_owned()));
        };
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    #[inline]
    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = Value;
    type Error = ValueError;

    #[inline]
    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    #[inline]
    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Object(self.map))
    }
}

#[doc(hidden)]
pub struct VariantMapBuilder {
    variant: &'static str,
    map: ObjectMap,
}

impl ser::SerializeStructVariant for VariantMapBuilder {
    type Ok = Value;
    type Error = ValueError;

    #[inline]
    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        let mut outer = ObjectMap::with_capacity(1);
        outer.insert(self.variant, Value::Object(self.map));
        Ok(Value::Object(outer))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::{String, ToString};
    use alloc::vec;

    use serde::Serialize;

    use super::to_value;
    use crate::value::Value;

    #[derive(Serialize)]
    enum Event {
        Started,
        Moved { x: i32, y: i32 },
        Renamed(String),
        Pair(u8, u8),
    }

    #[test]
    fn enums_are_externally_tagged() {
        let events = vec![
            Event::Started,
            Event::Moved { x: 1, y: -2 },
            Event::Renamed("x".to_string()),
            Event::Pair(1, 2),
        ];
        let value = to_value(&events).unwrap();
        assert_eq!(
            value.to_string(),
            r#"["Started",{"Moved":{"x":1,"y":-2}},{"Renamed":"x"},{"Pair":[1,2]}]"#
        );
    }

    #[test]
    fn numeric_map_keys_become_text() {
        let map = BTreeMap::from([(1_u32, true), (20, false)]);
        let value = to_value(&map).unwrap();
        assert_eq!(value.get("20"), Some(&Value::Bool(false)));
    }

    #[test]
    fn wide_integers_fall_back_to_text() {
        assert_eq!(to_value(&u128::MAX).unwrap(), Value::from(u128::MAX.to_string()));
        assert_eq!(to_value(&-3_i128).unwrap(), Value::from(-3_i64));
    }

    #[test]
    fn json_round_trip() {
        let text = r#"{"a":[1,-2,2.5,"x",null,true],"b":{}}"#;
        let value: Value = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), text);
    }
}
