use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::value::BorrowedStrDeserializer;
use serde_core::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde_core::Deserialize;

use super::ser::ValueError;
use super::{Number, ObjectMap, Value};

// -----------------------------------------------------------------------------
// Deserialize for Value

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON-compatible value")
    }

    #[inline]
    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    #[inline]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    #[inline]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(match (u64::try_from(v), i64::try_from(v)) {
            (Ok(n), _) => Value::from(n),
            (_, Ok(n)) => Value::from(n),
            _ => Value::String(v.to_string()),
        })
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(match u64::try_from(v) {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(v.to_string()),
        })
    }

    #[inline]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(Number::Float(v)))
    }

    #[inline]
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    #[inline]
    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    #[inline]
    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    #[inline]
    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    #[inline]
    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    #[inline]
    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = ObjectMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

// -----------------------------------------------------------------------------
// from_value

/// Builds any `serde` deserializable type from a [`Value`].
///
/// ```
/// use vc_convert::value::{Value, from_value};
///
/// let value: Value = serde_json::from_str(r#"{"a": [1, 2], "b": null}"#).unwrap();
///
/// #[derive(serde::Deserialize, Debug, PartialEq)]
/// struct Pair {
///     a: Vec<u8>,
///     b: Option<bool>,
/// }
///
/// let pair: Pair = from_value(&value).unwrap();
/// assert_eq!(pair, Pair { a: vec![1, 2], b: None });
/// ```
#[inline]
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, ValueError> {
    T::deserialize(ValueDeserializer::new(value))
}

// -----------------------------------------------------------------------------
// ValueDeserializer

/// A [`Deserializer`] reading from a borrowed [`Value`].
#[derive(Debug, Clone, Copy)]
pub struct ValueDeserializer<'de> {
    value: &'de Value,
}

impl<'de> ValueDeserializer<'de> {
    #[inline]
    pub const fn new(value: &'de Value) -> Self {
        Self { value }
    }
}

macro_rules! forward_to_any {
    ($($method:ident)*) => {$(
        #[inline]
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValueError> {
            self.deserialize_any(visitor)
        }
    )*};
}

impl<'de> Deserializer<'de> for ValueDeserializer<'de> {
    type Error = ValueError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValueError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(Number::PosInt(n)) => visitor.visit_u64(*n),
            Value::Number(Number::NegInt(n)) => visitor.visit_i64(*n),
            Value::Number(Number::Float(n)) => visitor.visit_f64(*n),
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Array(items) => visitor.visit_seq(SeqReader {
                items: items.iter(),
            }),
            Value::Object(map) => visitor.visit_map(MapReader {
                entries: map.iter(),
                value: None,
            }),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValueError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        self.deserialize_any(visitor)
    }

    #[inline]
    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        match self.value {
            Value::String(variant) => visitor.visit_enum(VariantReader {
                variant,
                payload: None,
            }),
            Value::Object(map) if map.len() == 1 => {
                let Some((variant, payload)) = map.iter().next() else {
                    return Err(ValueError::custom_enum(name));
                };
                visitor.visit_enum(VariantReader {
                    variant,
                    payload: Some(payload),
                })
            }
            _ => Err(ValueError::custom_enum(name)),
        }
    }

    forward_to_any! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char deserialize_str
        deserialize_string deserialize_bytes deserialize_byte_buf deserialize_unit
        deserialize_seq deserialize_map deserialize_identifier deserialize_ignored_any
    }
}

impl ValueError {
    fn custom_enum(name: &str) -> Self {
        <Self as de::Error>::custom(alloc::format!(
            "expected a variant name or a single-entry object for enum `{name}`"
        ))
    }
}

// -----------------------------------------------------------------------------
// Access helpers

struct SeqReader<'de> {
    items: core::slice::Iter<'de, Value>,
}

impl<'de> SeqAccess<'de> for SeqReader<'de> {
    type Error = ValueError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, ValueError> {
        match self.items.next() {
            Some(item) => seed.deserialize(ValueDeserializer::new(item)).map(Some),
            None => Ok(None),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapReader<'de, I> {
    entries: I,
    value: Option<&'de Value>,
}

impl<'de, I> MapAccess<'de> for MapReader<'de, I>
where
    I: ExactSizeIterator<Item = (&'de str, &'de Value)>,
{
    type Error = ValueError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, ValueError> {
        match self.entries.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, ValueError> {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(<ValueError as de::Error>::custom(
                "map value requested before its key",
            )),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct VariantReader<'de> {
    variant: &'de str,
    payload: Option<&'de Value>,
}

impl<'de> EnumAccess<'de> for VariantReader<'de> {
    type Error = ValueError;
    type Variant = PayloadReader<'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, PayloadReader<'de>), ValueError> {
        let variant = seed.deserialize(BorrowedStrDeserializer::new(self.variant))?;
        Ok((
            variant,
            PayloadReader {
                payload: self.payload,
            },
        ))
    }
}

struct PayloadReader<'de> {
    payload: Option<&'de Value>,
}

impl PayloadReader<'_> {
    fn missing() -> ValueError {
        <ValueError as de::Error>::custom("enum variant is missing its payload")
    }
}

impl<'de> VariantAccess<'de> for PayloadReader<'de> {
    type Error = ValueError;

    fn unit_variant(self) -> Result<(), ValueError> {
        match self.payload {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(<ValueError as de::Error>::custom(alloc::format!(
                "unit variant carries a {} payload",
                other.kind_name()
            ))),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, ValueError> {
        match self.payload {
            Some(payload) => seed.deserialize(ValueDeserializer::new(payload)),
            None => Err(Self::missing()),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, ValueError> {
        match self.payload {
            Some(payload) => ValueDeserializer::new(payload).deserialize_any(visitor),
            None => Err(Self::missing()),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        match self.payload {
            Some(payload) => ValueDeserializer::new(payload).deserialize_any(visitor),
            None => Err(Self::missing()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use serde::Deserialize;

    use super::from_value;
    use crate::value::{Value, to_value};

    #[derive(Deserialize, Debug, PartialEq)]
    enum Mode {
        Off,
        Level(u8),
        Window { from: u32, to: u32 },
    }

    #[test]
    fn enums_read_externally_tagged() {
        let value: Value = serde_json::from_str(
            r#"["Off", {"Level": 3}, {"Window": {"from": 1, "to": 9}}]"#,
        )
        .unwrap();
        let modes: Vec<Mode> = from_value(&value).unwrap();
        assert_eq!(modes, [Mode::Off, Mode::Level(3), Mode::Window { from: 1, to: 9 }]);
    }

    #[test]
    fn out_of_range_integer_is_an_error() {
        let err = from_value::<u8>(&Value::from(300_u32)).unwrap_err();
        assert!(err.message().contains("300"));
    }

    #[test]
    fn ron_text_reads_into_value_and_back() {
        let value: Value = ron::from_str(r#"{"name": "roland", "tags": ["a", "b"]}"#).unwrap();
        let tags: Vec<String> = from_value(value.get("tags").unwrap()).unwrap();
        assert_eq!(tags, ["a", "b"]);
        assert_eq!(to_value(&value).unwrap(), value);
    }
}
