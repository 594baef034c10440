use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use vc_reflect::{Reflect, ReflectKind, ReflectMut, ReflectRef};

use super::{Accessor, Nesting};
use crate::context::{SerializeContext, WriteContext};
use crate::error::{ConvertError, ValueParseError};
use crate::registry::AccessorRegistry;
use crate::value::Value;

/// Maps lower to objects keyed by the rendered map key.
///
/// Text keys are used as they are, other keys are lowered and printed (see
/// [`SerializeContext::render_key`]). Writing to an absent key inserts it,
/// parsing the key into the map's key type.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapAccessor;

impl Accessor for MapAccessor {
    fn name(&self) -> &'static str {
        "map"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        value.reflect_kind() == ReflectKind::Map
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Keyed
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let entries = self.children(cx, value)?;
        cx.lower_entries(entries)
    }

    fn child<'v>(
        &self,
        cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        if let ReflectRef::Map(map) = value.reflect_ref() {
            for (k, v) in map.iter() {
                if cx.render_key(k)? == key {
                    return Ok(v);
                }
            }
        }
        Err(ConvertError::path_not_found(key, value))
    }

    fn children<'v>(
        &self,
        cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        let ReflectRef::Map(map) = value.reflect_ref() else {
            return Ok(Vec::new());
        };
        let cap = cx.collection_cap();
        let mut entries = Vec::with_capacity(map.len().min(cap));
        for (k, v) in map.iter().take(cap) {
            entries.push((cx.render_key(k)?, v));
        }
        Ok(entries)
    }

    #[inline]
    fn can_write(&self) -> bool {
        true
    }

    fn child_mut<'v>(
        &self,
        wx: &mut WriteContext<'_>,
        container: &'v mut dyn Reflect,
        key: &str,
    ) -> Result<&'v mut dyn Reflect, ConvertError> {
        let type_path = container.type_path();
        let ReflectMut::Map(map) = container.reflect_mut() else {
            return Err(ConvertError::not_writable(type_path));
        };
        for (k, v) in map.iter_mut() {
            if wx.render_key(k)? == key {
                return Ok(v);
            }
        }
        Err(ConvertError::PathNotFound {
            segment: String::from(key),
            type_path,
        })
    }

    fn write(
        &self,
        wx: &mut WriteContext<'_>,
        container: &mut dyn Reflect,
        key: &str,
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        let type_path = container.type_path();
        let ReflectMut::Map(map) = container.reflect_mut() else {
            return Err(ConvertError::not_writable(type_path));
        };

        let mut existing = None;
        for (k, v) in map.iter_mut() {
            if wx.render_key(k)? == key {
                existing = Some(v);
                break;
            }
        }
        if let Some(slot) = existing {
            return wx.assign(slot, value);
        }

        let new_key = wx.parse(map.key_type(), &Value::from(key))?;
        let new_value = wx.parse(map.value_type(), value)?;
        map.insert_boxed(new_key, new_value)
            .map_err(|err| ValueParseError::from_text(type_path, key, format!("{err}")).into())
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::{String, ToString};

    use crate::config::{Limit, SerializeConfig};
    use crate::error::ConvertError;
    use crate::value::Value;
    use crate::{Converter, Path};

    #[test]
    fn keys_are_rendered() {
        let converter = Converter::new();
        let config = SerializeConfig::default();

        let by_name = BTreeMap::from([(String::from("a"), 1_u8), (String::from("b"), 2)]);
        let value = converter.serialize(&by_name, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"a":1,"b":2}"#);

        let by_id = BTreeMap::from([(10_u32, "ten"), (2, "two")]);
        let value = converter.serialize(&by_id, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"2":"two","10":"ten"}"#);

        let ten = converter.serialize(&by_id, &"10".parse::<Path>().unwrap(), &config).unwrap();
        assert_eq!(ten, Value::from("ten"));
        let err = converter.serialize(&by_id, &"3".parse::<Path>().unwrap(), &config).unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));
    }

    #[test]
    fn star_inside_a_key_is_literal() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let map = BTreeMap::from([(String::from("a*b"), 1_u8), (String::from("*"), 2), (String::from("c"), 3)]);

        let value = converter.serialize(&map, &"a*b".parse::<Path>().unwrap(), &config).unwrap();
        assert_eq!(value, Value::from(1_u8));
        let value = converter.serialize(&map, &"!*".parse::<Path>().unwrap(), &config).unwrap();
        assert_eq!(value, Value::from(2_u8));
        let value = converter.serialize(&map, &"*".parse::<Path>().unwrap(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"*":2,"a*b":1,"c":3}"#);
    }

    #[test]
    fn capped_maps_keep_iteration_order() {
        let config = SerializeConfig::default().with_max_collection_size(Limit::At(1));
        let map = BTreeMap::from([(1_u8, true), (2, false)]);
        let value = Converter::new().serialize(&map, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"1":true}"#);
    }

    #[test]
    fn writes_replace_or_insert() {
        let converter = Converter::new();
        let mut map = BTreeMap::from([(1_u16, String::from("one"))]);

        let old = converter
            .set_value(&mut map, &"1".parse::<Path>().unwrap(), &Value::from("uno"))
            .unwrap();
        assert_eq!(old.unwrap().take::<String>().unwrap(), "one");

        let old = converter
            .set_value(&mut map, &"2".parse::<Path>().unwrap(), &Value::from("dos"))
            .unwrap();
        assert!(old.is_none());
        assert_eq!(map.get(&2).map(String::as_str), Some("dos"));

        let err = converter
            .set_value(&mut map, &"two".parse::<Path>().unwrap(), &Value::from("x"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Conversion(_)));
    }
}
