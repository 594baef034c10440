use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use vc_reflect::{Reflect, ReflectKind, ReflectMut, ReflectRef};

use super::{Accessor, Nesting, parse_index};
use crate::context::{SerializeContext, WriteContext};
use crate::error::ConvertError;
use crate::path::Segment;
use crate::registry::AccessorRegistry;
use crate::value::Value;

/// Lists, tuples and sets lower to arrays.
///
/// Lists and sets keep at most `max_collection_size` items, tuples are
/// never cut. Newtype structs are transparent. Sets are read-only and
/// have no stable positions, so they can be fanned out but not indexed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceAccessor;

impl Accessor for SequenceAccessor {
    fn name(&self) -> &'static str {
        "sequence"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        matches!(
            value.reflect_kind(),
            ReflectKind::List | ReflectKind::Tuple | ReflectKind::Set
        )
    }

    fn nesting(&self, value: &dyn Reflect) -> Nesting {
        match value.reflect_ref() {
            ReflectRef::Tuple(tuple) if tuple.is_newtype() => Nesting::Transparent,
            _ => Nesting::Indexed,
        }
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let cap = cx.collection_cap();
        match value.reflect_ref() {
            ReflectRef::List(list) => cx.lower_items(list.iter().take(cap)),
            ReflectRef::Set(set) => cx.lower_items(set.iter().take(cap)),
            ReflectRef::Tuple(tuple) if tuple.is_newtype() => match tuple.field(0) {
                Some(inner) => cx.lower(inner),
                None => Ok(Value::Null),
            },
            ReflectRef::Tuple(tuple) => cx.lower_items(tuple.iter_fields()),
            _ => Ok(Value::Null),
        }
    }

    fn inner<'v>(&self, value: &'v dyn Reflect) -> Option<&'v dyn Reflect> {
        match value.reflect_ref() {
            ReflectRef::Tuple(tuple) if tuple.is_newtype() => tuple.field(0),
            _ => None,
        }
    }

    fn inner_mut<'v>(&self, value: &'v mut dyn Reflect) -> Option<&'v mut dyn Reflect> {
        match value.reflect_mut() {
            ReflectMut::Tuple(tuple) if tuple.is_newtype() => tuple.field_mut(0),
            _ => None,
        }
    }

    fn child<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        let found = match value.reflect_ref() {
            ReflectRef::List(list) => list.get(parse_index(key, list.len())?),
            ReflectRef::Tuple(tuple) => tuple.field(parse_index(key, tuple.field_len())?),
            _ => return Err(ConvertError::type_mismatch(&Segment::key(key), value)),
        };
        found.ok_or_else(|| ConvertError::path_not_found(key, value))
    }

    fn children<'v>(
        &self,
        cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        let cap = cx.collection_cap();
        let items: Vec<&'v dyn Reflect> = match value.reflect_ref() {
            ReflectRef::List(list) => list.iter().take(cap).collect(),
            ReflectRef::Set(set) => set.iter().take(cap).collect(),
            ReflectRef::Tuple(tuple) => tuple.iter_fields().collect(),
            _ => Vec::new(),
        };
        Ok(items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect())
    }

    #[inline]
    fn can_write(&self) -> bool {
        true
    }

    fn child_mut<'v>(
        &self,
        _: &mut WriteContext<'_>,
        container: &'v mut dyn Reflect,
        key: &str,
    ) -> Result<&'v mut dyn Reflect, ConvertError> {
        let type_path = container.type_path();
        let found = match container.reflect_mut() {
            ReflectMut::List(list) => {
                let index = parse_index(key, list.len())?;
                list.get_mut(index)
            }
            ReflectMut::Tuple(tuple) => {
                let index = parse_index(key, tuple.field_len())?;
                tuple.field_mut(index)
            }
            _ => return Err(ConvertError::not_writable(type_path)),
        };
        found.ok_or_else(|| ConvertError::PathNotFound {
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
        let item = self.child_mut(wx, container, key)?;
        wx.assign(item, value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::{BTreeSet, VecDeque};
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    use vc_reflect::derive::Reflect;

    use crate::config::{Limit, SerializeConfig};
    use crate::error::ConvertError;
    use crate::value::Value;
    use crate::{Converter, Path};

    #[derive(Reflect, Debug, PartialEq)]
    struct Meters(f64);

    #[test]
    fn sequences_become_arrays() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let read = |value: &dyn vc_reflect::Reflect| {
            converter.serialize(value, &Path::root(), &config).unwrap().to_string()
        };

        assert_eq!(read(&vec![1_u8, 2, 3]), "[1,2,3]");
        assert_eq!(read(&VecDeque::from([4_u8])), "[4]");
        assert_eq!(read(&[true, false]), "[true,false]");
        assert_eq!(read(&(1_u8, "a")), r#"[1,"a"]"#);
        assert_eq!(read(&BTreeSet::from([2_u8, 1])), "[1,2]");
        assert_eq!(read(&Meters(2.5)), "2.5");
    }

    #[test]
    fn collection_cap_keeps_the_head() {
        let config = SerializeConfig::default().with_max_collection_size(Limit::At(2));
        let value = Converter::new()
            .serialize(&vec![1_u8, 2, 3, 4], &Path::root(), &config)
            .unwrap();
        assert_eq!(value.to_string(), "[1,2]");

        let tuple = Converter::new().serialize(&(1_u8, 2_u8, 3_u8), &Path::root(), &config).unwrap();
        assert_eq!(tuple.to_string(), "[1,2,3]");
    }

    #[test]
    fn indices_are_checked() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let list = vec![10_u8, 20];
        let at = |path: &str| converter.serialize(&list, &path.parse::<Path>().unwrap(), &config);

        assert_eq!(at("1").unwrap(), Value::from(20_u8));
        assert!(matches!(at("2"), Err(ConvertError::IndexOutOfRange { index: 2, len: 2 })));
        assert!(matches!(at("-1"), Err(ConvertError::Conversion(_))));
        assert!(matches!(at("x"), Err(ConvertError::Conversion(_))));

        let set = BTreeSet::from([1_u8]);
        let err = converter.serialize(&set, &"0".parse::<Path>().unwrap(), &config).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn writes_replace_in_place() {
        let converter = Converter::new();
        let mut list: Vec<u16> = vec![1, 2, 3];
        let old = converter.set_value(&mut list, &"1".parse::<Path>().unwrap(), &Value::from(20_u16)).unwrap();
        assert_eq!(old.unwrap().take::<u16>().unwrap(), 2);
        assert_eq!(list, [1, 20, 3]);

        let err = converter
            .set_value(&mut list, &"5".parse::<Path>().unwrap(), &Value::from(0_u16))
            .unwrap_err();
        assert!(matches!(err, ConvertError::IndexOutOfRange { index: 5, len: 3 }));

        let mut distance = Meters(1.0);
        converter.set_value(&mut distance, &Path::root(), &Value::from(4.0_f64)).unwrap();
        assert_eq!(distance, Meters(4.0));

        let mut set = BTreeSet::from([1_u8]);
        let err = converter
            .set_value(&mut set, &"0".parse::<Path>().unwrap(), &Value::from(2_u8))
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotWritable { .. }));
    }
}
