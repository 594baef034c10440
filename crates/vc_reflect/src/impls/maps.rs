use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::hash::{BuildHasher, Hash};
use std::collections::HashMap;

use crate::Reflect;
use crate::info::TypeHint;
use crate::ops::{Map, MapInsertError};
use crate::reflection::impl_reflect_cast_fn;

/// Unboxes a key/value pair into the map's concrete types.
fn take_entry<K: Reflect, V: Reflect>(
    key: Box<dyn Reflect>,
    value: Box<dyn Reflect>,
) -> Result<(K, V), MapInsertError> {
    let key = key.take::<K>().map_err(|found| MapInsertError {
        slot: "key",
        expected: core::any::type_name::<K>(),
        found: found.type_path(),
    })?;
    let value = value.take::<V>().map_err(|found| MapInsertError {
        slot: "value",
        expected: core::any::type_name::<V>(),
        found: found.type_path(),
    })?;
    Ok((key, value))
}

macro_rules! impl_map_ops {
    ($map:ident) => {
        #[inline]
        fn len(&self) -> usize {
            $map::len(self)
        }

        fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
            Box::new($map::iter(self).map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)))
        }

        fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (&dyn Reflect, &mut dyn Reflect)> + '_> {
            Box::new(
                $map::iter_mut(self)
                    .map(|(key, value)| (key as &dyn Reflect, value as &mut dyn Reflect)),
            )
        }

        #[inline]
        fn key_type(&self) -> TypeHint {
            TypeHint::of::<K>()
        }

        #[inline]
        fn value_type(&self) -> TypeHint {
            TypeHint::of::<V>()
        }

        fn insert_boxed(
            &mut self,
            key: Box<dyn Reflect>,
            value: Box<dyn Reflect>,
        ) -> Result<Option<Box<dyn Reflect>>, MapInsertError> {
            let (key, value) = take_entry::<K, V>(key, value)?;
            Ok($map::insert(self, key, value).map(|old| Box::new(old) as Box<dyn Reflect>))
        }
    };
}

// -----------------------------------------------------------------------------
// HashMap

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher + Send + Sync + 'static,
{
    impl_reflect_cast_fn!(Map);
}

impl<K, V, S> Map for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher + Send + Sync + 'static,
{
    impl_map_ops!(HashMap);
}

// -----------------------------------------------------------------------------
// BTreeMap

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    impl_reflect_cast_fn!(Map);
}

impl<K: Reflect + Ord, V: Reflect> Map for BTreeMap<K, V> {
    impl_map_ops!(BTreeMap);
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use std::collections::HashMap;

    use crate::ops::Map;
    use crate::{Reflect, ReflectMut};

    #[test]
    fn insert_reports_type_mismatch() {
        let mut map: HashMap<String, u32> = HashMap::new();
        let err = map
            .insert_boxed(Box::new(String::from("a")), Box::new(1_i64))
            .unwrap_err();
        assert_eq!(err.slot, "value");
        assert!(Map::is_empty(&map));
    }

    #[test]
    fn iter_mut_edits_values() {
        let mut map = HashMap::from([(String::from("a"), 1_u32)]);
        let ReflectMut::Map(reflected) = map.reflect_mut() else {
            panic!("expected a map");
        };
        for (_, value) in reflected.iter_mut() {
            value.replace(Box::new(5_u32)).unwrap();
        }
        assert_eq!(map["a"], 5);
    }
}
