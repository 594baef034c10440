use alloc::boxed::Box;

use crate::Reflect;
use crate::info::TypeHint;
use crate::ops::MapInsertError;

/// A trait used to power [map-like] operations via reflection.
///
/// Iteration order is the map's own: sorted for `BTreeMap`, unspecified for
/// `HashMap`.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use vc_reflect::{Reflect, ops::Map};
///
/// let mut map = BTreeMap::from([(1_u8, "a".to_string())]);
///
/// let old = map.insert_boxed(Box::new(1_u8), Box::new("b".to_string())).unwrap();
/// assert_eq!(old.unwrap().take::<String>().unwrap(), "a");
///
/// assert!(map.insert_boxed(Box::new("k"), Box::new("v".to_string())).is_err());
/// assert_eq!(Map::len(&map), 1);
/// ```
///
/// [map-like]: https://doc.rust-lang.org/book/ch08-03-hash-maps.html
pub trait Map: Reflect {
    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the map holds no entries.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over `(key, value)` pairs.
    fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;

    /// Returns an iterator over `(key, value)` pairs with mutable values.
    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (&dyn Reflect, &mut dyn Reflect)> + '_>;

    /// Returns the static key type.
    fn key_type(&self) -> TypeHint;

    /// Returns the static value type.
    fn value_type(&self) -> TypeHint;

    /// Inserts an entry, returning the value previously stored under `key`.
    fn insert_boxed(
        &mut self,
        key: Box<dyn Reflect>,
        value: Box<dyn Reflect>,
    ) -> Result<Option<Box<dyn Reflect>>, MapInsertError>;
}
