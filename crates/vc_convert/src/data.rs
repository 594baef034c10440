//! Self-describing records for values whose shape is only known at runtime.
//!
//! ## Menu
//!
//! - [`CompositeData`]: a named record of ordered, named items.
//! - [`TabularData`]: rows of [`CompositeData`] indexed by one or more item
//!   names.
//!
//! Both are read-only through the converter.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use vc_reflect::Reflect;

use crate::hash::FixedHashState;

// -----------------------------------------------------------------------------
// CompositeData

/// A record of named items, lowered as an object in item order.
///
/// # Examples
///
/// ```
/// use vc_convert::data::CompositeData;
/// use vc_convert::value::Value;
/// use vc_convert::{Converter, Path, SerializeConfig};
///
/// let usage = CompositeData::new("MemoryUsage")
///     .with_item("used", 512_u64)
///     .with_item("max", 2048_u64);
///
/// let value = Converter::new()
///     .serialize(&usage, &Path::root(), &SerializeConfig::default())
///     .unwrap();
/// assert_eq!(value.to_string(), r#"{"used":512,"max":2048}"#);
/// ```
pub struct CompositeData {
    type_name: Cow<'static, str>,
    items: Vec<(String, Box<dyn Reflect>)>,
}

impl CompositeData {
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            items: Vec::new(),
        }
    }

    /// Adds an item, replacing an existing item of the same name in place.
    pub fn with_item(mut self, name: impl Into<String>, value: impl Reflect) -> Self {
        self.insert(name, Box::new(value));
        self
    }

    /// Inserts an item, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: Box<dyn Reflect>) -> Option<Box<dyn Reflect>> {
        let name = name.into();
        match self.items.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.items.push((name, value));
                None
            }
        }
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&dyn Reflect> {
        self.items
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| &**value)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|(key, _)| key == name)
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &dyn Reflect)> {
        self.items.iter().map(|(key, value)| (key.as_str(), &**value))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for CompositeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.iter() {
            map.entry(&key, &value);
        }
        map.finish()
    }
}

vc_reflect::impl_reflect_opaque!(CompositeData);

// -----------------------------------------------------------------------------
// TabularData

/// Error of [`TabularData::put`]: a row lacks one of the index items.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row of `{type_name}` has no index item `{item}`")]
pub struct MissingIndexItem {
    pub type_name: String,
    pub item: String,
}

/// Rows of [`CompositeData`] addressed by the values of their index items.
///
/// Read through the converter, a table is an array of row objects in row
/// order. A path supplies one segment per index item to reach a single row.
///
/// # Examples
///
/// ```
/// use vc_convert::data::{CompositeData, TabularData};
/// use vc_convert::{Converter, Path, SerializeConfig};
///
/// let mut threads = TabularData::new("Threads", ["pool", "id"]);
/// threads
///     .put(CompositeData::new("Thread").with_item("pool", "io").with_item("id", 1_u32).with_item("busy", true))
///     .unwrap();
/// threads
///     .put(CompositeData::new("Thread").with_item("pool", "io").with_item("id", 2_u32).with_item("busy", false))
///     .unwrap();
///
/// let value = Converter::new()
///     .serialize(&threads, &"io/2/busy".parse::<Path>().unwrap(), &SerializeConfig::default())
///     .unwrap();
/// assert_eq!(value.to_string(), "false");
/// ```
pub struct TabularData {
    type_name: Cow<'static, str>,
    index_names: Vec<String>,
    rows: Vec<CompositeData>,
    index: HashMap<String, usize, FixedHashState>,
}

/// Joins index values into one lookup key.
fn join_key<'k>(parts: impl IntoIterator<Item = &'k str>) -> String {
    let mut key = String::new();
    for (n, part) in parts.into_iter().enumerate() {
        if n > 0 {
            key.push('\u{0}');
        }
        key.push_str(part);
    }
    key
}

/// The text an index item is matched by.
pub(crate) fn index_text(value: &dyn Reflect) -> String {
    if let Some(text) = value.downcast_ref::<String>() {
        return text.clone();
    }
    if let Some(text) = value.downcast_ref::<&'static str>() {
        return String::from(*text);
    }
    if let Some(text) = value.downcast_ref::<Cow<'static, str>>() {
        return String::from(&**text);
    }
    if let Some(c) = value.downcast_ref::<char>() {
        return String::from(*c);
    }
    format!("{value:?}")
}

impl TabularData {
    pub fn new<I, S>(type_name: impl Into<Cow<'static, str>>, index_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_name: type_name.into(),
            index_names: index_names.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            index: HashMap::with_hasher(FixedHashState),
        }
    }

    fn key_of(&self, row: &CompositeData) -> Result<String, MissingIndexItem> {
        let mut parts = Vec::with_capacity(self.index_names.len());
        for name in &self.index_names {
            let Some(item) = row.get(name) else {
                return Err(MissingIndexItem {
                    type_name: String::from(&*self.type_name),
                    item: name.clone(),
                });
            };
            parts.push(index_text(item));
        }
        Ok(join_key(parts.iter().map(String::as_str)))
    }

    /// Adds a row, replacing the row with the same index values in place.
    ///
    /// Returns the replaced row.
    pub fn put(&mut self, row: CompositeData) -> Result<Option<CompositeData>, MissingIndexItem> {
        let key = self.key_of(&row)?;
        match self.index.get(&key) {
            Some(&slot) => Ok(Some(core::mem::replace(&mut self.rows[slot], row))),
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
                Ok(None)
            }
        }
    }

    /// Looks up the row with the given index values.
    pub fn get(&self, keys: &[&str]) -> Option<&CompositeData> {
        if keys.len() != self.index_names.len() {
            return None;
        }
        let slot = *self.index.get(&join_key(keys.iter().copied()))?;
        self.rows.get(slot)
    }

    /// The key of `row` as the path segments that reach it.
    pub(crate) fn row_keys(&self, row: &CompositeData) -> Vec<String> {
        self.index_names
            .iter()
            .map(|name| row.get(name).map(index_text).unwrap_or_default())
            .collect()
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn index_names(&self) -> &[String] {
        &self.index_names
    }

    #[inline]
    pub fn rows(&self) -> &[CompositeData] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Debug for TabularData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularData")
            .field("type_name", &self.type_name)
            .field("index_names", &self.index_names)
            .field("rows", &self.rows)
            .finish()
    }
}

vc_reflect::impl_reflect_opaque!(TabularData);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{CompositeData, TabularData};

    fn row(name: &str, id: u32) -> CompositeData {
        CompositeData::new("Row")
            .with_item("name", String::from(name))
            .with_item("id", id)
    }

    #[test]
    fn composite_keeps_insertion_order() {
        let data = CompositeData::new("T")
            .with_item("b", 1_u8)
            .with_item("a", 2_u8)
            .with_item("b", 3_u8);
        let keys: alloc::vec::Vec<_> = data.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(data.get("b").and_then(|v| v.downcast_ref::<u8>()), Some(&3));
    }

    #[test]
    fn tabular_lookup_by_index() {
        let mut table = TabularData::new("Table", ["name", "id"]);
        assert!(table.put(row("a", 1)).unwrap().is_none());
        assert!(table.put(row("a", 2)).unwrap().is_none());
        assert!(table.put(row("b", 1)).unwrap().is_none());

        assert_eq!(table.len(), 3);
        let found = table.get(&["a", "2"]).unwrap();
        assert_eq!(found.get("id").and_then(|v| v.downcast_ref::<u32>()), Some(&2));
        assert!(table.get(&["a"]).is_none());
        assert!(table.get(&["c", "1"]).is_none());
    }

    #[test]
    fn tabular_replaces_same_key() {
        let mut table = TabularData::new("Table", ["name"]);
        table.put(row("a", 1)).unwrap();
        let old = table.put(row("a", 9)).unwrap().unwrap();
        assert_eq!(old.get("id").and_then(|v| v.downcast_ref::<u32>()), Some(&1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn tabular_rejects_row_without_index() {
        let mut table = TabularData::new("Table", ["missing"]);
        let err = table.put(row("a", 1)).unwrap_err();
        assert_eq!(err.item, "missing");
    }
}
