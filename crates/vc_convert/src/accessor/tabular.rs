use alloc::string::String;
use alloc::vec::Vec;

use vc_reflect::Reflect;

use super::{Accessor, Nesting};
use crate::context::SerializeContext;
use crate::data::TabularData;
use crate::error::ConvertError;
use crate::registry::AccessorRegistry;
use crate::value::Value;

/// Lowers [`TabularData`] to an array of row objects.
///
/// A path reaches one row with one segment per index item. A wildcard fans
/// out into an object keyed by each row's index values joined with `/`.
/// Tables are read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularAccessor;

impl Accessor for TabularAccessor {
    fn name(&self) -> &'static str {
        "tabular"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        value.is::<TabularData>()
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Indexed
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let Some(table) = value.downcast_ref::<TabularData>() else {
            return Ok(Value::Null);
        };
        let cap = cx.collection_cap();
        cx.lower_items(table.rows().iter().take(cap).map(|row| row as &dyn Reflect))
    }

    #[inline]
    fn fan_out_keyed(&self, _: &dyn Reflect) -> bool {
        true
    }

    fn key_arity(&self, value: &dyn Reflect) -> usize {
        value
            .downcast_ref::<TabularData>()
            .map_or(1, |table| table.index_names().len())
    }

    fn child_by_keys<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        keys: &[&str],
    ) -> Result<&'v dyn Reflect, ConvertError> {
        value
            .downcast_ref::<TabularData>()
            .and_then(|table| table.get(keys))
            .map(|row| row as &dyn Reflect)
            .ok_or_else(|| ConvertError::path_not_found(&keys.join("/"), value))
    }

    fn children<'v>(
        &self,
        cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        let Some(table) = value.downcast_ref::<TabularData>() else {
            return Ok(Vec::new());
        };
        Ok(table
            .rows()
            .iter()
            .take(cx.collection_cap())
            .map(|row| (table.row_keys(row).join("/"), row as &dyn Reflect))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use crate::config::{Limit, SerializeConfig};
    use crate::data::{CompositeData, TabularData};
    use crate::error::ConvertError;
    use crate::fault::FaultMode;
    use crate::value::Value;
    use crate::{Converter, Path};

    fn threads() -> TabularData {
        let mut table = TabularData::new("Threads", ["pool", "id"]);
        for (id, busy) in [(1_u32, true), (2, false)] {
            let row = CompositeData::new("Thread")
                .with_item("pool", "io")
                .with_item("id", id)
                .with_item("busy", busy);
            table.put(row).unwrap();
        }
        table
    }

    fn path(text: &str) -> Path {
        text.parse().unwrap()
    }

    #[test]
    fn rows_read_as_an_array() {
        let value = Converter::new()
            .serialize(&threads(), &Path::root(), &SerializeConfig::default())
            .unwrap();
        assert_eq!(
            value.to_string(),
            r#"[{"pool":"io","id":1,"busy":true},{"pool":"io","id":2,"busy":false}]"#
        );
    }

    #[test]
    fn rows_are_found_by_index_values() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let table = threads();

        assert_eq!(converter.serialize(&table, &path("io/2/busy"), &config).unwrap(), Value::Bool(false));

        let err = converter.serialize(&table, &path("io/3"), &config).unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));
        let err = converter.serialize(&table, &path("io"), &config).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn wildcards_key_rows_by_index_values() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let table = threads();

        let value = converter.serialize(&table, &path("*/busy"), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"io/1":true,"io/2":false}"#);

        let filtering = config.with_fault_mode(FaultMode::Filtering);
        let value = converter.serialize(&table, &path("*/missing"), &filtering).unwrap();
        assert_eq!(value, Value::Object(Default::default()));
    }

    #[test]
    fn collection_cap_keeps_the_first_rows() {
        let converter = Converter::new();
        let config = SerializeConfig::default().with_max_collection_size(Limit::At(1));
        let table = threads();

        let value = converter.serialize(&table, &Path::root(), &config).unwrap();
        assert_eq!(value.as_array().map(|rows| rows.len()), Some(1));
        let value = converter.serialize(&table, &path("*/id"), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"io/1":1}"#);
    }

    #[test]
    fn writes_are_rejected() {
        let converter = Converter::new();
        let mut table = threads();
        for target in ["io/1/busy", "io"] {
            let err = converter
                .set_value(&mut table, &path(target), &Value::Bool(false))
                .unwrap_err();
            assert!(matches!(err, ConvertError::NotWritable { .. }), "{target}: {err}");
        }
        let busy = table.get(&["io", "1"]).and_then(|row| row.get("busy"));
        assert_eq!(busy.and_then(|v| v.downcast_ref::<bool>()), Some(&true));
    }
}
