use alloc::string::String;
use alloc::vec::Vec;

use vc_reflect::Reflect;

use super::{Accessor, Nesting};
use crate::context::SerializeContext;
use crate::data::CompositeData;
use crate::error::ConvertError;
use crate::registry::AccessorRegistry;
use crate::value::Value;

/// Lowers [`CompositeData`] to an object keyed by item name.
///
/// Composite records are read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeAccessor;

impl Accessor for CompositeAccessor {
    fn name(&self) -> &'static str {
        "composite"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        value.is::<CompositeData>()
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Keyed
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let Some(data) = value.downcast_ref::<CompositeData>() else {
            return Ok(Value::Null);
        };
        cx.lower_entries(data.iter())
    }

    fn child<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        value
            .downcast_ref::<CompositeData>()
            .and_then(|data| data.get(key))
            .ok_or_else(|| ConvertError::path_not_found(key, value))
    }

    fn children<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        Ok(value
            .downcast_ref::<CompositeData>()
            .map(|data| data.iter().map(|(key, item)| (String::from(key), item)).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use crate::config::{Limit, SerializeConfig};
    use crate::data::CompositeData;
    use crate::error::ConvertError;
    use crate::value::Value;
    use crate::{Converter, Path};

    fn usage() -> CompositeData {
        CompositeData::new("MemoryUsage")
            .with_item("used", 512_u64)
            .with_item("max", 2048_u64)
            .with_item("pool", CompositeData::new("Pool").with_item("name", "heap"))
    }

    fn path(text: &str) -> Path {
        text.parse().unwrap()
    }

    #[test]
    fn items_read_in_order() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let data = usage();

        let value = converter.serialize(&data, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"used":512,"max":2048,"pool":{"name":"heap"}}"#);
        assert_eq!(converter.serialize(&data, &path("pool/name"), &config).unwrap(), Value::from("heap"));

        let err = converter.serialize(&data, &path("free"), &config).unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));
    }

    #[test]
    fn items_are_not_capped() {
        let config = SerializeConfig::default().with_max_collection_size(Limit::At(1));
        let value = Converter::new().serialize(&usage(), &Path::root(), &config).unwrap();
        assert_eq!(value.as_object().map(|map| map.len()), Some(3));
    }

    #[test]
    fn writes_are_rejected() {
        let converter = Converter::new();
        let mut data = usage();
        for target in ["used", "pool/name", "free"] {
            let err = converter
                .set_value(&mut data, &path(target), &Value::from(1_u8))
                .unwrap_err();
            assert!(matches!(err, ConvertError::NotWritable { .. }), "{target}: {err}");
        }
        assert_eq!(data.get("used").and_then(|v| v.downcast_ref::<u64>()), Some(&512));
    }
}
