use alloc::format;

use vc_reflect::Reflect;

use super::{Accessor, Nesting};
use crate::context::SerializeContext;
use crate::error::{ConvertError, ValueParseError};
use crate::registry::AccessorRegistry;
use crate::value::{Value, ValueSerializer};

/// Lowers types registered with
/// [`AccessorRegistry::register_serialize`] through their `Serialize` impl.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeAccessor;

impl Accessor for SerdeAccessor {
    fn name(&self) -> &'static str {
        "serde"
    }

    #[inline]
    fn accepts(&self, registry: &AccessorRegistry, value: &dyn Reflect) -> bool {
        registry.serializer(value.ty_id()).is_some()
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Leaf
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let Some(serializable) = cx.registry().serializer(value.ty_id()).and_then(|get| get(value)) else {
            return Ok(Value::Null);
        };
        erased_serde::serialize(serializable, ValueSerializer).map_err(|err| {
            ValueParseError::from_text(value.type_path(), format!("{value:?}"), format!("{err}")).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::sync::Arc;

    use serde::Serialize;
    use vc_reflect::impl_reflect_opaque;

    use crate::config::SerializeConfig;
    use crate::registry::AccessorRegistry;
    use crate::value::Value;
    use crate::{Converter, Path};

    #[derive(Debug, Serialize)]
    struct Endpoint {
        host: &'static str,
        port: u16,
    }

    impl_reflect_opaque!(Endpoint);

    #[test]
    fn registered_types_use_serialize() {
        let endpoint = Endpoint { host: "db", port: 5432 };
        let config = SerializeConfig::default();

        let plain = Converter::new().serialize(&endpoint, &Path::root(), &config).unwrap();
        assert!(matches!(plain, Value::String(_)));

        let mut registry = AccessorRegistry::new();
        registry.register_serialize::<Endpoint>();
        let converter = Converter::with_registry(Arc::new(registry));
        let value = converter.serialize(&endpoint, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"host":"db","port":5432}"#);
    }
}
