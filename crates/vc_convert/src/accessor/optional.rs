use vc_reflect::{Reflect, ReflectKind, ReflectMut, ReflectRef};

use super::{Accessor, Nesting};
use crate::context::SerializeContext;
use crate::error::ConvertError;
use crate::registry::AccessorRegistry;
use crate::value::Value;

/// `None` lowers to null, `Some(x)` to `x`.
///
/// Writes to an option itself are handled by
/// [`WriteContext::assign`](crate::context::WriteContext::assign): `null`
/// clears it, anything else is parsed into the inner type.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalAccessor;

impl Accessor for OptionalAccessor {
    fn name(&self) -> &'static str {
        "optional"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        value.reflect_kind() == ReflectKind::Optional
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Transparent
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        match self.inner(value) {
            Some(inner) => cx.lower(inner),
            None => Ok(Value::Null),
        }
    }

    fn inner<'v>(&self, value: &'v dyn Reflect) -> Option<&'v dyn Reflect> {
        match value.reflect_ref() {
            ReflectRef::Optional(optional) => optional.get(),
            _ => None,
        }
    }

    fn inner_mut<'v>(&self, value: &'v mut dyn Reflect) -> Option<&'v mut dyn Reflect> {
        match value.reflect_mut() {
            ReflectMut::Optional(optional) => optional.get_mut(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use crate::config::SerializeConfig;
    use crate::error::ConvertError;
    use crate::value::Value;
    use crate::{Converter, Path};

    #[test]
    fn none_is_null_some_is_transparent() {
        let converter = Converter::new();
        let config = SerializeConfig::default();

        let none: Option<u8> = None;
        assert_eq!(converter.serialize(&none, &Path::root(), &config).unwrap(), Value::Null);
        assert_eq!(converter.serialize(&Some(4_u8), &Path::root(), &config).unwrap(), Value::from(4_u8));

        let nested = Some(vec![1_u8, 2]);
        let path: Path = "1".parse().unwrap();
        assert_eq!(converter.serialize(&nested, &path, &config).unwrap(), Value::from(2_u8));
    }

    #[test]
    fn navigating_into_none_is_not_found() {
        let none: Option<alloc::vec::Vec<u8>> = None;
        let path: Path = "0".parse().unwrap();
        let err = Converter::new()
            .serialize(&none, &path, &SerializeConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));
    }

    #[test]
    fn write_clears_and_fills() {
        let converter = Converter::new();
        let mut slot = Some(3_u32);

        let old = converter.set_value(&mut slot, &Path::root(), &Value::Null).unwrap();
        assert_eq!(old.unwrap().take::<u32>().unwrap(), 3);
        assert_eq!(slot, None);

        let old = converter.set_value(&mut slot, &Path::root(), &Value::from("7")).unwrap();
        assert!(old.is_none());
        assert_eq!(slot, Some(7));
    }
}
