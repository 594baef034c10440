use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use vc_reflect::info::VariantKind;
use vc_reflect::ops::Enum;
use vc_reflect::{Reflect, ReflectKind, ReflectMut, ReflectRef};

use super::{Accessor, Nesting, parse_index};
use crate::context::{SerializeContext, WriteContext};
use crate::error::ConvertError;
use crate::registry::AccessorRegistry;
use crate::value::{ObjectMap, Value};

#[inline]
fn as_enum(value: &dyn Reflect) -> Option<&dyn Enum> {
    match value.reflect_ref() {
        ReflectRef::Enum(e) => Some(e),
        _ => None,
    }
}

/// Looks up a field of the active variant: by name in struct variants, by
/// index in tuple variants.
fn field<'v>(e: &'v dyn Enum, key: &str) -> Result<Option<&'v dyn Reflect>, ConvertError> {
    Ok(match e.variant_kind() {
        VariantKind::Struct => e.field(key),
        VariantKind::Tuple => e.field_at(parse_index(key, e.field_len())?),
        VariantKind::Unit => None,
    })
}

/// Unit variants lower to their name, data variants to `{ name: payload }`.
///
/// The payload is an object for struct variants, the single field for
/// one-field tuple variants and an array otherwise. Paths address payload
/// fields directly, by name or index.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumAccessor;

impl Accessor for EnumAccessor {
    fn name(&self) -> &'static str {
        "enum"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        value.reflect_kind() == ReflectKind::Enum
    }

    fn nesting(&self, value: &dyn Reflect) -> Nesting {
        match as_enum(value).map(Enum::variant_kind) {
            Some(VariantKind::Unit) | None => Nesting::Leaf,
            Some(_) => Nesting::Keyed,
        }
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let Some(e) = as_enum(value) else {
            return Ok(Value::Null);
        };
        let payload = match e.variant_kind() {
            VariantKind::Unit => return Ok(Value::from(e.variant_name())),
            VariantKind::Struct => cx.lower_entries(
                e.iter_fields()
                    .map(|(name, field)| (name.unwrap_or_default(), field)),
            )?,
            VariantKind::Tuple if e.field_len() == 1 => match e.field_at(0) {
                Some(field) => cx.lower(field)?,
                None => Value::Null,
            },
            VariantKind::Tuple => cx.lower_items(e.iter_fields().map(|(_, field)| field))?,
        };
        let mut object = ObjectMap::with_capacity(1);
        object.insert(e.variant_name(), payload);
        Ok(Value::Object(object))
    }

    fn child<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        let found = match as_enum(value) {
            Some(e) => field(e, key)?,
            None => None,
        };
        found.ok_or_else(|| ConvertError::path_not_found(key, value))
    }

    fn children<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        let Some(e) = as_enum(value) else {
            return Ok(Vec::new());
        };
        Ok(e.iter_fields()
            .enumerate()
            .map(|(index, (name, field))| match name {
                Some(name) => (String::from(name), field),
                None => (index.to_string(), field),
            })
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
        let ReflectMut::Enum(e) = container.reflect_mut() else {
            return Err(ConvertError::not_writable(type_path));
        };
        let found = match e.variant_kind() {
            VariantKind::Struct => e.field_mut(key),
            VariantKind::Tuple => {
                let index = parse_index(key, e.field_len())?;
                e.field_at_mut(index)
            }
            VariantKind::Unit => None,
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
        let field = self.child_mut(wx, container, key)?;
        wx.assign(field, value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use vc_reflect::derive::Reflect;

    use crate::config::SerializeConfig;
    use crate::error::ConvertError;
    use crate::value::Value;
    use crate::{Converter, Path};

    #[derive(Reflect, Debug, PartialEq)]
    enum State {
        Idle,
        #[reflect(rename = "busy")]
        Busy(u32),
        Moving(i32, i32),
        Failed { code: u16, retry: bool },
    }

    fn read(value: &State, path: &str) -> Result<Value, ConvertError> {
        let path: Path = path.parse()?;
        Converter::new().serialize(value, &path, &SerializeConfig::default())
    }

    #[test]
    fn variants_lower_by_shape() {
        assert_eq!(read(&State::Idle, "").unwrap(), Value::from("Idle"));
        assert_eq!(read(&State::Busy(3), "").unwrap().to_string(), r#"{"busy":3}"#);
        assert_eq!(read(&State::Moving(1, -1), "").unwrap().to_string(), r#"{"Moving":[1,-1]}"#);
        assert_eq!(
            read(&State::Failed { code: 7, retry: true }, "").unwrap().to_string(),
            r#"{"Failed":{"code":7,"retry":true}}"#,
        );
    }

    #[test]
    fn payload_fields_are_addressable() {
        assert_eq!(read(&State::Moving(1, -1), "1").unwrap(), Value::from(-1_i32));
        assert_eq!(read(&State::Failed { code: 7, retry: true }, "code").unwrap(), Value::from(7_u16));
        assert!(matches!(
            read(&State::Failed { code: 7, retry: true }, "nope"),
            Err(ConvertError::PathNotFound { .. })
        ));
        assert!(matches!(
            read(&State::Moving(1, -1), "2"),
            Err(ConvertError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn writes_switch_unit_variants_and_payloads() {
        let converter = Converter::new();
        let mut state = State::Busy(1);

        let old = converter.set_value(&mut state, &Path::root(), &Value::from("Idle")).unwrap();
        assert_eq!(old.unwrap().take::<State>().unwrap(), State::Busy(1));
        assert_eq!(state, State::Idle);

        let err = converter.set_value(&mut state, &Path::root(), &Value::from("Gone")).unwrap_err();
        assert!(matches!(err, ConvertError::Conversion(_)));

        let mut state = State::Failed { code: 1, retry: false };
        let path: Path = "retry".parse().unwrap();
        converter.set_value(&mut state, &path, &Value::Bool(true)).unwrap();
        assert_eq!(state, State::Failed { code: 1, retry: true });
    }
}
