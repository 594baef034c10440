use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use vc_reflect::ops::Struct;
use vc_reflect::{Reflect, ReflectKind, ReflectMut, ReflectRef};

use super::{Accessor, Nesting};
use crate::context::{SerializeContext, WriteContext};
use crate::error::ConvertError;
use crate::registry::AccessorRegistry;
use crate::value::Value;

#[inline]
fn as_struct(value: &dyn Reflect) -> Option<&dyn Struct> {
    match value.reflect_ref() {
        ReflectRef::Struct(s) => Some(s),
        _ => None,
    }
}

/// Looks up a writable field, refusing read-only ones.
fn field_mut<'v>(container: &'v mut dyn Reflect, key: &str) -> Result<&'v mut dyn Reflect, ConvertError> {
    let type_path = container.type_path();
    let ReflectMut::Struct(s) = container.reflect_mut() else {
        return Err(ConvertError::not_writable(type_path));
    };
    let not_found = || ConvertError::PathNotFound {
        segment: String::from(key),
        type_path,
    };
    let info = s.field_info(key).ok_or_else(not_found)?;
    if info.is_read_only() {
        return Err(ConvertError::not_writable(format!("{type_path}.{key}")));
    }
    s.field_mut(key).ok_or_else(not_found)
}

/// Reflected structs lower to objects, one entry per field in declaration
/// order.
///
/// Field attributes of `#[derive(Reflect)]` apply: skipped fields are
/// invisible, renamed fields use their new name, read-only fields refuse
/// writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanAccessor;

impl Accessor for BeanAccessor {
    fn name(&self) -> &'static str {
        "bean"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        value.reflect_kind() == ReflectKind::Struct
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Keyed
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let Some(s) = as_struct(value) else {
            return Ok(Value::Null);
        };
        cx.lower_entries(s.iter_fields().map(|(info, field)| (info.name(), field)))
    }

    fn child<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        as_struct(value)
            .and_then(|s| s.field(key))
            .ok_or_else(|| ConvertError::path_not_found(key, value))
    }

    fn children<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        Ok(as_struct(value)
            .map(|s| {
                s.iter_fields()
                    .map(|(info, field)| (String::from(info.name()), field))
                    .collect()
            })
            .unwrap_or_default())
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
        field_mut(container, key)
    }

    fn write(
        &self,
        wx: &mut WriteContext<'_>,
        container: &mut dyn Reflect,
        key: &str,
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        let field = field_mut(container, key)?;
        wx.assign(field, value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;

    use vc_reflect::derive::Reflect;

    use crate::config::SerializeConfig;
    use crate::error::ConvertError;
    use crate::value::Value;
    use crate::{Converter, Path};

    #[derive(Reflect, Debug)]
    struct Account {
        #[reflect(rename = "user")]
        user_name: String,
        #[reflect(read_only)]
        id: u64,
        tags: Vec<String>,
        #[reflect(skip)]
        secret: String,
    }

    fn account() -> Account {
        Account {
            user_name: String::from("ada"),
            id: 7,
            tags: vec![String::from("admin")],
            secret: String::from("hunter2"),
        }
    }

    #[test]
    fn fields_follow_attributes() {
        let value = Converter::new()
            .serialize(&account(), &Path::root(), &SerializeConfig::default())
            .unwrap();
        assert_eq!(value.to_string(), r#"{"user":"ada","id":7,"tags":["admin"]}"#);

        let err = Converter::new()
            .serialize(&account(), &"secret".parse::<Path>().unwrap(), &SerializeConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));
    }

    #[test]
    fn writes_respect_read_only() {
        let converter = Converter::new();
        let mut account = account();

        let old = converter
            .set_value(&mut account, &"user".parse::<Path>().unwrap(), &Value::from("grace"))
            .unwrap();
        assert_eq!(old.unwrap().take::<String>().unwrap(), "ada");
        assert_eq!(account.user_name, "grace");

        converter
            .set_value(&mut account, &"tags/0".parse::<Path>().unwrap(), &Value::from("ops"))
            .unwrap();
        assert_eq!(account.tags, ["ops"]);

        let err = converter
            .set_value(&mut account, &"id".parse::<Path>().unwrap(), &Value::from(8_u64))
            .unwrap_err();
        assert!(matches!(&err, ConvertError::NotWritable { target } if target.ends_with("Account.id")));

        let err = converter
            .set_value(&mut account, &"secret".parse::<Path>().unwrap(), &Value::from("x"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::AttributeNotFound { .. }));
        assert_eq!(account.secret, "hunter2");
    }
}
