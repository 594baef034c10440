use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::any::TypeId;
use std::path::PathBuf;

use vc_reflect::Reflect;

use super::{Accessor, Nesting, parse_index};
use crate::config::SerializeConfig;
use crate::context::{SerializeContext, WriteContext};
use crate::error::ConvertError;
use crate::hash::TypeIdMap;
use crate::path::Segment;
use crate::registry::AccessorRegistry;
use crate::value::{Value, float_value, wide_int_value};

/// Lowers one leaf type; `None` if the value is not of that type.
pub type LowerFn = fn(&dyn Reflect, &SerializeConfig) -> Option<Value>;

/// The largest integer an IEEE-754 double holds exactly.
const MAX_SAFE_INTEGER: u128 = (1 << 53) - 1;

/// Lowers an integer, as text when it does not fit the value tree or, with
/// `large_integers_as_string`, a double.
pub(crate) fn integer_value(n: i128, config: &SerializeConfig) -> Value {
    if config.large_integers_as_string && n.unsigned_abs() > MAX_SAFE_INTEGER {
        return Value::String(n.to_string());
    }
    wide_int_value(n)
}

fn integer<T: Copy + Into<i128> + Reflect>(value: &dyn Reflect, config: &SerializeConfig) -> Option<Value> {
    let n: i128 = (*value.downcast_ref::<T>()?).into();
    Some(integer_value(n, config))
}

fn unsigned_wide(value: &dyn Reflect, config: &SerializeConfig) -> Option<Value> {
    let n = *value.downcast_ref::<u128>()?;
    Some(match i128::try_from(n) {
        Ok(n) => integer_value(n, config),
        Err(_) => Value::String(n.to_string()),
    })
}

fn size<T: Copy + TryInto<i128> + ToString + Reflect>(value: &dyn Reflect, config: &SerializeConfig) -> Option<Value> {
    let n = *value.downcast_ref::<T>()?;
    Some(match n.try_into() {
        Ok(n) => integer_value(n, config),
        Err(_) => Value::String(n.to_string()),
    })
}

/// Passes primitives, text and [`Value`]s through one to one.
///
/// [`Value`] leaves can also be navigated by object key or array index, and
/// written to.
pub struct TerminalAccessor {
    leaves: TypeIdMap<LowerFn>,
}

impl Default for TerminalAccessor {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalAccessor {
    pub fn new() -> Self {
        let mut this = Self {
            leaves: TypeIdMap::new(),
        };
        this.add::<u8>(integer::<u8>);
        this.add::<u16>(integer::<u16>);
        this.add::<u32>(integer::<u32>);
        this.add::<u64>(integer::<u64>);
        this.add::<u128>(unsigned_wide);
        this.add::<usize>(size::<usize>);
        this.add::<i8>(integer::<i8>);
        this.add::<i16>(integer::<i16>);
        this.add::<i32>(integer::<i32>);
        this.add::<i64>(integer::<i64>);
        this.add::<i128>(integer::<i128>);
        this.add::<isize>(size::<isize>);

        this.add::<f32>(|v, _| v.downcast_ref::<f32>().map(|n| float_value(f64::from(*n))));
        this.add::<f64>(|v, _| v.downcast_ref::<f64>().map(|n| float_value(*n)));
        this.add::<bool>(|v, _| v.downcast_ref::<bool>().map(|b| Value::Bool(*b)));
        this.add::<char>(|v, _| v.downcast_ref::<char>().map(|c| Value::String(String::from(*c))));
        this.add::<()>(|v, _| v.downcast_ref::<()>().map(|_| Value::Null));
        this.add::<String>(|v, _| v.downcast_ref::<String>().map(|s| Value::String(s.clone())));
        this.add::<&'static str>(|v, _| v.downcast_ref::<&'static str>().map(|s| Value::from(*s)));
        this.add::<Cow<'static, str>>(|v, _| {
            v.downcast_ref::<Cow<'static, str>>()
                .map(|s| Value::from(&**s))
        });
        this.add::<PathBuf>(|v, _| {
            v.downcast_ref::<PathBuf>()
                .map(|p| Value::from(p.to_string_lossy()))
        });
        this.add::<Value>(|v, _| v.downcast_ref::<Value>().cloned());
        this
    }

    /// Treats `T` as a leaf lowered by `lower`.
    pub fn add<T: Reflect>(&mut self, lower: LowerFn) {
        self.leaves.insert(TypeId::of::<T>(), lower);
    }
}

impl Accessor for TerminalAccessor {
    fn name(&self) -> &'static str {
        "terminal"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        self.leaves.contains(&value.ty_id())
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Leaf
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        Ok(self
            .leaves
            .get(&value.ty_id())
            .and_then(|lower| lower(value, cx.config()))
            .unwrap_or_default())
    }

    fn child<'v>(
        &self,
        _: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        let child = match value.downcast_ref::<Value>() {
            Some(Value::Object(map)) => map.get(key),
            Some(Value::Array(items)) => items.get(parse_index(key, items.len())?),
            _ => return Err(ConvertError::type_mismatch(&Segment::key(key), value)),
        };
        child
            .map(|child| child as &dyn Reflect)
            .ok_or_else(|| ConvertError::path_not_found(key, value))
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
        let child = match container.downcast_mut::<Value>() {
            Some(Value::Object(map)) => map.get_mut(key),
            Some(Value::Array(items)) => {
                let index = parse_index(key, items.len())?;
                items.get_mut(index)
            }
            _ => return Err(ConvertError::not_writable(type_path)),
        };
        child
            .map(|child| child as &mut dyn Reflect)
            .ok_or_else(|| ConvertError::PathNotFound {
                segment: String::from(key),
                type_path,
            })
    }

    fn write(
        &self,
        _: &mut WriteContext<'_>,
        container: &mut dyn Reflect,
        key: &str,
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        let type_path = container.type_path();
        let old = match container.downcast_mut::<Value>() {
            Some(Value::Object(map)) => map.insert(key, value.clone()),
            Some(Value::Array(items)) => {
                let index = parse_index(key, items.len())?;
                Some(core::mem::replace(&mut items[index], value.clone()))
            }
            _ => return Err(ConvertError::not_writable(type_path)),
        };
        Ok(old.map(|old| Box::new(old) as Box<dyn Reflect>))
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::string::{String, ToString};
    use std::path::PathBuf;

    use crate::config::SerializeConfig;
    use crate::value::Value;
    use crate::{Converter, Path};

    fn read(value: &dyn vc_reflect::Reflect, config: &SerializeConfig) -> Value {
        Converter::new().serialize(value, &Path::root(), config).unwrap()
    }

    #[test]
    fn primitives_pass_through() {
        let config = SerializeConfig::default();
        assert_eq!(read(&-3_i8, &config), Value::from(-3_i8));
        assert_eq!(read(&u64::MAX, &config), Value::from(u64::MAX));
        assert_eq!(read(&'x', &config), Value::from("x"));
        assert_eq!(read(&(), &config), Value::Null);
        assert_eq!(read(&Cow::<'static, str>::Borrowed("c"), &config), Value::from("c"));
        assert_eq!(read(&PathBuf::from("/tmp/a"), &config), Value::from("/tmp/a"));
        assert_eq!(read(&f64::INFINITY, &config), Value::from("Infinity"));
        assert_eq!(read(&String::from("s"), &config), Value::from("s"));
    }

    #[test]
    fn wide_integers() {
        let config = SerializeConfig::default();
        assert_eq!(read(&(i128::from(i64::MIN) - 1), &config), Value::from("-9223372036854775809"));
        assert_eq!(read(&u128::MAX, &config), Value::from(u128::MAX.to_string()));

        let config = config.with_large_integers_as_string(true);
        assert_eq!(read(&9_007_199_254_740_991_u64, &config), Value::from(9_007_199_254_740_991_u64));
        assert_eq!(read(&9_007_199_254_740_992_u64, &config), Value::from("9007199254740992"));
        assert_eq!(read(&-9_007_199_254_740_992_i64, &config), Value::from("-9007199254740992"));
    }

    #[test]
    fn values_navigate_and_write() {
        let mut tree: Value = serde_json::from_str(r#"{"a": [1, {"b": true}]}"#).unwrap();
        let converter = Converter::new();
        let config = SerializeConfig::default();

        let path: Path = "a/1/b".parse().unwrap();
        assert_eq!(converter.serialize(&tree, &path, &config).unwrap(), Value::Bool(true));

        let old = converter.set_value(&mut tree, &path, &Value::Bool(false)).unwrap();
        assert_eq!(old.unwrap().take::<Value>().unwrap(), Value::Bool(true));
        assert_eq!(tree.to_string(), r#"{"a":[1,{"b":false}]}"#);
    }
}
