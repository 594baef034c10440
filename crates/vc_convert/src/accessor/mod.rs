//! Shape-specific read and write handlers.
//!
//! ## Menu
//!
//! - [`Accessor`]: the handler trait, one implementation per shape family.
//! - [`Nesting`]: how an accessor's values nest, driving fan-out assembly
//!   and budget accounting.
//! - Built-ins, in dispatch order:
//!   [`TerminalAccessor`], [`CompositeAccessor`], [`TabularAccessor`],
//!   [`DateTimeAccessor`], [`SerdeAccessor`], [`OptionalAccessor`],
//!   [`EnumAccessor`], [`SequenceAccessor`], [`MapAccessor`],
//!   [`BeanAccessor`], and the catch-all [`OpaqueAccessor`].

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use vc_reflect::Reflect;

use crate::context::{SerializeContext, WriteContext};
use crate::error::{ConvertError, ValueParseError};
use crate::path::Segment;
use crate::registry::AccessorRegistry;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Modules

mod bean;
mod composite;
mod date_time;
mod enumeration;
mod map;
mod opaque;
mod optional;
mod sequence;
mod serde_backed;
mod tabular;
mod terminal;

// -----------------------------------------------------------------------------
// Exports

pub use bean::BeanAccessor;
pub use composite::CompositeAccessor;
pub use date_time::DateTimeAccessor;
pub use enumeration::EnumAccessor;
pub use map::MapAccessor;
pub use opaque::OpaqueAccessor;
pub use optional::OptionalAccessor;
pub use sequence::SequenceAccessor;
pub use serde_backed::SerdeAccessor;
pub use tabular::TabularAccessor;
pub use terminal::TerminalAccessor;

// -----------------------------------------------------------------------------
// Nesting

/// How the values an accessor handles relate to their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    /// Lowered as a whole. Takes no part in cycle or budget accounting.
    Leaf,
    /// Stands for at most one inner value, see [`Accessor::inner`].
    Transparent,
    /// Children addressed by name or key; a fan-out assembles an object.
    Keyed,
    /// Children addressed by position; a fan-out assembles an array.
    Indexed,
}

// -----------------------------------------------------------------------------
// Accessor

/// Reads and writes one family of shapes.
///
/// Accessors never recurse on their own: they call back into the
/// [`SerializeContext`] (or [`WriteContext`]) for every child, which keeps
/// depth, object budget and cycle bookkeeping in one place.
///
/// # Examples
///
/// An accessor that renders a newtype as text:
///
/// ```
/// use vc_convert::accessor::{Accessor, Nesting};
/// use vc_convert::context::SerializeContext;
/// use vc_convert::error::ConvertError;
/// use vc_convert::registry::AccessorRegistry;
/// use vc_convert::value::Value;
/// use vc_convert::{Converter, Path, SerializeConfig};
/// use vc_convert::reflect::{Reflect, impl_reflect_opaque};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Celsius(f32);
/// impl_reflect_opaque!(Celsius);
///
/// struct CelsiusAccessor;
///
/// impl Accessor for CelsiusAccessor {
///     fn name(&self) -> &'static str {
///         "celsius"
///     }
///
///     fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
///         value.is::<Celsius>()
///     }
///
///     fn nesting(&self, _: &dyn Reflect) -> Nesting {
///         Nesting::Leaf
///     }
///
///     fn read(&self, _: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
///         let Some(c) = value.downcast_ref::<Celsius>() else {
///             return Ok(Value::Null);
///         };
///         Ok(Value::from(format!("{:.1} °C", c.0)))
///     }
/// }
///
/// let mut registry = AccessorRegistry::new();
/// registry.prepend(CelsiusAccessor);
/// let converter = Converter::with_registry(Arc::new(registry));
///
/// let value = converter
///     .serialize(&Celsius(21.5), &Path::root(), &SerializeConfig::default())
///     .unwrap();
/// assert_eq!(value, Value::from("21.5 °C"));
/// ```
pub trait Accessor: Send + Sync + 'static {
    /// A short unique name, listed by [`AccessorRegistry::names`].
    fn name(&self) -> &'static str;

    /// Returns `true` if this accessor handles `value`.
    fn accepts(&self, registry: &AccessorRegistry, value: &dyn Reflect) -> bool;

    fn nesting(&self, value: &dyn Reflect) -> Nesting;

    /// Lowers the whole value.
    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError>;

    /// The inner value of a [`Transparent`](Nesting::Transparent) value.
    #[inline]
    fn inner<'v>(&self, _value: &'v dyn Reflect) -> Option<&'v dyn Reflect> {
        None
    }

    /// The inner value of a [`Transparent`](Nesting::Transparent) value, mutably.
    #[inline]
    fn inner_mut<'v>(&self, _value: &'v mut dyn Reflect) -> Option<&'v mut dyn Reflect> {
        None
    }

    /// Resolves one child by key.
    fn child<'v>(
        &self,
        _cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        key: &str,
    ) -> Result<&'v dyn Reflect, ConvertError> {
        Err(ConvertError::type_mismatch(&Segment::key(key), value))
    }

    /// How many path segments one child lookup consumes.
    #[inline]
    fn key_arity(&self, _value: &dyn Reflect) -> usize {
        1
    }

    /// Resolves one child from [`key_arity`](Self::key_arity) keys.
    fn child_by_keys<'v>(
        &self,
        cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
        keys: &[&str],
    ) -> Result<&'v dyn Reflect, ConvertError> {
        match keys {
            [key] => self.child(cx, value, key),
            _ => Err(ConvertError::type_mismatch(
                &Segment::key(keys.join("/")),
                value,
            )),
        }
    }

    /// Returns `true` if a wildcard over `value` assembles an object keyed
    /// by child key, `false` for an array in child order.
    #[inline]
    fn fan_out_keyed(&self, value: &dyn Reflect) -> bool {
        self.nesting(value) == Nesting::Keyed
    }

    /// Lists every child with its key, for wildcard fan-out.
    fn children<'v>(
        &self,
        _cx: &mut SerializeContext<'_>,
        value: &'v dyn Reflect,
    ) -> Result<Vec<(String, &'v dyn Reflect)>, ConvertError> {
        Err(ConvertError::type_mismatch(&Segment::Wildcard, value))
    }

    /// Returns `true` if [`write`](Self::write) can succeed at all.
    #[inline]
    fn can_write(&self) -> bool {
        false
    }

    /// Resolves one child by key for a write further down the path.
    fn child_mut<'v>(
        &self,
        _wx: &mut WriteContext<'_>,
        container: &'v mut dyn Reflect,
        _key: &str,
    ) -> Result<&'v mut dyn Reflect, ConvertError> {
        Err(ConvertError::not_writable(container.type_path()))
    }

    /// Replaces the child `key` of `container` with `value`, returning the
    /// previous child, or `None` if there was none.
    fn write(
        &self,
        _wx: &mut WriteContext<'_>,
        container: &mut dyn Reflect,
        _key: &str,
        _value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        Err(ConvertError::not_writable(container.type_path()))
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Parses a sequence index: non-numeric or negative text is a conversion
/// error, anything at or beyond `len` is out of range, however large.
pub(crate) fn parse_index(key: &str, len: usize) -> Result<usize, ConvertError> {
    let key = key.trim();
    let is_digits = |text: &str| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(key) {
        let reason = match key.strip_prefix('-') {
            Some(rest) if is_digits(rest) => "index is negative",
            _ => "not an index",
        };
        return Err(ValueParseError::from_text("usize", key, reason).into());
    }
    // All digits, so a failed parse is an overflow.
    let index = key.parse::<usize>().unwrap_or(usize::MAX);
    if index >= len {
        return Err(ConvertError::IndexOutOfRange { index, len });
    }
    Ok(index)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::parse_index;
    use crate::error::ConvertError;

    #[test]
    fn indices() {
        assert_eq!(parse_index("2", 3).unwrap(), 2);
        assert_eq!(parse_index(" 0 ", 1).unwrap(), 0);
        assert!(matches!(
            parse_index("3", 3),
            Err(ConvertError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            parse_index("18446744073709551616", 3),
            Err(ConvertError::IndexOutOfRange { index: usize::MAX, len: 3 })
        ));
        for bad in ["-1", "one", "", "+1", "1.5", "-"] {
            assert!(matches!(parse_index(bad, 3), Err(ConvertError::Conversion(_))), "{bad}");
        }
    }
}
