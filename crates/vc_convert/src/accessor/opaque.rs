use alloc::format;

use vc_reflect::Reflect;

use super::{Accessor, Nesting};
use crate::context::SerializeContext;
use crate::error::ConvertError;
use crate::registry::AccessorRegistry;
use crate::value::Value;

/// The catch-all: lowers any value to its debug text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueAccessor;

impl Accessor for OpaqueAccessor {
    fn name(&self) -> &'static str {
        "opaque"
    }

    #[inline]
    fn accepts(&self, _: &AccessorRegistry, _: &dyn Reflect) -> bool {
        true
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Leaf
    }

    fn read(&self, _: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        Ok(Value::String(format!("{value:?}")))
    }
}
