use core::fmt;

use crate::info::VariantKind;
use crate::ReflectRef;

/// Default [`Reflect::reflect_debug`](crate::Reflect::reflect_debug) body.
///
/// Shared nodes print only their type: formatting must not take a lock.
pub(crate) fn kind_debug(value: ReflectRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        ReflectRef::Struct(value) => {
            let mut debug = f.debug_struct(value.type_path());
            for (info, field) in value.iter_fields() {
                debug.field(info.name(), &field);
            }
            debug.finish()
        }
        ReflectRef::Tuple(value) => {
            let mut debug = f.debug_tuple("");
            for field in value.iter_fields() {
                debug.field(&field);
            }
            debug.finish()
        }
        ReflectRef::List(value) => f.debug_list().entries(value.iter()).finish(),
        ReflectRef::Set(value) => f.debug_set().entries(value.iter()).finish(),
        ReflectRef::Map(value) => f.debug_map().entries(value.iter()).finish(),
        ReflectRef::Enum(value) => match value.variant_kind() {
            VariantKind::Unit => f.write_str(value.variant_name()),
            VariantKind::Tuple => {
                let mut debug = f.debug_tuple(value.variant_name());
                for (_, field) in value.iter_fields() {
                    debug.field(&field);
                }
                debug.finish()
            }
            VariantKind::Struct => {
                let mut debug = f.debug_struct(value.variant_name());
                for (name, field) in value.iter_fields() {
                    debug.field(name.unwrap_or_default(), &field);
                }
                debug.finish()
            }
        },
        ReflectRef::Optional(value) => match value.get() {
            Some(inner) => f.debug_tuple("Some").field(&inner).finish(),
            None => f.write_str("None"),
        },
        ReflectRef::Shared(value) => f.debug_struct(value.type_path()).finish_non_exhaustive(),
        ReflectRef::Opaque(value) => f.write_str(value.type_path()),
    }
}
