use alloc::borrow::Cow;
use alloc::string::String;
use std::path::PathBuf;

use crate::Reflect;
use crate::ops::{Tuple, TupleFieldIter};
use crate::reflection::impl_reflect_cast_fn;

// -----------------------------------------------------------------------------
// Opaque leaves

crate::impl_reflect_opaque!(
    bool, char, (),
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    &'static str, String, Cow<'static, str>,
    PathBuf,
);

// -----------------------------------------------------------------------------
// Tuples

macro_rules! impl_reflect_tuple {
    ($len:literal: $($index:tt $name:ident),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            impl_reflect_cast_fn!(Tuple);
        }

        impl<$($name: Reflect),+> Tuple for ($($name,)+) {
            #[inline]
            fn field_len(&self) -> usize {
                $len
            }

            fn field(&self, index: usize) -> Option<&dyn Reflect> {
                match index {
                    $($index => Some(&self.$index),)+
                    _ => None,
                }
            }

            fn field_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
                match index {
                    $($index => Some(&mut self.$index),)+
                    _ => None,
                }
            }

            #[inline]
            fn iter_fields(&self) -> TupleFieldIter<'_> {
                TupleFieldIter::new(self)
            }
        }
    };
}

impl_reflect_tuple!(1: 0 P0);
impl_reflect_tuple!(2: 0 P0, 1 P1);
impl_reflect_tuple!(3: 0 P0, 1 P1, 2 P2);
impl_reflect_tuple!(4: 0 P0, 1 P1, 2 P2, 3 P3);
impl_reflect_tuple!(5: 0 P0, 1 P1, 2 P2, 3 P3, 4 P4);
impl_reflect_tuple!(6: 0 P0, 1 P1, 2 P2, 3 P3, 4 P4, 5 P5);
impl_reflect_tuple!(7: 0 P0, 1 P1, 2 P2, 3 P3, 4 P4, 5 P5, 6 P6);
impl_reflect_tuple!(8: 0 P0, 1 P1, 2 P2, 3 P3, 4 P4, 5 P5, 6 P6, 7 P7);

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;

    use crate::ops::Tuple;
    use crate::{Reflect, ReflectKind, ReflectRef};

    #[test]
    fn tuple_fields_by_index() {
        let mut value = (1_u8, String::from("a"), 2.5_f64);
        assert_eq!(value.reflect_kind(), ReflectKind::Tuple);
        assert_eq!(Tuple::field_len(&value), 3);
        assert!(Tuple::field(&value, 3).is_none());

        let slot = Tuple::field_mut(&mut value, 1).unwrap();
        slot.replace(alloc::boxed::Box::new(String::from("b"))).unwrap();
        assert_eq!(value.1, "b");
    }

    #[test]
    fn opaque_debug_uses_own_impl() {
        let value: &dyn Reflect = &"quoted";
        assert_eq!(format!("{value:?}"), "\"quoted\"");
        assert!(matches!(value.reflect_ref(), ReflectRef::Opaque(_)));
    }

    #[test]
    fn tuple_debug_lists_fields() {
        let value: &dyn Reflect = &(1_i32, true);
        assert_eq!(format!("{value:?}"), "(1, true)");
    }
}
