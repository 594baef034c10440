use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::impls::kind_debug;
use crate::kind::{ReflectKind, ReflectMut, ReflectRef};

// -----------------------------------------------------------------------------
// Reflect

/// The foundational trait for runtime introspection.
///
/// A `Reflect` value can be inspected without compile-time knowledge of its
/// type: [`reflect_ref`] and [`reflect_mut`] expose it as one of the kind
/// traits ([`Struct`], [`Tuple`], [`List`], [`Set`], [`Map`], [`Enum`],
/// [`Optional`], [`Shared`]) or as an opaque leaf.
///
/// # Recommendations
///
/// Use [the derive macro] rather than implementing this trait by hand.
/// Leaf types that should be treated as a single value can use
/// [`impl_reflect_opaque!`](crate::impl_reflect_opaque).
///
/// # Type Identification
///
/// [`Any::type_id`] on a `Box<dyn Reflect>` returns the id of the box.
/// [`Reflect::ty_id`] always returns the id of the underlying value:
///
/// ```
/// use vc_reflect::Reflect;
/// use core::any::TypeId;
///
/// let x: Box<dyn Reflect> = 32_i32.into_boxed_reflect();
/// assert!(x.ty_id() == TypeId::of::<i32>());
/// assert!(x.is::<i32>());
/// assert_eq!(x.downcast_ref::<i32>(), Some(&32));
/// ```
///
/// # Replacing values
///
/// [`Reflect::replace`] swaps in a value of the same concrete type and hands
/// back the previous one, so no `Clone` bound is needed to report what was
/// overwritten:
///
/// ```
/// use vc_reflect::Reflect;
///
/// let mut x = 1_u8;
/// let old = x.replace(Box::new(2_u8)).unwrap();
/// assert_eq!(x, 2);
/// assert_eq!(old.take::<u8>().unwrap(), 1);
///
/// // Wrong type: the argument comes back untouched.
/// assert!(x.replace(Box::new("two")).is_err());
/// ```
///
/// [`reflect_ref`]: Reflect::reflect_ref
/// [`reflect_mut`]: Reflect::reflect_mut
/// [the derive macro]: crate::derive::Reflect
/// [`Struct`]: crate::ops::Struct
/// [`Tuple`]: crate::ops::Tuple
/// [`List`]: crate::ops::List
/// [`Set`]: crate::ops::Set
/// [`Map`]: crate::ops::Map
/// [`Enum`]: crate::ops::Enum
/// [`Optional`]: crate::ops::Optional
/// [`Shared`]: crate::ops::Shared
pub trait Reflect: Any + Send + Sync {
    /// Casts this type to a reflected reference.
    #[inline(always)]
    fn as_reflect(&self) -> &dyn Reflect
    where
        Self: Sized,
    {
        self
    }

    /// Casts this type to a mutable reflected reference.
    #[inline(always)]
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect
    where
        Self: Sized,
    {
        self
    }

    /// Boxes this value as a `Box<dyn Reflect>`.
    #[inline(always)]
    fn into_boxed_reflect(self) -> Box<dyn Reflect>
    where
        Self: Sized,
    {
        Box::new(self)
    }

    /// Returns the [`TypeId`] of the underlying type.
    #[inline]
    fn ty_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Returns the full path of the underlying type, as
    /// [`core::any::type_name`] reports it.
    #[inline]
    fn type_path(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Casts to `&dyn Any` of the underlying value.
    fn as_any(&self) -> &dyn Any;

    /// Casts to `&mut dyn Any` of the underlying value.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Casts to `Box<dyn Any>` of the underlying value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Returns the [kind](ReflectKind) of this value.
    ///
    /// ```
    /// use vc_reflect::{Reflect, ReflectKind};
    ///
    /// assert_eq!(vec![1, 2].reflect_kind(), ReflectKind::List);
    /// assert_eq!(Some(1).reflect_kind(), ReflectKind::Optional);
    /// assert_eq!("text".reflect_kind(), ReflectKind::Opaque);
    /// ```
    fn reflect_kind(&self) -> ReflectKind;

    /// Returns an immutable view of this value as its kind trait.
    fn reflect_ref(&self) -> ReflectRef<'_>;

    /// Returns a mutable view of this value as its kind trait.
    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    /// Replaces this value with `value` and returns the previous value.
    ///
    /// Fails, returning `value` unchanged, if its concrete type differs.
    fn replace(&mut self, value: Box<dyn Reflect>) -> Result<Box<dyn Reflect>, Box<dyn Reflect>>;

    /// Debug formatter for the value.
    ///
    /// Opaque types format with their own [`Debug`](fmt::Debug) impl, other
    /// kinds are formatted member by member.
    fn reflect_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        kind_debug(self.reflect_ref(), f)
    }
}

// -----------------------------------------------------------------------------
// Downcast

impl dyn Reflect {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    /// Downcasts the value to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts the value to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcasts the value to type `T`, unboxing and consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    pub fn take<T: Any>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            // `is::<T>` and `into_any` both look through to the same value.
            Err(_) => unreachable!("`into_any` disagrees with `ty_id`"),
        }
    }
}

impl fmt::Debug for dyn Reflect {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reflect_debug(f)
    }
}

// -----------------------------------------------------------------------------
// Boxed values

/// A boxed reflected value is transparent: every method looks through the box.
///
/// This lets heterogeneous containers such as `Vec<Box<dyn Reflect>>` take part
/// in reflection. [`Reflect::replace`] keeps the inner type.
impl Reflect for Box<dyn Reflect> {
    #[inline]
    fn ty_id(&self) -> TypeId {
        (**self).ty_id()
    }

    #[inline]
    fn type_path(&self) -> &'static str {
        (**self).type_path()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        (**self).as_any_mut()
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        Reflect::into_any(*self)
    }

    #[inline]
    fn reflect_kind(&self) -> ReflectKind {
        (**self).reflect_kind()
    }

    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        (**self).reflect_ref()
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        (**self).reflect_mut()
    }

    #[inline]
    fn replace(&mut self, value: Box<dyn Reflect>) -> Result<Box<dyn Reflect>, Box<dyn Reflect>> {
        (**self).replace(value)
    }

    #[inline]
    fn reflect_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).reflect_debug(f)
    }
}

// -----------------------------------------------------------------------------
// Internal helpers

/// Implements the kind-independent methods of [`Reflect`] for a sized type.
///
/// The type must implement the kind trait named by the argument.
macro_rules! impl_reflect_cast_fn {
    ($kind:ident) => {
        #[inline]
        fn as_any(&self) -> &dyn ::core::any::Any {
            self
        }

        #[inline]
        fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
            self
        }

        #[inline]
        fn into_any(
            self: ::alloc::boxed::Box<Self>,
        ) -> ::alloc::boxed::Box<dyn ::core::any::Any> {
            self
        }

        #[inline]
        fn reflect_kind(&self) -> $crate::ReflectKind {
            $crate::ReflectKind::$kind
        }

        #[inline]
        fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
            $crate::ReflectRef::$kind(self)
        }

        #[inline]
        fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
            $crate::ReflectMut::$kind(self)
        }

        fn replace(
            &mut self,
            value: ::alloc::boxed::Box<dyn $crate::Reflect>,
        ) -> ::core::result::Result<
            ::alloc::boxed::Box<dyn $crate::Reflect>,
            ::alloc::boxed::Box<dyn $crate::Reflect>,
        > {
            let value = <dyn $crate::Reflect>::take::<Self>(value)?;
            Ok(::alloc::boxed::Box::new(::core::mem::replace(self, value)))
        }
    };
}

pub(crate) use impl_reflect_cast_fn;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use core::any::TypeId;

    use crate::{Reflect, ReflectKind};

    #[test]
    fn boxed_value_is_transparent() {
        let boxed: Box<dyn Reflect> = Box::new(String::from("x"));
        let outer: &dyn Reflect = &boxed;

        assert_eq!(outer.ty_id(), TypeId::of::<String>());
        assert_eq!(outer.reflect_kind(), ReflectKind::Opaque);
        assert_eq!(outer.downcast_ref::<String>().map(String::as_str), Some("x"));
    }

    #[test]
    fn replace_returns_previous_value() {
        let mut items = vec![1_i32, 2];
        let old = items.replace(Box::new(vec![3_i32])).unwrap();

        assert_eq!(items, [3]);
        assert_eq!(old.take::<alloc::vec::Vec<i32>>().unwrap(), [1, 2]);
    }

    #[test]
    fn take_wrong_type_returns_box() {
        let value: Box<dyn Reflect> = Box::new(5_u32);
        let value = value.take::<i64>().unwrap_err();
        assert_eq!(value.take::<u32>().unwrap(), 5);
    }
}
