use alloc::boxed::Box;

use crate::Reflect;
use crate::info::TypeHint;

/// A value that may be absent, i.e. `Option<T>`.
///
/// # Example
///
/// ```
/// use vc_reflect::{Reflect, ReflectMut};
///
/// let mut slot: Option<u32> = None;
/// if let ReflectMut::Optional(opt) = slot.reflect_mut() {
///     assert!(opt.inner_type().is::<u32>());
///     assert!(opt.insert_boxed(Box::new(4_u32)).unwrap().is_none());
/// }
/// assert_eq!(slot, Some(4));
/// ```
pub trait Optional: Reflect {
    /// Returns the contained value, if any.
    fn get(&self) -> Option<&dyn Reflect>;

    /// Returns the contained value mutably, if any.
    fn get_mut(&mut self) -> Option<&mut dyn Reflect>;

    /// Takes the contained value out, leaving the slot empty.
    fn take(&mut self) -> Option<Box<dyn Reflect>>;

    /// Stores `value`, returning the previous content.
    ///
    /// Fails, returning `value` unchanged, if its type is not the inner type.
    fn insert_boxed(
        &mut self,
        value: Box<dyn Reflect>,
    ) -> Result<Option<Box<dyn Reflect>>, Box<dyn Reflect>>;

    /// Returns the static inner type.
    fn inner_type(&self) -> TypeHint;
}
