use alloc::boxed::Box;

use crate::Reflect;
use crate::info::TypeHint;

/// A trait used to power [set-like] operations via reflection.
///
/// Sets have no stable index, so reflection only reads them.
///
/// [set-like]: https://doc.rust-lang.org/stable/std/collections/struct.HashSet.html
pub trait Set: Reflect {
    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the set holds no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the elements in the set's iteration order.
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;

    /// Returns the static element type.
    fn item_type(&self) -> TypeHint;
}
