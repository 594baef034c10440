use crate::Reflect;
use crate::info::TypeHint;

// -----------------------------------------------------------------------------
// List

/// A trait used to power [list-like] operations via reflection.
///
/// Elements are homogeneous and addressed by index. Implemented for
/// `Vec<T>`, `VecDeque<T>`, `[T; N]` and `Box<[T]>`.
///
/// # Example
///
/// ```
/// use vc_reflect::{Reflect, ReflectMut, ops::List};
///
/// let mut items = vec![1_u8, 2, 3];
/// assert_eq!(items.iter().count(), 3);
///
/// if let ReflectMut::List(list) = items.reflect_mut() {
///     let old = list.get_mut(1).unwrap().replace(Box::new(7_u8)).unwrap();
///     assert_eq!(old.take::<u8>().unwrap(), 2);
/// }
/// assert_eq!(items, [1, 7, 3]);
/// ```
///
/// [list-like]: https://doc.rust-lang.org/book/ch08-01-vectors.html
pub trait List: Reflect {
    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the list holds no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index`, or `None` if out of bounds.
    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the element at `index` mutably, or `None` if out of bounds.
    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Returns an iterator over the elements in order.
    fn iter(&self) -> ListItemIter<'_>;

    /// Returns the static element type.
    fn item_type(&self) -> TypeHint;
}

// -----------------------------------------------------------------------------
// ListItemIter

/// An iterator over the elements of a [`List`].
pub struct ListItemIter<'a> {
    list: &'a dyn List,
    index: usize,
}

impl ListItemIter<'_> {
    /// Creates a new iterator for the given list.
    #[inline(always)]
    pub const fn new(list: &dyn List) -> ListItemIter<'_> {
        ListItemIter { list, index: 0 }
    }
}

impl<'a> Iterator for ListItemIter<'a> {
    type Item = &'a dyn Reflect;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.list.get(self.index);
        self.index += value.is_some() as usize;
        value
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.list.len().saturating_sub(self.index);
        (size, Some(size))
    }
}

impl ExactSizeIterator for ListItemIter<'_> {}
