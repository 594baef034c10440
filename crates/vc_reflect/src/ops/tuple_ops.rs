use crate::Reflect;

// -----------------------------------------------------------------------------
// Tuple

/// A trait used to power positional field access via reflection.
///
/// Implemented for tuples up to 8 elements and derived for tuple structs.
/// A tuple struct with exactly one reflected field is a *newtype*; callers
/// may choose to treat it as its inner value.
///
/// # Example
///
/// ```
/// use vc_reflect::{derive::Reflect, ops::Tuple};
///
/// #[derive(Reflect)]
/// struct Meters(f64);
///
/// let pair = (1_u8, "two");
/// assert_eq!(pair.field_len(), 2);
/// assert!(!pair.is_newtype());
///
/// let m = Meters(3.5);
/// assert!(m.is_newtype());
/// assert_eq!(m.field(0).and_then(|v| v.downcast_ref::<f64>()), Some(&3.5));
/// ```
pub trait Tuple: Reflect {
    /// Returns the number of reflected fields.
    fn field_len(&self) -> usize;

    /// Returns the field at `index`, or `None` if out of bounds.
    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the field at `index` mutably, or `None` if out of bounds.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Returns an iterator over the fields in order.
    fn iter_fields(&self) -> TupleFieldIter<'_>;

    /// Returns `true` for a single-field tuple struct.
    #[inline]
    fn is_newtype(&self) -> bool {
        false
    }
}

// -----------------------------------------------------------------------------
// TupleFieldIter

/// An iterator over the fields of a [`Tuple`].
pub struct TupleFieldIter<'a> {
    inner: &'a dyn Tuple,
    index: usize,
}

impl TupleFieldIter<'_> {
    #[inline(always)]
    pub const fn new(inner: &dyn Tuple) -> TupleFieldIter<'_> {
        TupleFieldIter { inner, index: 0 }
    }
}

impl<'a> Iterator for TupleFieldIter<'a> {
    type Item = &'a dyn Reflect;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.inner.field(self.index);
        self.index += value.is_some() as usize;
        value
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.inner.field_len().saturating_sub(self.index);
        (size, Some(size))
    }
}

impl ExactSizeIterator for TupleFieldIter<'_> {}
