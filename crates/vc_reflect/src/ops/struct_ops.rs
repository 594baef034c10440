use crate::Reflect;
use crate::info::FieldInfo;

// -----------------------------------------------------------------------------
// Struct

/// A trait used to power [struct-like] operations via reflection.
///
/// Fields are addressed by their reflected name (after `rename`) or by their
/// index in declaration order. Fields marked `#[reflect(skip)]` do not exist
/// for reflection.
///
/// # Example
///
/// ```
/// use vc_reflect::{derive::Reflect, ops::Struct};
///
/// #[derive(Reflect)]
/// struct Foo {
///     a: u32,
///     #[reflect(rename = "bee", read_only)]
///     b: bool,
///     #[reflect(skip)]
///     _cache: u64,
/// }
///
/// let foo = Foo { a: 1, b: true, _cache: 0 };
///
/// assert_eq!(foo.field_len(), 2);
/// assert!(foo.field("bee").is_some());
/// assert!(foo.field("b").is_none());
/// assert!(foo.field_info("bee").unwrap().is_read_only());
///
/// let names: Vec<_> = foo.iter_fields().map(|(info, _)| info.name()).collect();
/// assert_eq!(names, ["a", "bee"]);
/// ```
///
/// [struct-like]: https://doc.rust-lang.org/book/ch05-01-defining-structs.html
pub trait Struct: Reflect {
    /// Returns the static description of all reflected fields, in order.
    fn field_infos(&self) -> &'static [FieldInfo];

    /// Returns the field named `name`, or `None` if there is none.
    fn field(&self, name: &str) -> Option<&dyn Reflect>;

    /// Returns the field named `name` mutably, or `None` if there is none.
    ///
    /// Read-only fields are still returned; the flag is advisory and
    /// enforced by writers that honor [`FieldInfo::is_read_only`].
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;

    /// Returns the field at `index`, or `None` if out of bounds.
    fn field_at(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the field at `index` mutably, or `None` if out of bounds.
    fn field_at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Returns an iterator over `(info, value)` pairs in declaration order.
    fn iter_fields(&self) -> StructFieldIter<'_>;

    /// Returns the number of reflected fields.
    #[inline]
    fn field_len(&self) -> usize {
        self.field_infos().len()
    }

    /// Returns the description of the field named `name`.
    #[inline]
    fn field_info(&self, name: &str) -> Option<&'static FieldInfo> {
        self.field_infos().iter().find(|info| info.name() == name)
    }
}

// -----------------------------------------------------------------------------
// StructFieldIter

/// An iterator over the fields of a [`Struct`].
pub struct StructFieldIter<'a> {
    inner: &'a dyn Struct,
    index: usize,
}

impl StructFieldIter<'_> {
    #[inline(always)]
    pub const fn new(inner: &dyn Struct) -> StructFieldIter<'_> {
        StructFieldIter { inner, index: 0 }
    }
}

impl<'a> Iterator for StructFieldIter<'a> {
    type Item = (&'static FieldInfo, &'a dyn Reflect);

    fn next(&mut self) -> Option<Self::Item> {
        let info = self.inner.field_infos().get(self.index)?;
        let value = self.inner.field_at(self.index)?;
        self.index += 1;
        Some((info, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.inner.field_len().saturating_sub(self.index);
        (size, Some(size))
    }
}

impl ExactSizeIterator for StructFieldIter<'_> {}
