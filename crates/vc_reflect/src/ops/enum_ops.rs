use alloc::boxed::Box;

use crate::Reflect;
use crate::info::VariantKind;

// -----------------------------------------------------------------------------
// Enum

/// A trait used to power [enum-like] operations via reflection.
///
/// Only the active variant is visible. Struct-variant fields are addressed
/// by name or index; tuple-variant fields by index only.
///
/// # Example
///
/// ```
/// use vc_reflect::{derive::Reflect, info::VariantKind, ops::Enum};
///
/// #[derive(Reflect, Debug, PartialEq)]
/// enum Shape {
///     Empty,
///     Circle { radius: f32 },
///     #[reflect(rename = "rect")]
///     Rectangle(f32, f32),
/// }
///
/// let shape = Shape::Rectangle(1.0, 2.0);
/// assert_eq!(shape.variant_name(), "rect");
/// assert_eq!(shape.variant_kind(), VariantKind::Tuple);
/// assert_eq!(shape.field_len(), 2);
///
/// let circle = Shape::Circle { radius: 1.5 };
/// assert!(circle.field("radius").is_some());
///
/// let empty = circle.unit_variant("Empty").unwrap();
/// assert_eq!(empty.take::<Shape>().unwrap(), Shape::Empty);
/// assert!(circle.unit_variant("rect").is_none());
/// ```
///
/// [enum-like]: https://doc.rust-lang.org/book/ch06-01-defining-an-enum.html
pub trait Enum: Reflect {
    /// Returns the reflected name of the active variant.
    fn variant_name(&self) -> &'static str;

    /// Returns the declaration index of the active variant.
    fn variant_index(&self) -> usize;

    /// Returns the shape of the active variant.
    fn variant_kind(&self) -> VariantKind;

    /// Returns the reflected names of all variants, in declaration order.
    fn variant_names(&self) -> &'static [&'static str];

    /// Returns the number of reflected fields of the active variant.
    fn field_len(&self) -> usize;

    /// Returns the struct-variant field named `name`.
    fn field(&self, name: &str) -> Option<&dyn Reflect>;

    /// Returns the struct-variant field named `name` mutably.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;

    /// Returns the field of the active variant at `index`.
    fn field_at(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the field of the active variant at `index` mutably.
    fn field_at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Returns the name of the struct-variant field at `index`.
    fn name_at(&self, index: usize) -> Option<&'static str>;

    /// Builds the unit variant named `name`, if the enum has one.
    fn unit_variant(&self, name: &str) -> Option<Box<dyn Reflect>>;

    /// Returns an iterator over the fields of the active variant.
    fn iter_fields(&self) -> VariantFieldIter<'_>;
}

// -----------------------------------------------------------------------------
// VariantFieldIter

/// An iterator over the fields of the active variant of an [`Enum`].
///
/// Yields the field name for struct variants and `None` otherwise.
pub struct VariantFieldIter<'a> {
    inner: &'a dyn Enum,
    index: usize,
}

impl VariantFieldIter<'_> {
    #[inline(always)]
    pub const fn new(inner: &dyn Enum) -> VariantFieldIter<'_> {
        VariantFieldIter { inner, index: 0 }
    }
}

impl<'a> Iterator for VariantFieldIter<'a> {
    type Item = (Option<&'static str>, &'a dyn Reflect);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.inner.field_at(self.index)?;
        let name = self.inner.name_at(self.index);
        self.index += 1;
        Some((name, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.inner.field_len().saturating_sub(self.index);
        (size, Some(size))
    }
}

impl ExactSizeIterator for VariantFieldIter<'_> {}
