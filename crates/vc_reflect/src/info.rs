//! Static descriptions attached to reflected types.

use core::any::{Any, TypeId};
use core::fmt;

// -----------------------------------------------------------------------------
// FieldInfo

/// Name and access flags of one reflected struct field.
///
/// Fields marked `#[reflect(skip)]` have no `FieldInfo` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    name: &'static str,
    read_only: bool,
}

impl FieldInfo {
    /// Creates a writable field description.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            read_only: false,
        }
    }

    /// Marks the field as readable but not writable through reflection.
    #[inline]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// The reflected name of the field, after `rename`.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }
}

// -----------------------------------------------------------------------------
// VariantKind

/// The shape of an enum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// `A`
    Unit,
    /// `A(u8, u8)`
    Tuple,
    /// `A { x: u8 }`
    Struct,
}

// -----------------------------------------------------------------------------
// TypeHint

/// The static type of a container's elements.
///
/// Containers report it so that a caller can build a new element (for
/// example when inserting into a map) without an existing one to copy.
#[derive(Clone, Copy)]
pub struct TypeHint {
    id: TypeId,
    path: &'static str,
}

impl TypeHint {
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeHint {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHint {}

impl fmt::Debug for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}
