use core::fmt;

use crate::Reflect;
use crate::ops::{Enum, List, Map, Optional, Set, Shared, Struct, Tuple};

// -----------------------------------------------------------------------------
// ReflectKind

/// A zero-sized enumeration of the "kinds" of a reflected type.
///
/// Each kind corresponds to a trait in [`ops`](crate::ops), except
/// [`Opaque`](ReflectKind::Opaque), which marks a value that is only
/// meaningful as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectKind {
    Struct,
    Tuple,
    List,
    Set,
    Map,
    Enum,
    Optional,
    Shared,
    Opaque,
}

impl ReflectKind {
    /// Returns the kind name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ReflectKind::Struct => "Struct",
            ReflectKind::Tuple => "Tuple",
            ReflectKind::List => "List",
            ReflectKind::Set => "Set",
            ReflectKind::Map => "Map",
            ReflectKind::Enum => "Enum",
            ReflectKind::Optional => "Optional",
            ReflectKind::Shared => "Shared",
            ReflectKind::Opaque => "Opaque",
        }
    }
}

impl fmt::Display for ReflectKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// ReflectRef / ReflectMut

/// An immutable view of a reflected value as its kind trait.
pub enum ReflectRef<'a> {
    Struct(&'a dyn Struct),
    Tuple(&'a dyn Tuple),
    List(&'a dyn List),
    Set(&'a dyn Set),
    Map(&'a dyn Map),
    Enum(&'a dyn Enum),
    Optional(&'a dyn Optional),
    Shared(&'a dyn Shared),
    Opaque(&'a dyn Reflect),
}

/// A mutable view of a reflected value as its kind trait.
pub enum ReflectMut<'a> {
    Struct(&'a mut dyn Struct),
    Tuple(&'a mut dyn Tuple),
    List(&'a mut dyn List),
    Set(&'a mut dyn Set),
    Map(&'a mut dyn Map),
    Enum(&'a mut dyn Enum),
    Optional(&'a mut dyn Optional),
    Shared(&'a mut dyn Shared),
    Opaque(&'a mut dyn Reflect),
}

macro_rules! impl_kind_fn {
    ($name:ident) => {
        impl $name<'_> {
            /// Returns the [`ReflectKind`] of this view.
            pub fn kind(&self) -> ReflectKind {
                match self {
                    $name::Struct(_) => ReflectKind::Struct,
                    $name::Tuple(_) => ReflectKind::Tuple,
                    $name::List(_) => ReflectKind::List,
                    $name::Set(_) => ReflectKind::Set,
                    $name::Map(_) => ReflectKind::Map,
                    $name::Enum(_) => ReflectKind::Enum,
                    $name::Optional(_) => ReflectKind::Optional,
                    $name::Shared(_) => ReflectKind::Shared,
                    $name::Opaque(_) => ReflectKind::Opaque,
                }
            }
        }
    };
}

impl_kind_fn!(ReflectRef);
impl_kind_fn!(ReflectMut);
