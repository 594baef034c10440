use core::any::{Any, TypeId};

use crate::Reflect;

// -----------------------------------------------------------------------------
// NodeId

/// The identity of a shared cell: its address together with its type.
///
/// The type disambiguates cells that start at the same address, such as a
/// struct and its first field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    addr: usize,
    ty: TypeId,
}

impl NodeId {
    #[inline]
    pub const fn new(addr: usize, ty: TypeId) -> Self {
        Self { addr, ty }
    }

    /// The identity of the cell `value` lives in.
    #[inline]
    pub fn of<T: Any>(value: &T) -> Self {
        Self::from_ptr(core::ptr::from_ref(value))
    }

    #[inline]
    pub fn from_ptr<T: Any>(ptr: *const T) -> Self {
        Self {
            addr: ptr.cast::<()>().addr(),
            ty: TypeId::of::<T>(),
        }
    }

    #[inline]
    pub const fn addr(&self) -> usize {
        self.addr
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.ty
    }
}

// -----------------------------------------------------------------------------
// Shared

/// A node that can be reached along more than one path.
///
/// Shared nodes are the only way an object graph can contain cycles, so
/// traversals key their visited set on [`identity`](Shared::identity) and
/// check it *before* calling [`read_with`](Shared::read_with) or
/// [`write_with`](Shared::write_with). Those may take a lock, and taking a
/// lock that is already held further up the current path would deadlock.
///
/// Pointers (`Arc`, `Weak`) look through a lock they point to: they report
/// the lock's identity and hand out the locked value.
///
/// Access is callback based because a lock guard cannot outlive the call.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, RwLock};
/// use vc_reflect::{Reflect, ReflectRef};
///
/// let node = Arc::new(RwLock::new(1_i32));
/// let other = Arc::clone(&node);
///
/// let (ReflectRef::Shared(a), ReflectRef::Shared(b)) = (node.reflect_ref(), other.reflect_ref())
/// else { unreachable!() };
/// assert_eq!(a.identity(), b.identity());
///
/// assert!(a.write_with(&mut |value| {
///     value.replace(Box::new(2_i32)).unwrap();
/// }));
/// assert_eq!(*node.read().unwrap(), 2);
/// ```
pub trait Shared: Reflect {
    /// The identity of the shared allocation or cell.
    ///
    /// Two handles to the same node report the same identity.
    fn identity(&self) -> NodeId;

    /// Calls `f` with the shared value.
    ///
    /// Returns `false` without calling `f` if the value is gone (a dangling
    /// `Weak`).
    fn read_with(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool;

    /// Calls `f` with the shared value mutably.
    ///
    /// Returns `false` without calling `f` if the value is gone or cannot be
    /// mutated through a shared handle (an `Arc` without a lock inside).
    fn write_with(&self, f: &mut dyn FnMut(&mut dyn Reflect)) -> bool;
}
