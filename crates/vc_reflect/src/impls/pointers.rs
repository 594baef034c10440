use alloc::sync::{Arc, Weak};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::ops::{NodeId, Shared};
use crate::reflection::impl_reflect_cast_fn;
use crate::{Reflect, ReflectRef};

/// The identity of a pointee: a lock's own identity, or the pointee cell.
fn pointee_identity<T: Reflect>(value: &T) -> NodeId {
    match value.reflect_ref() {
        ReflectRef::Shared(inner) => inner.identity(),
        _ => NodeId::of(value),
    }
}

/// Forwards a read into `value` if it is itself shared.
fn read_through(value: &dyn Reflect, f: &mut dyn FnMut(&dyn Reflect)) -> bool {
    match value.reflect_ref() {
        ReflectRef::Shared(inner) => inner.read_with(f),
        _ => {
            f(value);
            true
        }
    }
}

/// Forwards a write to `value` if it is itself shared.
fn write_through(value: &dyn Reflect, f: &mut dyn FnMut(&mut dyn Reflect)) -> bool {
    match value.reflect_ref() {
        ReflectRef::Shared(inner) => inner.write_with(f),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Arc / Weak

impl<T: Reflect> Reflect for Arc<T> {
    impl_reflect_cast_fn!(Shared);
}

impl<T: Reflect> Shared for Arc<T> {
    #[inline]
    fn identity(&self) -> NodeId {
        pointee_identity(&**self)
    }

    #[inline]
    fn read_with(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool {
        read_through(&**self, f)
    }

    #[inline]
    fn write_with(&self, f: &mut dyn FnMut(&mut dyn Reflect)) -> bool {
        write_through(&**self, f)
    }
}

impl<T: Reflect> Reflect for Weak<T> {
    impl_reflect_cast_fn!(Shared);
}

impl<T: Reflect> Shared for Weak<T> {
    fn identity(&self) -> NodeId {
        match self.upgrade() {
            Some(strong) => pointee_identity(&*strong),
            None => NodeId::from_ptr(Weak::as_ptr(self)),
        }
    }

    fn read_with(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool {
        let Some(strong) = self.upgrade() else {
            return false;
        };
        read_through(&*strong, f)
    }

    fn write_with(&self, f: &mut dyn FnMut(&mut dyn Reflect)) -> bool {
        let Some(strong) = self.upgrade() else {
            return false;
        };
        write_through(&*strong, f)
    }
}

// -----------------------------------------------------------------------------
// Locks

impl<T: Reflect> Reflect for RwLock<T> {
    impl_reflect_cast_fn!(Shared);
}

impl<T: Reflect> Shared for RwLock<T> {
    #[inline]
    fn identity(&self) -> NodeId {
        NodeId::of(self)
    }

    fn read_with(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool {
        let guard = self.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard);
        true
    }

    fn write_with(&self, f: &mut dyn FnMut(&mut dyn Reflect)) -> bool {
        let mut guard = self.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard);
        true
    }
}

impl<T: Reflect> Reflect for Mutex<T> {
    impl_reflect_cast_fn!(Shared);
}

impl<T: Reflect> Shared for Mutex<T> {
    #[inline]
    fn identity(&self) -> NodeId {
        NodeId::of(self)
    }

    fn read_with(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool {
        let guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*guard);
        true
    }

    fn write_with(&self, f: &mut dyn FnMut(&mut dyn Reflect)) -> bool {
        let mut guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard);
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use std::sync::{Mutex, RwLock};

    use crate::{Reflect, ReflectRef};

    fn shared(value: &dyn Reflect) -> &dyn crate::ops::Shared {
        match value.reflect_ref() {
            ReflectRef::Shared(shared) => shared,
            _ => panic!("expected a shared node"),
        }
    }

    #[test]
    fn clones_share_identity() {
        let a = Arc::new(RwLock::new(1_u8));
        let b = Arc::clone(&a);
        let c = Arc::new(RwLock::new(1_u8));
        assert_eq!(shared(&a).identity(), shared(&b).identity());
        assert_ne!(shared(&a).identity(), shared(&c).identity());

        let weak = Arc::downgrade(&a);
        assert_eq!(shared(&weak).identity(), shared(&a).identity());
    }

    #[test]
    fn pointer_reads_through_lock() {
        let value = Arc::new(RwLock::new(3_u16));
        let lock: &RwLock<u16> = &value;
        assert_eq!(shared(&value).identity(), shared(lock).identity());

        let mut seen = None;
        assert!(shared(&value).read_with(&mut |inner| seen = inner.downcast_ref::<u16>().copied()));
        assert_eq!(seen, Some(3));
    }

    #[test]
    fn dangling_weak_reads_nothing() {
        let weak = {
            let strong = Arc::new(5_u8);
            Arc::downgrade(&strong)
        };
        let mut called = false;
        assert!(!shared(&weak).read_with(&mut |_| called = true));
        assert!(!called);
    }

    #[test]
    fn plain_arc_is_read_only() {
        let value = Arc::new(5_u8);
        assert!(!shared(&value).write_with(&mut |_| {}));
    }

    #[test]
    fn mutex_write_through_arc() {
        let value = Arc::new(Mutex::new(1_i64));
        assert!(shared(&value).write_with(&mut |inner| {
            inner.replace(Box::new(9_i64)).unwrap();
        }));
        assert_eq!(*value.lock().unwrap(), 9);
    }
}
