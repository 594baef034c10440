use alloc::boxed::Box;
use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;
use std::collections::HashSet;

use crate::Reflect;
use crate::info::TypeHint;
use crate::ops::{List, ListItemIter, Set};
use crate::reflection::impl_reflect_cast_fn;

// -----------------------------------------------------------------------------
// Slice-backed lists

macro_rules! impl_slice_list_ops {
    () => {
        #[inline]
        fn len(&self) -> usize {
            <[T]>::len(self)
        }

        #[inline]
        fn get(&self, index: usize) -> Option<&dyn Reflect> {
            <[T]>::get(self, index).map(|item| item as &dyn Reflect)
        }

        #[inline]
        fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
            <[T]>::get_mut(self, index).map(|item| item as &mut dyn Reflect)
        }

        #[inline]
        fn iter(&self) -> ListItemIter<'_> {
            ListItemIter::new(self)
        }

        #[inline]
        fn item_type(&self) -> TypeHint {
            TypeHint::of::<T>()
        }
    };
}

impl<T: Reflect> Reflect for Vec<T> {
    impl_reflect_cast_fn!(List);
}

impl<T: Reflect> Reflect for Box<[T]> {
    impl_reflect_cast_fn!(List);
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    impl_reflect_cast_fn!(List);
}

impl<T: Reflect> List for Vec<T> {
    impl_slice_list_ops!();
}

impl<T: Reflect> List for Box<[T]> {
    impl_slice_list_ops!();
}

impl<T: Reflect, const N: usize> List for [T; N] {
    impl_slice_list_ops!();
}

// -----------------------------------------------------------------------------
// VecDeque

impl<T: Reflect> Reflect for VecDeque<T> {
    impl_reflect_cast_fn!(List);
}

impl<T: Reflect> List for VecDeque<T> {
    #[inline]
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        VecDeque::get(self, index).map(|item| item as &dyn Reflect)
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        VecDeque::get_mut(self, index).map(|item| item as &mut dyn Reflect)
    }

    #[inline]
    fn iter(&self) -> ListItemIter<'_> {
        ListItemIter::new(self)
    }

    #[inline]
    fn item_type(&self) -> TypeHint {
        TypeHint::of::<T>()
    }
}

// -----------------------------------------------------------------------------
// Sets

impl<T: Reflect, S: Send + Sync + 'static> Reflect for HashSet<T, S> {
    impl_reflect_cast_fn!(Set);
}

impl<T: Reflect, S: Send + Sync + 'static> Set for HashSet<T, S> {
    #[inline]
    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(HashSet::iter(self).map(|item| item as &dyn Reflect))
    }

    #[inline]
    fn item_type(&self) -> TypeHint {
        TypeHint::of::<T>()
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    impl_reflect_cast_fn!(Set);
}

impl<T: Reflect> Set for BTreeSet<T> {
    #[inline]
    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(BTreeSet::iter(self).map(|item| item as &dyn Reflect))
    }

    #[inline]
    fn item_type(&self) -> TypeHint {
        TypeHint::of::<T>()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::{BTreeSet, VecDeque};
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::ops::{List, Set};
    use crate::{Reflect, ReflectKind, ReflectRef};

    #[test]
    fn lists_share_index_access() {
        let array = [1_i32, 2, 3];
        let boxed: Box<[i32]> = vec![1, 2, 3].into_boxed_slice();
        let deque: VecDeque<i32> = VecDeque::from([1, 2, 3]);

        for list in [&array as &dyn List, &boxed, &deque] {
            assert_eq!(List::len(list), 3);
            assert_eq!(list.get(2).and_then(|v| v.downcast_ref::<i32>()), Some(&3));
            assert!(list.get(3).is_none());
            assert!(list.item_type().is::<i32>());
        }
    }

    #[test]
    fn list_iter_is_in_order() {
        let items = vec![3_u8, 1, 2];
        let ReflectRef::List(list) = items.reflect_ref() else {
            panic!("expected a list");
        };
        let seen: Vec<u8> = list
            .iter()
            .filter_map(|v| v.downcast_ref::<u8>().copied())
            .collect();
        assert_eq!(seen, [3, 1, 2]);
    }

    #[test]
    fn sets_are_sets() {
        let set = BTreeSet::from([2_u8, 1]);
        assert_eq!(set.reflect_kind(), ReflectKind::Set);
        let ReflectRef::Set(set) = set.reflect_ref() else {
            panic!("expected a set");
        };
        assert_eq!(set.iter().count(), 2);
    }
}
