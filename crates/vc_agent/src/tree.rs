use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use vc_reflect::Reflect;

/// Named roots an [`Agent`](crate::Agent) serves.
///
/// Roots are shared with the application. Register an `Arc<RwLock<T>>` (or
/// `Arc<Mutex<T>>`) to make a root writable; a bare `Arc<T>` is read-only.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, RwLock};
/// use vc_agent::ObjectTree;
///
/// let tree = ObjectTree::new();
/// let limits = Arc::new(RwLock::new(vec![1_u32, 2]));
/// assert!(tree.register("limits", limits.clone()).is_none());
/// assert_eq!(tree.names(), ["limits"]);
///
/// limits.write().unwrap().push(3);
/// assert!(tree.get("limits").is_some());
/// ```
#[derive(Default)]
pub struct ObjectTree {
    roots: RwLock<BTreeMap<String, Arc<dyn Reflect>>>,
}

impl ObjectTree {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<dyn Reflect>>> {
        self.roots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<dyn Reflect>>> {
        self.roots.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `root` under `name`, returning the root it replaced.
    pub fn register(&self, name: impl Into<String>, root: Arc<dyn Reflect>) -> Option<Arc<dyn Reflect>> {
        self.write().insert(name.into(), root)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Reflect>> {
        self.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Reflect>> {
        self.read().get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Roots whose names match `pattern`, where `*` stands for any run of
    /// characters.
    pub fn matching(&self, pattern: &str) -> Vec<(String, Arc<dyn Reflect>)> {
        self.read()
            .iter()
            .filter(|(name, _)| glob_match(pattern, name))
            .map(|(name, root)| (name.clone(), Arc::clone(root)))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl core::fmt::Debug for ObjectTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.read().keys()).finish()
    }
}

/// Matches `text` against `pattern` with `*` wildcards.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(head) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((tail, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.len() >= tail.len() && rest.ends_with(tail)
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use std::sync::RwLock;

    use super::{ObjectTree, glob_match};

    #[test]
    fn globs() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "pool"));
        assert!(glob_match("pool.*", "pool.db"));
        assert!(!glob_match("pool.*", "cache"));
        assert!(glob_match("*.db", "pool.db"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxc"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
        assert!(!glob_match("ab*ba", "aba"));
    }

    #[test]
    fn register_and_unregister() {
        let tree = ObjectTree::new();
        tree.register("b", Arc::new(RwLock::new(1_u8)));
        tree.register("a", Arc::new(2_u8));
        assert_eq!(tree.names(), ["a", "b"]);
        assert_eq!(tree.matching("*").len(), 2);

        assert!(tree.register("a", Arc::new(3_u8)).is_some());
        assert!(tree.unregister("a").is_some());
        assert!(tree.unregister("a").is_none());
        assert_eq!(tree.len(), 1);
    }
}
