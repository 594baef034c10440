use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;

use log::trace;
use vc_reflect::Reflect;

use crate::config::SerializeConfig;
use crate::context::{SerializeContext, WriteContext};
use crate::error::ConvertError;
use crate::path::Path;
use crate::registry::AccessorRegistry;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Converter

/// Reads reflected values into [`Value`] trees and writes [`Value`]s back.
///
/// A converter is a cheap handle on an [`AccessorRegistry`]; every call
/// runs with its own context, so one converter can serve many threads.
///
/// # Examples
///
/// ```
/// use vc_convert::reflect::derive::Reflect;
/// use vc_convert::value::Value;
/// use vc_convert::{Converter, Path, SerializeConfig};
///
/// #[derive(Reflect, Debug)]
/// struct Pool {
///     name: String,
///     size: u32,
/// }
///
/// let converter = Converter::new();
/// let mut pool = Pool { name: "db".into(), size: 4 };
///
/// let path: Path = "size".parse().unwrap();
/// let old = converter.set_value(&mut pool, &path, &Value::from(8_u32)).unwrap();
/// assert_eq!(old.unwrap().take::<u32>().unwrap(), 4);
///
/// let value = converter.serialize(&pool, &Path::root(), &SerializeConfig::default()).unwrap();
/// assert_eq!(value.to_string(), r#"{"name":"db","size":8}"#);
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    registry: Arc<AccessorRegistry>,
}

impl Default for Converter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// A converter on the process-wide [`global`](AccessorRegistry::global)
    /// registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            registry: Arc::clone(AccessorRegistry::global()),
        }
    }

    #[inline]
    pub fn with_registry(registry: Arc<AccessorRegistry>) -> Self {
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &AccessorRegistry {
        &self.registry
    }

    /// Lowers the value at `path` below `root`.
    ///
    /// Cycles and exhausted budgets show up as placeholder strings in the
    /// result, never as errors. A wildcard that matches nothing yields an
    /// empty container.
    pub fn serialize(&self, root: &dyn Reflect, path: &Path, config: &SerializeConfig) -> Result<Value, ConvertError> {
        trace!("serialize `{path}` on `{}`", root.type_path());
        let mut cx = SerializeContext::new(&self.registry, config);
        cx.extract(root, path.segments()).map(|fanout| fanout.into_value())
    }

    /// Writes `value` at `path` below `root` with the default config.
    ///
    /// Returns the value that was replaced, or `None` if the write filled an
    /// empty slot (a new map entry or an absent option).
    #[inline]
    pub fn set_value(
        &self,
        root: &mut dyn Reflect,
        path: &Path,
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        self.set_value_with(root, path, value, &SerializeConfig::default())
    }

    /// Like [`set_value`](Self::set_value), parsing dates per `config`.
    pub fn set_value_with(
        &self,
        root: &mut dyn Reflect,
        path: &Path,
        value: &Value,
        config: &SerializeConfig,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        trace!("write `{path}` on `{}`", root.type_path());
        WriteContext::new(&self.registry, config).write_at(root, path.segments(), value)
    }

    /// Writes through a shared root such as an `Arc<RwLock<T>>`.
    ///
    /// Roots that cannot be written through a lock are [`NotWritable`].
    ///
    /// [`NotWritable`]: ConvertError::NotWritable
    pub fn set_shared_value(
        &self,
        root: &dyn Reflect,
        path: &Path,
        value: &Value,
        config: &SerializeConfig,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        trace!("write `{path}` through `{}`", root.type_path());
        WriteContext::new(&self.registry, config).write_shared(root, path.segments(), value)
    }

    /// Navigates to `path` below `root` and hands the raw value to `f`.
    ///
    /// Wildcards are rejected with [`TypeMismatch`]. Shared nodes on the
    /// path, the target included, stay locked while `f` runs; a target whose
    /// lock is already held further up the path is handed to `f` unopened.
    ///
    /// [`TypeMismatch`]: ConvertError::TypeMismatch
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::{Arc, RwLock};
    /// use vc_convert::{Converter, Path, SerializeConfig};
    ///
    /// let root = Arc::new(RwLock::new(vec![1_u8, 2, 3]));
    /// let path: Path = "2".parse().unwrap();
    /// let seen = Converter::new()
    ///     .inspect(&root, &path, &SerializeConfig::default(), |value| {
    ///         value.downcast_ref::<u8>().copied()
    ///     })
    ///     .unwrap();
    /// assert_eq!(seen, Some(3));
    /// ```
    pub fn inspect<R>(
        &self,
        root: &dyn Reflect,
        path: &Path,
        config: &SerializeConfig,
        f: impl FnOnce(&dyn Reflect) -> R,
    ) -> Result<R, ConvertError> {
        let mut cx = SerializeContext::new(&self.registry, config);
        let mut f = Some(f);
        let mut out = None;
        cx.navigate(root, path.segments(), &mut |value: &dyn Reflect| {
            if let Some(f) = f.take() {
                out = Some(f(value));
            }
        })?;
        out.ok_or_else(|| ConvertError::path_not_found(&path.to_string(), root))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::sync::{Arc, Weak};
    use alloc::vec;
    use alloc::vec::Vec;
    use std::sync::RwLock;

    use vc_reflect::derive::Reflect;

    use super::Converter;
    use crate::config::{Limit, SerializeConfig};
    use crate::context::OBJECT_LIMIT;
    use crate::error::ConvertError;
    use crate::fault::FaultMode;
    use crate::path::Path;
    use crate::value::Value;

    fn path(text: &str) -> Path {
        text.parse().unwrap()
    }

    #[derive(Reflect, Debug)]
    struct Profile {
        name: String,
        tags: Vec<String>,
    }

    #[derive(Reflect, Debug)]
    struct Node {
        name: String,
        parent: Option<Weak<RwLock<Node>>>,
        children: Vec<Arc<RwLock<Node>>>,
    }

    fn node(name: &str) -> Arc<RwLock<Node>> {
        Arc::new(RwLock::new(Node {
            name: String::from(name),
            parent: None,
            children: Vec::new(),
        }))
    }

    fn adopt(parent: &Arc<RwLock<Node>>, child: Arc<RwLock<Node>>) {
        child.write().unwrap().parent = Some(Arc::downgrade(parent));
        parent.write().unwrap().children.push(child);
    }

    #[derive(Reflect, Debug)]
    struct Level {
        label: u8,
        next: Option<Arc<Level>>,
    }

    fn levels(n: u8) -> Level {
        (1..n).rev().fold(Level { label: n, next: None }, |next, label| Level {
            label,
            next: Some(Arc::new(next)),
        })
    }

    #[test]
    fn reads_are_idempotent() {
        let profile = Profile {
            name: String::from("roland"),
            tags: vec![String::from("a")],
        };
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let first = converter.serialize(&profile, &Path::root(), &config).unwrap();
        let second = converter.serialize(&profile, &Path::root(), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn collection_cap_truncates_silently() {
        let profile = Profile {
            name: String::from("roland"),
            tags: ["a", "b", "c", "d"].into_iter().map(String::from).collect(),
        };
        let config = SerializeConfig::default().with_max_collection_size(Limit::At(2));
        let value = Converter::new().serialize(&profile, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"{"name":"roland","tags":["a","b"]}"#);
    }

    #[test]
    fn depth_limit_emits_placeholder() {
        let config = SerializeConfig::default().with_max_depth(Limit::At(2));
        let value = Converter::new().serialize(&levels(4), &Path::root(), &config).unwrap();

        let inner = value.get("next").and_then(|v| v.get("next")).unwrap();
        let text = inner.as_str().unwrap();
        assert!(text.starts_with("[Depth limit reached: "), "{text}");
        assert!(text.ends_with("Level]"), "{text}");

        let deeper = SerializeConfig::default().with_max_depth(Limit::At(3));
        let value = Converter::new().serialize(&levels(4), &Path::root(), &deeper).unwrap();
        let third = value.get("next").and_then(|v| v.get("next")).unwrap();
        assert_eq!(third.get("label"), Some(&Value::from(3_u8)));
    }

    #[test]
    fn depth_counts_from_the_path_target() {
        let config = SerializeConfig::default().with_max_depth(Limit::At(1));
        let value = Converter::new().serialize(&levels(3), &path("next"), &config).unwrap();
        assert_eq!(value.get("label"), Some(&Value::from(2_u8)));
        assert!(value.get("next").and_then(Value::as_str).is_some());
    }

    #[test]
    fn cycles_become_references() {
        let root = node("root");
        adopt(&root, node("left"));
        adopt(&root, node("right"));

        for config in [
            SerializeConfig::default(),
            SerializeConfig::default().with_max_depth(Limit::At(2)),
            SerializeConfig::default().with_max_objects(Limit::At(3)),
        ] {
            assert!(Converter::new().serialize(&root, &Path::root(), &config).is_ok());
        }

        let value = Converter::new()
            .serialize(&root, &Path::root(), &SerializeConfig::default())
            .unwrap();
        assert_eq!(value.get("parent"), Some(&Value::Null));
        let children = value.get("children").and_then(Value::as_array).unwrap();
        assert_eq!(children.len(), 2);
        for child in children {
            let back = child.get("parent").and_then(Value::as_str).unwrap();
            assert!(back.starts_with("[Reference "), "{back}");
        }
    }

    #[test]
    fn self_reference_terminates_within_depth() {
        let me = node("me");
        me.write().unwrap().parent = Some(Arc::downgrade(&me));
        me.write().unwrap().children.push(Arc::clone(&me));

        let config = SerializeConfig::default().with_max_depth(Limit::At(5));
        let value = Converter::new().serialize(&me, &Path::root(), &config).unwrap();
        assert_eq!(value.get("name"), Some(&Value::from("me")));
        assert!(value.get("parent").and_then(Value::as_str).unwrap().starts_with("[Reference "));
        let children = value.get("children").and_then(Value::as_array).unwrap();
        assert!(children[0].as_str().unwrap().starts_with("[Reference "));

        me.write().unwrap().children.clear();
    }

    #[test]
    fn object_budget_truncates_containers() {
        let data = vec![Profile {
            name: String::from("a"),
            tags: Vec::new(),
        }];
        let config = SerializeConfig::default().with_max_objects(Limit::At(1));
        let value = Converter::new().serialize(&data, &Path::root(), &config).unwrap();
        assert_eq!(value, Value::Array(vec![Value::from(OBJECT_LIMIT)]));

        let config = SerializeConfig::default().with_max_objects(Limit::At(2));
        let value = Converter::new().serialize(&data, &Path::root(), &config).unwrap();
        assert_eq!(value.to_string(), r#"[{"name":"a","tags":"[Object limit reached]"}]"#);
    }

    #[test]
    fn write_round_trip() {
        let converter = Converter::new();
        let config = SerializeConfig::default();
        let mut profile = Profile {
            name: String::from("v1"),
            tags: Vec::new(),
        };

        let old = converter.set_value(&mut profile, &path("name"), &Value::from("v2")).unwrap();
        assert_eq!(old.unwrap().take::<String>().unwrap(), "v1");
        assert_eq!(converter.serialize(&profile, &path("name"), &config).unwrap(), Value::from("v2"));
    }

    #[test]
    fn writes_go_through_locks() {
        let root = node("root");
        adopt(&root, node("kid"));
        let converter = Converter::new();
        let config = SerializeConfig::default();

        let old = converter
            .set_shared_value(&root, &path("children/0/name"), &Value::from("child"), &config)
            .unwrap();
        assert_eq!(old.unwrap().take::<String>().unwrap(), "kid");
        assert_eq!(root.read().unwrap().children[0].read().unwrap().name, "child");

        let err = converter
            .set_shared_value(&root, &path("children/0/parent/name"), &Value::from("x"), &config)
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotWritable { .. }));

        let plain = Profile {
            name: String::new(),
            tags: Vec::new(),
        };
        let err = converter
            .set_shared_value(&plain, &path("name"), &Value::from("x"), &config)
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotWritable { .. }));
    }

    #[test]
    fn writes_reject_wildcards() {
        let mut profile = Profile {
            name: String::new(),
            tags: Vec::new(),
        };
        let err = Converter::new()
            .set_value(&mut profile, &path("*"), &Value::from("x"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[derive(Reflect, Debug)]
    struct Cell {
        k: u8,
    }

    #[derive(Reflect, Debug)]
    struct Other {
        j: u8,
    }

    #[derive(Reflect, Debug)]
    struct Grid {
        a: Cell,
        b: Other,
        c: Cell,
    }

    #[test]
    fn wildcard_filters_or_throws() {
        let grid = Grid {
            a: Cell { k: 1 },
            b: Other { j: 2 },
            c: Cell { k: 3 },
        };
        let converter = Converter::new();

        let filtering = SerializeConfig::default().with_fault_mode(FaultMode::Filtering);
        let value = converter.serialize(&grid, &path("*/k"), &filtering).unwrap();
        assert_eq!(value.to_string(), r#"{"a":1,"c":3}"#);

        let throwing = SerializeConfig::default();
        let err = converter.serialize(&grid, &path("*/k"), &throwing).unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));

        let nothing = converter.serialize(&grid, &path("*/z"), &filtering).unwrap();
        assert_eq!(nothing, Value::Object(Default::default()));
    }

    #[test]
    fn nested_wildcards_drop_empty_branches() {
        let grid = vec![
            Grid {
                a: Cell { k: 1 },
                b: Other { j: 2 },
                c: Cell { k: 3 },
            },
        ];
        let filtering = SerializeConfig::default().with_fault_mode(FaultMode::Filtering);
        let value = Converter::new().serialize(&grid, &path("*/*/j"), &filtering).unwrap();
        assert_eq!(value.to_string(), r#"[{"b":2}]"#);

        let value = Converter::new().serialize(&grid, &path("*/*/z"), &filtering).unwrap();
        assert_eq!(value, Value::Array(Vec::new()));
    }

    #[test]
    fn inspect_hands_out_raw_values() {
        let root = node("root");
        adopt(&root, node("kid"));
        let converter = Converter::new();
        let config = SerializeConfig::default();

        let name = converter
            .inspect(&root, &path("children/0/name"), &config, |value| {
                value.downcast_ref::<String>().cloned()
            })
            .unwrap();
        assert_eq!(name.as_deref(), Some("kid"));

        let opened = converter
            .inspect(&root, &path("children/0"), &config, |value| {
                value.downcast_ref::<Node>().map(|node| node.name.clone())
            })
            .unwrap();
        assert_eq!(opened.as_deref(), Some("kid"));

        let err = converter.inspect(&root, &path("children/*"), &config, |_| ()).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));

        let err = converter
            .inspect(&root, &path("children/0/parent/name"), &config, |_| ())
            .unwrap_err();
        assert!(matches!(err, ConvertError::PathNotFound { .. }));
    }
}
