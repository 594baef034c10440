//! Traversal state of one read or write call.
//!
//! ## Menu
//!
//! - [`SerializeContext`]: lowers values and resolves read paths, tracking
//!   depth, the object budget and the visited identities.
//! - [`WriteContext`]: resolves write paths and assigns parsed values.
//! - [`Fanout`]: the result of a path extraction, which may drop out of an
//!   enclosing wildcard.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use hashbrown::HashSet;
use log::debug;
use vc_reflect::ops::{NodeId, Shared};
use vc_reflect::{Reflect, ReflectMut, ReflectRef};
use vc_reflect::info::TypeHint;

use crate::accessor::{Accessor, Nesting};
use crate::config::SerializeConfig;
use crate::error::{ConvertError, ValueParseError};
use crate::fault::FaultAction;
use crate::hash::FixedHashState;
use crate::path::Segment;
use crate::registry::AccessorRegistry;
use crate::value::{ObjectMap, Value};

// -----------------------------------------------------------------------------
// Placeholders

/// Emitted in place of a container once the object budget is spent, and
/// appended to an array cut short by it.
pub const OBJECT_LIMIT: &str = "[Object limit reached]";

/// Key added to an object cut short by the object budget.
pub const TRUNCATED_KEY: &str = "...";

#[inline]
fn reference_placeholder(value: &dyn Reflect) -> Value {
    Value::String(format!("[Reference {}]", value.type_path()))
}

#[inline]
fn depth_placeholder(value: &dyn Reflect) -> Value {
    Value::String(format!("[Depth limit reached: {}]", value.type_path()))
}

// -----------------------------------------------------------------------------
// Identity

/// A node on the current traversal path.
///
/// Shared cells and plain containers live in separate namespaces: an
/// `Arc<T>` and the `T` it points to share an address but are distinct
/// steps of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Identity {
    Shared(NodeId),
    Plain(NodeId),
}

impl Identity {
    #[inline]
    fn shared(shared: &dyn Shared) -> Self {
        Identity::Shared(shared.identity())
    }

    #[inline]
    fn plain(value: &dyn Reflect) -> Self {
        let addr = core::ptr::from_ref(value).cast::<()>().addr();
        Identity::Plain(NodeId::new(addr, value.ty_id()))
    }
}

/// The identities on the current path, innermost last.
#[derive(Default)]
struct Visited {
    stack: Vec<Identity>,
    set: HashSet<Identity, FixedHashState>,
}

impl Visited {
    /// Pushes `identity`, or returns `false` if it is already on the path.
    fn push(&mut self, identity: Identity) -> bool {
        if !self.set.insert(identity) {
            return false;
        }
        self.stack.push(identity);
        true
    }

    fn pop(&mut self) {
        if let Some(identity) = self.stack.pop() {
            self.set.remove(&identity);
        }
    }
}

// -----------------------------------------------------------------------------
// Fanout

/// The result of extracting a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Fanout {
    Value(Value),
    /// Nothing survived below a wildcard; the enclosing fan-out drops the
    /// entry instead of recording an empty container.
    Omit,
}

impl Fanout {
    /// The extracted value, with an omitted result as an empty array.
    #[inline]
    pub fn into_value(self) -> Value {
        match self {
            Fanout::Value(value) => value,
            Fanout::Omit => Value::Array(Vec::new()),
        }
    }
}

// -----------------------------------------------------------------------------
// SerializeContext

/// State of one read call.
///
/// Accessors receive the context in [`Accessor::read`] and call back into
/// [`lower`](Self::lower), [`lower_items`](Self::lower_items) and
/// [`lower_entries`](Self::lower_entries) for their children.
pub struct SerializeContext<'a> {
    registry: &'a AccessorRegistry,
    config: &'a SerializeConfig,
    depth: usize,
    objects: usize,
    exhausted: bool,
    fanout: usize,
    visited: Visited,
    #[cfg(feature = "debug")]
    trail: Vec<String>,
}

/// Pops the scope's identity when dropped.
struct Scope<'c, 'a> {
    cx: &'c mut SerializeContext<'a>,
    nested: bool,
}

impl<'a> Deref for Scope<'_, 'a> {
    type Target = SerializeContext<'a>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.cx
    }
}

impl DerefMut for Scope<'_, '_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cx
    }
}

impl Drop for Scope<'_, '_> {
    fn drop(&mut self) {
        self.cx.visited.pop();
        if self.nested {
            self.cx.depth -= 1;
        }
    }
}

impl<'a> SerializeContext<'a> {
    pub fn new(registry: &'a AccessorRegistry, config: &'a SerializeConfig) -> Self {
        Self {
            registry,
            config,
            depth: 0,
            objects: 0,
            exhausted: false,
            fanout: 0,
            visited: Visited::default(),
            #[cfg(feature = "debug")]
            trail: Vec::new(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &'a AccessorRegistry {
        self.registry
    }

    #[inline]
    pub fn config(&self) -> &'a SerializeConfig {
        self.config
    }

    /// Number of containers being lowered on the current path.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum number of elements lowered per collection.
    #[inline]
    pub fn collection_cap(&self) -> usize {
        self.config.max_collection_size.cap()
    }

    /// Returns `true` once the object budget has run out.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn enter(&mut self, identity: Identity, nested: bool) -> Option<Scope<'_, 'a>> {
        if !self.visited.push(identity) {
            return None;
        }
        if nested {
            self.depth += 1;
        }
        Some(Scope { cx: self, nested })
    }

    fn take_object(&mut self) -> bool {
        if self.config.max_objects.allows(self.objects + 1) {
            self.objects += 1;
            true
        } else {
            self.exhausted = true;
            false
        }
    }

    #[cfg(feature = "debug")]
    fn label(&self, key: &str) -> String {
        let mut label = self.trail.join("/");
        if !label.is_empty() {
            label.push('/');
        }
        label.push_str(key);
        label
    }

    // -------------------------------------------------------------------------
    // Lowering

    /// Lowers a whole value.
    pub fn lower(&mut self, value: &dyn Reflect) -> Result<Value, ConvertError> {
        if let ReflectRef::Shared(shared) = value.reflect_ref() {
            return self.lower_shared(value, shared);
        }
        let registry = self.registry;
        let accessor = registry.resolve(value);
        match accessor.nesting(value) {
            Nesting::Leaf | Nesting::Transparent => accessor.read(self, value),
            Nesting::Keyed | Nesting::Indexed => self.lower_nested(accessor, value),
        }
    }

    fn lower_shared(&mut self, value: &dyn Reflect, shared: &dyn Shared) -> Result<Value, ConvertError> {
        let Some(mut scope) = self.enter(Identity::shared(shared), false) else {
            return Ok(reference_placeholder(value));
        };
        let mut result = None;
        shared.read_with(&mut |inner: &dyn Reflect| result = Some(scope.lower(inner)));
        // A dangling `Weak` reads nothing.
        result.unwrap_or(Ok(Value::Null))
    }

    fn lower_nested(&mut self, accessor: &dyn Accessor, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let Some(mut scope) = self.enter(Identity::plain(value), true) else {
            return Ok(reference_placeholder(value));
        };
        if !scope.config.max_depth.allows(scope.depth) {
            debug!("depth limit reached at `{}`", value.type_path());
            return Ok(depth_placeholder(value));
        }
        if !scope.take_object() {
            debug!("object limit reached at `{}`", value.type_path());
            return Ok(Value::from(OBJECT_LIMIT));
        }
        accessor.read(&mut scope, value)
    }

    /// Lowers `items` into an array.
    ///
    /// Once the object budget runs out the array ends with a single
    /// [`OBJECT_LIMIT`] marker instead of the remaining items.
    pub fn lower_items<'v, I>(&mut self, items: I) -> Result<Value, ConvertError>
    where
        I: IntoIterator<Item = &'v dyn Reflect>,
    {
        let items = items.into_iter();
        let mut out = Vec::with_capacity(items.size_hint().0);
        for item in items {
            if self.exhausted {
                out.push(Value::from(OBJECT_LIMIT));
                break;
            }
            out.push(self.lower(item)?);
        }
        Ok(Value::Array(out))
    }

    /// Lowers `entries` into an object.
    ///
    /// Once the object budget runs out the object gets a [`TRUNCATED_KEY`]
    /// entry instead of the remaining entries.
    pub fn lower_entries<'v, K, I>(&mut self, entries: I) -> Result<Value, ConvertError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, &'v dyn Reflect)>,
    {
        let entries = entries.into_iter();
        let mut out = ObjectMap::with_capacity(entries.size_hint().0);
        for (key, item) in entries {
            if self.exhausted {
                out.insert(TRUNCATED_KEY, Value::from(OBJECT_LIMIT));
                break;
            }
            let item = self.lower(item)?;
            out.insert(key.into(), item);
        }
        Ok(Value::Object(out))
    }

    /// Renders a map key as an object key.
    ///
    /// Text keys are used as they are; other keys are lowered and printed.
    pub fn render_key(&mut self, key: &dyn Reflect) -> Result<String, ConvertError> {
        if let Some(text) = key.downcast_ref::<String>() {
            return Ok(text.clone());
        }
        if let Some(text) = key.downcast_ref::<&'static str>() {
            return Ok(String::from(*text));
        }
        Ok(match self.lower(key)? {
            Value::String(text) => text,
            other => other.to_text().into_owned(),
        })
    }

    // -------------------------------------------------------------------------
    // Paths

    /// Resolves `path` below `value` and lowers what it names.
    ///
    /// Wildcards fan out over every child; each child continues with the
    /// rest of the path.
    pub fn extract(&mut self, value: &dyn Reflect, path: &[Segment]) -> Result<Fanout, ConvertError> {
        let Some(first) = path.first() else {
            return self.lower(value).map(Fanout::Value);
        };
        if let ReflectRef::Shared(shared) = value.reflect_ref() {
            let Some(mut scope) = self.enter(Identity::shared(shared), false) else {
                return Ok(Fanout::Value(reference_placeholder(value)));
            };
            let mut result = None;
            shared.read_with(&mut |inner: &dyn Reflect| result = Some(scope.extract(inner, path)));
            return result.unwrap_or_else(|| Err(ConvertError::path_not_found(&first.to_string(), value)));
        }

        let registry = self.registry;
        let accessor = registry.resolve(value);
        let nesting = accessor.nesting(value);
        if nesting == Nesting::Transparent {
            return match accessor.inner(value) {
                Some(inner) => self.extract(inner, path),
                None => Err(ConvertError::path_not_found(&first.to_string(), value)),
            };
        }
        if nesting == Nesting::Leaf {
            return self.descend(accessor, value, path);
        }

        let Some(mut scope) = self.enter(Identity::plain(value), false) else {
            return Ok(Fanout::Value(reference_placeholder(value)));
        };
        if first.is_wildcard() {
            return scope.fan_out(accessor, value, &path[1..]);
        }
        scope.descend(accessor, value, path)
    }

    /// Extracts the rest of `path` below the child its leading keys name.
    fn descend(
        &mut self,
        accessor: &dyn Accessor,
        value: &dyn Reflect,
        path: &[Segment],
    ) -> Result<Fanout, ConvertError> {
        let (child, consumed) = self.step(accessor, value, path)?;
        #[cfg(feature = "debug")]
        self.trail.push(
            path[..consumed]
                .iter()
                .map(Segment::to_string)
                .collect::<Vec<_>>()
                .join("/"),
        );
        let result = self.extract(child, &path[consumed..]);
        #[cfg(feature = "debug")]
        self.trail.pop();
        result
    }

    /// Resolves `path` below `value` and calls `f` with the target.
    ///
    /// Wildcards are rejected. A shared target is opened like the shared
    /// nodes on the way down, unless its lock is already held further up the
    /// path: then `f` gets the shared node itself, unopened.
    pub fn navigate(
        &mut self,
        value: &dyn Reflect,
        path: &[Segment],
        f: &mut dyn FnMut(&dyn Reflect),
    ) -> Result<(), ConvertError> {
        if let ReflectRef::Shared(shared) = value.reflect_ref() {
            let Some(mut scope) = self.enter(Identity::shared(shared), false) else {
                return match path.first() {
                    Some(first) => Err(ConvertError::path_not_found(&first.to_string(), value)),
                    None => {
                        f(value);
                        Ok(())
                    }
                };
            };
            let mut result = None;
            shared.read_with(&mut |inner: &dyn Reflect| {
                result = Some(scope.navigate(inner, path, &mut *f));
            });
            // A dangling `Weak` has nothing to hand out.
            return result.unwrap_or_else(|| {
                let segment = path.first().map(ToString::to_string).unwrap_or_default();
                Err(ConvertError::path_not_found(&segment, value))
            });
        }
        let Some(first) = path.first() else {
            f(value);
            return Ok(());
        };

        let registry = self.registry;
        let accessor = registry.resolve(value);
        let nesting = accessor.nesting(value);
        if nesting == Nesting::Transparent {
            return match accessor.inner(value) {
                Some(inner) => self.navigate(inner, path, f),
                None => Err(ConvertError::path_not_found(&first.to_string(), value)),
            };
        }
        if nesting == Nesting::Leaf {
            let (child, consumed) = self.step(accessor, value, path)?;
            return self.navigate(child, &path[consumed..], f);
        }
        let Some(mut scope) = self.enter(Identity::plain(value), false) else {
            return Err(ConvertError::path_not_found(&first.to_string(), value));
        };
        let (child, consumed) = scope.step(accessor, value, path)?;
        scope.navigate(child, &path[consumed..], f)
    }

    /// Resolves the child named by the leading keys of `path`, returning it
    /// with the number of segments consumed.
    fn step<'v>(
        &mut self,
        accessor: &dyn Accessor,
        value: &'v dyn Reflect,
        path: &[Segment],
    ) -> Result<(&'v dyn Reflect, usize), ConvertError> {
        let arity = accessor.key_arity(value).max(1);
        let Some(segments) = path.get(..arity) else {
            return Err(ConvertError::type_mismatch(&path[0], value));
        };
        let mut keys = Vec::with_capacity(arity);
        for segment in segments {
            match segment {
                Segment::Key(key) => keys.push(key.as_str()),
                Segment::Wildcard => return Err(ConvertError::type_mismatch(segment, value)),
            }
        }
        let child = accessor.child_by_keys(self, value, &keys)?;
        Ok((child, arity))
    }

    fn fan_out(
        &mut self,
        accessor: &dyn Accessor,
        value: &dyn Reflect,
        rest: &[Segment],
    ) -> Result<Fanout, ConvertError> {
        let children = accessor.children(self, value)?;
        let keyed = accessor.fan_out_keyed(value);

        self.fanout += 1;
        let collected = self.collect(children, rest);
        self.fanout -= 1;
        let collected = collected?;

        if collected.is_empty() && self.fanout > 0 {
            return Ok(Fanout::Omit);
        }
        Ok(Fanout::Value(if keyed {
            Value::Object(collected.into_iter().collect())
        } else {
            Value::Array(collected.into_iter().map(|(_, value)| value).collect())
        }))
    }

    fn collect(
        &mut self,
        children: Vec<(String, &dyn Reflect)>,
        rest: &[Segment],
    ) -> Result<Vec<(String, Value)>, ConvertError> {
        let config = self.config;
        let handler = config.fault_handler();
        let mut out = Vec::with_capacity(children.len());
        for (key, child) in children {
            #[cfg(feature = "debug")]
            self.trail.push(key.clone());
            let result = self.extract(child, rest);
            #[cfg(feature = "debug")]
            self.trail.pop();

            match result {
                Ok(Fanout::Value(value)) => out.push((key, value)),
                Ok(Fanout::Omit) => {}
                Err(err) => {
                    #[cfg(feature = "debug")]
                    debug!("fan-out child `{}` failed: {err}", self.label(&key));
                    match handler.handle(err)? {
                        FaultAction::Omit => {}
                        FaultAction::Substitute(value) => out.push((key, value)),
                    }
                }
            }
        }
        Ok(out)
    }
}

// -----------------------------------------------------------------------------
// WriteContext

/// State of one write call.
///
/// Accessors receive the context in [`Accessor::write`] and
/// [`Accessor::child_mut`] and use [`assign`](Self::assign) and
/// [`parse`](Self::parse) to turn request values into typed ones.
pub struct WriteContext<'a> {
    registry: &'a AccessorRegistry,
    config: &'a SerializeConfig,
    visited: Visited,
}

impl<'a> WriteContext<'a> {
    pub fn new(registry: &'a AccessorRegistry, config: &'a SerializeConfig) -> Self {
        Self {
            registry,
            config,
            visited: Visited::default(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &'a AccessorRegistry {
        self.registry
    }

    #[inline]
    pub fn config(&self) -> &'a SerializeConfig {
        self.config
    }

    /// Renders a map key the way reads do.
    pub fn render_key(&self, key: &dyn Reflect) -> Result<String, ConvertError> {
        SerializeContext::new(self.registry, self.config).render_key(key)
    }

    /// Parses `value` into a new value of the type described by `hint`.
    pub fn parse(&self, hint: TypeHint, value: &Value) -> Result<Box<dyn Reflect>, ConvertError> {
        match self.registry.parser(hint.id()) {
            Some(parse) => Ok(parse(value, self.config)?),
            None => Err(ValueParseError::new(hint.path(), value, "no parser registered for this type").into()),
        }
    }

    /// Overwrites `target` in place with `value`, returning the previous
    /// value, or `None` if there was none (an absent option).
    ///
    /// Types with a registered parser are replaced as a whole. Options,
    /// unit enums, newtypes and shared cells are assigned through.
    pub fn assign(
        &mut self,
        target: &mut dyn Reflect,
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        let type_path = target.type_path();
        if let Some(parse) = self.registry.parser(target.ty_id()) {
            let parsed = parse(value, self.config)?;
            return target
                .replace(parsed)
                .map(Some)
                .map_err(|_| ValueParseError::new(type_path, value, "parser produced another type").into());
        }
        if let ReflectRef::Shared(shared) = target.reflect_ref() {
            return self.through_shared(&*target, shared, |wx, inner| wx.assign(inner, value));
        }

        match target.reflect_mut() {
            ReflectMut::Optional(optional) => {
                if value.is_null() {
                    return Ok(optional.take());
                }
                if let Some(inner) = optional.get_mut() {
                    return self.assign(inner, value);
                }
                let parsed = self.parse(optional.inner_type(), value)?;
                optional
                    .insert_boxed(parsed)
                    .map_err(|_| ValueParseError::new(type_path, value, "parser produced another type"))?;
                Ok(None)
            }
            ReflectMut::Enum(enumeration) => {
                let Value::String(name) = value else {
                    return Err(ValueParseError::new(type_path, value, "expected a variant name").into());
                };
                let Some(variant) = enumeration.unit_variant(name) else {
                    return Err(ValueParseError::new(type_path, value, "no unit variant with this name").into());
                };
                enumeration
                    .replace(variant)
                    .map(Some)
                    .map_err(|_| ValueParseError::new(type_path, value, "variant has another type").into())
            }
            ReflectMut::Tuple(tuple) if tuple.is_newtype() => match tuple.field_mut(0) {
                Some(inner) => self.assign(inner, value),
                None => Err(ValueParseError::new(type_path, value, "empty newtype").into()),
            },
            _ => Err(ValueParseError::new(type_path, value, "no parser registered for this type").into()),
        }
    }

    /// Writes `value` at `path` below `target`.
    pub(crate) fn write_at(
        &mut self,
        target: &mut dyn Reflect,
        path: &[Segment],
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        let Some((first, rest)) = path.split_first() else {
            return self.assign(target, value);
        };
        if let ReflectRef::Shared(shared) = target.reflect_ref() {
            return self.through_shared(&*target, shared, |wx, inner| wx.write_at(inner, path, value));
        }

        let registry = self.registry;
        let accessor = registry.resolve(&*target);
        if accessor.nesting(&*target) == Nesting::Transparent {
            let type_path = target.type_path();
            return match accessor.inner_mut(target) {
                Some(inner) => self.write_at(inner, path, value),
                None => Err(ConvertError::AttributeNotFound {
                    segment: first.to_string(),
                    type_path,
                }),
            };
        }
        let Segment::Key(key) = first else {
            return Err(ConvertError::type_mismatch(first, &*target));
        };
        if rest.is_empty() {
            if !accessor.can_write() {
                return Err(ConvertError::not_writable(target.type_path()));
            }
            return accessor
                .write(self, target, key, value)
                .map_err(ConvertError::into_write_error);
        }
        let child = accessor
            .child_mut(self, target, key)
            .map_err(ConvertError::into_write_error)?;
        self.write_at(child, rest, value)
    }

    /// Writes through a shared root, which is only reachable immutably.
    pub(crate) fn write_shared(
        &mut self,
        root: &dyn Reflect,
        path: &[Segment],
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError> {
        let ReflectRef::Shared(shared) = root.reflect_ref() else {
            return Err(ConvertError::not_writable(root.type_path()));
        };
        self.through_shared(root, shared, |wx, inner| wx.write_at(inner, path, value))
    }

    fn through_shared<F>(
        &mut self,
        node: &dyn Reflect,
        shared: &dyn Shared,
        mut f: F,
    ) -> Result<Option<Box<dyn Reflect>>, ConvertError>
    where
        F: FnMut(&mut Self, &mut dyn Reflect) -> Result<Option<Box<dyn Reflect>>, ConvertError>,
    {
        // Re-entering a held lock would deadlock.
        if !self.visited.push(Identity::shared(shared)) {
            return Err(ConvertError::not_writable(node.type_path()));
        }
        let mut result = None;
        let reached = shared.write_with(&mut |inner: &mut dyn Reflect| result = Some(f(&mut *self, inner)));
        self.visited.pop();
        match result {
            Some(result) if reached => result,
            _ => Err(ConvertError::not_writable(node.type_path())),
        }
    }
}
