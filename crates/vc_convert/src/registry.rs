//! The ordered set of accessors and the per-type parsers and serializers.
//!
//! ## Menu
//!
//! - [`AccessorRegistry`]: dispatch table consulted for every value.
//! - [`ParseFn`] / [`SerializeFn`]: per-type hooks.
//! - [`AccessorPlugin`] and [`submit_accessor!`](crate::submit_accessor):
//!   accessors collected at link time (`auto_register` feature).

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use std::sync::OnceLock;

use log::trace;
use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use vc_reflect::Reflect;

use crate::accessor::{
    Accessor, BeanAccessor, CompositeAccessor, DateTimeAccessor, EnumAccessor, MapAccessor,
    OpaqueAccessor, OptionalAccessor, SequenceAccessor, SerdeAccessor, TabularAccessor,
    TerminalAccessor,
};
use crate::config::SerializeConfig;
use crate::error::ValueParseError;
use crate::hash::TypeIdMap;
use crate::parse;
use crate::value::{Value, ValueDeserializer};

// -----------------------------------------------------------------------------
// Hooks

/// Builds a value of one concrete type from a [`Value`].
pub type ParseFn = fn(&Value, &SerializeConfig) -> Result<Box<dyn Reflect>, ValueParseError>;

/// Views a value of one concrete type as a serde serializable.
pub type SerializeFn = fn(&dyn Reflect) -> Option<&dyn erased_serde::Serialize>;

// -----------------------------------------------------------------------------
// AccessorRegistry

/// The accessors of a [`Converter`](crate::Converter), in dispatch order.
///
/// The first accessor that accepts a value handles it. A catch-all that
/// lowers anything to its debug text always comes last and cannot be
/// removed.
///
/// # Examples
///
/// ```
/// use vc_convert::registry::AccessorRegistry;
///
/// let registry = AccessorRegistry::new();
/// let names = registry.names();
/// assert_eq!(names.first(), Some(&"terminal"));
/// assert_eq!(names.last(), Some(&"opaque"));
/// ```
pub struct AccessorRegistry {
    accessors: Vec<Box<dyn Accessor>>,
    fallback: OpaqueAccessor,
    parsers: TypeIdMap<ParseFn>,
    serializers: TypeIdMap<SerializeFn>,
}

impl Default for AccessorRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AccessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorRegistry")
            .field("accessors", &self.names())
            .field("parsers", &self.parsers.len())
            .field("serializers", &self.serializers.len())
            .finish()
    }
}

impl AccessorRegistry {
    /// A registry without accessors, parsers or serializers.
    ///
    /// Every value is lowered by the catch-all.
    pub fn empty() -> Self {
        Self {
            accessors: Vec::new(),
            fallback: OpaqueAccessor,
            parsers: TypeIdMap::new(),
            serializers: TypeIdMap::new(),
        }
    }

    /// A registry with the built-in accessors and parsers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.push(TerminalAccessor::new());
        registry.push(CompositeAccessor);
        registry.push(TabularAccessor);
        registry.push(DateTimeAccessor);
        registry.push(SerdeAccessor);
        registry.push(OptionalAccessor);
        registry.push(EnumAccessor);
        registry.push(SequenceAccessor);
        registry.push(MapAccessor);
        registry.push(BeanAccessor);
        parse::register_builtin(&mut registry);
        registry
    }

    // -------------------------------------------------------------------------
    // Accessors

    /// Appends `accessor`, after all others but before the catch-all.
    pub fn push<A: Accessor>(&mut self, accessor: A) {
        self.accessors.push(Box::new(accessor));
    }

    /// Inserts `accessor` ahead of all others.
    pub fn prepend<A: Accessor>(&mut self, accessor: A) {
        self.accessors.insert(0, Box::new(accessor));
    }

    /// Inserts `accessor` right before the accessor called `name`.
    ///
    /// Returns `false`, leaving the registry unchanged, if there is none.
    pub fn insert_before<A: Accessor>(&mut self, name: &str, accessor: A) -> bool {
        let Some(index) = self.accessors.iter().position(|a| a.name() == name) else {
            return false;
        };
        self.accessors.insert(index, Box::new(accessor));
        true
    }

    /// Accessor names in dispatch order, the catch-all last.
    pub fn names(&self) -> Vec<&'static str> {
        self.accessors
            .iter()
            .map(|accessor| accessor.name())
            .chain([self.fallback.name()])
            .collect()
    }

    /// The accessor that handles `value`.
    pub fn resolve(&self, value: &dyn Reflect) -> &dyn Accessor {
        let accessor = self
            .accessors
            .iter()
            .map(|accessor| &**accessor)
            .find(|accessor| accessor.accepts(self, value))
            .unwrap_or(&self.fallback);
        trace!("`{}` handled by the {} accessor", value.type_path(), accessor.name());
        accessor
    }

    // -------------------------------------------------------------------------
    // Parsers and serializers

    #[inline]
    pub fn parser(&self, type_id: TypeId) -> Option<ParseFn> {
        self.parsers.get(&type_id).copied()
    }

    #[inline]
    pub fn serializer(&self, type_id: TypeId) -> Option<SerializeFn> {
        self.serializers.get(&type_id).copied()
    }

    /// Registers how to build a `T` from a [`Value`], replacing any parser
    /// registered before.
    pub fn register_parser<T: Reflect>(&mut self, parse: ParseFn) {
        self.parsers.insert(TypeId::of::<T>(), parse);
    }

    /// Registers `T`'s serde `Deserialize` impl as its parser.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_convert::registry::AccessorRegistry;
    /// use vc_convert::reflect::impl_reflect_opaque;
    ///
    /// #[derive(Debug, serde::Deserialize)]
    /// struct Port(u16);
    /// impl_reflect_opaque!(Port);
    ///
    /// let mut registry = AccessorRegistry::new();
    /// registry.register_deserialize::<Port>();
    /// assert!(registry.parser(core::any::TypeId::of::<Port>()).is_some());
    /// ```
    pub fn register_deserialize<T: DeserializeOwned + Reflect>(&mut self) {
        self.register_parser::<T>(|value, _| {
            T::deserialize(ValueDeserializer::new(value))
                .map(|parsed| Box::new(parsed) as Box<dyn Reflect>)
                .map_err(|err| {
                    ValueParseError::new(core::any::type_name::<T>(), value, String::from(err.message()))
                })
        });
    }

    /// Lowers `T` through its serde `Serialize` impl instead of its reflected
    /// shape.
    pub fn register_serialize<T: Serialize + Reflect>(&mut self) {
        self.serializers.insert(TypeId::of::<T>(), |value| {
            value
                .downcast_ref::<T>()
                .map(|value| value as &dyn erased_serde::Serialize)
        });
    }

    // -------------------------------------------------------------------------
    // Global

    /// The registry used by [`Converter::new`](crate::Converter::new).
    ///
    /// Built on first use from [`new`](Self::new) and, with the
    /// `auto_register` feature, every submitted accessor.
    pub fn global() -> &'static Arc<AccessorRegistry> {
        static GLOBAL: OnceLock<Arc<AccessorRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            #[cfg_attr(not(feature = "auto_register"), expect(unused_mut))]
            let mut registry = AccessorRegistry::new();
            #[cfg(feature = "auto_register")]
            registry.auto_register();
            Arc::new(registry)
        })
    }

    /// Prepends every accessor submitted with
    /// [`submit_accessor!`](crate::submit_accessor), ordered by name.
    ///
    /// Returns the number of accessors added.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> usize {
        let mut plugins: Vec<Box<dyn Accessor>> = inventory::iter::<AccessorPlugin>
            .into_iter()
            .map(|plugin| (plugin.build)())
            .collect();
        plugins.sort_by_key(|accessor| accessor.name());
        let count = plugins.len();
        self.accessors.splice(0..0, plugins);
        count
    }
}

// -----------------------------------------------------------------------------
// AccessorPlugin

/// An accessor submitted for automatic registration.
#[cfg(feature = "auto_register")]
pub struct AccessorPlugin {
    build: fn() -> Box<dyn Accessor>,
}

#[cfg(feature = "auto_register")]
impl AccessorPlugin {
    #[inline]
    pub const fn new(build: fn() -> Box<dyn Accessor>) -> Self {
        Self { build }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(AccessorPlugin);

/// Submits an accessor to every registry built by
/// [`AccessorRegistry::global`].
///
/// The argument is an expression building the accessor.
///
/// ```
/// use vc_convert::accessor::{Accessor, Nesting};
/// use vc_convert::context::SerializeContext;
/// use vc_convert::error::ConvertError;
/// use vc_convert::registry::AccessorRegistry;
/// use vc_convert::value::Value;
/// use vc_convert::reflect::Reflect;
///
/// struct Unsigned;
///
/// impl Accessor for Unsigned {
///     fn name(&self) -> &'static str {
///         "unsigned"
///     }
///     fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
///         value.is::<u8>()
///     }
///     fn nesting(&self, _: &dyn Reflect) -> Nesting {
///         Nesting::Leaf
///     }
///     fn read(&self, _: &mut SerializeContext<'_>, _: &dyn Reflect) -> Result<Value, ConvertError> {
///         Ok(Value::from("byte"))
///     }
/// }
///
/// vc_convert::submit_accessor!(Unsigned);
///
/// fn main() {
///     assert_eq!(AccessorRegistry::global().names().first(), Some(&"unsigned"));
/// }
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_accessor {
    ($accessor:expr) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AccessorPlugin::new(|| {
                $crate::__macro_exports::Box::new($accessor)
            })
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::AccessorRegistry;
    use crate::accessor::{Accessor, Nesting};
    use crate::context::SerializeContext;
    use crate::error::ConvertError;
    use crate::value::Value;
    use vc_reflect::Reflect;

    struct Marker;

    impl Accessor for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
            value.is::<String>()
        }

        fn nesting(&self, _: &dyn Reflect) -> Nesting {
            Nesting::Leaf
        }

        fn read(&self, _: &mut SerializeContext<'_>, _: &dyn Reflect) -> Result<Value, ConvertError> {
            Ok(Value::from("marked"))
        }
    }

    #[test]
    fn builtin_order() {
        let registry = AccessorRegistry::new();
        assert_eq!(
            registry.names(),
            [
                "terminal",
                "composite",
                "tabular",
                "date_time",
                "serde",
                "optional",
                "enum",
                "sequence",
                "map",
                "bean",
                "opaque",
            ]
        );
    }

    #[test]
    fn first_match_wins() {
        let mut registry = AccessorRegistry::new();
        assert_eq!(registry.resolve(&String::new()).name(), "terminal");

        assert!(registry.insert_before("terminal", Marker));
        assert_eq!(registry.resolve(&String::new()).name(), "marker");
        assert_eq!(registry.names()[0], "marker");

        assert!(!registry.insert_before("missing", Marker));
    }

    #[test]
    fn empty_registry_falls_back() {
        let registry = AccessorRegistry::empty();
        assert_eq!(registry.names(), ["opaque"]);
        assert_eq!(registry.resolve(&vec![1_u8]).name(), "opaque");
        assert_eq!(registry.resolve(&1_u8).name(), "opaque");
    }

    #[test]
    fn builtin_parsers() {
        let registry = AccessorRegistry::new();
        let config = crate::SerializeConfig::default();
        let parse = registry.parser(core::any::TypeId::of::<u16>()).unwrap();
        let parsed = parse(&Value::from(7_u64), &config).unwrap();
        assert_eq!(parsed.downcast_ref::<u16>(), Some(&7));
        assert!(registry.parser(core::any::TypeId::of::<Vec<u16>>()).is_none());
    }
}
