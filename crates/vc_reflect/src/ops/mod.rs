//! Kind traits: the data access interfaces of reflected values.
//!
//! Each trait is a subtrait of [`Reflect`] and is reached through
//! [`Reflect::reflect_ref`] or [`Reflect::reflect_mut`].
//!
//! - [`Struct`]: named fields (e.g. `A { .. }`).
//! - [`Tuple`]: positional fields (e.g. `(i32, f32)` or `A(..)`).
//! - [`List`]: indexed, fixed-type elements (e.g. `Vec<i32>`, `[i32; 4]`).
//! - [`Set`]: unindexed, read-only elements (e.g. `HashSet<i32>`).
//! - [`Map`]: key/value entries (e.g. `HashMap<String, f32>`).
//! - [`Enum`]: the active variant of an enum.
//! - [`Optional`]: a value that may be absent (`Option<T>`).
//! - [`Shared`]: a node that may be reachable from several places
//!   (`Arc<T>`, `Weak<T>`, `RwLock<T>`, `Mutex<T>`).
//!
//! [`Reflect`]: crate::Reflect
//! [`Reflect::reflect_ref`]: crate::Reflect::reflect_ref
//! [`Reflect::reflect_mut`]: crate::Reflect::reflect_mut

// -----------------------------------------------------------------------------
// Modules

mod enum_ops;
mod insert_error;
mod list_ops;
mod map_ops;
mod optional_ops;
mod set_ops;
mod shared_ops;
mod struct_ops;
mod tuple_ops;

// -----------------------------------------------------------------------------
// Exports

pub use enum_ops::{Enum, VariantFieldIter};
pub use insert_error::MapInsertError;
pub use list_ops::{List, ListItemIter};
pub use map_ops::Map;
pub use optional_ops::Optional;
pub use set_ops::Set;
pub use shared_ops::{NodeId, Shared};
pub use struct_ops::{Struct, StructFieldIter};
pub use tuple_ops::{Tuple, TupleFieldIter};
