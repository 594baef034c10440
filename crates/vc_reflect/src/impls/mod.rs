//! [`Reflect`](crate::Reflect) implementations for foreign types.
//!
//! ## Implemented Menu
//!
//! - opaque:
//!     - `bool`, `char`, `i8`-`i128`, `u8`-`u128`, `isize`, `usize`, `f32`, `f64`, `()`
//!     - `&'static str`, `String`, `Cow<'static, str>`, `PathBuf`
//!     - `core::time::Duration`, `std::time::SystemTime`
//!     - `chrono`: `DateTime<Utc>`, `DateTime<FixedOffset>`, `DateTime<Local>`,
//!       `NaiveDateTime`, `NaiveDate`, `NaiveTime`, `TimeDelta` ("chrono" feature)
//! - tuple: `(P0,)` .. `(P0, .., P7)`
//! - list: `Vec<T>`, `VecDeque<T>`, `[T; N]`, `Box<[T]>`
//! - set: `HashSet<T, S>`, `BTreeSet<T>`
//! - map: `HashMap<K, V, S>`, `BTreeMap<K, V>`
//! - optional: `Option<T>`
//! - shared: `Arc<T>`, `Weak<T>`, `RwLock<T>`, `Mutex<T>`
//!
//! Other leaf types can be made reflectable with
//! [`impl_reflect_opaque!`](crate::impl_reflect_opaque).

// -----------------------------------------------------------------------------
// Modules

mod debug;

mod containers;
mod maps;
mod native;
mod option;
mod pointers;
mod time;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use debug::kind_debug;

// -----------------------------------------------------------------------------
// impl_reflect_opaque

/// Implements [`Reflect`](crate::Reflect) for leaf types.
///
/// The types are reflected as [`ReflectKind::Opaque`](crate::ReflectKind::Opaque)
/// and must implement [`Debug`](core::fmt::Debug), which becomes their
/// reflected debug form.
///
/// # Example
///
/// ```
/// use vc_reflect::{Reflect, ReflectKind, impl_reflect_opaque};
///
/// #[derive(Debug)]
/// struct Token([u8; 4]);
///
/// impl_reflect_opaque!(Token);
///
/// assert_eq!(Token(*b"abcd").reflect_kind(), ReflectKind::Opaque);
/// ```
#[macro_export]
macro_rules! impl_reflect_opaque {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                #[inline]
                fn as_any(&self) -> &dyn $crate::__macro_exports::Any {
                    self
                }

                #[inline]
                fn as_any_mut(&mut self) -> &mut dyn $crate::__macro_exports::Any {
                    self
                }

                #[inline]
                fn into_any(
                    self: $crate::__macro_exports::Box<Self>,
                ) -> $crate::__macro_exports::Box<dyn $crate::__macro_exports::Any> {
                    self
                }

                #[inline]
                fn reflect_kind(&self) -> $crate::ReflectKind {
                    $crate::ReflectKind::Opaque
                }

                #[inline]
                fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                    $crate::ReflectRef::Opaque(self)
                }

                #[inline]
                fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
                    $crate::ReflectMut::Opaque(self)
                }

                fn replace(
                    &mut self,
                    value: $crate::__macro_exports::Box<dyn $crate::Reflect>,
                ) -> $crate::__macro_exports::Result<
                    $crate::__macro_exports::Box<dyn $crate::Reflect>,
                    $crate::__macro_exports::Box<dyn $crate::Reflect>,
                > {
                    let value = <dyn $crate::Reflect>::take::<Self>(value)?;
                    $crate::__macro_exports::Ok($crate::__macro_exports::Box::new(
                        $crate::__macro_exports::replace(self, value),
                    ))
                }

                #[inline]
                fn reflect_debug(
                    &self,
                    f: &mut $crate::__macro_exports::Formatter<'_>,
                ) -> $crate::__macro_exports::FmtResult {
                    $crate::__macro_exports::Debug::fmt(self, f)
                }
            }
        )+
    };
}
