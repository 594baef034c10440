//! Items referenced by `#[derive(Reflect)]` and `impl_reflect_opaque!` output.
//!
//! Generated code cannot assume the caller has `extern crate alloc`.

pub use alloc::boxed::Box;
pub use core::any::Any;
pub use core::fmt::{Debug, Formatter, Result as FmtResult};
pub use core::mem::replace;
pub use core::option::Option::{self, None, Some};
pub use core::result::Result::{self, Err, Ok};
