#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Extern Self

// Derive output names the crate by path, and the manifest lookup resolves
// that path to `vc_reflect` inside this crate too.
extern crate self as vc_reflect;

// -----------------------------------------------------------------------------
// std support

extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod kind;
mod reflection;

pub mod impls;
pub mod info;
pub mod ops;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use kind::{ReflectKind, ReflectMut, ReflectRef};
pub use reflection::Reflect;
pub use vc_reflect_derive as derive;
