#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// std support

extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod converter;
mod parse;

pub mod accessor;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod fault;
pub mod hash;
pub mod path;
pub mod registry;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use config::SerializeConfig;
pub use converter::Converter;
pub use path::Path;
pub use vc_reflect as reflect;

#[doc(hidden)]
pub mod __macro_exports {
    pub use alloc::boxed::Box;

    #[cfg(feature = "auto_register")]
    pub use inventory;
}
