#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// std support

extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod agent;
mod error;
mod request;
mod tree;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use agent::Agent;
pub use error::AgentError;
pub use request::Request;
pub use tree::ObjectTree;

pub use vc_convert as convert;
pub use vc_reflect as reflect;
