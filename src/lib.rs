#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_agent as agent;
pub use vc_convert as convert;
pub use vc_reflect as reflect;
