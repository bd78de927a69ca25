#![doc = include_str!("../README.md")]
#![warn(missing_docs, missing_debug_implementations)]
mod config;
mod error;
mod permits;
mod pool;
mod reset;

pub use config::*;
pub use error::*;
pub use pool::*;
pub use reset::*;
