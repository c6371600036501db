//! SPIR-V module parsing and the reflection query surface built on it.
use spirv_headers as spv;

mod build;
mod data;
mod error;
mod reflect;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod types;
mod view;

pub use build::{parse_bytes, parse_words};
pub use data::Module;
pub use error::*;
pub use reflect::*;
pub use types::*;

pub use spv::BuiltIn;
pub use spv::Decoration;
pub use spv::ExecutionMode;
pub use spv::ExecutionModel;
pub use spv::Op;
pub use spv::StorageClass;
