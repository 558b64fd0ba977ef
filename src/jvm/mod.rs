//! JVM class file representation and serialization

mod access_flags;
pub mod class_file;
mod code;
mod constants;
mod descriptors;
mod errors;
mod names;

pub use access_flags::*;
pub use code::*;
pub use constants::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
