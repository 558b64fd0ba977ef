//! Language-agnostic description of Java classes
//!
//! These types are the input side of the crate: a frontend builds up a [`ClassDesc`]
//! (an immutable tree of members, statements, and expressions) and hands it to the
//! assembler. Nothing in here knows about bytecode or the class file format.

mod class;
mod code;
mod method;
mod types;

pub use class::*;
pub use code::*;
pub use method::*;
pub use types::*;
