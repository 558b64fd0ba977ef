//! Backend for turning an abstract class/method/field model into JVM class files.
//!
//! The crate is split into three layers:
//!
//!   - [`model`] is the input: a language-agnostic description of classes, members,
//!     statements, and (possibly generic) types, built by some upstream collaborator
//!   - [`jvm`] is the output side: class file records, the constant pool, descriptors,
//!     and binary serialization
//!   - [`assemble`] walks the model and produces class file records, tracking operand
//!     stack depth, local variable slots, and branch targets along the way
//!
//! [`writer::write_class`] drives the whole pipeline for one top-level class (and its
//! inner classes) and persists the resulting `.class` files.

pub mod assemble;
pub mod jvm;
pub mod model;
pub mod util;
pub mod writer;
