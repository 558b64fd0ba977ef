//! Lowering from the input model to class file structures
//!
//! Assembly happens in three layers: [`TypeEncoder`] turns model types into erased
//! descriptors and generic signatures, [`CodeAssembler`] lowers statement trees into
//! bytecode, and [`ClassAssembler`] stitches members into a serializable
//! [`crate::jvm::class_file::ClassFile`].

mod class;
mod code;
mod types;

pub use class::*;
pub use code::*;
pub use types::*;
