mod attribute;
mod class;
mod field;
mod method;
mod serialize;
mod version;

pub use attribute::*;
pub use class::*;
pub use field::*;
pub use method::*;
pub use serialize::*;
pub use version::*;
