use super::{Constant, Label};
use std::fmt;

/// Everything that can go wrong while assembling or writing a class
///
/// All failures are reported synchronously to the caller of the operation that detected
/// them; none are retried internally. A failed operation aborts assembly of the class it
/// belongs to and leaves no partial artifact behind.
#[derive(Debug)]
pub enum Error {
    /// A type description falls outside the supported grammar (eg. a type variable
    /// that is not declared in the enclosing scope)
    UnsupportedType(String),

    /// The constant pool ran out of addressable indices
    PoolOverflow {
        constant: Box<Constant>,
        offset: usize,
    },

    /// A branch refers to a label that was never placed
    DanglingBranch(Label),

    /// A statement or expression form the assembler cannot lower
    UnsupportedConstruct(String),

    /// A member with the same kind, name, and descriptor was already registered
    DuplicateMember {
        kind: MemberKind,
        name: String,
        descriptor: String,
    },

    /// An expression's type does not agree with the declared type it must satisfy
    TypeMismatch { expected: String, found: String },

    /// A member registration arrived after `finish()` sealed the class
    ClassAlreadyFinalized,

    /// The destination could not be written
    WriteFailure(std::io::Error),
}

/// Kinds of class members tracked for duplicate detection
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
    InnerClass,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::InnerClass => "inner class",
        };
        f.write_str(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedType(msg) => write!(f, "Unsupported type: {}", msg),
            Error::PoolOverflow { constant, offset } => write!(
                f,
                "Constant pool overflow adding {:?} at offset {}",
                constant, offset
            ),
            Error::DanglingBranch(label) => {
                write!(f, "Branch to label {:?} which is never placed", label)
            }
            Error::UnsupportedConstruct(msg) => write!(f, "Unsupported construct: {}", msg),
            Error::DuplicateMember {
                kind,
                name,
                descriptor,
            } => write!(f, "Duplicate {} '{}' with descriptor {}", kind, name, descriptor),
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Error::ClassAlreadyFinalized => {
                f.write_str("Cannot add members to a finalized class")
            }
            Error::WriteFailure(err) => write!(f, "Failed to write class: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WriteFailure(err) => Some(err),
            _ => None,
        }
    }
}
