use super::Serialize;
use crate::jvm::{ClassConstantIndex, InnerClassAccessFlags, Utf8ConstantIndex};
use byteorder::WriteBytesExt;

/// Attributes (used on classes, fields, and methods)
///
/// All attributes share the same outer layout: a name index and an opaque payload.
/// The payloads themselves are produced by serializing one of the structured types
/// below (see [`AttributeLike`]).
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: Vec<u8>,
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        (self.info.len() as u32).serialize(writer)?;
        writer.write_all(&self.info)?;

        Ok(())
    }
}

/// Attributes are all stored in the same way (see [`Attribute`]), but internally they
/// represent very different things. This trait is implemented by things which can be
/// turned into attributes.
pub trait AttributeLike: Serialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_array: BytecodeArray,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Code {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        self.code_array.serialize(writer)?;
        self.exception_table.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";
}

pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    pub catch_type: ClassConstantIndex,
}

impl Serialize for ExceptionHandler {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.start_pc.serialize(writer)?;
        self.end_pc.serialize(writer)?;
        self.handler_pc.serialize(writer)?;
        self.catch_type.serialize(writer)?;
        Ok(())
    }
}

/// Encoded bytecode instructions
pub struct BytecodeArray(pub Vec<u8>);

impl Serialize for BytecodeArray {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        // Code length is 4 bytes
        (self.0.len() as u32).serialize(writer)?;
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// Generic signature of a class, field, or method
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.9
#[derive(Debug)]
pub struct Signature {
    pub signature: Utf8ConstantIndex,
}

impl AttributeLike for Signature {
    const NAME: &'static str = "Signature";
}

impl Serialize for Signature {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.signature.serialize(writer)?;
        Ok(())
    }
}

/// Every nested class emitted alongside its enclosing class gets an entry here, on
/// both the inner and the outer class file.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.6
#[derive(Debug)]
pub struct InnerClasses(pub Vec<InnerClass>);

impl AttributeLike for InnerClasses {
    const NAME: &'static str = "InnerClasses";
}

impl Serialize for InnerClasses {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

#[derive(Debug)]
pub struct InnerClass {
    pub inner_class: ClassConstantIndex,
    pub outer_class: ClassConstantIndex,
    pub inner_name: Utf8ConstantIndex,
    pub access_flags: InnerClassAccessFlags,
}

impl Serialize for InnerClass {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.inner_class.serialize(writer)?;
        self.outer_class.serialize(writer)?;
        self.inner_name.serialize(writer)?;
        self.access_flags.serialize(writer)?;
        Ok(())
    }
}
