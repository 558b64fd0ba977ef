use super::{Attribute, Field, Method, Serialize, Version};
use crate::jvm::{ClassAccessFlags, ClassConstantIndex, Constant};
use crate::util::OffsetVec;
use byteorder::WriteBytesExt;

/// Representation of the [`class` file format of the JVM][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug)]
pub struct ClassFile {
    pub version: Version,
    pub constants: OffsetVec<Constant>,
    pub access_flags: ClassAccessFlags,
    pub this_class: ClassConstantIndex,
    pub super_class: ClassConstantIndex,
    pub interfaces: Vec<ClassConstantIndex>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic header bytes that go at the front of the serialized class file
    const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    /// Serialize the class file into an in-memory buffer
    ///
    /// Going through a buffer (instead of writing straight to a file) means a
    /// serialization failure can never leave a truncated artifact on disk.
    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut buffer = vec![];
        self.serialize(&mut buffer)?;
        Ok(buffer)
    }
}

impl Serialize for ClassFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&ClassFile::MAGIC)?;
        self.version.serialize(writer)?;

        // The constant pool count is one more than the number of occupied slots
        (self.constants.offset_len().0 as u16).serialize(writer)?;
        for (_, constant) in self.constants.iter() {
            constant.serialize(writer)?;
        }

        self.access_flags.serialize(writer)?;
        self.this_class.serialize(writer)?;
        self.super_class.serialize(writer)?;
        self.interfaces.serialize(writer)?;
        self.fields.serialize(writer)?;
        self.methods.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}
