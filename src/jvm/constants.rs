use super::class_file::{Attribute, AttributeLike, Serialize};
use super::{BinaryName, Error, FieldType, MethodDescriptor, Name, RenderDescriptor, UnqualifiedName};
use crate::util::{Offset, OffsetVec, Width};
use byteorder::WriteBytesExt;
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;

/// Class file constant pool builder
///
/// The pool is append only: entries are interned on first use and never mutated or
/// removed, so an index handed out stays valid for the lifetime of the pool. Interning
/// a structurally equal value twice returns the index assigned on first sight, which
/// keeps output deterministic for a fixed traversal order. Only after the pool is
/// fully built up can it be consumed into a regular [`OffsetVec`].
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,

    classes: HashMap<String, ClassConstantIndex>,
    fieldrefs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), FieldRefConstantIndex>,
    methodrefs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex, bool), MethodRefConstantIndex>,
    strings: HashMap<Utf8ConstantIndex, StringConstantIndex>,
    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<[u8; 4], ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<[u8; 8], ConstantIndex>,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
    utf8s: HashMap<String, Utf8ConstantIndex>,
}

impl ConstantsPool {
    /// Make a fresh empty constant pool
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            classes: HashMap::new(),
            fieldrefs: HashMap::new(),
            methodrefs: HashMap::new(),
            strings: HashMap::new(),
            integers: HashMap::new(),
            floats: HashMap::new(),
            longs: HashMap::new(),
            doubles: HashMap::new(),
            name_and_types: HashMap::new(),
            utf8s: HashMap::new(),
        }
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: indexing starts at 1, some constants take two slots, and the serialized
    /// pool count (final offset) must itself fit in a `u16`, capping the largest
    /// usable index at 65534.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        let offset = self.constants.offset_len().0;

        // Detect if the next constant would overflow the pool
        if offset + constant.width() > u16::MAX as usize {
            return Err(Error::PoolOverflow {
                constant: Box::new(constant),
                offset,
            });
        }

        self.constants.push(constant);
        Ok(ConstantIndex(offset as u16))
    }

    /// Consume the pool and return the final vector of constants
    pub fn into_offset_vec(self) -> OffsetVec<Constant> {
        self.constants
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, Error> {
        let cow = utf8.into();

        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            Ok(*idx)
        } else {
            let owned = cow.into_owned();
            let constant = Constant::Utf8(owned.clone());
            let idx = Utf8ConstantIndex(self.push_constant(constant)?);
            self.utf8s.insert(owned, idx);
            Ok(idx)
        }
    }

    /// Get or insert a string constant from the constant pool
    pub fn get_string(&mut self, utf8: Utf8ConstantIndex) -> Result<StringConstantIndex, Error> {
        if let Some(idx) = self.strings.get(&utf8) {
            Ok(*idx)
        } else {
            let idx = StringConstantIndex(self.push_constant(Constant::String(utf8))?);
            self.strings.insert(utf8, idx);
            Ok(idx)
        }
    }

    /// Get or insert a class constant from the constant pool
    pub fn get_class(&mut self, class: &BinaryName) -> Result<ClassConstantIndex, Error> {
        self.get_class_named(class.as_str())
    }

    /// Get or insert a class constant from its name in internal form
    ///
    /// Array classes (eg. for a `checkcast` against an array type) use the descriptor
    /// of the array type as the name.
    pub fn get_class_named(&mut self, name: &str) -> Result<ClassConstantIndex, Error> {
        if let Some(idx) = self.classes.get(name) {
            Ok(*idx)
        } else {
            let name_utf8 = self.get_utf8(name)?;
            let idx = ClassConstantIndex(self.push_constant(Constant::Class(name_utf8))?);
            self.classes.insert(name.to_owned(), idx);
            Ok(idx)
        }
    }

    /// Get or insert a name & type constant from the constant pool
    pub fn get_name_and_type(
        &mut self,
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    ) -> Result<NameAndTypeConstantIndex, Error> {
        let key = (name, descriptor);
        if let Some(idx) = self.name_and_types.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::NameAndType { name, descriptor };
            let idx = NameAndTypeConstantIndex(self.push_constant(constant)?);
            self.name_and_types.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a field reference constant from the constant pool
    pub fn get_field_ref(
        &mut self,
        class: &BinaryName,
        field: &UnqualifiedName,
        descriptor: &FieldType,
    ) -> Result<FieldRefConstantIndex, Error> {
        let class_idx = self.get_class(class)?;
        let field_utf8 = self.get_utf8(field.as_str())?;
        let descriptor_utf8 = self.get_utf8(descriptor.render())?;
        let name_and_type_idx = self.get_name_and_type(field_utf8, descriptor_utf8)?;

        let key = (class_idx, name_and_type_idx);
        if let Some(idx) = self.fieldrefs.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::FieldRef(class_idx, name_and_type_idx);
            let idx = FieldRefConstantIndex(self.push_constant(constant)?);
            self.fieldrefs.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a method reference constant from the constant pool
    pub fn get_method_ref(
        &mut self,
        class: &BinaryName,
        method: &UnqualifiedName,
        descriptor: &MethodDescriptor,
        is_interface: bool,
    ) -> Result<MethodRefConstantIndex, Error> {
        let class_idx = self.get_class(class)?;
        let method_utf8 = self.get_utf8(method.as_str())?;
        let descriptor_utf8 = self.get_utf8(descriptor.render())?;
        let name_and_type_idx = self.get_name_and_type(method_utf8, descriptor_utf8)?;

        let key = (class_idx, name_and_type_idx, is_interface);
        if let Some(idx) = self.methodrefs.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::MethodRef {
                class: class_idx,
                name_and_type: name_and_type_idx,
                is_interface,
            };
            let idx = MethodRefConstantIndex(self.push_constant(constant)?);
            self.methodrefs.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert an `int` constant from the constant pool
    pub fn get_integer(&mut self, integer: i32) -> Result<ConstantIndex, Error> {
        if let Some(idx) = self.integers.get(&integer) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Integer(integer))?;
            self.integers.insert(integer, idx);
            Ok(idx)
        }
    }

    /// Get or insert a `long` constant from the constant pool
    pub fn get_long(&mut self, long: i64) -> Result<ConstantIndex, Error> {
        if let Some(idx) = self.longs.get(&long) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Long(long))?;
            self.longs.insert(long, idx);
            Ok(idx)
        }
    }

    /// Get or insert a `float` constant from the constant pool
    ///
    /// Keyed on the raw bits so that `NaN` payloads and signed zeros dedupe structurally.
    pub fn get_float(&mut self, float: f32) -> Result<ConstantIndex, Error> {
        let bits = float.to_be_bytes();
        if let Some(idx) = self.floats.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Float(float))?;
            self.floats.insert(bits, idx);
            Ok(idx)
        }
    }

    /// Get or insert a `double` constant from the constant pool
    pub fn get_double(&mut self, double: f64) -> Result<ConstantIndex, Error> {
        let bits = double.to_be_bytes();
        if let Some(idx) = self.doubles.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Double(double))?;
            self.doubles.insert(bits, idx);
            Ok(idx)
        }
    }

    /// Serialize an attribute payload and intern its name
    pub fn get_attribute<A: AttributeLike>(&mut self, attribute: A) -> Result<Attribute, Error> {
        let name_index = self.get_utf8(A::NAME)?;
        let mut info = vec![];

        attribute.serialize(&mut info).map_err(Error::WriteFailure)?;

        Ok(Attribute { name_index, info })
    }
}

impl Default for ConstantsPool {
    fn default() -> Self {
        ConstantsPool::new()
    }
}

/// Constants as in the constant pool
///
/// Note: constant types the assembler never produces (method handles, dynamic call
/// sites, modules) are not represented.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the null
    /// character `\u{0000}` and the encoding of supplementary characters is different).
    Utf8(String),
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                (buffer.len() as u16).serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
            Constant::Class(name) => {
                7u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::String(utf8) => {
                8u8.serialize(writer)?;
                utf8.serialize(writer)?;
            }
            Constant::FieldRef(class, name_and_type) => {
                9u8.serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => {
                (if !is_interface { 10u8 } else { 11u8 }).serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::NameAndType { name, descriptor } => {
                12u8.serialize(writer)?;
                name.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
        };
        Ok(())
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u{0000}` is encoded in 2-byte format rather than 1-byte, so that the
/// >    encoded strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![];
    for c in string.chars() {
        // Handle the exception for how `\u{0000}` is represented
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x1F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`.
/// Quoting the class file spec:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class
/// > file. If a CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the
/// > constant_pool table at index n, then the next usable item in the pool is located at
/// > index n+2.
/// >
/// > In retrospect, making 8-byte constants take two constant pool entries was a poor choice.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct StringConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct FieldRefConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct MethodRefConstantIndex(ConstantIndex);

impl From<Utf8ConstantIndex> for ConstantIndex {
    fn from(idx: Utf8ConstantIndex) -> ConstantIndex {
        idx.0
    }
}
impl From<StringConstantIndex> for ConstantIndex {
    fn from(idx: StringConstantIndex) -> ConstantIndex {
        idx.0
    }
}
impl From<NameAndTypeConstantIndex> for ConstantIndex {
    fn from(idx: NameAndTypeConstantIndex) -> ConstantIndex {
        idx.0
    }
}
impl From<ClassConstantIndex> for ConstantIndex {
    fn from(idx: ClassConstantIndex) -> ConstantIndex {
        idx.0
    }
}
impl From<FieldRefConstantIndex> for ConstantIndex {
    fn from(idx: FieldRefConstantIndex) -> ConstantIndex {
        idx.0
    }
}
impl From<MethodRefConstantIndex> for ConstantIndex {
    fn from(idx: MethodRefConstantIndex) -> ConstantIndex {
        idx.0
    }
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for Utf8ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for StringConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for NameAndTypeConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for ClassConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for FieldRefConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for MethodRefConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    #[test]
    fn interning_is_deduplicated() {
        let mut pool = ConstantsPool::new();
        let a = pool.get_utf8("Point").unwrap();
        let b = pool.get_utf8("x").unwrap();
        let a_again = pool.get_utf8("Point").unwrap();
        assert_eq!(a, a_again);
        assert_ne!(a, b);

        let one = pool.get_integer(1).unwrap();
        let one_again = pool.get_integer(1).unwrap();
        assert_eq!(one, one_again);
    }

    #[test]
    fn indices_follow_insertion_order() {
        let mut pool = ConstantsPool::new();
        let first = pool.get_utf8("a").unwrap();
        let second = pool.get_utf8("b").unwrap();
        let third = pool.get_utf8("c").unwrap();
        assert_eq!(ConstantIndex::from(first).0, 1);
        assert_eq!(ConstantIndex::from(second).0, 2);
        assert_eq!(ConstantIndex::from(third).0, 3);
    }

    #[test]
    fn longs_take_two_slots() {
        let mut pool = ConstantsPool::new();
        let long = pool.get_long(42).unwrap();
        let next = pool.get_utf8("after").unwrap();
        assert_eq!(long.0, 1);
        assert_eq!(ConstantIndex::from(next).0, 3);
    }

    #[test]
    fn pool_overflows_past_addressable_range() {
        let mut pool = ConstantsPool::new();
        for i in 0..u16::MAX as i32 - 1 {
            pool.get_integer(i).unwrap();
        }
        match pool.get_integer(-1) {
            Err(Error::PoolOverflow { .. }) => (),
            other => panic!("expected pool overflow, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn last_handed_out_index_keeps_the_pool_count_in_range() {
        let mut pool = ConstantsPool::new();
        let mut last = ConstantIndex(0);
        for i in 0..u16::MAX as i32 - 1 {
            last = pool.get_integer(i).unwrap();
        }
        assert_eq!(last.0, u16::MAX - 1);

        // The serialized pool count is the final offset, which must fit in a u16
        assert_eq!(pool.into_offset_vec().offset_len().0, u16::MAX as usize);
    }

    #[test]
    fn structurally_equal_refs_share_an_index() {
        let mut pool = ConstantsPool::new();
        let x = UnqualifiedName::from_string(String::from("x")).unwrap();
        let point = BinaryName::from_string(String::from("Point")).unwrap();
        let first = pool.get_field_ref(&point, &x, &FieldType::INT).unwrap();
        let second = pool.get_field_ref(&point, &x, &FieldType::INT).unwrap();
        assert_eq!(first, second);
    }
}
