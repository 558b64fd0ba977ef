use super::{ClassConstantIndex, ConstantIndex, Error, FieldRefConstantIndex, MethodRefConstantIndex};
use crate::util::{Offset, Width};
use byteorder::{BigEndian, WriteBytesExt};
use std::fmt;

/// Opaque label standing in for a bytecode offset that is not known yet
///
/// Labels are handed out and placed by the method body assembler; by the time a method
/// is serialized, every referenced label must have been placed.
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Label(pub usize);

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("l{}", self.0))
    }
}

/// Comparison condition used by conditional branch instructions
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum OrdComparison {
    EQ,
    NE,
    LT,
    GE,
    GT,
    LE,
}

impl OrdComparison {
    /// Condition that succeeds exactly when this one fails
    pub fn negate(self) -> OrdComparison {
        match self {
            OrdComparison::EQ => OrdComparison::NE,
            OrdComparison::NE => OrdComparison::EQ,
            OrdComparison::LT => OrdComparison::GE,
            OrdComparison::GE => OrdComparison::LT,
            OrdComparison::GT => OrdComparison::LE,
            OrdComparison::LE => OrdComparison::GT,
        }
    }

    /// Offset of the condition within a family of comparison opcodes
    const fn opcode_offset(self) -> u8 {
        match self {
            OrdComparison::EQ => 0,
            OrdComparison::NE => 1,
            OrdComparison::LT => 2,
            OrdComparison::GE => 3,
            OrdComparison::GT => 4,
            OrdComparison::LE => 5,
        }
    }
}

/// Subset of JVM instructions the assembler produces
///
/// Instructions know their encoded size (see the [`Width`] impl), so an
/// `OffsetVec<Instruction>` indexes instructions directly by bytecode offset. Local
/// variable slots are capped at 255 by the assembler, which lets the encoding always
/// pick between the `iload_<n>` style short forms and the single-byte-index forms.
#[derive(Clone, Debug)]
pub enum Instruction {
    /// Push `null`
    AConstNull,

    /// Push an `int` in the range `-1..=5` (the `iconst_<i>` forms)
    IConst(i32),

    /// Push a sign-extended byte
    BiPush(i8),

    /// Push a sign-extended short
    SiPush(i16),

    /// Push a one-slot constant from the pool (`ldc` or `ldc_w`, picked by index)
    Ldc(ConstantIndex),

    /// Push a two-slot (`long`/`double`) constant from the pool
    Ldc2(ConstantIndex),

    ILoad(u16),
    LLoad(u16),
    FLoad(u16),
    DLoad(u16),
    ALoad(u16),

    IStore(u16),
    LStore(u16),
    FStore(u16),
    DStore(u16),
    AStore(u16),

    Pop,
    Pop2,
    Dup,

    IAdd,
    ISub,
    IMul,
    IDiv,
    IRem,

    GetStatic(FieldRefConstantIndex),
    PutStatic(FieldRefConstantIndex),
    GetField(FieldRefConstantIndex),
    PutField(FieldRefConstantIndex),

    InvokeVirtual(MethodRefConstantIndex),
    InvokeSpecial(MethodRefConstantIndex),
    InvokeStatic(MethodRefConstantIndex),
    InvokeInterface(MethodRefConstantIndex, u8),

    New(ClassConstantIndex),
    CheckCast(ClassConstantIndex),

    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,

    /// Unconditional jump
    Goto(Label),

    /// Compare the `int` on top of the stack against zero and jump if the condition holds
    If(OrdComparison, Label),

    /// Compare the two `int`s on top of the stack and jump if the condition holds
    IfICmp(OrdComparison, Label),
}

impl Width for Instruction {
    fn width(&self) -> usize {
        match self {
            Instruction::AConstNull
            | Instruction::IConst(_)
            | Instruction::Pop
            | Instruction::Pop2
            | Instruction::Dup
            | Instruction::IAdd
            | Instruction::ISub
            | Instruction::IMul
            | Instruction::IDiv
            | Instruction::IRem
            | Instruction::IReturn
            | Instruction::LReturn
            | Instruction::FReturn
            | Instruction::DReturn
            | Instruction::AReturn
            | Instruction::Return => 1,

            Instruction::BiPush(_) => 2,
            Instruction::SiPush(_) => 3,

            Instruction::Ldc(index) => {
                if index.0 <= u8::MAX as u16 {
                    2
                } else {
                    3
                }
            }
            Instruction::Ldc2(_) => 3,

            Instruction::ILoad(slot)
            | Instruction::LLoad(slot)
            | Instruction::FLoad(slot)
            | Instruction::DLoad(slot)
            | Instruction::ALoad(slot)
            | Instruction::IStore(slot)
            | Instruction::LStore(slot)
            | Instruction::FStore(slot)
            | Instruction::DStore(slot)
            | Instruction::AStore(slot) => {
                if *slot <= 3 {
                    1
                } else {
                    2
                }
            }

            Instruction::GetStatic(_)
            | Instruction::PutStatic(_)
            | Instruction::GetField(_)
            | Instruction::PutField(_)
            | Instruction::InvokeVirtual(_)
            | Instruction::InvokeSpecial(_)
            | Instruction::InvokeStatic(_)
            | Instruction::New(_)
            | Instruction::CheckCast(_)
            | Instruction::Goto(_)
            | Instruction::If(_, _)
            | Instruction::IfICmp(_, _) => 3,

            Instruction::InvokeInterface(_, _) => 5,
        }
    }
}

/// Encode a load/store style instruction that has `_<n>` short forms
fn encode_local<W: WriteBytesExt>(
    writer: &mut W,
    short_form_base: u8,
    general_opcode: u8,
    slot: u16,
) -> std::io::Result<()> {
    if slot <= 3 {
        writer.write_u8(short_form_base + slot as u8)
    } else {
        writer.write_u8(general_opcode)?;
        writer.write_u8(slot as u8)
    }
}

impl Instruction {
    /// Encode the instruction at the given offset, resolving branch targets to
    /// relative offsets
    pub fn encode<W: WriteBytesExt>(
        &self,
        own_offset: Offset,
        writer: &mut W,
        mut resolve: impl FnMut(Label) -> Option<Offset>,
    ) -> Result<(), Error> {
        let mut branch = |writer: &mut W, opcode: u8, label: Label| -> Result<(), Error> {
            let target = resolve(label).ok_or(Error::DanglingBranch(label))?;
            let delta = target.0 as i64 - own_offset.0 as i64;
            let delta = i16::try_from(delta).map_err(|_| {
                Error::UnsupportedConstruct(format!(
                    "branch offset {} exceeds the signed 16-bit range",
                    delta
                ))
            })?;
            writer.write_u8(opcode).map_err(Error::WriteFailure)?;
            writer
                .write_i16::<BigEndian>(delta)
                .map_err(Error::WriteFailure)
        };

        let io = |result: std::io::Result<()>| result.map_err(Error::WriteFailure);

        match self {
            Instruction::AConstNull => io(writer.write_u8(0x01)),
            Instruction::IConst(value) => {
                debug_assert!((-1..=5).contains(value));
                io(writer.write_u8((0x03 + value) as u8))
            }
            Instruction::BiPush(value) => {
                io(writer.write_u8(0x10).and_then(|()| writer.write_i8(*value)))
            }
            Instruction::SiPush(value) => io(writer
                .write_u8(0x11)
                .and_then(|()| writer.write_i16::<BigEndian>(*value))),
            Instruction::Ldc(index) => {
                if index.0 <= u8::MAX as u16 {
                    io(writer
                        .write_u8(0x12)
                        .and_then(|()| writer.write_u8(index.0 as u8)))
                } else {
                    io(writer
                        .write_u8(0x13)
                        .and_then(|()| writer.write_u16::<BigEndian>(index.0)))
                }
            }
            Instruction::Ldc2(index) => io(writer
                .write_u8(0x14)
                .and_then(|()| writer.write_u16::<BigEndian>(index.0))),

            Instruction::ILoad(slot) => io(encode_local(writer, 0x1a, 0x15, *slot)),
            Instruction::LLoad(slot) => io(encode_local(writer, 0x1e, 0x16, *slot)),
            Instruction::FLoad(slot) => io(encode_local(writer, 0x22, 0x17, *slot)),
            Instruction::DLoad(slot) => io(encode_local(writer, 0x26, 0x18, *slot)),
            Instruction::ALoad(slot) => io(encode_local(writer, 0x2a, 0x19, *slot)),

            Instruction::IStore(slot) => io(encode_local(writer, 0x3b, 0x36, *slot)),
            Instruction::LStore(slot) => io(encode_local(writer, 0x3f, 0x37, *slot)),
            Instruction::FStore(slot) => io(encode_local(writer, 0x43, 0x38, *slot)),
            Instruction::DStore(slot) => io(encode_local(writer, 0x47, 0x39, *slot)),
            Instruction::AStore(slot) => io(encode_local(writer, 0x4b, 0x3a, *slot)),

            Instruction::Pop => io(writer.write_u8(0x57)),
            Instruction::Pop2 => io(writer.write_u8(0x58)),
            Instruction::Dup => io(writer.write_u8(0x59)),

            Instruction::IAdd => io(writer.write_u8(0x60)),
            Instruction::ISub => io(writer.write_u8(0x64)),
            Instruction::IMul => io(writer.write_u8(0x68)),
            Instruction::IDiv => io(writer.write_u8(0x6c)),
            Instruction::IRem => io(writer.write_u8(0x70)),

            Instruction::GetStatic(field) => {
                io(writer.write_u8(0xb2).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*field).0)
                }))
            }
            Instruction::PutStatic(field) => {
                io(writer.write_u8(0xb3).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*field).0)
                }))
            }
            Instruction::GetField(field) => {
                io(writer.write_u8(0xb4).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*field).0)
                }))
            }
            Instruction::PutField(field) => {
                io(writer.write_u8(0xb5).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*field).0)
                }))
            }

            Instruction::InvokeVirtual(method) => {
                io(writer.write_u8(0xb6).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*method).0)
                }))
            }
            Instruction::InvokeSpecial(method) => {
                io(writer.write_u8(0xb7).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*method).0)
                }))
            }
            Instruction::InvokeStatic(method) => {
                io(writer.write_u8(0xb8).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*method).0)
                }))
            }
            Instruction::InvokeInterface(method, count) => io(writer
                .write_u8(0xb9)
                .and_then(|()| writer.write_u16::<BigEndian>(ConstantIndex::from(*method).0))
                .and_then(|()| writer.write_u8(*count))
                .and_then(|()| writer.write_u8(0))),

            Instruction::New(class) => {
                io(writer.write_u8(0xbb).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*class).0)
                }))
            }
            Instruction::CheckCast(class) => {
                io(writer.write_u8(0xc0).and_then(|()| {
                    writer.write_u16::<BigEndian>(ConstantIndex::from(*class).0)
                }))
            }

            Instruction::IReturn => io(writer.write_u8(0xac)),
            Instruction::LReturn => io(writer.write_u8(0xad)),
            Instruction::FReturn => io(writer.write_u8(0xae)),
            Instruction::DReturn => io(writer.write_u8(0xaf)),
            Instruction::AReturn => io(writer.write_u8(0xb0)),
            Instruction::Return => io(writer.write_u8(0xb1)),

            Instruction::Goto(label) => branch(writer, 0xa7, *label),
            Instruction::If(cond, label) => branch(writer, 0x99 + cond.opcode_offset(), *label),
            Instruction::IfICmp(cond, label) => {
                branch(writer, 0x9f + cond.opcode_offset(), *label)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encoded(insn: Instruction, at: Offset, target: Option<Offset>) -> Vec<u8> {
        let mut buffer = vec![];
        insn.encode(at, &mut buffer, |_| target).unwrap();
        buffer
    }

    #[test]
    fn widths_match_encoded_lengths() {
        let insns = vec![
            Instruction::AConstNull,
            Instruction::IConst(5),
            Instruction::BiPush(-7),
            Instruction::SiPush(300),
            Instruction::ILoad(2),
            Instruction::ILoad(9),
            Instruction::AStore(200),
            Instruction::Goto(Label(0)),
        ];
        for insn in insns {
            let bytes = encoded(insn.clone(), Offset(0), Some(Offset(0)));
            assert_eq!(bytes.len(), insn.width(), "width mismatch for {:?}", insn);
        }
    }

    #[test]
    fn short_and_general_local_forms() {
        assert_eq!(encoded(Instruction::ILoad(0), Offset(0), None), vec![0x1a]);
        assert_eq!(
            encoded(Instruction::ILoad(7), Offset(0), None),
            vec![0x15, 7]
        );
        assert_eq!(encoded(Instruction::AStore(3), Offset(0), None), vec![0x4e]);
    }

    #[test]
    fn branches_encode_relative_offsets() {
        // Forward jump from offset 4 to offset 10
        assert_eq!(
            encoded(Instruction::Goto(Label(0)), Offset(4), Some(Offset(10))),
            vec![0xa7, 0, 6]
        );
        // Backward jump from offset 10 to offset 4
        assert_eq!(
            encoded(
                Instruction::IfICmp(OrdComparison::LT, Label(0)),
                Offset(10),
                Some(Offset(4))
            ),
            vec![0xa1, 0xff, 0xfa]
        );
    }

    #[test]
    fn unplaced_label_is_a_dangling_branch() {
        let mut buffer = vec![];
        let result = Instruction::Goto(Label(3)).encode(Offset(0), &mut buffer, |_| None);
        assert!(matches!(result, Err(Error::DanglingBranch(Label(3)))));
    }
}
