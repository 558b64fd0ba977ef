use super::TypeEncoder;
use crate::jvm::class_file::{BytecodeArray, Code};
use crate::jvm::{
    BaseType, BinaryName, ConstantIndex, ConstantsPool, Error, FieldType, Instruction, Label,
    MethodDescriptor, Name, OrdComparison, RenderDescriptor, UnqualifiedName,
};
use crate::model::{
    BinOp, Comparison, Expression, InvokeKind, JavaType, Literal, Statement, Target,
};
use crate::util::{Offset, OffsetVec, Width};
use std::collections::HashMap;

/// Running operand stack depth model
///
/// Wide (`long`/`double`) values count as two. The maximum observed depth becomes the
/// `max_stack` of the emitted `Code` attribute.
struct StackTracker {
    current: usize,
    maximum: usize,
}

impl StackTracker {
    fn new() -> StackTracker {
        StackTracker {
            current: 0,
            maximum: 0,
        }
    }

    fn push(&mut self, width: usize) {
        self.current += width;
        self.maximum = self.maximum.max(self.current);
    }

    fn pop(&mut self, width: usize) -> Result<(), Error> {
        if self.current < width {
            return Err(Error::UnsupportedConstruct(String::from(
                "operand stack underflow",
            )));
        }
        self.current -= width;
        Ok(())
    }
}

/// Local variable slot table
///
/// Slots are assigned in first-bind order and never reused, even when a name goes out
/// of scope; wide types occupy two consecutive slots. Slot 0 is reserved for `this`
/// in instance methods.
struct LocalTable {
    bindings: HashMap<String, (u16, FieldType)>,
    next_slot: u16,
}

impl LocalTable {
    fn new(reserve_this: bool) -> LocalTable {
        LocalTable {
            bindings: HashMap::new(),
            next_slot: if reserve_this { 1 } else { 0 },
        }
    }

    fn declare(&mut self, name: &str, binding_type: FieldType) -> Result<u16, Error> {
        let width = binding_type.width() as u16;

        // The single-byte load/store forms cap the addressable slots at 255
        if self.next_slot as usize + width as usize > 256 {
            return Err(Error::UnsupportedConstruct(String::from(
                "more than 255 local variable slots",
            )));
        }

        let slot = self.next_slot;
        self.next_slot += width;
        self.bindings
            .insert(name.to_owned(), (slot, binding_type));
        Ok(slot)
    }

    fn lookup(&self, name: &str) -> Result<(u16, FieldType), Error> {
        self.bindings.get(name).cloned().ok_or_else(|| {
            Error::UnsupportedConstruct(format!("variable '{}' is not declared", name))
        })
    }
}

/// Assembler for a single method body
///
/// Statements and expressions are lowered in one forward pass; branch targets are
/// recorded as [`Label`]s and only resolved to byte offsets when [`CodeAssembler::finish`]
/// serializes the instruction stream (the second pass).
pub struct CodeAssembler<'a> {
    constants: &'a mut ConstantsPool,
    encoder: &'a TypeEncoder,
    class_name: &'a BinaryName,
    is_static: bool,
    instructions: OffsetVec<Instruction>,
    labels: HashMap<Label, Offset>,
    next_label: usize,
    locals: LocalTable,
    stack: StackTracker,
}

impl<'a> CodeAssembler<'a> {
    pub fn new(
        constants: &'a mut ConstantsPool,
        encoder: &'a TypeEncoder,
        class_name: &'a BinaryName,
        is_static: bool,
    ) -> CodeAssembler<'a> {
        CodeAssembler {
            constants,
            encoder,
            class_name,
            is_static,
            instructions: OffsetVec::new(),
            labels: HashMap::new(),
            next_label: 0,
            locals: LocalTable::new(!is_static),
            stack: StackTracker::new(),
        }
    }

    /// Bind a method parameter to the next local slot
    pub fn declare_parameter(&mut self, name: &str, java_type: &JavaType) -> Result<(), Error> {
        let erased = self.encoder.erase(java_type)?;
        self.locals.declare(name, erased)?;
        Ok(())
    }

    /// Emit the implicit `super.<init>()` call at the start of a constructor
    pub fn super_call(&mut self, super_class: &BinaryName) -> Result<(), Error> {
        let descriptor = MethodDescriptor {
            parameters: vec![],
            return_type: None,
        };
        let init =
            self.constants
                .get_method_ref(super_class, &UnqualifiedName::INIT, &descriptor, false)?;
        self.emit(Instruction::ALoad(0));
        self.stack.push(1);
        self.emit(Instruction::InvokeSpecial(init));
        self.stack.pop(1)?;
        Ok(())
    }

    /// Lower a full method body, closing it off with the appropriate return
    ///
    /// Void methods get an implicit trailing `return`; non-void methods must end with
    /// an explicit return statement.
    pub fn body(
        &mut self,
        statements: &[Statement],
        return_type: &Option<FieldType>,
    ) -> Result<(), Error> {
        for statement in statements {
            self.statement(statement, return_type)?;
        }
        match return_type {
            None => {
                if !matches!(statements.last(), Some(Statement::Return(None))) {
                    self.emit(Instruction::Return);
                }
            }
            Some(_) => {
                if !matches!(statements.last(), Some(Statement::Return(Some(_)))) {
                    return Err(Error::UnsupportedConstruct(String::from(
                        "method body must end with a return statement",
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve labels and serialize into a `Code` attribute body
    pub fn finish(self) -> Result<Code, Error> {
        let labels = &self.labels;
        let mut buffer = vec![];
        for (offset, instruction) in self.instructions.iter() {
            instruction.encode(offset, &mut buffer, |label| labels.get(&label).copied())?;
        }

        // The `Code` attribute stores a u32 length but the verifier caps method
        // bodies at 65535 bytes
        if buffer.len() > u16::MAX as usize {
            return Err(Error::UnsupportedConstruct(String::from(
                "method body exceeds 65535 bytes",
            )));
        }

        Ok(Code {
            max_stack: self.stack.maximum as u16,
            max_locals: self.locals.next_slot,
            code_array: BytecodeArray(buffer),
            exception_table: vec![],
            attributes: vec![],
        })
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn fresh_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn place_label(&mut self, label: Label) {
        let previous = self.labels.insert(label, self.instructions.offset_len());
        debug_assert!(previous.is_none(), "label {:?} placed twice", label);
    }

    fn statement(
        &mut self,
        statement: &Statement,
        return_type: &Option<FieldType>,
    ) -> Result<(), Error> {
        match statement {
            Statement::Declare {
                name,
                var_type,
                value,
            } => {
                let declared = self.encoder.erase(var_type)?;
                let found = self.value_expression(value)?;
                check_assignable(&declared, &found)?;
                let slot = self.locals.declare(name, declared.clone())?;
                self.stack.pop(declared.width())?;
                self.emit(store_instruction(slot, &declared));
                Ok(())
            }

            Statement::Assign { target, value } => match target {
                Target::Variable(name) => {
                    let (slot, declared) = self.locals.lookup(name)?;
                    let found = self.value_expression(value)?;
                    check_assignable(&declared, &found)?;
                    self.stack.pop(declared.width())?;
                    self.emit(store_instruction(slot, &declared));
                    Ok(())
                }
                Target::Field { field, receiver } => {
                    let declared = self.encoder.erase(&field.field_type)?;
                    let index =
                        self.constants
                            .get_field_ref(&field.owner, &field.name, &declared)?;
                    if field.is_static {
                        if receiver.is_some() {
                            return Err(Error::UnsupportedConstruct(String::from(
                                "static field assignment through a receiver",
                            )));
                        }
                        let found = self.value_expression(value)?;
                        check_assignable(&declared, &found)?;
                        self.stack.pop(declared.width())?;
                        self.emit(Instruction::PutStatic(index));
                    } else {
                        self.receiver(receiver.as_deref())?;
                        let found = self.value_expression(value)?;
                        check_assignable(&declared, &found)?;
                        self.stack.pop(1 + declared.width())?;
                        self.emit(Instruction::PutField(index));
                    }
                    Ok(())
                }
            },

            Statement::Return(None) => {
                if let Some(expected) = return_type {
                    return Err(Error::TypeMismatch {
                        expected: expected.render(),
                        found: String::from("void"),
                    });
                }
                self.emit(Instruction::Return);
                Ok(())
            }

            Statement::Return(Some(value)) => {
                let found = self.value_expression(value)?;
                let expected = return_type.as_ref().ok_or_else(|| Error::TypeMismatch {
                    expected: String::from("void"),
                    found: found.render(),
                })?;
                check_assignable(expected, &found)?;
                self.stack.pop(expected.width())?;
                self.emit(return_instruction(expected));
                Ok(())
            }

            Statement::Expression(expression) => {
                match self.expression(expression)? {
                    None => {}
                    Some(discarded) => {
                        self.stack.pop(discarded.width())?;
                        self.emit(if discarded.width() == 2 {
                            Instruction::Pop2
                        } else {
                            Instruction::Pop
                        });
                    }
                }
                Ok(())
            }

            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                let else_label = self.fresh_label();
                self.condition(condition, else_label)?;
                for statement in then_body {
                    self.statement(statement, return_type)?;
                }
                if else_body.is_empty() {
                    self.place_label(else_label);
                } else {
                    let end_label = self.fresh_label();
                    self.emit(Instruction::Goto(end_label));
                    self.place_label(else_label);
                    for statement in else_body {
                        self.statement(statement, return_type)?;
                    }
                    self.place_label(end_label);
                }
                Ok(())
            }

            Statement::While { condition, body } => {
                let start_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.place_label(start_label);
                self.condition(condition, end_label)?;
                for statement in body {
                    self.statement(statement, return_type)?;
                }
                self.emit(Instruction::Goto(start_label));
                self.place_label(end_label);
                Ok(())
            }
        }
    }

    /// Lower a condition, jumping to `jump_if_false` when it does not hold
    ///
    /// Comparisons invert their condition so the fall-through path is the "true"
    /// branch; comparisons against the literal `0` use the single-operand forms.
    fn condition(&mut self, condition: &Expression, jump_if_false: Label) -> Result<(), Error> {
        match condition {
            Expression::Compare { op, lhs, rhs } => {
                let comparison = ord_comparison(*op);
                if matches!(rhs.as_ref(), Expression::Literal(Literal::Int(0))) {
                    let found = self.value_expression(lhs)?;
                    check_int_operand(&found)?;
                    self.stack.pop(1)?;
                    self.emit(Instruction::If(comparison.negate(), jump_if_false));
                } else {
                    let lhs_type = self.value_expression(lhs)?;
                    check_int_operand(&lhs_type)?;
                    let rhs_type = self.value_expression(rhs)?;
                    check_int_operand(&rhs_type)?;
                    self.stack.pop(2)?;
                    self.emit(Instruction::IfICmp(comparison.negate(), jump_if_false));
                }
            }
            boolean_valued => {
                let found = self.value_expression(boolean_valued)?;
                check_boolean_operand(&found)?;
                self.stack.pop(1)?;

                // `false` is 0, so fall through only when the value is nonzero
                self.emit(Instruction::If(OrdComparison::EQ, jump_if_false));
            }
        }
        Ok(())
    }

    /// Lower an expression that must produce a value
    fn value_expression(&mut self, expression: &Expression) -> Result<FieldType, Error> {
        self.expression(expression)?.ok_or_else(|| {
            Error::UnsupportedConstruct(String::from(
                "void method call used where a value is required",
            ))
        })
    }

    /// Lower an expression, returning the type it leaves on the stack (`None` for a
    /// call to a void method)
    fn expression(&mut self, expression: &Expression) -> Result<Option<FieldType>, Error> {
        match expression {
            Expression::Literal(literal) => self.literal(literal).map(Some),

            Expression::This => {
                self.this_on_stack()?;
                Ok(Some(FieldType::object(self.class_name.clone())))
            }

            Expression::Variable(name) => {
                let (slot, binding_type) = self.locals.lookup(name)?;
                self.emit(load_instruction(slot, &binding_type));
                self.stack.push(binding_type.width());
                Ok(Some(binding_type))
            }

            Expression::GetField { field, receiver } => {
                let field_type = self.encoder.erase(&field.field_type)?;
                let index = self
                    .constants
                    .get_field_ref(&field.owner, &field.name, &field_type)?;
                if field.is_static {
                    if receiver.is_some() {
                        return Err(Error::UnsupportedConstruct(String::from(
                            "static field read through a receiver",
                        )));
                    }
                    self.emit(Instruction::GetStatic(index));
                } else {
                    self.receiver(receiver.as_deref())?;
                    self.stack.pop(1)?;
                    self.emit(Instruction::GetField(index));
                }
                self.stack.push(field_type.width());
                Ok(Some(field_type))
            }

            Expression::Call {
                method,
                receiver,
                arguments,
            } => {
                if arguments.len() != method.parameters.len() {
                    return Err(Error::UnsupportedConstruct(format!(
                        "call to '{}' with {} arguments but {} parameters",
                        method.name.as_str(),
                        arguments.len(),
                        method.parameters.len()
                    )));
                }
                let descriptor = self
                    .encoder
                    .erase_method(&method.parameters, &method.return_type)?;
                let is_interface = method.invoke == InvokeKind::Interface;
                let index = self.constants.get_method_ref(
                    &method.owner,
                    &method.name,
                    &descriptor,
                    is_interface,
                )?;

                let is_static = method.invoke == InvokeKind::Static;
                if is_static {
                    if receiver.is_some() {
                        return Err(Error::UnsupportedConstruct(String::from(
                            "static method call through a receiver",
                        )));
                    }
                } else {
                    self.receiver(receiver.as_deref())?;
                }
                for argument in arguments {
                    self.value_expression(argument)?;
                }
                self.stack.pop(descriptor.parameter_length(!is_static))?;

                self.emit(match method.invoke {
                    InvokeKind::Virtual => Instruction::InvokeVirtual(index),
                    InvokeKind::Static => Instruction::InvokeStatic(index),
                    InvokeKind::Special => Instruction::InvokeSpecial(index),
                    InvokeKind::Interface => {
                        Instruction::InvokeInterface(index, descriptor.parameter_length(true) as u8)
                    }
                });

                match &descriptor.return_type {
                    None => Ok(None),
                    Some(return_type) => {
                        self.stack.push(return_type.width());
                        Ok(Some(return_type.clone()))
                    }
                }
            }

            Expression::New {
                class,
                parameters,
                arguments,
            } => {
                if arguments.len() != parameters.len() {
                    return Err(Error::UnsupportedConstruct(format!(
                        "constructor call for '{}' with {} arguments but {} parameters",
                        class.name.as_str(),
                        arguments.len(),
                        parameters.len()
                    )));
                }
                let class_index = self.constants.get_class(&class.name)?;
                let descriptor = self.encoder.erase_method(parameters, &None)?;
                let init = self.constants.get_method_ref(
                    &class.name,
                    &UnqualifiedName::INIT,
                    &descriptor,
                    false,
                )?;

                self.emit(Instruction::New(class_index));
                self.stack.push(1);
                self.emit(Instruction::Dup);
                self.stack.push(1);
                for argument in arguments {
                    self.value_expression(argument)?;
                }
                self.stack.pop(descriptor.parameter_length(true))?;
                self.emit(Instruction::InvokeSpecial(init));

                Ok(Some(FieldType::object(class.name.clone())))
            }

            Expression::Cast { value, to } => {
                let found = self.value_expression(value)?;
                if !found.is_reference() {
                    return Err(Error::UnsupportedConstruct(String::from(
                        "cast applied to a primitive value",
                    )));
                }
                let target = self.encoder.erase(to)?;
                let class_index = match &target {
                    FieldType::Object(name) => self.constants.get_class(name)?,
                    FieldType::Array(_) => self.constants.get_class_named(&target.render())?,
                    FieldType::Base(_) => {
                        return Err(Error::UnsupportedConstruct(String::from(
                            "cast to a primitive type",
                        )))
                    }
                };
                self.emit(Instruction::CheckCast(class_index));
                Ok(Some(target))
            }

            Expression::Binary { op, lhs, rhs } => {
                let lhs_type = self.value_expression(lhs)?;
                check_int_operand(&lhs_type)?;
                let rhs_type = self.value_expression(rhs)?;
                check_int_operand(&rhs_type)?;
                self.stack.pop(2)?;
                self.stack.push(1);
                self.emit(match op {
                    BinOp::Add => Instruction::IAdd,
                    BinOp::Sub => Instruction::ISub,
                    BinOp::Mul => Instruction::IMul,
                    BinOp::Div => Instruction::IDiv,
                    BinOp::Rem => Instruction::IRem,
                });
                Ok(Some(FieldType::INT))
            }

            Expression::Compare { .. } => Err(Error::UnsupportedConstruct(String::from(
                "comparison used outside an if or while condition",
            ))),
        }
    }

    fn literal(&mut self, literal: &Literal) -> Result<FieldType, Error> {
        match literal {
            Literal::Int(value) => {
                let instruction = match *value {
                    -1..=5 => Instruction::IConst(*value),
                    small if i8::try_from(small).is_ok() => Instruction::BiPush(small as i8),
                    medium if i16::try_from(medium).is_ok() => Instruction::SiPush(medium as i16),
                    large => Instruction::Ldc(self.constants.get_integer(large)?),
                };
                self.emit(instruction);
                self.stack.push(1);
                Ok(FieldType::INT)
            }
            Literal::Boolean(value) => {
                self.emit(Instruction::IConst(i32::from(*value)));
                self.stack.push(1);
                Ok(FieldType::Base(BaseType::Boolean))
            }
            Literal::Long(value) => {
                let index = self.constants.get_long(*value)?;
                self.emit(Instruction::Ldc2(index));
                self.stack.push(2);
                Ok(FieldType::Base(BaseType::Long))
            }
            Literal::Float(value) => {
                let index = self.constants.get_float(*value)?;
                self.emit(Instruction::Ldc(index));
                self.stack.push(1);
                Ok(FieldType::Base(BaseType::Float))
            }
            Literal::Double(value) => {
                let index = self.constants.get_double(*value)?;
                self.emit(Instruction::Ldc2(index));
                self.stack.push(2);
                Ok(FieldType::Base(BaseType::Double))
            }
            Literal::String(value) => {
                let utf8 = self.constants.get_utf8(value.as_str())?;
                let string = self.constants.get_string(utf8)?;
                self.emit(Instruction::Ldc(ConstantIndex::from(string)));
                self.stack.push(1);
                Ok(FieldType::object(BinaryName::STRING))
            }
            Literal::Null => {
                self.emit(Instruction::AConstNull);
                self.stack.push(1);
                Ok(FieldType::object(BinaryName::OBJECT))
            }
        }
    }

    /// Load the receiver for an instance field access or method call
    fn receiver(&mut self, receiver: Option<&Expression>) -> Result<(), Error> {
        match receiver {
            Some(expression) => {
                let found = self.value_expression(expression)?;
                if !found.is_reference() {
                    return Err(Error::TypeMismatch {
                        expected: String::from("a reference type"),
                        found: found.render(),
                    });
                }
                Ok(())
            }
            None => self.this_on_stack(),
        }
    }

    fn this_on_stack(&mut self) -> Result<(), Error> {
        if self.is_static {
            return Err(Error::UnsupportedConstruct(String::from(
                "'this' referenced in a static context",
            )));
        }
        self.emit(Instruction::ALoad(0));
        self.stack.push(1);
        Ok(())
    }
}

/// Assignment compatibility over erased types
///
/// The model carries no class hierarchy, so any reference type is considered
/// assignable to any reference type; primitive types must match exactly.
pub(crate) fn check_assignable(expected: &FieldType, found: &FieldType) -> Result<(), Error> {
    if expected == found || (expected.is_reference() && found.is_reference()) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: expected.render(),
            found: found.render(),
        })
    }
}

fn check_int_operand(found: &FieldType) -> Result<(), Error> {
    if matches!(found, FieldType::Base(BaseType::Int)) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: String::from("I"),
            found: found.render(),
        })
    }
}

fn check_boolean_operand(found: &FieldType) -> Result<(), Error> {
    if matches!(found, FieldType::Base(BaseType::Boolean | BaseType::Int)) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: String::from("Z"),
            found: found.render(),
        })
    }
}

fn ord_comparison(comparison: Comparison) -> OrdComparison {
    match comparison {
        Comparison::Eq => OrdComparison::EQ,
        Comparison::Ne => OrdComparison::NE,
        Comparison::Lt => OrdComparison::LT,
        Comparison::Le => OrdComparison::LE,
        Comparison::Gt => OrdComparison::GT,
        Comparison::Ge => OrdComparison::GE,
    }
}

fn load_instruction(slot: u16, binding_type: &FieldType) -> Instruction {
    match binding_type {
        FieldType::Base(BaseType::Long) => Instruction::LLoad(slot),
        FieldType::Base(BaseType::Float) => Instruction::FLoad(slot),
        FieldType::Base(BaseType::Double) => Instruction::DLoad(slot),
        FieldType::Base(_) => Instruction::ILoad(slot),
        FieldType::Object(_) | FieldType::Array(_) => Instruction::ALoad(slot),
    }
}

fn store_instruction(slot: u16, binding_type: &FieldType) -> Instruction {
    match binding_type {
        FieldType::Base(BaseType::Long) => Instruction::LStore(slot),
        FieldType::Base(BaseType::Float) => Instruction::FStore(slot),
        FieldType::Base(BaseType::Double) => Instruction::DStore(slot),
        FieldType::Base(_) => Instruction::IStore(slot),
        FieldType::Object(_) | FieldType::Array(_) => Instruction::AStore(slot),
    }
}

fn return_instruction(return_type: &FieldType) -> Instruction {
    match return_type {
        FieldType::Base(BaseType::Long) => Instruction::LReturn,
        FieldType::Base(BaseType::Float) => Instruction::FReturn,
        FieldType::Base(BaseType::Double) => Instruction::DReturn,
        FieldType::Base(_) => Instruction::IReturn,
        FieldType::Object(_) | FieldType::Array(_) => Instruction::AReturn,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{FieldRef, MethodRef, Parameter};

    fn point() -> BinaryName {
        BinaryName::from_string(String::from("Point")).unwrap()
    }

    fn assemble(
        is_static: bool,
        parameters: &[Parameter],
        return_type: Option<JavaType>,
        body: &[Statement],
    ) -> Result<Code, Error> {
        let mut constants = ConstantsPool::new();
        let encoder = TypeEncoder::new(&[]);
        let class_name = point();
        let mut assembler = CodeAssembler::new(&mut constants, &encoder, &class_name, is_static);
        for parameter in parameters {
            assembler.declare_parameter(&parameter.name, &parameter.parameter_type)?;
        }
        let erased_return = match &return_type {
            None => None,
            Some(java_type) => Some(encoder.erase(java_type)?),
        };
        assembler.body(body, &erased_return)?;
        assembler.finish()
    }

    #[test]
    fn empty_void_body_is_a_bare_return() {
        let code = assemble(true, &[], None, &[]).unwrap();
        assert_eq!(code.code_array.0, vec![0xb1]);
        assert_eq!(code.max_stack, 0);
        assert_eq!(code.max_locals, 0);
    }

    #[test]
    fn parameters_occupy_slots_in_order_with_wide_types_taking_two() {
        let parameters = vec![
            Parameter::new("a", JavaType::LONG),
            Parameter::new("b", JavaType::INT),
        ];
        let body = vec![Statement::Return(Some(Expression::variable("b")))];
        let code = assemble(false, &parameters, Some(JavaType::INT), &body).unwrap();

        // this=0, a=1..2, b=3
        assert_eq!(code.max_locals, 4);
        assert_eq!(code.code_array.0, vec![0x1d, 0xac]); // iload_3, ireturn
    }

    #[test]
    fn declared_locals_never_reuse_slots() {
        let body = vec![
            Statement::If {
                condition: Expression::compare(Comparison::Gt, Expression::int(1), Expression::int(0)),
                then_body: vec![Statement::Declare {
                    name: String::from("x"),
                    var_type: JavaType::INT,
                    value: Expression::int(1),
                }],
                else_body: vec![],
            },
            Statement::Declare {
                name: String::from("y"),
                var_type: JavaType::INT,
                value: Expression::int(2),
            },
        ];
        let code = assemble(true, &[], None, &body).unwrap();

        // x got slot 0 inside the branch; y must get slot 1 even though x is dead
        assert_eq!(code.max_locals, 2);
    }

    #[test]
    fn stack_depth_tracks_nested_expressions() {
        // (1 + 2) + (3 + 4) needs three slots at its deepest
        let sum = Expression::binary(
            BinOp::Add,
            Expression::binary(BinOp::Add, Expression::int(1), Expression::int(2)),
            Expression::binary(BinOp::Add, Expression::int(3), Expression::int(4)),
        );
        let body = vec![Statement::Return(Some(sum))];
        let code = assemble(true, &[], Some(JavaType::INT), &body).unwrap();
        assert_eq!(code.max_stack, 3);
    }

    #[test]
    fn undeclared_variable_is_rejected() {
        let body = vec![Statement::Return(Some(Expression::variable("ghost")))];
        let result = assemble(true, &[], Some(JavaType::INT), &body);
        assert!(matches!(result, Err(Error::UnsupportedConstruct(_))));
    }

    #[test]
    fn returning_the_wrong_type_is_rejected() {
        let body = vec![Statement::Return(Some(Expression::string("oops")))];
        let result = assemble(true, &[], Some(JavaType::INT), &body);
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn missing_return_in_non_void_body_is_rejected() {
        let result = assemble(true, &[], Some(JavaType::INT), &[]);
        assert!(matches!(result, Err(Error::UnsupportedConstruct(_))));
    }

    #[test]
    fn comparison_outside_a_condition_is_rejected() {
        let body = vec![Statement::Return(Some(Expression::compare(
            Comparison::Lt,
            Expression::int(1),
            Expression::int(2),
        )))];
        let result = assemble(true, &[], Some(JavaType::BOOLEAN), &body);
        assert!(matches!(result, Err(Error::UnsupportedConstruct(_))));
    }

    #[test]
    fn this_in_a_static_context_is_rejected() {
        let body = vec![Statement::Expression(Expression::This)];
        let result = assemble(true, &[], None, &body);
        assert!(matches!(result, Err(Error::UnsupportedConstruct(_))));
    }

    #[test]
    fn while_loop_jumps_backwards() {
        let parameters = vec![Parameter::new("n", JavaType::INT)];
        let body = vec![
            Statement::While {
                condition: Expression::compare(
                    Comparison::Gt,
                    Expression::variable("n"),
                    Expression::int(0),
                ),
                body: vec![Statement::Assign {
                    target: Target::Variable(String::from("n")),
                    value: Expression::binary(
                        BinOp::Sub,
                        Expression::variable("n"),
                        Expression::int(1),
                    ),
                }],
            },
            Statement::Return(None),
        ];
        let code = assemble(true, &parameters, None, &body).unwrap();

        // iload_0, ifle +10, iload_0, iconst_1, isub, istore_0, goto -8, return
        assert_eq!(
            code.code_array.0,
            vec![0x1a, 0x9e, 0, 10, 0x1a, 0x04, 0x64, 0x3b, 0xa7, 0xff, 0xf8, 0xb1]
        );
    }

    #[test]
    fn branch_to_a_label_that_is_never_placed_fails() {
        let mut constants = ConstantsPool::new();
        let encoder = TypeEncoder::new(&[]);
        let class_name = point();
        let mut assembler = CodeAssembler::new(&mut constants, &encoder, &class_name, true);
        let label = assembler.fresh_label();
        assembler.emit(Instruction::Goto(label));
        assert!(matches!(
            assembler.finish(),
            Err(Error::DanglingBranch(_))
        ));
    }

    #[test]
    fn field_reads_and_writes_pick_the_static_forms() {
        let counter = FieldRef {
            owner: point(),
            name: UnqualifiedName::from_string(String::from("count")).unwrap(),
            field_type: JavaType::INT,
            is_static: true,
        };
        let body = vec![
            Statement::Assign {
                target: Target::Field {
                    field: counter.clone(),
                    receiver: None,
                },
                value: Expression::binary(
                    BinOp::Add,
                    Expression::GetField {
                        field: counter,
                        receiver: None,
                    },
                    Expression::int(1),
                ),
            },
            Statement::Return(None),
        ];
        let code = assemble(true, &[], None, &body).unwrap();

        // getstatic, iconst_1, iadd, putstatic, return
        assert_eq!(code.code_array.0[0], 0xb2);
        assert_eq!(code.code_array.0[5], 0xb3);
    }

    #[test]
    fn calls_check_their_argument_count() {
        let method = MethodRef {
            owner: point(),
            name: UnqualifiedName::from_string(String::from("getX")).unwrap(),
            parameters: vec![JavaType::INT],
            return_type: Some(JavaType::INT),
            invoke: InvokeKind::Virtual,
        };
        let body = vec![Statement::Expression(Expression::Call {
            method,
            receiver: Some(Box::new(Expression::This)),
            arguments: vec![],
        })];
        let result = assemble(false, &[], None, &body);
        assert!(matches!(result, Err(Error::UnsupportedConstruct(_))));
    }
}
