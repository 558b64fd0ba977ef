use super::{ClassType, JavaType};
use crate::jvm::{BinaryName, UnqualifiedName};

/// Literal value appearing in an expression
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Null,
}

/// Integer arithmetic operator
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Integer comparison operator
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// How a method call gets dispatched
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InvokeKind {
    Virtual,
    Static,
    Special,
    Interface,
}

/// Reference to a field of some class
#[derive(Clone, PartialEq, Debug)]
pub struct FieldRef {
    pub owner: BinaryName,
    pub name: UnqualifiedName,
    pub field_type: JavaType,
    pub is_static: bool,
}

/// Reference to a method of some class
#[derive(Clone, PartialEq, Debug)]
pub struct MethodRef {
    pub owner: BinaryName,
    pub name: UnqualifiedName,
    pub parameters: Vec<JavaType>,
    pub return_type: Option<JavaType>,
    pub invoke: InvokeKind,
}

/// Expression tree
///
/// Expressions are immutable and carry enough type information (on field and method
/// references, casts, and declarations) for the assembler to lower them without a
/// separate inference pass.
#[derive(Clone, PartialEq, Debug)]
pub enum Expression {
    Literal(Literal),

    /// The receiver of the enclosing instance method or constructor
    This,

    /// Read of a local variable or parameter
    Variable(String),

    /// Field read; `receiver` is `None` for static fields and for instance fields
    /// of `this`
    GetField {
        field: FieldRef,
        receiver: Option<Box<Expression>>,
    },

    /// Method call; `receiver` is `None` for static calls and calls on `this`
    Call {
        method: MethodRef,
        receiver: Option<Box<Expression>>,
        arguments: Vec<Expression>,
    },

    /// Constructor call `new C(...)`; `parameters` are the constructor's declared
    /// parameter types
    New {
        class: ClassType,
        parameters: Vec<JavaType>,
        arguments: Vec<Expression>,
    },

    /// Reference cast, lowered to `checkcast`
    Cast {
        value: Box<Expression>,
        to: JavaType,
    },

    /// Integer arithmetic
    Binary {
        op: BinOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    /// Integer comparison; only valid as the condition of an `if` or `while`
    Compare {
        op: Comparison,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    pub fn int(value: i32) -> Expression {
        Expression::Literal(Literal::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Expression {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn variable(name: impl Into<String>) -> Expression {
        Expression::Variable(name.into())
    }

    pub fn binary(op: BinOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn compare(op: Comparison, lhs: Expression, rhs: Expression) -> Expression {
        Expression::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// Left-hand side of an assignment
#[derive(Clone, PartialEq, Debug)]
pub enum Target {
    Variable(String),
    Field {
        field: FieldRef,
        receiver: Option<Box<Expression>>,
    },
}

/// Statement tree, executed in order
#[derive(Clone, PartialEq, Debug)]
pub enum Statement {
    /// Declare and initialize a new local variable
    Declare {
        name: String,
        var_type: JavaType,
        value: Expression,
    },

    /// Assign to a local variable or a field
    Assign { target: Target, value: Expression },

    /// Return from the enclosing method (`None` for void)
    Return(Option<Expression>),

    /// Evaluate an expression and discard its result
    Expression(Expression),

    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },

    While {
        condition: Expression,
        body: Vec<Statement>,
    },
}
