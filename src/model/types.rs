use crate::jvm::{BaseType, BinaryName};

/// Source-level Java type, before erasure
///
/// Unlike [`crate::jvm::FieldType`], this keeps generic information around: class
/// references carry their type arguments and type variables are still symbolic.
#[derive(Clone, PartialEq, Debug)]
pub enum JavaType {
    /// Primitive type (`int`, `long`, ...)
    Primitive(BaseType),

    /// Class or interface reference, possibly with type arguments
    Class(ClassType),

    /// Array whose elements have the given type
    Array(Box<JavaType>),

    /// Reference to a type variable declared by the enclosing class or method
    Variable(String),
}

impl JavaType {
    pub const INT: JavaType = JavaType::Primitive(BaseType::Int);
    pub const LONG: JavaType = JavaType::Primitive(BaseType::Long);
    pub const BOOLEAN: JavaType = JavaType::Primitive(BaseType::Boolean);
    pub const OBJECT: JavaType = JavaType::Class(ClassType::OBJECT);
    pub const STRING: JavaType = JavaType::Class(ClassType::STRING);

    /// Non-generic reference to the named class
    pub fn class(name: BinaryName) -> JavaType {
        JavaType::Class(ClassType::raw(name))
    }

    pub fn array(element: JavaType) -> JavaType {
        JavaType::Array(Box::new(element))
    }

    pub fn variable(name: impl Into<String>) -> JavaType {
        JavaType::Variable(name.into())
    }
}

/// Class reference along with its type arguments (empty for a raw reference)
#[derive(Clone, PartialEq, Debug)]
pub struct ClassType {
    pub name: BinaryName,
    pub arguments: Vec<TypeArgument>,
}

impl ClassType {
    pub const OBJECT: ClassType = ClassType {
        name: BinaryName::OBJECT,
        arguments: Vec::new(),
    };
    pub const STRING: ClassType = ClassType {
        name: BinaryName::STRING,
        arguments: Vec::new(),
    };

    /// Reference without type arguments
    pub fn raw(name: BinaryName) -> ClassType {
        ClassType {
            name,
            arguments: vec![],
        }
    }

    pub fn generic(name: BinaryName, arguments: Vec<TypeArgument>) -> ClassType {
        ClassType { name, arguments }
    }
}

/// Type argument at a generic class use site
#[derive(Clone, PartialEq, Debug)]
pub enum TypeArgument {
    /// Unbounded wildcard `?`
    Any,

    /// Concrete argument
    Exact(Box<JavaType>),

    /// Upper-bounded wildcard `? extends T`
    Extends(Box<JavaType>),

    /// Lower-bounded wildcard `? super T`
    Super(Box<JavaType>),
}

impl TypeArgument {
    pub fn exact(argument: JavaType) -> TypeArgument {
        TypeArgument::Exact(Box::new(argument))
    }

    pub fn extends(bound: JavaType) -> TypeArgument {
        TypeArgument::Extends(Box::new(bound))
    }

    pub fn super_bound(bound: JavaType) -> TypeArgument {
        TypeArgument::Super(Box::new(bound))
    }
}

/// Type parameter declared by a generic class or method
///
/// A declaration with no bounds at all is implicitly bounded by `java.lang.Object`.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<JavaType>,
    pub interface_bounds: Vec<JavaType>,
}

impl TypeParameter {
    /// Unbounded type parameter
    pub fn unbounded(name: impl Into<String>) -> TypeParameter {
        TypeParameter {
            name: name.into(),
            class_bound: None,
            interface_bounds: vec![],
        }
    }
}
