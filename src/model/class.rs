use super::{ClassType, ConstructorDesc, Expression, JavaType, MethodDesc, TypeParameter};
use crate::jvm::UnqualifiedName;

/// Member visibility
///
/// Package visibility maps to the absence of any access flag.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

/// What kind of class is being described
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ClassVariant {
    /// Ordinary concrete class
    Concrete,
    Abstract,
    Interface,
    /// Enum class (`ACC_ENUM`, superclass `java.lang.Enum`)
    Enum,
}

/// Description of a field to emit
#[derive(Clone, Debug)]
pub struct FieldDesc {
    pub name: UnqualifiedName,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub field_type: JavaType,

    /// Evaluated in `<clinit>` for static fields, replayed in every constructor
    /// for instance fields
    pub initializer: Option<Expression>,
}

impl FieldDesc {
    pub fn new(name: UnqualifiedName, field_type: JavaType) -> FieldDesc {
        FieldDesc {
            name,
            visibility: Visibility::Private,
            is_static: false,
            is_final: false,
            field_type,
            initializer: None,
        }
    }
}

/// Class member, in declaration order
#[derive(Clone, Debug)]
pub enum Member {
    Field(FieldDesc),
    Method(MethodDesc),
    Constructor(ConstructorDesc),
    InnerClass(ClassDesc),
}

/// Description of a class to emit
///
/// The name is the simple (unqualified) name; the package and, for nested classes,
/// the enclosing class name are supplied by whoever drives assembly.
#[derive(Clone, Debug)]
pub struct ClassDesc {
    pub name: UnqualifiedName,
    pub visibility: Visibility,
    pub variant: ClassVariant,
    pub is_final: bool,

    /// Only meaningful for nested classes
    pub is_static: bool,

    pub type_parameters: Vec<TypeParameter>,

    /// `None` means `java.lang.Object` (or `java.lang.Enum` for enum classes)
    pub super_class: Option<ClassType>,

    pub interfaces: Vec<ClassType>,

    /// Members in declaration order; the order is preserved through emission
    pub members: Vec<Member>,
}

impl ClassDesc {
    /// Public concrete class with no members
    pub fn new(name: UnqualifiedName) -> ClassDesc {
        ClassDesc {
            name,
            visibility: Visibility::Public,
            variant: ClassVariant::Concrete,
            is_final: false,
            is_static: false,
            type_parameters: vec![],
            super_class: None,
            interfaces: vec![],
            members: vec![],
        }
    }
}
