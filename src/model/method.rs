use super::{JavaType, Statement, TypeParameter, Visibility};
use crate::jvm::UnqualifiedName;

/// Named method or constructor parameter
#[derive(Clone, PartialEq, Debug)]
pub struct Parameter {
    pub name: String,
    pub parameter_type: JavaType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, parameter_type: JavaType) -> Parameter {
        Parameter {
            name: name.into(),
            parameter_type,
        }
    }
}

/// Description of a method to emit
#[derive(Clone, Debug)]
pub struct MethodDesc {
    pub name: UnqualifiedName,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<Parameter>,

    /// `None` means the method returns `void`
    pub return_type: Option<JavaType>,

    /// Ignored for abstract methods
    pub body: Vec<Statement>,
}

impl MethodDesc {
    /// Public non-static concrete method with no parameters and a void return
    pub fn new(name: UnqualifiedName) -> MethodDesc {
        MethodDesc {
            name,
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            is_abstract: false,
            type_parameters: vec![],
            parameters: vec![],
            return_type: None,
            body: vec![],
        }
    }
}

/// Description of a constructor to emit
///
/// The super-constructor call and instance field initializers are implicit; `body`
/// holds only the statements written after them.
#[derive(Clone, Debug)]
pub struct ConstructorDesc {
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

impl ConstructorDesc {
    pub fn new(visibility: Visibility) -> ConstructorDesc {
        ConstructorDesc {
            visibility,
            parameters: vec![],
            body: vec![],
        }
    }
}
