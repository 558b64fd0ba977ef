use crate::jvm::{Error, FieldType, MethodDescriptor, Name, RenderDescriptor};
use crate::model::{ClassType, JavaType, MethodDesc, TypeArgument, TypeParameter};

/// Encoder from model types to erased descriptors and generic signatures
///
/// The encoder carries the type parameters in scope (class scope, extended with a
/// method scope via [`TypeEncoder::with_method`]); everything it computes is a pure
/// function of the input type and that scope. Inner scopes shadow outer ones.
#[derive(Clone, Debug, Default)]
pub struct TypeEncoder {
    scopes: Vec<Vec<TypeParameter>>,
}

impl TypeEncoder {
    /// Encoder for the scope of a class declaring the given type parameters
    pub fn new(class_parameters: &[TypeParameter]) -> TypeEncoder {
        TypeEncoder {
            scopes: vec![class_parameters.to_vec()],
        }
    }

    /// Extend the scope with a method's type parameters
    pub fn with_method(&self, method_parameters: &[TypeParameter]) -> TypeEncoder {
        let mut scopes = self.scopes.clone();
        scopes.push(method_parameters.to_vec());
        TypeEncoder { scopes }
    }

    fn lookup(&self, variable: &str) -> Option<&TypeParameter> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().find(|param| param.name == variable))
    }

    /// Erase a model type down to its raw JVM descriptor type
    ///
    /// Type variables erase to their class bound, else their first interface bound,
    /// else `java.lang.Object`. A variable that is not declared in scope is an error.
    pub fn erase(&self, java_type: &JavaType) -> Result<FieldType, Error> {
        match java_type {
            JavaType::Primitive(base_type) => Ok(FieldType::Base(*base_type)),
            JavaType::Class(class_type) => Ok(FieldType::Object(class_type.name.clone())),
            JavaType::Array(element) => Ok(FieldType::array(self.erase(element)?)),
            JavaType::Variable(variable) => {
                let parameter = self.lookup(variable).ok_or_else(|| {
                    Error::UnsupportedType(format!(
                        "type variable '{}' is not declared in the enclosing scope",
                        variable
                    ))
                })?;
                match (&parameter.class_bound, parameter.interface_bounds.first()) {
                    (Some(bound), _) => self.erase(bound),
                    (None, Some(bound)) => self.erase(bound),
                    (None, None) => Ok(FieldType::object(crate::jvm::BinaryName::OBJECT)),
                }
            }
        }
    }

    /// Erase a parameter list and return type into a method descriptor
    pub fn erase_method(
        &self,
        parameters: &[JavaType],
        return_type: &Option<JavaType>,
    ) -> Result<MethodDescriptor, Error> {
        Ok(MethodDescriptor {
            parameters: parameters
                .iter()
                .map(|parameter| self.erase(parameter))
                .collect::<Result<Vec<_>, Error>>()?,
            return_type: match return_type {
                None => None,
                Some(java_type) => Some(self.erase(java_type)?),
            },
        })
    }

    /// Render the `Signature` attribute form of a type (JVMS 4.7.9.1)
    fn type_signature(&self, java_type: &JavaType, out: &mut String) -> Result<(), Error> {
        match java_type {
            JavaType::Primitive(base_type) => {
                base_type.render_to(out);
                Ok(())
            }
            JavaType::Class(class_type) => self.class_type_signature(class_type, out),
            JavaType::Array(element) => {
                out.push('[');
                self.type_signature(element, out)
            }
            JavaType::Variable(variable) => {
                if self.lookup(variable).is_none() {
                    return Err(Error::UnsupportedType(format!(
                        "type variable '{}' is not declared in the enclosing scope",
                        variable
                    )));
                }
                out.push('T');
                out.push_str(variable);
                out.push(';');
                Ok(())
            }
        }
    }

    fn class_type_signature(&self, class_type: &ClassType, out: &mut String) -> Result<(), Error> {
        out.push('L');
        out.push_str(class_type.name.as_str());
        if !class_type.arguments.is_empty() {
            out.push('<');
            for argument in &class_type.arguments {
                self.type_argument_signature(argument, out)?;
            }
            out.push('>');
        }
        out.push(';');
        Ok(())
    }

    fn type_argument_signature(
        &self,
        argument: &TypeArgument,
        out: &mut String,
    ) -> Result<(), Error> {
        let bound = match argument {
            TypeArgument::Any => {
                out.push('*');
                return Ok(());
            }
            TypeArgument::Exact(java_type) => java_type,
            TypeArgument::Extends(java_type) => {
                out.push('+');
                java_type
            }
            TypeArgument::Super(java_type) => {
                out.push('-');
                java_type
            }
        };
        if matches!(bound.as_ref(), JavaType::Primitive(_)) {
            return Err(Error::UnsupportedType(String::from(
                "primitive type used as a type argument",
            )));
        }
        self.type_signature(bound, out)
    }

    /// Render `<T:...>` type parameter declarations (empty input renders nothing)
    fn type_parameter_declarations(
        &self,
        parameters: &[TypeParameter],
        out: &mut String,
    ) -> Result<(), Error> {
        if parameters.is_empty() {
            return Ok(());
        }
        out.push('<');
        for parameter in parameters {
            out.push_str(&parameter.name);
            out.push(':');
            match &parameter.class_bound {
                Some(bound) => self.type_signature(bound, out)?,
                None if parameter.interface_bounds.is_empty() => {
                    out.push_str("Ljava/lang/Object;");
                }
                None => {}
            }
            for bound in &parameter.interface_bounds {
                out.push(':');
                self.type_signature(bound, out)?;
            }
        }
        out.push('>');
        Ok(())
    }

    /// `Signature` attribute payload for a field of the given type
    pub fn field_signature(&self, field_type: &JavaType) -> Result<String, Error> {
        let mut out = String::new();
        self.type_signature(field_type, &mut out)?;
        Ok(out)
    }

    /// `Signature` attribute payload for a method
    ///
    /// The method's type parameters must already be in scope (see
    /// [`TypeEncoder::with_method`]).
    pub fn method_signature(&self, method: &MethodDesc) -> Result<String, Error> {
        let mut out = String::new();
        self.type_parameter_declarations(&method.type_parameters, &mut out)?;
        out.push('(');
        for parameter in &method.parameters {
            self.type_signature(&parameter.parameter_type, &mut out)?;
        }
        out.push(')');
        match &method.return_type {
            None => out.push('V'),
            Some(java_type) => self.type_signature(java_type, &mut out)?,
        }
        Ok(out)
    }

    /// `Signature` attribute payload for a class
    pub fn class_signature(
        &self,
        type_parameters: &[TypeParameter],
        super_class: &ClassType,
        interfaces: &[ClassType],
    ) -> Result<String, Error> {
        let mut out = String::new();
        self.type_parameter_declarations(type_parameters, &mut out)?;
        self.class_type_signature(super_class, &mut out)?;
        for interface in interfaces {
            self.class_type_signature(interface, &mut out)?;
        }
        Ok(out)
    }
}

/// Does this type mention any generic construct (variables or type arguments)?
pub fn involves_generics(java_type: &JavaType) -> bool {
    match java_type {
        JavaType::Primitive(_) => false,
        JavaType::Class(class_type) => !class_type.arguments.is_empty(),
        JavaType::Array(element) => involves_generics(element),
        JavaType::Variable(_) => true,
    }
}

/// Does this method need a `Signature` attribute?
pub fn method_involves_generics(method: &MethodDesc) -> bool {
    !method.type_parameters.is_empty()
        || method
            .parameters
            .iter()
            .any(|parameter| involves_generics(&parameter.parameter_type))
        || matches!(&method.return_type, Some(t) if involves_generics(t))
}

/// Does this class header (not its members) need a `Signature` attribute?
pub fn class_involves_generics(
    type_parameters: &[TypeParameter],
    super_class: &ClassType,
    interfaces: &[ClassType],
) -> bool {
    !type_parameters.is_empty()
        || !super_class.arguments.is_empty()
        || interfaces
            .iter()
            .any(|interface| !interface.arguments.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BaseType, BinaryName};

    fn list_of(argument: TypeArgument) -> ClassType {
        ClassType::generic(
            BinaryName::from_string(String::from("java/util/List")).unwrap(),
            vec![argument],
        )
    }

    #[test]
    fn erasure_of_concrete_types() {
        let encoder = TypeEncoder::new(&[]);
        assert_eq!(encoder.erase(&JavaType::INT).unwrap(), FieldType::INT);
        assert_eq!(
            encoder
                .erase(&JavaType::Class(list_of(TypeArgument::exact(
                    JavaType::STRING
                ))))
                .unwrap()
                .render(),
            "Ljava/util/List;"
        );
        assert_eq!(
            encoder
                .erase(&JavaType::array(JavaType::LONG))
                .unwrap()
                .render(),
            "[J"
        );
    }

    #[test]
    fn erasure_of_type_variables_uses_bounds() {
        let unbounded = TypeParameter::unbounded("T");
        let class_bounded = TypeParameter {
            name: String::from("U"),
            class_bound: Some(JavaType::STRING),
            interface_bounds: vec![JavaType::class(
                BinaryName::from_string(String::from("java/lang/Comparable")).unwrap(),
            )],
        };
        let interface_bounded = TypeParameter {
            name: String::from("V"),
            class_bound: None,
            interface_bounds: vec![JavaType::class(
                BinaryName::from_string(String::from("java/lang/Runnable")).unwrap(),
            )],
        };
        let encoder = TypeEncoder::new(&[unbounded, class_bounded, interface_bounded]);

        assert_eq!(
            encoder.erase(&JavaType::variable("T")).unwrap().render(),
            "Ljava/lang/Object;"
        );
        assert_eq!(
            encoder.erase(&JavaType::variable("U")).unwrap().render(),
            "Ljava/lang/String;"
        );
        assert_eq!(
            encoder.erase(&JavaType::variable("V")).unwrap().render(),
            "Ljava/lang/Runnable;"
        );
    }

    #[test]
    fn undeclared_type_variable_is_rejected() {
        let encoder = TypeEncoder::new(&[]);
        assert!(matches!(
            encoder.erase(&JavaType::variable("T")),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            encoder.field_signature(&JavaType::variable("T")),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn method_scope_shadows_class_scope() {
        let class_scope = TypeEncoder::new(&[TypeParameter {
            name: String::from("T"),
            class_bound: Some(JavaType::STRING),
            interface_bounds: vec![],
        }]);
        let method_scope = class_scope.with_method(&[TypeParameter::unbounded("T")]);

        assert_eq!(
            class_scope.erase(&JavaType::variable("T")).unwrap().render(),
            "Ljava/lang/String;"
        );
        assert_eq!(
            method_scope.erase(&JavaType::variable("T")).unwrap().render(),
            "Ljava/lang/Object;"
        );
    }

    #[test]
    fn field_signatures() {
        let encoder = TypeEncoder::new(&[TypeParameter::unbounded("T")]);
        assert_eq!(
            encoder
                .field_signature(&JavaType::Class(list_of(TypeArgument::exact(
                    JavaType::variable("T")
                ))))
                .unwrap(),
            "Ljava/util/List<TT;>;"
        );
        assert_eq!(
            encoder
                .field_signature(&JavaType::Class(list_of(TypeArgument::Any)))
                .unwrap(),
            "Ljava/util/List<*>;"
        );
        assert_eq!(
            encoder
                .field_signature(&JavaType::Class(list_of(TypeArgument::extends(
                    JavaType::STRING
                ))))
                .unwrap(),
            "Ljava/util/List<+Ljava/lang/String;>;"
        );
        assert_eq!(
            encoder
                .field_signature(&JavaType::Class(list_of(TypeArgument::super_bound(
                    JavaType::STRING
                ))))
                .unwrap(),
            "Ljava/util/List<-Ljava/lang/String;>;"
        );
    }

    #[test]
    fn primitive_type_argument_is_rejected() {
        let encoder = TypeEncoder::new(&[]);
        let bad = JavaType::Class(list_of(TypeArgument::exact(JavaType::INT)));
        assert!(matches!(
            encoder.field_signature(&bad),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn class_signatures() {
        let encoder = TypeEncoder::new(&[TypeParameter::unbounded("T")]);
        let signature = encoder
            .class_signature(
                &[TypeParameter::unbounded("T")],
                &ClassType::OBJECT,
                &[list_of(TypeArgument::exact(JavaType::variable("T")))],
            )
            .unwrap();
        assert_eq!(
            signature,
            "<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/List<TT;>;"
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = TypeEncoder::new(&[TypeParameter::unbounded("T")]);
        let input = JavaType::Class(list_of(TypeArgument::exact(JavaType::variable("T"))));
        assert_eq!(
            encoder.field_signature(&input).unwrap(),
            encoder.field_signature(&input).unwrap()
        );
        assert_eq!(encoder.erase(&input).unwrap(), encoder.erase(&input).unwrap());
    }

    #[test]
    fn base_type_width_drives_descriptors() {
        let encoder = TypeEncoder::new(&[]);
        let descriptor = encoder
            .erase_method(
                &[JavaType::Primitive(BaseType::Double), JavaType::INT],
                &Some(JavaType::STRING),
            )
            .unwrap();
        assert_eq!(descriptor.render(), "(DI)Ljava/lang/String;");
    }
}
