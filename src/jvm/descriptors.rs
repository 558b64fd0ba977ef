use super::{BinaryName, Name};
use crate::util::Width;

/// Utility trait for converting descriptors to their string representation
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl Width for BaseType {
    fn width(&self) -> usize {
        match self {
            BaseType::Byte
            | BaseType::Char
            | BaseType::Float
            | BaseType::Int
            | BaseType::Short
            | BaseType::Boolean => 1,
            BaseType::Double | BaseType::Long => 2,
        }
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        let c = match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        };
        write_to.push(c);
    }
}

/// Erased type of a field, parameter, or local variable
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType {
    Base(BaseType),
    Object(BinaryName),
    Array(Box<FieldType>),
}

impl FieldType {
    pub const INT: FieldType = FieldType::Base(BaseType::Int);

    pub fn object(class_name: BinaryName) -> FieldType {
        FieldType::Object(class_name)
    }

    pub fn array(element_type: FieldType) -> FieldType {
        FieldType::Array(Box::new(element_type))
    }

    /// Is this a reference (as opposed to primitive) type?
    pub fn is_reference(&self) -> bool {
        !matches!(self, FieldType::Base(_))
    }
}

impl Width for FieldType {
    fn width(&self) -> usize {
        match self {
            FieldType::Base(base_type) => base_type.width(),
            FieldType::Object(_) | FieldType::Array(_) => 1,
        }
    }
}

impl RenderDescriptor for FieldType {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(write_to),
            FieldType::Object(class_name) => {
                write_to.push('L');
                write_to.push_str(class_name.as_str());
                write_to.push(';');
            }
            FieldType::Array(element_type) => {
                write_to.push('[');
                element_type.render_to(write_to);
            }
        }
    }
}

/// Erased signature of a method
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: Option<FieldType>, // `None` is for `void` (ie. no return)
}

impl MethodDescriptor {
    /// Total width of the parameters (not the same as the length of the vector),
    /// which must be 255 or less for the descriptor to be valid
    pub fn parameter_length(&self, has_this_param: bool) -> usize {
        let this_width = if has_this_param { 1 } else { 0 };
        this_width + self.parameters.iter().map(Width::width).sum::<usize>()
    }
}

impl RenderDescriptor for MethodDescriptor {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.render_to(write_to),
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_types() {
        assert_eq!("I", FieldType::INT.render());
        assert_eq!("J", FieldType::Base(BaseType::Long).render());
        assert_eq!("Z", FieldType::Base(BaseType::Boolean).render());
    }

    #[test]
    fn reference_types() {
        assert_eq!(
            "Ljava/lang/Object;",
            FieldType::object(BinaryName::OBJECT).render()
        );
        assert_eq!(
            "[[Ljava/lang/String;",
            FieldType::array(FieldType::array(FieldType::object(BinaryName::STRING))).render()
        );
        assert_eq!(
            "[D",
            FieldType::array(FieldType::Base(BaseType::Double)).render()
        );
    }

    #[test]
    fn method_descriptors() {
        assert_eq!(
            "(IDLjava/lang/String;)Ljava/lang/Object;",
            MethodDescriptor {
                parameters: vec![
                    FieldType::INT,
                    FieldType::Base(BaseType::Double),
                    FieldType::object(BinaryName::STRING),
                ],
                return_type: Some(FieldType::object(BinaryName::OBJECT)),
            }
            .render()
        );
        assert_eq!(
            "()V",
            MethodDescriptor {
                parameters: vec![],
                return_type: None,
            }
            .render()
        );
    }

    #[test]
    fn parameter_widths() {
        let descriptor = MethodDescriptor {
            parameters: vec![
                FieldType::INT,
                FieldType::Base(BaseType::Long),
                FieldType::object(BinaryName::OBJECT),
            ],
            return_type: None,
        };
        assert_eq!(descriptor.parameter_length(false), 4);
        assert_eq!(descriptor.parameter_length(true), 5);
    }
}
