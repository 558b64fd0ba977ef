use super::code::check_assignable;
use super::{
    class_involves_generics, involves_generics, method_involves_generics, CodeAssembler,
    TypeEncoder,
};
use crate::jvm::class_file::{ClassFile, Field, InnerClass, InnerClasses, Method, Signature, Version};
use crate::jvm::{
    BaseType, BinaryName, ClassAccessFlags, ConstantsPool, Error, FieldAccessFlags, FieldType,
    InnerClassAccessFlags, MemberKind, MethodAccessFlags, Name, RenderDescriptor, UnqualifiedName,
};
use crate::model::{
    ClassDesc, ClassType, ConstructorDesc, ClassVariant, Expression, FieldDesc, FieldRef, JavaType,
    Literal, MethodDesc, Statement, Target, TypeParameter, Visibility,
};
use std::collections::HashSet;
use std::mem;

/// Assembler for a single class file
///
/// Members are registered one at a time with the `add_*` operations and the class is
/// sealed with [`ClassAssembler::finish`], which produces the complete [`ClassFile`]
/// or an error but never a partial artifact. Any `add_*` (or a second `finish`) after
/// sealing fails with [`Error::ClassAlreadyFinalized`].
///
/// Constructors are deferred until `finish` so that instance field initializers
/// registered after a constructor still get replayed in its prologue; static field
/// initializers collect into a synthesized `<clinit>`.
pub struct ClassAssembler {
    name: BinaryName,
    variant: ClassVariant,
    access_flags: ClassAccessFlags,
    type_parameters: Vec<TypeParameter>,
    super_class: ClassType,
    interfaces: Vec<ClassType>,
    encoder: TypeEncoder,
    constants: ConstantsPool,
    fields: Vec<Field>,
    methods: Vec<Method>,
    pending_constructors: Vec<ConstructorDesc>,
    instance_initializers: Vec<(FieldRef, Expression)>,
    static_initializers: Vec<(FieldRef, Expression)>,
    inner_class_entries: Vec<(BinaryName, BinaryName, UnqualifiedName, InnerClassAccessFlags)>,
    seen_members: HashSet<(MemberKind, String, String)>,
    finished: bool,
}

impl ClassAssembler {
    /// Start assembling a class with the given binary name and the header information
    /// (variant, flags, generics, supertypes) of the description
    pub fn new(name: BinaryName, desc: &ClassDesc) -> ClassAssembler {
        let super_class = match (&desc.super_class, desc.variant) {
            (Some(class_type), _) => class_type.clone(),
            (None, ClassVariant::Enum) => ClassType::raw(BinaryName::ENUM),
            (None, _) => ClassType::OBJECT,
        };

        let mut access_flags = match desc.variant {
            ClassVariant::Concrete => ClassAccessFlags::SUPER,
            ClassVariant::Abstract => ClassAccessFlags::SUPER | ClassAccessFlags::ABSTRACT,
            ClassVariant::Interface => ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
            ClassVariant::Enum => ClassAccessFlags::SUPER | ClassAccessFlags::ENUM,
        };
        if desc.visibility == Visibility::Public {
            access_flags |= ClassAccessFlags::PUBLIC;
        }
        if desc.is_final {
            access_flags |= ClassAccessFlags::FINAL;
        }

        ClassAssembler {
            name,
            variant: desc.variant,
            access_flags,
            type_parameters: desc.type_parameters.clone(),
            super_class,
            interfaces: desc.interfaces.clone(),
            encoder: TypeEncoder::new(&desc.type_parameters),
            constants: ConstantsPool::new(),
            fields: vec![],
            methods: vec![],
            pending_constructors: vec![],
            instance_initializers: vec![],
            static_initializers: vec![],
            inner_class_entries: vec![],
            seen_members: HashSet::new(),
            finished: false,
        }
    }

    /// Binary name of the class under assembly
    pub fn name(&self) -> &BinaryName {
        &self.name
    }

    pub fn add_field(&mut self, field: &FieldDesc) -> Result<(), Error> {
        self.check_open()?;
        let erased = self.encoder.erase(&field.field_type)?;
        let descriptor = erased.render();
        self.check_duplicate(MemberKind::Field, field.name.as_str(), &descriptor)?;

        // Literal initializers can be type checked right away; anything else gets
        // checked when the initializer is lowered in `finish`
        if let Some(Expression::Literal(literal)) = &field.initializer {
            check_assignable(&erased, &literal_type(literal))?;
        }

        let name_index = self.constants.get_utf8(field.name.as_str())?;
        let descriptor_index = self.constants.get_utf8(descriptor)?;

        let mut attributes = vec![];
        if involves_generics(&field.field_type) {
            let rendered = self.encoder.field_signature(&field.field_type)?;
            let signature = self.constants.get_utf8(rendered)?;
            attributes.push(self.constants.get_attribute(Signature { signature })?);
        }

        self.fields.push(Field {
            access_flags: field_flags(field),
            name_index,
            descriptor_index,
            attributes,
        });

        if let Some(initializer) = &field.initializer {
            let reference = FieldRef {
                owner: self.name.clone(),
                name: field.name.clone(),
                field_type: field.field_type.clone(),
                is_static: field.is_static,
            };
            if field.is_static {
                self.static_initializers.push((reference, initializer.clone()));
            } else {
                self.instance_initializers.push((reference, initializer.clone()));
            }
        }
        Ok(())
    }

    pub fn add_method(&mut self, method: &MethodDesc) -> Result<(), Error> {
        self.check_open()?;
        let method_encoder = self.encoder.with_method(&method.type_parameters);
        let parameter_types: Vec<JavaType> = method
            .parameters
            .iter()
            .map(|parameter| parameter.parameter_type.clone())
            .collect();
        let descriptor = method_encoder.erase_method(&parameter_types, &method.return_type)?;
        let rendered = descriptor.render();
        self.check_duplicate(MemberKind::Method, method.name.as_str(), &rendered)?;

        // Interface methods without a body are implicitly abstract
        let is_abstract = method.is_abstract
            || (self.variant == ClassVariant::Interface
                && !method.is_static
                && method.body.is_empty());
        if is_abstract
            && matches!(self.variant, ClassVariant::Concrete | ClassVariant::Enum)
        {
            return Err(Error::UnsupportedConstruct(format!(
                "abstract method '{}' in a non-abstract class",
                method.name.as_str()
            )));
        }

        let mut access_flags = method_visibility_flags(method.visibility);
        if method.is_static {
            access_flags |= MethodAccessFlags::STATIC;
        }
        if method.is_final {
            access_flags |= MethodAccessFlags::FINAL;
        }
        if is_abstract {
            access_flags |= MethodAccessFlags::ABSTRACT;
        }

        let mut attributes = vec![];
        if !is_abstract {
            let mut code = CodeAssembler::new(
                &mut self.constants,
                &method_encoder,
                &self.name,
                method.is_static,
            );
            for parameter in &method.parameters {
                code.declare_parameter(&parameter.name, &parameter.parameter_type)?;
            }
            code.body(&method.body, &descriptor.return_type)?;
            let code_attribute = code.finish()?;
            attributes.push(self.constants.get_attribute(code_attribute)?);
        }
        if method_involves_generics(method) {
            let rendered_signature = method_encoder.method_signature(method)?;
            let signature = self.constants.get_utf8(rendered_signature)?;
            attributes.push(self.constants.get_attribute(Signature { signature })?);
        }

        let name_index = self.constants.get_utf8(method.name.as_str())?;
        let descriptor_index = self.constants.get_utf8(rendered)?;
        self.methods.push(Method {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
        Ok(())
    }

    /// Register a constructor; its body is assembled during `finish` so that the
    /// prologue can replay every instance field initializer
    pub fn add_constructor(&mut self, constructor: &ConstructorDesc) -> Result<(), Error> {
        self.check_open()?;
        if self.variant == ClassVariant::Interface {
            return Err(Error::UnsupportedConstruct(String::from(
                "constructor declared on an interface",
            )));
        }
        let parameter_types: Vec<JavaType> = constructor
            .parameters
            .iter()
            .map(|parameter| parameter.parameter_type.clone())
            .collect();
        let descriptor = self.encoder.erase_method(&parameter_types, &None)?;
        self.check_duplicate(
            MemberKind::Constructor,
            UnqualifiedName::INIT.as_str(),
            &descriptor.render(),
        )?;
        self.pending_constructors.push(constructor.clone());
        Ok(())
    }

    /// Register a nested class, returning the binary name it must be emitted under
    ///
    /// Only the `InnerClasses` linkage is recorded here; assembling the nested class
    /// file itself is the caller's job (see [`crate::writer::write_class`]).
    pub fn add_inner_class(&mut self, inner: &ClassDesc) -> Result<BinaryName, Error> {
        self.check_open()?;
        self.check_duplicate(MemberKind::InnerClass, inner.name.as_str(), "")?;
        let nested_name = self.name.nested(&inner.name);
        self.record_inner_class_entry(
            nested_name.clone(),
            self.name.clone(),
            inner.name.clone(),
            inner_class_flags(inner),
        )?;
        Ok(nested_name)
    }

    /// Record one `InnerClasses` table entry verbatim
    ///
    /// A nested class file carries an entry describing itself, with its enclosing
    /// class as the outer reference.
    pub fn record_inner_class_entry(
        &mut self,
        inner: BinaryName,
        outer: BinaryName,
        simple_name: UnqualifiedName,
        access_flags: InnerClassAccessFlags,
    ) -> Result<(), Error> {
        self.check_open()?;
        self.inner_class_entries
            .push((inner, outer, simple_name, access_flags));
        Ok(())
    }

    /// Seal the class and produce its complete class file
    pub fn finish(&mut self) -> Result<ClassFile, Error> {
        self.check_open()?;
        self.finished = true;

        let instance_initializers = mem::take(&mut self.instance_initializers);
        let pending_constructors = mem::take(&mut self.pending_constructors);
        if pending_constructors.is_empty() && !instance_initializers.is_empty() {
            return Err(Error::UnsupportedConstruct(String::from(
                "instance field initializers require at least one constructor",
            )));
        }

        let super_name = self.super_class.name.clone();
        for constructor in &pending_constructors {
            let parameter_types: Vec<JavaType> = constructor
                .parameters
                .iter()
                .map(|parameter| parameter.parameter_type.clone())
                .collect();
            let descriptor = self.encoder.erase_method(&parameter_types, &None)?;

            let mut code =
                CodeAssembler::new(&mut self.constants, &self.encoder, &self.name, false);
            for parameter in &constructor.parameters {
                code.declare_parameter(&parameter.name, &parameter.parameter_type)?;
            }
            code.super_call(&super_name)?;

            let mut statements: Vec<Statement> = instance_initializers
                .iter()
                .map(|(reference, initializer)| Statement::Assign {
                    target: Target::Field {
                        field: reference.clone(),
                        receiver: None,
                    },
                    value: initializer.clone(),
                })
                .collect();
            statements.extend(constructor.body.iter().cloned());
            code.body(&statements, &None)?;
            let code_attribute = code.finish()?;

            let attribute = self.constants.get_attribute(code_attribute)?;
            let name_index = self.constants.get_utf8(UnqualifiedName::INIT.as_str())?;
            let descriptor_index = self.constants.get_utf8(descriptor.render())?;
            self.methods.push(Method {
                access_flags: method_visibility_flags(constructor.visibility),
                name_index,
                descriptor_index,
                attributes: vec![attribute],
            });
        }

        let static_initializers = mem::take(&mut self.static_initializers);
        if !static_initializers.is_empty() {
            let mut code =
                CodeAssembler::new(&mut self.constants, &self.encoder, &self.name, true);
            let statements: Vec<Statement> = static_initializers
                .iter()
                .map(|(reference, initializer)| Statement::Assign {
                    target: Target::Field {
                        field: reference.clone(),
                        receiver: None,
                    },
                    value: initializer.clone(),
                })
                .collect();
            code.body(&statements, &None)?;
            let code_attribute = code.finish()?;

            let attribute = self.constants.get_attribute(code_attribute)?;
            let name_index = self.constants.get_utf8(UnqualifiedName::CLINIT.as_str())?;
            let descriptor_index = self.constants.get_utf8("()V")?;
            self.methods.push(Method {
                access_flags: MethodAccessFlags::STATIC,
                name_index,
                descriptor_index,
                attributes: vec![attribute],
            });
        }

        let mut attributes = vec![];
        if class_involves_generics(&self.type_parameters, &self.super_class, &self.interfaces) {
            let rendered =
                self.encoder
                    .class_signature(&self.type_parameters, &self.super_class, &self.interfaces)?;
            let signature = self.constants.get_utf8(rendered)?;
            attributes.push(self.constants.get_attribute(Signature { signature })?);
        }

        let inner_class_entries = mem::take(&mut self.inner_class_entries);
        if !inner_class_entries.is_empty() {
            let mut entries = vec![];
            for (inner, outer, simple_name, access_flags) in inner_class_entries {
                entries.push(InnerClass {
                    inner_class: self.constants.get_class(&inner)?,
                    outer_class: self.constants.get_class(&outer)?,
                    inner_name: self.constants.get_utf8(simple_name.as_str())?,
                    access_flags,
                });
            }
            attributes.push(self.constants.get_attribute(InnerClasses(entries))?);
        }

        let this_class = self.constants.get_class(&self.name)?;
        let super_class = self.constants.get_class(&super_name)?;
        let interface_names: Vec<BinaryName> = self
            .interfaces
            .iter()
            .map(|interface| interface.name.clone())
            .collect();
        let mut interfaces = vec![];
        for interface_name in &interface_names {
            interfaces.push(self.constants.get_class(interface_name)?);
        }

        Ok(ClassFile {
            version: Version::JAVA8,
            constants: mem::take(&mut self.constants).into_offset_vec(),
            access_flags: self.access_flags,
            this_class,
            super_class,
            interfaces,
            fields: mem::take(&mut self.fields),
            methods: mem::take(&mut self.methods),
            attributes,
        })
    }

    fn check_open(&self) -> Result<(), Error> {
        if self.finished {
            Err(Error::ClassAlreadyFinalized)
        } else {
            Ok(())
        }
    }

    fn check_duplicate(
        &mut self,
        kind: MemberKind,
        name: &str,
        descriptor: &str,
    ) -> Result<(), Error> {
        if self
            .seen_members
            .insert((kind, name.to_owned(), descriptor.to_owned()))
        {
            Ok(())
        } else {
            Err(Error::DuplicateMember {
                kind,
                name: name.to_owned(),
                descriptor: descriptor.to_owned(),
            })
        }
    }
}

fn literal_type(literal: &Literal) -> FieldType {
    match literal {
        Literal::Int(_) => FieldType::INT,
        Literal::Long(_) => FieldType::Base(BaseType::Long),
        Literal::Float(_) => FieldType::Base(BaseType::Float),
        Literal::Double(_) => FieldType::Base(BaseType::Double),
        Literal::Boolean(_) => FieldType::Base(BaseType::Boolean),
        Literal::String(_) => FieldType::object(BinaryName::STRING),
        Literal::Null => FieldType::object(BinaryName::OBJECT),
    }
}

fn method_visibility_flags(visibility: Visibility) -> MethodAccessFlags {
    match visibility {
        Visibility::Public => MethodAccessFlags::PUBLIC,
        Visibility::Protected => MethodAccessFlags::PROTECTED,
        Visibility::Private => MethodAccessFlags::PRIVATE,
        Visibility::Package => MethodAccessFlags::empty(),
    }
}

fn field_flags(field: &FieldDesc) -> FieldAccessFlags {
    let mut access_flags = match field.visibility {
        Visibility::Public => FieldAccessFlags::PUBLIC,
        Visibility::Protected => FieldAccessFlags::PROTECTED,
        Visibility::Private => FieldAccessFlags::PRIVATE,
        Visibility::Package => FieldAccessFlags::empty(),
    };
    if field.is_static {
        access_flags |= FieldAccessFlags::STATIC;
    }
    if field.is_final {
        access_flags |= FieldAccessFlags::FINAL;
    }
    access_flags
}

pub(crate) fn inner_class_flags(inner: &ClassDesc) -> InnerClassAccessFlags {
    let mut access_flags = match inner.visibility {
        Visibility::Public => InnerClassAccessFlags::PUBLIC,
        Visibility::Protected => InnerClassAccessFlags::PROTECTED,
        Visibility::Private => InnerClassAccessFlags::PRIVATE,
        Visibility::Package => InnerClassAccessFlags::empty(),
    };
    match inner.variant {
        ClassVariant::Concrete => {}
        ClassVariant::Abstract => access_flags |= InnerClassAccessFlags::ABSTRACT,
        ClassVariant::Interface => {
            access_flags |= InnerClassAccessFlags::INTERFACE | InnerClassAccessFlags::ABSTRACT
        }
        ClassVariant::Enum => access_flags |= InnerClassAccessFlags::ENUM,
    }
    if inner.is_static {
        access_flags |= InnerClassAccessFlags::STATIC;
    }
    if inner.is_final {
        access_flags |= InnerClassAccessFlags::FINAL;
    }
    access_flags
}
