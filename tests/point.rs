//! End-to-end test: describe a `Point` class, write it to disk, and re-parse the
//! emitted class file with an independent parser.

use classfile_parser::attribute_info::code_attribute_parser;
use classfile_parser::code_attribute::{code_parser, Instruction};
use classfile_parser::constant_info::ConstantInfo;
use classfile_parser::field_info::FieldAccessFlags;
use classfile_parser::method_info::MethodAccessFlags;
use classfile_parser::types::{ClassAccessFlags, ClassFile};

use model2class::jvm::{BinaryName, Name, UnqualifiedName};
use model2class::model::{
    ClassDesc, ClassVariant, ConstructorDesc, Expression, FieldDesc, FieldRef, JavaType, Member,
    MethodDesc, Parameter, Statement, Target, Visibility,
};
use model2class::writer::write_class;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn name(value: &str) -> UnqualifiedName {
    UnqualifiedName::from_string(String::from(value)).unwrap()
}

fn utf8<'a>(pool: &'a [ConstantInfo], index: u16) -> &'a str {
    match &pool[index as usize - 1] {
        ConstantInfo::Utf8(constant) => &constant.utf8_string,
        other => panic!("expected Utf8 at constant {}, found {:?}", index, other),
    }
}

fn field_ref_name<'a>(pool: &'a [ConstantInfo], index: u16) -> &'a str {
    let name_and_type_index = match &pool[index as usize - 1] {
        ConstantInfo::FieldRef(field_ref) => field_ref.name_and_type_index,
        other => panic!("expected FieldRef at constant {}, found {:?}", index, other),
    };
    match &pool[name_and_type_index as usize - 1] {
        ConstantInfo::NameAndType(name_and_type) => utf8(pool, name_and_type.name_index),
        other => panic!("expected NameAndType, found {:?}", other),
    }
}

fn method_named<'a>(
    class_file: &'a ClassFile,
    method_name: &str,
) -> &'a classfile_parser::method_info::MethodInfo {
    class_file
        .methods
        .iter()
        .find(|method| utf8(&class_file.const_pool, method.name_index) == method_name)
        .unwrap_or_else(|| panic!("no method named {}", method_name))
}

fn code_of(
    class_file: &ClassFile,
    method: &classfile_parser::method_info::MethodInfo,
) -> classfile_parser::attribute_info::CodeAttribute {
    let attribute = method
        .attributes
        .iter()
        .find(|attribute| {
            utf8(&class_file.const_pool, attribute.attribute_name_index) == "Code"
        })
        .expect("method has no Code attribute");
    code_attribute_parser(&attribute.info).expect("malformed Code attribute").1
}

/// `public class Point { private int x; private int y; Point(int x, int y); int getX(); }`
fn point_description() -> ClassDesc {
    let owner = BinaryName::from_string(String::from("geom/Point")).unwrap();
    let field_x = FieldRef {
        owner: owner.clone(),
        name: name("x"),
        field_type: JavaType::INT,
        is_static: false,
    };
    let field_y = FieldRef {
        owner,
        name: name("y"),
        field_type: JavaType::INT,
        is_static: false,
    };

    let constructor = ConstructorDesc {
        visibility: Visibility::Public,
        parameters: vec![
            Parameter::new("x", JavaType::INT),
            Parameter::new("y", JavaType::INT),
        ],
        body: vec![
            Statement::Assign {
                target: Target::Field {
                    field: field_x.clone(),
                    receiver: None,
                },
                value: Expression::variable("x"),
            },
            Statement::Assign {
                target: Target::Field {
                    field: field_y,
                    receiver: None,
                },
                value: Expression::variable("y"),
            },
        ],
    };

    let get_x = MethodDesc {
        return_type: Some(JavaType::INT),
        body: vec![Statement::Return(Some(Expression::GetField {
            field: field_x,
            receiver: None,
        }))],
        ..MethodDesc::new(name("getX"))
    };

    let mut desc = ClassDesc::new(name("Point"));
    desc.members = vec![
        Member::Field(FieldDesc::new(name("x"), JavaType::INT)),
        Member::Field(FieldDesc::new(name("y"), JavaType::INT)),
        Member::Constructor(constructor),
        Member::Method(get_x),
    ];
    desc
}

#[test]
fn point_class_round_trips_through_an_independent_parser() {
    init_logging();
    let output = tempfile::tempdir().unwrap();
    write_class(&point_description(), Some("geom"), output.path()).unwrap();

    let class_path = output.path().join("geom/Point");
    let class_file = classfile_parser::parse_class(class_path.to_str().unwrap()).unwrap();
    let pool = &class_file.const_pool;

    assert_eq!(class_file.major_version, 52);
    assert_eq!(class_file.minor_version, 0);
    assert!(class_file
        .access_flags
        .contains(ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER));

    let this_name = match &pool[class_file.this_class as usize - 1] {
        ConstantInfo::Class(class) => utf8(pool, class.name_index),
        other => panic!("expected Class constant, found {:?}", other),
    };
    assert_eq!(this_name, "geom/Point");

    // Both fields, in declaration order, private ints
    let field_names: Vec<&str> = class_file
        .fields
        .iter()
        .map(|field| utf8(pool, field.name_index))
        .collect();
    assert_eq!(field_names, vec!["x", "y"]);
    for field in &class_file.fields {
        assert_eq!(utf8(pool, field.descriptor_index), "I");
        assert!(field.access_flags.contains(FieldAccessFlags::PRIVATE));
    }

    // The accessor: aload_0, getfield, ireturn
    let get_x = method_named(&class_file, "getX");
    assert_eq!(utf8(pool, get_x.descriptor_index), "()I");
    assert!(get_x.access_flags.contains(MethodAccessFlags::PUBLIC));
    let get_x_code = code_of(&class_file, get_x);
    assert_eq!(get_x_code.max_stack, 1);
    assert_eq!(get_x_code.max_locals, 1);
    let instructions = code_parser(&get_x_code.code).unwrap().1;
    assert!(matches!(
        &instructions[..],
        [(_, Instruction::Aload0), (_, Instruction::Getfield(_)), (_, Instruction::Ireturn)]
    ));
}

#[test]
fn constructor_assigns_fields_in_declaration_order() {
    init_logging();
    let output = tempfile::tempdir().unwrap();
    write_class(&point_description(), Some("geom"), output.path()).unwrap();

    let class_path = output.path().join("geom/Point");
    let class_file = classfile_parser::parse_class(class_path.to_str().unwrap()).unwrap();
    let pool = &class_file.const_pool;

    let constructor = method_named(&class_file, "<init>");
    assert_eq!(utf8(pool, constructor.descriptor_index), "(II)V");

    let code = code_of(&class_file, constructor);
    let instructions = code_parser(&code.code).unwrap().1;

    // The prologue calls the superclass constructor before anything else
    assert!(matches!(
        &instructions[..2],
        [(_, Instruction::Aload0), (_, Instruction::Invokespecial(_))]
    ));

    // Exactly two putfields, hitting x then y
    let stored: Vec<&str> = instructions
        .iter()
        .filter_map(|(_, instruction)| match instruction {
            Instruction::Putfield(index) => Some(field_ref_name(pool, *index)),
            _ => None,
        })
        .collect();
    assert_eq!(stored, vec!["x", "y"]);

    // Constructors always fall off the end through a return
    assert!(matches!(instructions.last(), Some((_, Instruction::Return))));
}

#[test]
fn emission_leaves_only_class_files_behind() {
    init_logging();
    let output = tempfile::tempdir().unwrap();
    write_class(&point_description(), Some("geom"), output.path()).unwrap();

    let mut pending = vec![output.path().to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                assert_eq!(
                    path.extension().and_then(|extension| extension.to_str()),
                    Some("class"),
                    "unexpected file left behind: {}",
                    path.display()
                );
            }
        }
    }
}

#[test]
fn nested_classes_are_emitted_as_separate_linked_files() {
    init_logging();

    let mut inner = ClassDesc::new(name("Builder"));
    inner.is_static = true;
    inner.members = vec![Member::Constructor(ConstructorDesc::new(Visibility::Public))];

    let mut outer = ClassDesc::new(name("Point"));
    outer.members = vec![
        Member::Constructor(ConstructorDesc::new(Visibility::Public)),
        Member::InnerClass(inner),
    ];

    let output = tempfile::tempdir().unwrap();
    write_class(&outer, None, output.path()).unwrap();

    let outer_file =
        classfile_parser::parse_class(output.path().join("Point").to_str().unwrap()).unwrap();
    let inner_file =
        classfile_parser::parse_class(output.path().join("Point$Builder").to_str().unwrap())
            .unwrap();

    for class_file in [&outer_file, &inner_file] {
        assert!(class_file.attributes.iter().any(|attribute| {
            utf8(&class_file.const_pool, attribute.attribute_name_index) == "InnerClasses"
        }));
    }

    let inner_name = match &inner_file.const_pool[inner_file.this_class as usize - 1] {
        ConstantInfo::Class(class) => utf8(&inner_file.const_pool, class.name_index),
        other => panic!("expected Class constant, found {:?}", other),
    };
    assert_eq!(inner_name, "Point$Builder");
}

#[test]
fn interfaces_carry_the_interface_flags() {
    init_logging();

    let mut greeter = ClassDesc::new(name("Greeter"));
    greeter.variant = ClassVariant::Interface;
    greeter.members = vec![Member::Method(MethodDesc {
        return_type: Some(JavaType::STRING),
        ..MethodDesc::new(name("greet"))
    })];

    let output = tempfile::tempdir().unwrap();
    write_class(&greeter, None, output.path()).unwrap();

    let class_file =
        classfile_parser::parse_class(output.path().join("Greeter").to_str().unwrap()).unwrap();
    assert!(class_file
        .access_flags
        .contains(ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT));

    let greet = method_named(&class_file, "greet");
    assert!(greet.access_flags.contains(MethodAccessFlags::ABSTRACT));
    assert_eq!(
        utf8(&class_file.const_pool, greet.descriptor_index),
        "()Ljava/lang/String;"
    );
}
