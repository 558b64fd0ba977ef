//! Driving assembly and persisting class files to disk

use crate::assemble::{inner_class_flags, ClassAssembler};
use crate::jvm::class_file::ClassFile;
use crate::jvm::{BinaryName, Error, Name};
use crate::model::{ClassDesc, Member};
use std::fs;
use std::path::Path;

/// Assemble a class description (and, recursively, its nested classes) and write the
/// resulting class files under `dest`
///
/// The package qualifier uses dots (`geom.util`); each class lands at
/// `dest/<package dirs>/<Name>.class`, nested classes under their `Outer$Inner`
/// binary name. Every class file is fully serialized in memory before anything is
/// written, so an assembly failure leaves no partial output behind.
pub fn write_class(desc: &ClassDesc, package: Option<&str>, dest: &Path) -> Result<(), Error> {
    let binary_name = toplevel_binary_name(desc, package)?;

    let mut class_files = vec![];
    assemble_tree(desc, binary_name, None, &mut class_files)?;

    let mut artifacts = vec![];
    for (name, class_file) in &class_files {
        let bytes = class_file.to_bytes().map_err(Error::WriteFailure)?;
        artifacts.push((name, bytes));
    }

    for (name, bytes) in artifacts {
        let path = dest.join(format!("{}.class", name.as_str()));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailure)?;
        }

        // Write to a scratch file and rename, so an interrupted write never
        // leaves a truncated class file at the final path
        let scratch = path.with_extension("class.tmp");
        if let Err(error) = fs::write(&scratch, &bytes) {
            let _ = fs::remove_file(&scratch);
            return Err(Error::WriteFailure(error));
        }
        fs::rename(&scratch, &path).map_err(Error::WriteFailure)?;
        log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
    }
    Ok(())
}

/// Assemble a class and its nested classes, depth first
fn assemble_tree(
    desc: &ClassDesc,
    binary_name: BinaryName,
    enclosing: Option<&BinaryName>,
    out: &mut Vec<(BinaryName, ClassFile)>,
) -> Result<(), Error> {
    let mut assembler = ClassAssembler::new(binary_name.clone(), desc);

    // A nested class file records its own InnerClasses entry
    if let Some(outer) = enclosing {
        assembler.record_inner_class_entry(
            binary_name.clone(),
            outer.clone(),
            desc.name.clone(),
            inner_class_flags(desc),
        )?;
    }

    let mut nested = vec![];
    for member in &desc.members {
        match member {
            Member::Field(field) => assembler.add_field(field)?,
            Member::Method(method) => assembler.add_method(method)?,
            Member::Constructor(constructor) => assembler.add_constructor(constructor)?,
            Member::InnerClass(inner) => {
                let nested_name = assembler.add_inner_class(inner)?;
                nested.push((inner, nested_name));
            }
        }
    }

    let class_file = assembler.finish()?;
    out.push((binary_name.clone(), class_file));

    for (inner, nested_name) in nested {
        assemble_tree(inner, nested_name, Some(&binary_name), out)?;
    }
    Ok(())
}

fn toplevel_binary_name(desc: &ClassDesc, package: Option<&str>) -> Result<BinaryName, Error> {
    let qualified = match package {
        None => desc.name.as_str().to_owned(),
        Some(package) => format!("{}/{}", package.replace('.', "/"), desc.name.as_str()),
    };
    BinaryName::from_string(qualified)
        .map_err(|message| Error::UnsupportedConstruct(format!("invalid class name: {}", message)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::UnqualifiedName;

    #[test]
    fn package_qualifiers_turn_into_directories() {
        let desc = ClassDesc::new(UnqualifiedName::from_string(String::from("Point")).unwrap());
        let name = toplevel_binary_name(&desc, Some("geom.util")).unwrap();
        assert_eq!(name.as_str(), "geom/util/Point");
    }

    #[test]
    fn malformed_packages_are_rejected() {
        let desc = ClassDesc::new(UnqualifiedName::from_string(String::from("Point")).unwrap());
        assert!(matches!(
            toplevel_binary_name(&desc, Some("geom..util")),
            Err(Error::UnsupportedConstruct(_))
        ));
    }
}
