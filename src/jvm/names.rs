use std::borrow::Cow;
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Names of methods, fields
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct BinaryName(Cow<'static, str>);

/// Extracts the raw underlying string name
impl AsRef<str> for UnqualifiedName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Extracts the raw underlying string name
impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

pub trait Name: Sized {
    /// Check if a string would be a valid name of this kind
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extract the raw underlying string data
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extract the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;
}

impl Name for UnqualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name == "<init>" || name == "<clinit>" {
            Ok(())
        } else if name.contains(&['.', ';', '[', '/', '<', '>'][..]) {
            Err(format!(
                "Unqualified name '{}' contains an illegal character",
                name
            ))
        } else if name.is_empty() {
            Err(String::from("Unqualified name is empty"))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(UnqualifiedName(Cow::Owned(name))),
            Err(msg) => Err(msg),
        }
    }
}

impl Name for BinaryName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(String::from("Binary name is empty"))
        } else {
            name.split('/').map(UnqualifiedName::check_valid).collect()
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(BinaryName(Cow::Owned(name))),
            Err(msg) => Err(msg),
        }
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl From<UnqualifiedName> for BinaryName {
    fn from(name: UnqualifiedName) -> BinaryName {
        BinaryName(name.0)
    }
}

impl UnqualifiedName {
    const fn name(value: &'static str) -> UnqualifiedName {
        UnqualifiedName(Cow::Borrowed(value))
    }

    // Special unqualified names - only these are allowed to have angle brackets in them
    pub const INIT: Self = Self::name("<init>");
    pub const CLINIT: Self = Self::name("<clinit>");
}

impl BinaryName {
    /// Join segments from the other name onto the end of this binary name
    pub fn join(&self, other: &UnqualifiedName) -> BinaryName {
        BinaryName(Cow::Owned(format!("{}/{}", self.as_str(), other.as_str())))
    }

    /// Binary name of a class nested inside this one (`Outer$Inner`)
    pub fn nested(&self, inner: &UnqualifiedName) -> BinaryName {
        BinaryName(Cow::Owned(format!("{}${}", self.as_str(), inner.as_str())))
    }

    const fn name(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    // JDK names
    pub const OBJECT: Self = Self::name("java/lang/Object");
    pub const STRING: Self = Self::name("java/lang/String");
    pub const ENUM: Self = Self::name("java/lang/Enum");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unqualified_names() {
        assert!(UnqualifiedName::from_string(String::from("getX")).is_ok());
        assert!(UnqualifiedName::from_string(String::from("<init>")).is_ok());
        assert!(UnqualifiedName::from_string(String::from("a.b")).is_err());
        assert!(UnqualifiedName::from_string(String::from("")).is_err());
    }

    #[test]
    fn binary_names() {
        assert!(BinaryName::from_string(String::from("java/lang/Object")).is_ok());
        assert!(BinaryName::from_string(String::from("Point")).is_ok());
        assert!(BinaryName::from_string(String::from("java//lang")).is_err());
    }

    #[test]
    fn nested_names() {
        let outer = BinaryName::from_string(String::from("geom/Point")).unwrap();
        let inner = UnqualifiedName::from_string(String::from("Builder")).unwrap();
        assert_eq!(outer.nested(&inner).as_str(), "geom/Point$Builder");
    }
}
