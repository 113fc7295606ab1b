//! Identities of Java elements.
//!
//! A type is identified by where it was declared plus its qualified name, so
//! two projects holding the same source text still declare distinct types.

use std::fmt;

use smol_str::SmolStr;

use crate::base::{ArchiveId, FileId};

/// Where a type declaration lives.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// A compilation unit in a project.
    Source(FileId),
    /// A type compiled into an archive.
    Binary(ArchiveId),
}

impl Origin {
    pub fn is_binary(self) -> bool {
        matches!(self, Origin::Binary(_))
    }

    pub fn file(self) -> Option<FileId> {
        match self {
            Origin::Source(file) => Some(file),
            Origin::Binary(_) => None,
        }
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Source(file) => write!(f, "{:?}", file),
            Origin::Binary(archive) => write!(f, "{:?}", archive),
        }
    }
}

/// A type declaration: `p.X`, or `p.X.Inner` for a member type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub origin: Origin,
    pub qualified_name: SmolStr,
}

impl TypeKey {
    pub fn new(origin: Origin, qualified_name: impl Into<SmolStr>) -> Self {
        Self {
            origin,
            qualified_name: qualified_name.into(),
        }
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.qualified_name)
    }

    /// Everything before the simple name: a package or an outer type.
    pub fn qualifier(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(qualifier, _)| qualifier)
            .unwrap_or("")
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.qualified_name, self.origin)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

/// A method: declaring type, selector and erased parameter types.
///
/// Parameter types are stored as simple names with array brackets
/// (`Object`, `int[]`), which is how declarations are compared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    pub owner: TypeKey,
    pub selector: SmolStr,
    pub params: Vec<SmolStr>,
}

impl MethodHandle {
    /// Build a handle from parameter signatures in either source form
    /// (`Object`, `java.lang.Object`, `int[]`) or descriptor form
    /// (`QObject;`, `Ljava.lang.Object;`, `I`, `[I`).
    pub fn new<S: AsRef<str>>(owner: TypeKey, selector: impl Into<SmolStr>, params: &[S]) -> Self {
        Self {
            owner,
            selector: selector.into(),
            params: params.iter().map(|p| erase_signature(p.as_ref())).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_constructor(&self) -> bool {
        self.selector == self.owner.simple_name()
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}.{}({})", self.owner, self.selector, self.params.join(", "))
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    pub owner: TypeKey,
    pub name: SmolStr,
}

impl FieldHandle {
    pub fn new(owner: TypeKey, name: impl Into<SmolStr>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}.{}", self.owner, self.name)
    }
}

/// Anything a search scope can be built from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Project(SmolStr),
    CompilationUnit(FileId),
    Type(TypeKey),
    Method(MethodHandle),
    Field(FieldHandle),
}

impl From<TypeKey> for Element {
    fn from(key: TypeKey) -> Self {
        Element::Type(key)
    }
}

impl From<MethodHandle> for Element {
    fn from(handle: MethodHandle) -> Self {
        Element::Method(handle)
    }
}

impl From<FieldHandle> for Element {
    fn from(handle: FieldHandle) -> Self {
        Element::Field(handle)
    }
}

/// Reduce a parameter signature to its erased simple name.
pub fn erase_signature(sig: &str) -> SmolStr {
    let sig = sig.trim();
    let mut dims = sig.bytes().take_while(|&b| b == b'[').count();
    let rest = &sig[dims..];

    let mut out = if let Some(name) = descriptor_class(rest) {
        simple_of(name)
    } else if let Some(primitive) = descriptor_primitive(rest) {
        primitive.to_string()
    } else {
        let mut name = rest;
        while let Some(stripped) = name.strip_suffix("[]") {
            name = stripped;
            dims += 1;
        }
        if let Some(stripped) = name.strip_suffix("...") {
            name = stripped;
            dims += 1;
        }
        simple_of(name)
    };
    for _ in 0..dims {
        out.push_str("[]");
    }
    SmolStr::new(out)
}

/// `QName;`, `Lpkg.Name;` or `TVar;`.
fn descriptor_class(text: &str) -> Option<&str> {
    let body = text.strip_suffix(';')?;
    match body.as_bytes().first() {
        Some(b'Q' | b'L' | b'T') if body.len() > 1 => Some(&body[1..]),
        _ => None,
    }
}

fn descriptor_primitive(text: &str) -> Option<&'static str> {
    Some(match text {
        "B" => "byte",
        "C" => "char",
        "D" => "double",
        "F" => "float",
        "I" => "int",
        "J" => "long",
        "S" => "short",
        "Z" => "boolean",
        "V" => "void",
        _ => return None,
    })
}

fn simple_of(name: &str) -> String {
    let without_args = match name.find('<') {
        Some(idx) => &name[..idx],
        None => name,
    };
    without_args
        .rsplit(['.', '/', '$'])
        .next()
        .unwrap_or(without_args)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Object", "Object")]
    #[case("QObject;", "Object")]
    #[case("Ljava.lang.Object;", "Object")]
    #[case("Ljava/lang/String;", "String")]
    #[case("I", "int")]
    #[case("[I", "int[]")]
    #[case("[[QString;", "String[][]")]
    #[case("java.util.List<String>", "List")]
    #[case("int[]", "int[]")]
    #[case("String...", "String[]")]
    #[case("Map.Entry", "Entry")]
    fn test_erase_signature(#[case] sig: &str, #[case] expected: &str) {
        assert_eq!(erase_signature(sig), expected);
    }

    #[test]
    fn test_type_key_names() {
        let key = TypeKey::new(Origin::Source(FileId::new(1)), "p.X.Inner");
        assert_eq!(key.simple_name(), "Inner");
        assert_eq!(key.qualifier(), "p.X");

        let default_package = TypeKey::new(Origin::Source(FileId::new(1)), "Y");
        assert_eq!(default_package.simple_name(), "Y");
        assert_eq!(default_package.qualifier(), "");
    }

    #[test]
    fn test_copies_are_distinct_types() {
        let a = TypeKey::new(Origin::Source(FileId::new(1)), "p.I");
        let b = TypeKey::new(Origin::Source(FileId::new(2)), "p.I");
        assert_ne!(a, b);
    }

    #[test]
    fn test_method_handle_decodes_params() {
        let owner = TypeKey::new(Origin::Source(FileId::new(0)), "p.I");
        let from_descriptor = MethodHandle::new(owner.clone(), "method", &["QObject;"]);
        let from_source = MethodHandle::new(owner, "method", &["Object"]);
        assert_eq!(from_descriptor, from_source);
        assert_eq!(from_source.arity(), 1);
        assert!(!from_source.is_constructor());
    }
}
