//! Archives: compiled libraries shared between projects.
//!
//! An archive is built from stub sources. Bodies are dropped and every type
//! reference is rewritten to its qualified form against the archive's own
//! contents, which is what a class file would record.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::ArchiveId;
use crate::env::{JAVA_BASE, ModuleDescription};
use crate::error::{Error, Result};
use crate::hir::{Origin, TypeInfo, TypeKey, collect_types};
use crate::syntax::ast::{CompilationUnit, TypeRef};
use crate::syntax::parse;

/// Path of the built-in minimal class library.
pub const JCL_ARCHIVE_PATH: &str = "/JCL/jclMin.jar";

/// Classpath variable bound to [`JCL_ARCHIVE_PATH`] in every workspace.
pub const JCL_VARIABLE: &str = "JCL_LIB";

const JCL_SOURCES: &[(&str, &str)] = &[
    (
        "java/lang/Object.java",
        "package java.lang;
        public class Object {
            public Object() {}
            public boolean equals(Object obj);
            public native int hashCode();
            public String toString();
            public final native Class getClass();
            protected native Object clone() throws CloneNotSupportedException;
        }",
    ),
    (
        "java/lang/String.java",
        "package java.lang;
        public final class String {
            public String() {}
            public String(String original) {}
            public int length();
            public char charAt(int index);
            public boolean equals(Object anObject);
            public String substring(int beginIndex);
            public String concat(String str);
            public static String valueOf(Object obj);
        }",
    ),
    (
        "java/lang/Class.java",
        "package java.lang;
        public final class Class {
            public String getName();
        }",
    ),
    (
        "java/lang/Throwable.java",
        "package java.lang;
        public class Throwable {
            public Throwable() {}
            public Throwable(String message) {}
            public String getMessage();
            public void printStackTrace();
        }",
    ),
    (
        "java/lang/Exception.java",
        "package java.lang;
        public class Exception extends Throwable {
            public Exception() {}
            public Exception(String message) {}
        }",
    ),
    (
        "java/lang/CloneNotSupportedException.java",
        "package java.lang;
        public class CloneNotSupportedException extends Exception {}",
    ),
    (
        "java/lang/RuntimeException.java",
        "package java.lang;
        public class RuntimeException extends Exception {
            public RuntimeException() {}
            public RuntimeException(String message) {}
        }",
    ),
    (
        "java/lang/Error.java",
        "package java.lang;
        public class Error extends Throwable {
            public Error() {}
        }",
    ),
];

/// The class library stubs, parsed once per process.
static JCL_UNITS: Lazy<Vec<CompilationUnit>> = Lazy::new(|| {
    JCL_SOURCES
        .iter()
        .filter_map(|(path, text)| match parse(text) {
            Ok(unit) => Some(unit),
            Err(err) => {
                tracing::warn!(path, %err, "class library stub does not parse");
                None
            }
        })
        .collect()
});

#[derive(Clone, Debug)]
pub struct Archive {
    pub id: ArchiveId,
    /// Display path, e.g. `/JCL/jclMin.jar`.
    pub path: SmolStr,
    module: Option<ModuleDescription>,
    types: Vec<TypeInfo>,
    by_name: FxHashMap<SmolStr, usize>,
    packages: FxHashSet<SmolStr>,
}

impl Archive {
    /// Compile `(name, text)` stub sources into an archive.
    pub fn from_sources<N: AsRef<str>, T: AsRef<str>>(
        id: ArchiveId,
        path: impl Into<SmolStr>,
        sources: &[(N, T)],
        module: Option<ModuleDescription>,
    ) -> Result<Self> {
        let path = path.into();
        let units = sources
            .iter()
            .map(|(name, text)| {
                parse(text.as_ref()).map_err(|err| Error::Syntax {
                    path: format!("{}!/{}", path, name.as_ref()),
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_units(id, path, &units, module))
    }

    /// The built-in minimal class library, as module `java.base`.
    pub fn jcl_min(id: ArchiveId) -> Self {
        let module = ModuleDescription::new(JAVA_BASE).exports("java.lang");
        Self::from_units(id, SmolStr::new(JCL_ARCHIVE_PATH), &JCL_UNITS, Some(module))
    }

    fn from_units(
        id: ArchiveId,
        path: SmolStr,
        units: &[CompilationUnit],
        module: Option<ModuleDescription>,
    ) -> Self {
        let per_unit: Vec<Vec<TypeInfo>> = units
            .iter()
            .map(|unit| collect_types(unit, Origin::Binary(id)))
            .collect();

        let names: FxHashSet<SmolStr> = per_unit
            .iter()
            .flatten()
            .map(|t| t.key.qualified_name.clone())
            .collect();

        let mut types = Vec::new();
        for (unit, unit_types) in units.iter().zip(per_unit) {
            let qualifier = Qualifier {
                unit,
                names: &names,
            };
            for mut info in unit_types {
                qualifier.qualify_type(&mut info);
                types.push(info);
            }
        }

        let mut by_name = FxHashMap::default();
        let mut packages = FxHashSet::default();
        for (idx, info) in types.iter().enumerate() {
            by_name.entry(info.key.qualified_name.clone()).or_insert(idx);
            let mut prefix = String::new();
            for segment in info.package.split('.').filter(|s| !s.is_empty()) {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                packages.insert(SmolStr::new(&prefix));
            }
        }
        tracing::debug!(archive = %path, types = types.len(), "built archive");

        Self {
            id,
            path,
            module,
            types,
            by_name,
            packages,
        }
    }

    pub fn module(&self) -> Option<&ModuleDescription> {
        self.module.as_ref()
    }

    /// Types in declaration order.
    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    pub fn type_info(&self, qualified_name: &str) -> Option<&TypeInfo> {
        self.by_name
            .get(qualified_name)
            .and_then(|&idx| self.types.get(idx))
    }

    pub fn lookup_type(&self, qualified_name: &str) -> Option<&TypeKey> {
        self.type_info(qualified_name).map(|info| &info.key)
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }
}

/// Rewrites type references of one stub unit to qualified names.
struct Qualifier<'a> {
    unit: &'a CompilationUnit,
    names: &'a FxHashSet<SmolStr>,
}

impl Qualifier<'_> {
    fn qualify_type(&self, info: &mut TypeInfo) {
        let scope = info.key.qualified_name.clone();
        let package = info.package.clone();
        let mut qualify = |ty: &mut TypeRef| self.qualify(ty, &scope, &package);

        if let Some(superclass) = info.superclass.as_mut() {
            qualify(superclass);
        }
        info.interfaces.iter_mut().for_each(&mut qualify);
        for method in &mut info.methods {
            method.params.iter_mut().for_each(&mut qualify);
            if let Some(ret) = method.return_type.as_mut() {
                qualify(ret);
            }
        }
        for field in &mut info.fields {
            qualify(&mut field.ty);
        }
    }

    fn qualify(&self, ty: &mut TypeRef, scope: &str, package: &str) {
        if ty.is_primitive() {
            return;
        }
        let Some((first, rest)) = ty.segments.split_first() else {
            return;
        };
        if let Some(resolved) = self.resolve_simple(first, scope, package) {
            let mut segments: Vec<SmolStr> = resolved.split('.').map(SmolStr::new).collect();
            segments.extend(rest.iter().cloned());
            ty.segments = segments;
        }
    }

    fn resolve_simple(&self, name: &str, scope: &str, package: &str) -> Option<String> {
        // member types of the enclosing chain, innermost first
        let mut outer = Some(scope);
        while let Some(current) = outer {
            if current == package {
                break;
            }
            let candidate = format!("{}.{}", current, name);
            if self.names.contains(candidate.as_str()) {
                return Some(candidate);
            }
            if current.rsplit_once('.').map(|(_, simple)| simple) == Some(name)
                || current == name
            {
                return Some(current.to_string());
            }
            outer = current.rsplit_once('.').map(|(q, _)| q);
        }

        for import in self.unit.imports.iter().filter(|i| !i.on_demand && !i.is_static) {
            if import.segments.last().is_some_and(|last| last == name) {
                return Some(import.segments.join("."));
            }
        }

        let in_package = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", package, name)
        };
        if self.names.contains(in_package.as_str()) {
            return Some(in_package);
        }

        for import in self.unit.imports.iter().filter(|i| i.on_demand && !i.is_static) {
            let candidate = format!("{}.{}", import.segments.join("."), name);
            if self.names.contains(candidate.as_str()) {
                return Some(candidate);
            }
        }

        let lang = format!("java.lang.{}", name);
        self.names.contains(lang.as_str()).then_some(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jcl_declares_object_in_java_base() {
        let jcl = Archive::jcl_min(ArchiveId::new(0));
        assert_eq!(jcl.path, JCL_ARCHIVE_PATH);
        let object = jcl.type_info("java.lang.Object").unwrap();
        assert_eq!(object.key.origin, Origin::Binary(ArchiveId::new(0)));
        assert!(jcl.has_package("java"));
        assert!(jcl.has_package("java.lang"));
        assert_eq!(jcl.module().unwrap().name, JAVA_BASE);
    }

    #[test]
    fn test_references_are_qualified() {
        let jcl = Archive::jcl_min(ArchiveId::new(0));
        let exception = jcl.type_info("java.lang.Exception").unwrap();
        assert_eq!(
            exception.superclass.as_ref().unwrap().dotted(),
            "java.lang.Throwable"
        );
        let object = jcl.type_info("java.lang.Object").unwrap();
        let to_string = object.methods_named("toString").next().unwrap();
        assert_eq!(
            to_string.return_type.as_ref().unwrap().dotted(),
            "java.lang.String"
        );
        // simple names survive for signature comparison
        assert_eq!(to_string.return_type.as_ref().unwrap().simple_name(), "String");
    }

    #[test]
    fn test_from_sources_with_imports_and_member_types() {
        let archive = Archive::from_sources(
            ArchiveId::new(4),
            "/lib/util.jar",
            &[
                ("u/Box.java", "package u; import v.Item; public class Box { Item item; Entry e; public static class Entry {} }"),
                ("v/Item.java", "package v; public class Item { }"),
            ],
            None,
        )
        .unwrap();
        let boxed = archive.type_info("u.Box").unwrap();
        assert_eq!(boxed.field("item").unwrap().ty.dotted(), "v.Item");
        assert_eq!(boxed.field("e").unwrap().ty.dotted(), "u.Box.Entry");
        assert!(archive.lookup_type("u.Box.Entry").is_some());
        assert!(archive.module().is_none());
    }

    #[test]
    fn test_from_sources_reports_syntax_errors() {
        let err = Archive::from_sources(ArchiveId::new(0), "/bad.jar", &[("A.java", "class {")], None)
            .unwrap_err();
        assert!(matches!(err, Error::Syntax { path, .. } if path == "/bad.jar!/A.java"));
    }
}
