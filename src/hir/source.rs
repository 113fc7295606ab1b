//! Parsed compilation units.

use std::sync::Arc;

use smol_str::SmolStr;

use super::ids::{Origin, TypeKey};
use super::symbols::{TypeInfo, collect_types};
use crate::base::{FileId, LineCol, LineIndex, TextRange};
use crate::syntax::{CompilationUnit, ParseError, parse};

/// One `.java` file in a project, parsed once when its contents are set.
///
/// A file that fails to parse keeps its text and error but declares no
/// types and yields no matches.
#[derive(Debug)]
pub struct SourceFile {
    pub id: FileId,
    /// Owning project name.
    pub project: SmolStr,
    /// Path relative to the project root, e.g. `p/X.java`.
    pub path: SmolStr,
    pub text: Arc<str>,
    parse: Result<CompilationUnit, ParseError>,
    types: Vec<TypeInfo>,
}

impl SourceFile {
    pub fn new(
        id: FileId,
        project: impl Into<SmolStr>,
        path: impl Into<SmolStr>,
        text: impl Into<Arc<str>>,
    ) -> Self {
        let project = project.into();
        let path = path.into();
        let text: Arc<str> = text.into();
        let parse = parse(&text);
        let types = match &parse {
            Ok(unit) => collect_types(unit, Origin::Source(id)),
            Err(err) => {
                tracing::warn!(project = %project, path = %path, %err, "source file does not parse");
                Vec::new()
            }
        };
        Self {
            id,
            project,
            path,
            text,
            parse,
            types,
        }
    }

    pub fn unit(&self) -> Option<&CompilationUnit> {
        self.parse.as_ref().ok()
    }

    pub fn syntax_error(&self) -> Option<&ParseError> {
        self.parse.as_ref().err()
    }

    /// Line and column of the syntax error, if any.
    pub fn syntax_error_at(&self) -> Option<LineCol> {
        let err = self.syntax_error()?;
        Some(LineIndex::new(&self.text).line_col(err.offset))
    }

    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    pub fn type_info(&self, qualified_name: &str) -> Option<&TypeInfo> {
        self.types
            .iter()
            .find(|t| t.key.qualified_name == qualified_name)
    }

    /// Top-level or member type by its simple name, outermost first.
    pub fn type_named(&self, simple_name: &str) -> Option<&TypeInfo> {
        self.types.iter().find(|t| t.simple_name() == simple_name)
    }

    pub fn package(&self) -> SmolStr {
        self.unit()
            .map(|u| SmolStr::new(u.package_segments().join(".")))
            .unwrap_or_default()
    }

    /// Workspace path, e.g. `/P1/p/X.java`.
    pub fn workspace_path(&self) -> String {
        format!("/{}/{}", self.project, self.path)
    }

    pub fn text_at(&self, range: TextRange) -> Option<&str> {
        crate::base::slice(&self.text, range)
    }

    /// The innermost named type whose declaration covers `range`.
    pub fn enclosing_type(&self, range: TextRange) -> Option<&TypeKey> {
        let unit = self.unit()?;
        self.types
            .iter()
            .filter(|t| t.decl(unit).is_some_and(|d| d.range.contains_range(range)))
            .last()
            .map(|t| &t.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_collects_types() {
        let file = SourceFile::new(
            FileId::new(3),
            "P1",
            "p/X.java",
            "package p;\npublic class X { class Inner {} }",
        );
        assert!(file.syntax_error().is_none());
        assert_eq!(file.package(), "p");
        assert_eq!(file.workspace_path(), "/P1/p/X.java");
        assert_eq!(file.types().len(), 2);
        assert_eq!(
            file.type_named("X").unwrap().key,
            TypeKey::new(Origin::Source(FileId::new(3)), "p.X")
        );
    }

    #[test]
    fn test_syntax_error_declares_nothing() {
        let file = SourceFile::new(FileId::new(0), "P", "Broken.java", "class { }");
        assert!(file.syntax_error().is_some());
        assert!(file.types().is_empty());
        assert!(file.unit().is_none());
    }

    #[test]
    fn test_syntax_error_position() {
        let file = SourceFile::new(FileId::new(0), "P", "X.java", "package p;\n\nclass {\n}");
        let at = file.syntax_error_at().unwrap();
        assert_eq!(at.line, 2);
        assert_eq!(at.to_string(), "3:7");
        let clean = SourceFile::new(FileId::new(1), "P", "Y.java", "class Y {}");
        assert!(clean.syntax_error_at().is_none());
    }

    #[test]
    fn test_enclosing_type_is_innermost() {
        let text = "class A { class B { void m() {} } void n() {} }";
        let file = SourceFile::new(FileId::new(0), "P", "A.java", text);
        let m = text.find("m()").unwrap() as u32;
        let n = text.find("n()").unwrap() as u32;
        let range = |at: u32| TextRange::at(at.into(), 1.into());
        assert_eq!(file.enclosing_type(range(m)).unwrap().qualified_name, "A.B");
        assert_eq!(file.enclosing_type(range(n)).unwrap().qualified_name, "A");
    }
}
