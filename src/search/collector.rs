//! Search results and the requestor that receives them.

use std::fmt;

use smol_str::SmolStr;

use crate::base::{FileId, TextRange};

/// How sure the engine is that a match is the searched element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Accuracy {
    /// The reference binds to the target.
    Exact,
    /// The name matches but its binding could not be resolved.
    Inaccurate,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Accuracy::Exact => "EXACT_MATCH",
            Accuracy::Inaccurate => "INACCURATE_MATCH",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Declaration,
    Reference,
    Implementor,
}

/// One match, attributed to a project and a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    pub project: SmolStr,
    /// Project-relative path of a source, or the path of an archive.
    pub resource: SmolStr,
    /// Label of the declared or enclosing element, e.g. `p.X.bar() -> void`.
    pub element: String,
    /// `None` for archive matches.
    pub range: Option<TextRange>,
    /// The matched source text.
    pub source: Option<String>,
    pub accuracy: Accuracy,
    pub kind: MatchKind,
    pub file: Option<FileId>,
}

/// Receives matches as a search finds them.
pub trait SearchRequestor {
    fn begin_reporting(&mut self) {}

    fn accept(&mut self, found: SearchMatch);

    fn end_reporting(&mut self) {}
}

/// Collects matches and renders them one per line:
/// `resource[ [in Project]] element[ [source]][ ACCURACY]`.
#[derive(Clone, Debug, Default)]
pub struct ResultCollector {
    pub show_project: bool,
    pub show_accuracy: bool,
    matches: Vec<SearchMatch>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_project(mut self, show: bool) -> Self {
        self.show_project = show;
        self
    }

    pub fn show_accuracy(mut self, show: bool) -> Self {
        self.show_accuracy = show;
        self
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn clear(&mut self) {
        self.matches.clear();
    }

    fn write_record(&self, f: &mut fmt::Formatter<'_>, found: &SearchMatch) -> fmt::Result {
        f.write_str(&found.resource)?;
        if self.show_project {
            write!(f, " [in {}]", found.project)?;
        }
        write!(f, " {}", found.element)?;
        if let Some(source) = &found.source {
            write!(f, " [{}]", source)?;
        }
        if self.show_accuracy {
            write!(f, " {}", found.accuracy)?;
        }
        Ok(())
    }
}

impl SearchRequestor for ResultCollector {
    fn accept(&mut self, found: SearchMatch) {
        self.matches.push(found);
    }
}

impl fmt::Display for ResultCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, found) in self.matches.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            self.write_record(f, found)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reference() -> SearchMatch {
        SearchMatch {
            project: "P2".into(),
            resource: "p2/Y.java".into(),
            element: "p2.Y.bar() -> void".into(),
            range: Some(TextRange::new(10.into(), 15.into())),
            source: Some("foo()".into()),
            accuracy: Accuracy::Exact,
            kind: MatchKind::Reference,
            file: Some(FileId::new(1)),
        }
    }

    #[rstest]
    #[case(false, false, "p2/Y.java p2.Y.bar() -> void [foo()]")]
    #[case(true, false, "p2/Y.java [in P2] p2.Y.bar() -> void [foo()]")]
    #[case(true, true, "p2/Y.java [in P2] p2.Y.bar() -> void [foo()] EXACT_MATCH")]
    #[case(false, true, "p2/Y.java p2.Y.bar() -> void [foo()] EXACT_MATCH")]
    fn test_record_format(#[case] project: bool, #[case] accuracy: bool, #[case] expected: &str) {
        let mut collector = ResultCollector::new().show_project(project).show_accuracy(accuracy);
        collector.accept(reference());
        assert_eq!(collector.to_string(), expected);
    }

    #[test]
    fn test_archive_records_have_no_source() {
        let mut collector = ResultCollector::new().show_project(true);
        collector.accept(SearchMatch {
            project: "P1".into(),
            resource: "/JCL/jclMin.jar".into(),
            element: "java.lang.Object".into(),
            range: None,
            source: None,
            accuracy: Accuracy::Exact,
            kind: MatchKind::Declaration,
            file: None,
        });
        collector.accept(SearchMatch {
            accuracy: Accuracy::Inaccurate,
            ..reference()
        });
        assert_eq!(
            collector.to_string(),
            "/JCL/jclMin.jar [in P1] java.lang.Object\np2/Y.java [in P2] p2.Y.bar() -> void [foo()]"
        );
    }

    #[test]
    fn test_empty_collector_renders_nothing() {
        assert_eq!(ResultCollector::new().to_string(), "");
        assert!(ResultCollector::new().is_empty());
    }
}
