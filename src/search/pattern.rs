//! What to search for.

use smol_str::SmolStr;

use crate::error::{Error, Result};
use crate::hir::{Element, FieldHandle, MethodHandle, TypeKey, erase_signature};

/// Which occurrences of the target to report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LimitTo {
    Declarations,
    References,
    /// Declarations and references.
    AllOccurrences,
    /// Types naming the target type directly in `extends` or `implements`.
    Implementors,
}

impl LimitTo {
    pub fn declarations(self) -> bool {
        matches!(self, LimitTo::Declarations | LimitTo::AllOccurrences)
    }

    pub fn references(self) -> bool {
        matches!(self, LimitTo::References | LimitTo::AllOccurrences)
    }
}

/// Kind of element a string pattern names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchFor {
    Type,
    Method,
    Field,
}

/// A simple-name pattern with `*` and `?` wildcards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamePattern {
    text: SmolStr,
    case_sensitive: bool,
}

impl NamePattern {
    pub fn new(text: impl Into<SmolStr>, case_sensitive: bool) -> Self {
        Self {
            text: text.into(),
            case_sensitive,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn has_wildcards(&self) -> bool {
        self.text.contains(['*', '?'])
    }

    /// The literal word every match contains, if there is one.
    pub fn exact_word(&self) -> Option<&str> {
        (self.case_sensitive && !self.has_wildcards()).then_some(self.text.as_str())
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.case_sensitive {
            glob_match(self.text.as_bytes(), name.as_bytes())
        } else {
            glob_match(
                self.text.to_lowercase().as_bytes(),
                name.to_lowercase().as_bytes(),
            )
        }
    }
}

fn glob_match(pattern: &[u8], name: &[u8]) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == b'?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, at)) => {
                    p = star + 1;
                    n = at + 1;
                    backtrack = Some((star, at + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == b'*')
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternTarget {
    Type(TypeKey),
    Method(MethodHandle),
    Field(FieldHandle),
    /// A name pattern, optionally qualified, with an optional parameter list
    /// for methods.
    Name {
        kind: SearchFor,
        qualifier: Option<NamePattern>,
        name: NamePattern,
        params: Option<Vec<SmolStr>>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPattern {
    pub target: PatternTarget,
    pub limit_to: LimitTo,
}

impl SearchPattern {
    /// Search for a Java element. Projects and compilation units are not
    /// searchable targets.
    pub fn for_element(element: impl Into<Element>, limit_to: LimitTo) -> Result<Self> {
        let target = match element.into() {
            Element::Type(key) => PatternTarget::Type(key),
            Element::Method(handle) => PatternTarget::Method(handle),
            Element::Field(handle) => PatternTarget::Field(handle),
            other => {
                return Err(Error::InvalidPattern(format!(
                    "{:?} is not a searchable element",
                    other
                )));
            }
        };
        Ok(Self { target, limit_to })
    }

    /// Parse `Object`, `java.lang.Obj*`, `p.X.foo(Object, int)` or `X.f`.
    pub fn from_string(text: &str, kind: SearchFor, limit_to: LimitTo, case_sensitive: bool) -> Result<Self> {
        let text = text.trim();
        let invalid = || Error::InvalidPattern(text.to_string());

        let (path, params) = match (kind, text.find('(')) {
            (SearchFor::Method, Some(open)) => {
                let inner = text[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
                let params = if inner.trim().is_empty() {
                    Vec::new()
                } else {
                    inner
                        .split(',')
                        .map(|p| {
                            let p = p.trim();
                            if p.is_empty() {
                                Err(invalid())
                            } else {
                                Ok(erase_signature(p))
                            }
                        })
                        .collect::<Result<Vec<_>>>()?
                };
                (&text[..open], Some(params))
            }
            _ => (text, None),
        };

        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| !is_pattern_segment(s)) {
            return Err(invalid());
        }
        let (name, qualifier) = match segments.split_last() {
            Some((name, [])) => (*name, None),
            Some((name, rest)) => (*name, Some(rest.join("."))),
            None => return Err(invalid()),
        };
        Ok(Self {
            target: PatternTarget::Name {
                kind,
                qualifier: qualifier.map(|q| NamePattern::new(q, case_sensitive)),
                name: NamePattern::new(name, case_sensitive),
                params,
            },
            limit_to,
        })
    }
}

/// One dotted segment: identifier characters and wildcards.
fn is_pattern_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let wildcard = |c: char| c == '*' || c == '?';
    (unicode_ident::is_xid_start(first) || first == '_' || first == '$' || wildcard(first))
        && chars.all(|c| unicode_ident::is_xid_continue(c) || c == '$' || wildcard(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Object", "Object", true)]
    #[case("Obj*", "Object", true)]
    #[case("*ect", "Object", true)]
    #[case("O?ject", "Object", true)]
    #[case("*", "", true)]
    #[case("Obj", "Object", false)]
    #[case("a*b*c", "aXbYc", true)]
    #[case("a*b*c", "aXbY", false)]
    fn test_glob(#[case] pattern: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(NamePattern::new(pattern, true).matches(name), expected);
    }

    #[test]
    fn test_case_insensitive_has_no_exact_word() {
        let pattern = NamePattern::new("object", false);
        assert!(pattern.matches("Object"));
        assert_eq!(pattern.exact_word(), None);
        assert_eq!(NamePattern::new("Object", true).exact_word(), Some("Object"));
    }

    #[test]
    fn test_parse_qualified_method_with_params() {
        let pattern = SearchPattern::from_string(
            "p.X.foo(Object, int[])",
            SearchFor::Method,
            LimitTo::References,
            true,
        )
        .unwrap();
        let PatternTarget::Name {
            qualifier,
            name,
            params,
            ..
        } = pattern.target
        else {
            panic!("expected a name pattern");
        };
        assert_eq!(qualifier.unwrap().as_str(), "p.X");
        assert_eq!(name.as_str(), "foo");
        assert_eq!(params.unwrap(), ["Object", "int[]"]);
    }

    #[rstest]
    #[case("")]
    #[case("p..X")]
    #[case("foo(")]
    #[case("foo(int,)")]
    #[case("1abc")]
    fn test_invalid_patterns(#[case] text: &str) {
        assert!(matches!(
            SearchPattern::from_string(text, SearchFor::Method, LimitTo::Declarations, true),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_projects_are_not_searchable() {
        assert!(SearchPattern::for_element(Element::Project("P1".into()), LimitTo::References).is_err());
    }
}
