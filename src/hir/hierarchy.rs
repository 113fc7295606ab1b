//! Type hierarchies: every supertype and subtype of one focus type.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::ids::{Origin, TypeKey};
use super::resolve::Semantics;

/// Supertypes and subtypes of a focus type.
///
/// Supertypes are resolved from each type's own declaration site. Subtypes
/// can only live where the focus type is visible: its own project and every
/// project depending on it, directly or not.
#[derive(Clone, Debug)]
pub struct TypeHierarchy {
    focus: TypeKey,
    /// Nearest first.
    supertypes: Vec<TypeKey>,
    /// Breadth-first from the focus, in project and path order.
    subtypes: Vec<TypeKey>,
    members: FxHashSet<TypeKey>,
}

impl TypeHierarchy {
    pub fn compute(sema: &Semantics<'_>, focus: &TypeKey) -> Self {
        let supertypes = sema.all_supertypes(focus);
        let subtypes = compute_subtypes(sema, focus);

        let mut members = FxHashSet::default();
        members.insert(focus.clone());
        members.extend(supertypes.iter().cloned());
        members.extend(subtypes.iter().cloned());
        tracing::debug!(
            focus = %focus,
            supertypes = supertypes.len(),
            subtypes = subtypes.len(),
            "computed type hierarchy"
        );
        Self {
            focus: focus.clone(),
            supertypes,
            subtypes,
            members,
        }
    }

    pub fn focus(&self) -> &TypeKey {
        &self.focus
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.members.contains(key)
    }

    /// Whether `key` is a proper supertype of the focus.
    pub fn is_supertype(&self, key: &TypeKey) -> bool {
        self.supertypes.contains(key)
    }

    /// Whether `key` is a proper subtype of the focus.
    pub fn is_subtype(&self, key: &TypeKey) -> bool {
        self.subtypes.contains(key)
    }

    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    pub fn subtypes(&self) -> &[TypeKey] {
        &self.subtypes
    }

    /// Focus, then supertypes, then subtypes.
    pub fn types(&self) -> impl Iterator<Item = &TypeKey> {
        std::iter::once(&self.focus)
            .chain(self.supertypes.iter())
            .chain(self.subtypes.iter())
    }
}

/// Projects in which a type declared by `key` can be referenced, by name.
pub(crate) fn projects_seeing(sema: &Semantics<'_>, key: &TypeKey) -> Vec<SmolStr> {
    let snapshot = sema.snapshot();
    let mut roots: Vec<SmolStr> = Vec::new();
    match key.origin {
        Origin::Source(_) => roots.extend(snapshot.project_of(key).cloned()),
        Origin::Binary(archive) => roots.extend(
            snapshot
                .projects()
                .filter(|p| snapshot.libraries(p).iter().any(|a| a.id == archive))
                .map(|p| p.name.clone()),
        ),
    }
    let mut names: Vec<SmolStr> = roots.clone();
    for root in &roots {
        names.extend(snapshot.dependents(root));
    }
    names.sort();
    names.dedup();
    names
}

fn compute_subtypes(sema: &Semantics<'_>, focus: &TypeKey) -> Vec<TypeKey> {
    let snapshot = sema.snapshot();
    let mut candidates: Vec<TypeKey> = Vec::new();
    for name in projects_seeing(sema, focus) {
        let Some(project) = snapshot.project(&name) else {
            continue;
        };
        for (_, file) in project.compilation_units() {
            if let Some(source) = snapshot.source(file) {
                candidates.extend(source.types().iter().map(|t| t.key.clone()));
            }
        }
    }
    if let Origin::Binary(archive) = focus.origin {
        if let Some(archive) = snapshot.archive(archive) {
            candidates.extend(archive.types().iter().map(|t| t.key.clone()));
        }
    }

    let mut direct: FxHashMap<TypeKey, Vec<TypeKey>> = FxHashMap::default();
    for candidate in &candidates {
        for sup in sema.direct_supertypes(candidate) {
            direct.entry(sup).or_default().push(candidate.clone());
        }
    }

    let mut seen = FxHashSet::default();
    seen.insert(focus.clone());
    let mut subtypes = Vec::new();
    let mut queue = VecDeque::from([focus.clone()]);
    while let Some(current) = queue.pop_front() {
        for sub in direct.get(&current).into_iter().flatten() {
            if seen.insert(sub.clone()) {
                subtypes.push(sub.clone());
                queue.push_back(sub.clone());
            }
        }
    }
    subtypes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectConfig, Workspace};

    fn chain() -> Workspace {
        let ws = Workspace::new();
        ws.create_project(ProjectConfig::new("P0")).unwrap();
        ws.create_file("/P0/X.java", "public class X { public void foo() {} }")
            .unwrap();
        ws.create_project(ProjectConfig::new("P1").variable("JCL_LIB").requires("P0"))
            .unwrap();
        ws.create_file("/P1/Y.java", "public class Y extends X {}").unwrap();
        ws.create_project(ProjectConfig::new("P2").requires("P0").requires("P1"))
            .unwrap();
        ws.create_file("/P2/Z.java", "public class Z extends Y implements Runnable {}")
            .unwrap();
        ws.create_project(ProjectConfig::new("Other")).unwrap();
        ws.create_file("/Other/W.java", "public class W extends X {}").unwrap();
        ws
    }

    fn key(ws: &Workspace, path: &str, name: &str) -> TypeKey {
        ws.find_type(ws.compilation_unit(path).unwrap(), name).unwrap()
    }

    #[test]
    fn test_subtypes_across_dependent_projects() {
        let ws = chain();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let x = key(&ws, "/P0/X.java", "X");
        let hierarchy = TypeHierarchy::compute(&sema, &x);
        let subs: Vec<_> = hierarchy
            .subtypes()
            .iter()
            .map(|k| k.qualified_name.as_str())
            .collect();
        // Other cannot see P0, so its W is not a subtype
        assert_eq!(subs, ["Y", "Z"]);
        assert!(hierarchy.supertypes().is_empty());
    }

    #[test]
    fn test_supertypes_from_each_declaration_site() {
        let ws = chain();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let y = key(&ws, "/P1/Y.java", "Y");
        let hierarchy = TypeHierarchy::compute(&sema, &y);
        let x = key(&ws, "/P0/X.java", "X");
        assert!(hierarchy.is_supertype(&x));
        assert!(hierarchy.is_subtype(&key(&ws, "/P2/Z.java", "Z")));
        assert!(!hierarchy.contains(&key(&ws, "/Other/W.java", "W")));
        assert_eq!(hierarchy.types().next(), Some(&y));
    }

    #[test]
    fn test_projects_seeing_follow_dependents() {
        let ws = chain();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let x = key(&ws, "/P0/X.java", "X");
        assert_eq!(projects_seeing(&sema, &x), ["P0", "P1", "P2"]);
        let object = snapshot
            .archive_by_path(crate::project::JCL_ARCHIVE_PATH)
            .and_then(|a| a.lookup_type("java.lang.Object"))
            .cloned()
            .unwrap();
        assert_eq!(projects_seeing(&sema, &object), ["P1", "P2"]);
    }
}
