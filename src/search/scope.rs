//! Search scopes: which documents a search visits and which matches in them
//! count.
//!
//! A scope is computed once from a snapshot and never changes. Documents are
//! kept in (project, resource path) order, which is the order a search
//! reports them in.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::{ArchiveId, FileId};
use crate::error::{Error, Result};
use crate::hir::{Element, Origin, Semantics, TypeHierarchy, TypeKey};
use crate::project::WorkspaceSnapshot;

/// A searchable unit: a compilation unit, or an archive as seen from one
/// project.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocKey {
    Source(FileId),
    Archive(ArchiveId),
}

/// Which parts of a document a scope covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocFilter {
    All,
    /// Only code inside these types, their members and nested types.
    Types(Arc<FxHashSet<TypeKey>>),
}

impl DocFilter {
    /// `enclosing` lists the types around a match, innermost first.
    pub fn encloses(&self, enclosing: &[TypeKey]) -> bool {
        match self {
            DocFilter::All => true,
            DocFilter::Types(types) => enclosing.iter().any(|key| types.contains(key)),
        }
    }

    fn union(&mut self, other: DocFilter) {
        match (&mut *self, other) {
            (DocFilter::All, _) => {}
            (_, DocFilter::All) => *self = DocFilter::All,
            (DocFilter::Types(mine), DocFilter::Types(theirs)) => {
                Arc::make_mut(mine).extend(theirs.iter().cloned());
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeDocument {
    pub key: DocKey,
    /// The project matches in this document are attributed to.
    pub project: SmolStr,
    /// Project-relative path for sources, the archive path for archives.
    pub resource: SmolStr,
    pub filter: DocFilter,
}

impl ScopeDocument {
    pub fn encloses(&self, enclosing: &[TypeKey]) -> bool {
        self.filter.encloses(enclosing)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Elements,
    Hierarchy(TypeKey),
    Workspace,
}

#[derive(Clone, Debug)]
pub struct SearchScope {
    kind: ScopeKind,
    projects: Vec<SmolStr>,
    documents: Vec<ScopeDocument>,
}

/// Collects documents, merging filters of repeated ones.
#[derive(Default)]
struct ScopeBuilder {
    projects: Vec<SmolStr>,
    /// (project, resource) → document
    documents: BTreeMap<(SmolStr, SmolStr), ScopeDocument>,
}

impl ScopeBuilder {
    fn add_project_name(&mut self, name: &SmolStr) {
        if !self.projects.contains(name) {
            self.projects.push(name.clone());
        }
    }

    fn add(&mut self, document: ScopeDocument) {
        // an archive is reported for the first project it was added for
        if matches!(document.key, DocKey::Archive(_))
            && self
                .documents
                .values()
                .any(|d| d.key == document.key && d.project != document.project)
        {
            return;
        }
        let slot = (document.project.clone(), document.resource.clone());
        match self.documents.get_mut(&slot) {
            Some(existing) => existing.filter.union(document.filter),
            None => {
                self.documents.insert(slot, document);
            }
        }
    }

    fn add_source(&mut self, snapshot: &WorkspaceSnapshot, file: FileId, filter: DocFilter) -> bool {
        let Some(source) = snapshot.source(file) else {
            return false;
        };
        self.add_project_name(&source.project);
        self.add(ScopeDocument {
            key: DocKey::Source(file),
            project: source.project.clone(),
            resource: source.path.clone(),
            filter,
        });
        true
    }

    fn add_archive(&mut self, snapshot: &WorkspaceSnapshot, archive: ArchiveId, project: &SmolStr, filter: DocFilter) {
        let Some(archive) = snapshot.archive(archive) else {
            return;
        };
        self.add(ScopeDocument {
            key: DocKey::Archive(archive.id),
            project: project.clone(),
            resource: archive.path.clone(),
            filter,
        });
    }

    /// Every compilation unit of a project, plus the archives on its own
    /// classpath.
    fn add_whole_project(&mut self, snapshot: &WorkspaceSnapshot, name: &str) -> Result<()> {
        let project = snapshot
            .project(name)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))?;
        self.add_project_name(&project.name);
        for (_, file) in project.compilation_units() {
            self.add_source(snapshot, file, DocFilter::All);
        }
        for archive in snapshot.libraries(project) {
            self.add_archive(snapshot, archive.id, &project.name, DocFilter::All);
        }
        Ok(())
    }

    fn finish(self, kind: ScopeKind) -> SearchScope {
        SearchScope {
            kind,
            projects: self.projects,
            documents: self.documents.into_values().collect(),
        }
    }
}

/// The first project, by name, with `archive` on its own classpath.
fn first_project_with_archive<'a>(
    snapshot: &WorkspaceSnapshot,
    archive: ArchiveId,
    among: impl IntoIterator<Item = &'a SmolStr>,
) -> Option<SmolStr> {
    let mut names: Vec<&SmolStr> = among.into_iter().collect();
    names.sort();
    names.into_iter().find_map(|name| {
        let project = snapshot.project(name)?;
        snapshot
            .libraries(project)
            .iter()
            .any(|a| a.id == archive)
            .then(|| name.clone())
    })
}

impl SearchScope {
    /// The union of the given elements. A project covers its own sources and
    /// archives, never the projects it requires. A type, method or field
    /// covers the declaring type's code only.
    pub fn from_elements(snapshot: &WorkspaceSnapshot, elements: &[Element]) -> Result<Self> {
        let mut builder = ScopeBuilder::default();
        for element in elements {
            match element {
                Element::Project(name) => builder.add_whole_project(snapshot, name)?,
                Element::CompilationUnit(file) => {
                    if !builder.add_source(snapshot, *file, DocFilter::All) {
                        return Err(Error::ElementNotFound(format!("{:?}", file)));
                    }
                }
                Element::Type(key) => add_type(&mut builder, snapshot, key)?,
                Element::Method(handle) => add_type(&mut builder, snapshot, &handle.owner)?,
                Element::Field(handle) => add_type(&mut builder, snapshot, &handle.owner)?,
            }
        }
        let scope = builder.finish(ScopeKind::Elements);
        tracing::debug!(
            elements = elements.len(),
            documents = scope.documents.len(),
            "built element scope"
        );
        Ok(scope)
    }

    /// Every type in `focus`'s hierarchy, searched in every project that can
    /// see one of them. Only code inside hierarchy types is enclosed.
    pub fn hierarchy(snapshot: &WorkspaceSnapshot, focus: &TypeKey) -> Result<Self> {
        if snapshot.type_info(focus).is_none() {
            return Err(Error::ElementNotFound(focus.to_string()));
        }
        let sema = Semantics::new(snapshot);
        let hierarchy = TypeHierarchy::compute(&sema, focus);
        Ok(Self::from_hierarchy(&sema, &hierarchy))
    }

    pub fn from_hierarchy(sema: &Semantics<'_>, hierarchy: &TypeHierarchy) -> Self {
        let snapshot = sema.snapshot();
        let types: Arc<FxHashSet<TypeKey>> = Arc::new(hierarchy.types().cloned().collect());

        // archive types only add their archive, unless nothing else is left
        let source_types: Vec<&TypeKey> = hierarchy
            .types()
            .filter(|key| matches!(key.origin, Origin::Source(_)))
            .collect();
        let roots: Vec<&TypeKey> = if source_types.is_empty() {
            hierarchy.types().collect()
        } else {
            source_types
        };
        let mut candidates: Vec<SmolStr> = roots
            .into_iter()
            .flat_map(|key| crate::hir::projects_seeing(sema, key))
            .collect();
        candidates.sort();
        candidates.dedup();

        let mut builder = ScopeBuilder::default();
        for name in &candidates {
            let Some(project) = snapshot.project(name) else {
                continue;
            };
            builder.add_project_name(name);
            for (_, file) in project.compilation_units() {
                builder.add_source(snapshot, file, DocFilter::Types(types.clone()));
            }
        }
        let mut archives: Vec<ArchiveId> = hierarchy
            .types()
            .filter_map(|key| match key.origin {
                Origin::Binary(id) => Some(id),
                Origin::Source(_) => None,
            })
            .collect();
        archives.sort();
        archives.dedup();
        for archive in archives {
            match first_project_with_archive(snapshot, archive, &candidates) {
                Some(project) => builder.add_archive(snapshot, archive, &project, DocFilter::Types(types.clone())),
                None => tracing::debug!(?archive, "no candidate project holds archive"),
            }
        }

        let scope = builder.finish(ScopeKind::Hierarchy(hierarchy.focus().clone()));
        tracing::debug!(
            focus = %hierarchy.focus(),
            projects = ?scope.projects,
            documents = scope.documents.len(),
            "built hierarchy scope"
        );
        scope
    }

    /// Every project and every archive on some project's classpath.
    pub fn workspace(snapshot: &WorkspaceSnapshot) -> Self {
        let mut builder = ScopeBuilder::default();
        for project in snapshot.projects() {
            // projects come from the snapshot itself, so this cannot fail
            if let Err(err) = builder.add_whole_project(snapshot, &project.name) {
                tracing::warn!(%err, "skipping project");
            }
        }
        builder.finish(ScopeKind::Workspace)
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    /// Projects the scope was built over, in the order they were added.
    pub fn projects(&self) -> &[SmolStr] {
        &self.projects
    }

    pub fn documents(&self) -> &[ScopeDocument] {
        &self.documents
    }

    pub fn includes_project(&self, name: &str) -> bool {
        self.projects.iter().any(|p| p == name)
    }

    pub fn includes_file(&self, file: FileId) -> bool {
        self.documents.iter().any(|d| d.key == DocKey::Source(file))
    }

    /// Whether code directly inside `key` is searched.
    pub fn encloses_type(&self, snapshot: &WorkspaceSnapshot, key: &TypeKey) -> bool {
        let doc_key = match key.origin {
            Origin::Source(file) => DocKey::Source(file),
            Origin::Binary(archive) => DocKey::Archive(archive),
        };
        let mut chain = vec![key.clone()];
        let mut current = snapshot.type_info(key).and_then(|i| i.outer.clone());
        while let Some(outer) = current {
            let outer_key = TypeKey::new(key.origin, outer);
            current = snapshot.type_info(&outer_key).and_then(|i| i.outer.clone());
            chain.push(outer_key);
        }
        self.documents
            .iter()
            .any(|d| d.key == doc_key && d.encloses(&chain))
    }
}

fn add_type(builder: &mut ScopeBuilder, snapshot: &WorkspaceSnapshot, key: &TypeKey) -> Result<()> {
    if snapshot.type_info(key).is_none() {
        return Err(Error::ElementNotFound(key.to_string()));
    }
    let filter = DocFilter::Types(Arc::new(FxHashSet::from_iter([key.clone()])));
    match key.origin {
        Origin::Source(file) => {
            builder.add_source(snapshot, file, filter);
        }
        Origin::Binary(archive) => {
            let names: Vec<SmolStr> = snapshot.projects().map(|p| p.name.clone()).collect();
            match first_project_with_archive(snapshot, archive, &names) {
                Some(project) => {
                    builder.add_project_name(&project);
                    builder.add_archive(snapshot, archive, &project, filter);
                }
                None => tracing::debug!(type_key = %key, "archive is on no classpath"),
            }
        }
    }
    Ok(())
}
