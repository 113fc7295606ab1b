//! The workspace: projects, files and archives behind one swappable snapshot.
//!
//! Readers take an `Arc<WorkspaceSnapshot>` and keep it for as long as they
//! need a consistent view. Every mutation forks the current snapshot, edits
//! the fork and swaps it in under the write lock, so a search sees the
//! project graph entirely before or entirely after a change.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::archive::{Archive, JCL_VARIABLE};
use super::project::{ClasspathEntry, Project, ProjectConfig};
use crate::base::{ArchiveId, FileId, IdAllocator, ProjectId};
use crate::env::{ModuleDescription, ProjectEnvironment};
use crate::error::{Error, Result};
use crate::hir::{FieldHandle, MethodHandle, Origin, SourceFile, TypeInfo, TypeKey};
use crate::search::SearchIndex;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// An immutable state of the whole workspace.
#[derive(Debug)]
pub struct WorkspaceSnapshot {
    ids: IdAllocator,
    /// Ordered by name.
    projects: BTreeMap<SmolStr, Arc<Project>>,
    /// Raw contents of every resource.
    contents: FxHashMap<FileId, Arc<str>>,
    /// Parsed compilation units (resources in source folders ending `.java`).
    sources: FxHashMap<FileId, Arc<SourceFile>>,
    /// Registered archives by path, in registration order.
    archives: IndexMap<SmolStr, Arc<Archive>>,
    variables: IndexMap<SmolStr, SmolStr>,
    /// Built on first search against this snapshot.
    index: OnceCell<Arc<SearchIndex>>,
}

impl WorkspaceSnapshot {
    fn empty() -> Self {
        Self {
            ids: IdAllocator::default(),
            projects: BTreeMap::new(),
            contents: FxHashMap::default(),
            sources: FxHashMap::default(),
            archives: IndexMap::new(),
            variables: IndexMap::new(),
            index: OnceCell::new(),
        }
    }

    /// A mutable copy sharing all unchanged files and projects.
    fn fork(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            projects: self.projects.clone(),
            contents: self.contents.clone(),
            sources: self.sources.clone(),
            archives: self.archives.clone(),
            variables: self.variables.clone(),
            index: OnceCell::new(),
        }
    }

    // ------------------------------------------------------------------
    // projects and files
    // ------------------------------------------------------------------

    pub fn project(&self, name: &str) -> Option<&Arc<Project>> {
        self.projects.get(name)
    }

    /// Projects ordered by name.
    pub fn projects(&self) -> impl Iterator<Item = &Arc<Project>> {
        self.projects.values()
    }

    pub fn source(&self, file: FileId) -> Option<&Arc<SourceFile>> {
        self.sources.get(&file)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Arc<SourceFile>> {
        self.sources.values()
    }

    pub fn contents(&self, file: FileId) -> Option<&Arc<str>> {
        self.contents.get(&file)
    }

    /// Resolve `/Project/path/To.java` to a compilation unit.
    pub fn compilation_unit(&self, path: &str) -> Result<FileId> {
        let (project, rel) = split_path(path)?;
        let project = self.require_project(project)?;
        project
            .file(rel)
            .filter(|id| self.sources.contains_key(id))
            .ok_or_else(|| Error::ResourceNotFound(path.to_string()))
    }

    fn require_project(&self, name: &str) -> Result<&Arc<Project>> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    /// Projects that require `name`, directly or through other dependents.
    pub fn dependents(&self, name: &str) -> BTreeSet<SmolStr> {
        let mut found = BTreeSet::new();
        let mut stack = vec![SmolStr::new(name)];
        while let Some(current) = stack.pop() {
            for project in self.projects.values() {
                if project.requires(&current) && project.name != name {
                    if found.insert(project.name.clone()) {
                        stack.push(project.name.clone());
                    }
                }
            }
        }
        found
    }

    // ------------------------------------------------------------------
    // archives and variables
    // ------------------------------------------------------------------

    pub fn archive(&self, id: ArchiveId) -> Option<&Arc<Archive>> {
        self.archives.values().find(|a| a.id == id)
    }

    pub fn archive_by_path(&self, path: &str) -> Option<&Arc<Archive>> {
        self.archives.get(path)
    }

    pub fn archives(&self) -> impl Iterator<Item = &Arc<Archive>> {
        self.archives.values()
    }

    pub fn variable(&self, name: &str) -> Option<&SmolStr> {
        self.variables.get(name)
    }

    /// The archive a library or variable entry points at.
    pub fn resolve_library(&self, entry: &ClasspathEntry) -> Option<&Arc<Archive>> {
        match entry {
            ClasspathEntry::Library { path } => self.archive_by_path(path),
            ClasspathEntry::Variable { name } => self
                .variables
                .get(name.as_str())
                .and_then(|path| self.archive_by_path(path)),
            ClasspathEntry::Project { .. } => None,
        }
    }

    /// Archives on the project's own classpath, in entry order.
    pub fn libraries(&self, project: &Project) -> Vec<&Arc<Archive>> {
        let mut out: Vec<&Arc<Archive>> = Vec::new();
        for entry in project.classpath() {
            if let Some(archive) = self.resolve_library(entry) {
                if !out.iter().any(|a| a.id == archive.id) {
                    out.push(archive);
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // types and members
    // ------------------------------------------------------------------

    pub fn type_info(&self, key: &TypeKey) -> Option<&TypeInfo> {
        match key.origin {
            Origin::Source(file) => self.sources.get(&file)?.type_info(&key.qualified_name),
            Origin::Binary(archive) => self.archive(archive)?.type_info(&key.qualified_name),
        }
    }

    /// The project declaring a source type.
    pub fn project_of(&self, key: &TypeKey) -> Option<&SmolStr> {
        let file = key.origin.file()?;
        self.sources.get(&file).map(|f| &f.project)
    }

    /// Environment of `project`'s full classpath.
    pub fn environment(&self, project: &str) -> Option<ProjectEnvironment<'_>> {
        self.projects
            .get(project)
            .map(|p| ProjectEnvironment::new(self, p.clone()))
    }

    /// The type `simple_name` declared in a compilation unit.
    pub fn find_type(&self, file: FileId, simple_name: &str) -> Result<TypeKey> {
        self.sources
            .get(&file)
            .and_then(|f| f.type_named(simple_name))
            .map(|info| info.key.clone())
            .ok_or_else(|| Error::ElementNotFound(format!("{} in {:?}", simple_name, file)))
    }

    /// A method by selector and parameter signatures (`"QObject;"` or
    /// `"Object"`).
    pub fn find_method<S: AsRef<str>>(
        &self,
        owner: &TypeKey,
        selector: &str,
        params: &[S],
    ) -> Result<MethodHandle> {
        let wanted = MethodHandle::new(owner.clone(), selector, params);
        let info = self
            .type_info(owner)
            .ok_or_else(|| Error::ElementNotFound(owner.to_string()))?;
        info.methods
            .iter()
            .map(|m| m.handle(owner))
            .find(|handle| *handle == wanted)
            .ok_or_else(|| Error::ElementNotFound(format!("{:?}", wanted)))
    }

    pub fn find_field(&self, owner: &TypeKey, name: &str) -> Result<FieldHandle> {
        self.type_info(owner)
            .and_then(|info| info.field(name))
            .map(|field| field.handle(owner))
            .ok_or_else(|| Error::ElementNotFound(format!("{}.{}", owner, name)))
    }

    /// The word index of this snapshot, built on first use.
    pub fn index(&self) -> Arc<SearchIndex> {
        self.index
            .get_or_init(|| Arc::new(SearchIndex::build(self)))
            .clone()
    }

    // ------------------------------------------------------------------
    // edits (on a fork)
    // ------------------------------------------------------------------

    fn project_mut(&mut self, name: &str) -> Result<&mut Project> {
        self.projects
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    fn add_project(&mut self, config: ProjectConfig) -> Result<ProjectId> {
        let name = config.name().to_string();
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidPath(name));
        }
        if self.projects.contains_key(name.as_str()) {
            return Err(Error::ProjectExists(name));
        }
        let id = self.ids.project();
        let project = Project::new(id, config);
        for entry in project.classpath() {
            match entry {
                ClasspathEntry::Project { name: required, .. } => {
                    if !self.projects.contains_key(required) {
                        tracing::warn!(project = %name, required = %required, "required project does not exist yet");
                    }
                }
                other => {
                    if self.resolve_library(other).is_none() {
                        tracing::warn!(project = %name, entry = ?other, "classpath entry does not resolve to an archive");
                    }
                }
            }
        }
        self.projects.insert(SmolStr::new(&name), Arc::new(project));
        tracing::debug!(project = %name, %id, "created project");
        Ok(id)
    }

    fn remove_project(&mut self, name: &str) -> Result<()> {
        let project = self
            .projects
            .remove(name)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))?;
        for (_, id) in project.files() {
            self.contents.remove(&id);
            self.sources.remove(&id);
        }
        tracing::debug!(project = %name, "deleted project");
        Ok(())
    }

    fn add_file(&mut self, project_name: &str, rel: &str, text: Arc<str>) -> Result<FileId> {
        let id = self.ids.file();
        let project = self.project_mut(project_name)?;
        project.insert_file(SmolStr::new(rel), id);
        let is_unit = project.is_compilation_unit(rel);
        self.contents.insert(id, text.clone());
        if is_unit {
            let source = SourceFile::new(id, project_name, rel, text);
            self.sources.insert(id, Arc::new(source));
        }
        self.rebuild_types(project_name)
            .map(|_| id)
    }

    fn rebuild_types(&mut self, project_name: &str) -> Result<()> {
        let sources = std::mem::take(&mut self.sources);
        let result = self
            .project_mut(project_name)
            .map(|project| project.rebuild_types(&sources));
        self.sources = sources;
        result
    }
}

/// Split `/Project/rel/path` into its project name and relative path.
fn split_path(path: &str) -> Result<(&str, &str)> {
    let trimmed = path
        .strip_prefix('/')
        .ok_or_else(|| Error::InvalidPath(path.to_string()))?
        .trim_end_matches('/');
    let (project, rel) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    if project.is_empty() || rel.split('/').any(|s| s == "." || s == "..") {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok((project, rel))
}

fn parent_folder(rel: &str) -> &str {
    rel.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

// ============================================================================
// WORKSPACE
// ============================================================================

/// A shared, mutable workspace.
///
/// Always contains the minimal class library at
/// [`JCL_ARCHIVE_PATH`](super::JCL_ARCHIVE_PATH), bound to the `JCL_LIB`
/// classpath variable.
#[derive(Debug)]
pub struct Workspace {
    state: RwLock<Arc<WorkspaceSnapshot>>,
}

impl Workspace {
    pub fn new() -> Self {
        let mut snapshot = WorkspaceSnapshot::empty();
        let jcl = Archive::jcl_min(snapshot.ids.archive());
        snapshot
            .variables
            .insert(SmolStr::new(JCL_VARIABLE), jcl.path.clone());
        snapshot.archives.insert(jcl.path.clone(), Arc::new(jcl));
        Self {
            state: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current state. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<WorkspaceSnapshot> {
        self.state.read().clone()
    }

    /// Apply `edit` to a fork and publish it, or publish nothing on error.
    fn mutate<T>(&self, edit: impl FnOnce(&mut WorkspaceSnapshot) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let mut next = state.fork();
        let out = edit(&mut next)?;
        *state = Arc::new(next);
        Ok(out)
    }

    pub fn create_project(&self, config: ProjectConfig) -> Result<ProjectId> {
        self.mutate(|s| s.add_project(config))
    }

    pub fn delete_project(&self, name: &str) -> Result<()> {
        self.mutate(|s| s.remove_project(name))
    }

    /// Delete every named project that exists, in one step. Missing names are
    /// skipped so this can run unconditionally during teardown.
    pub fn delete_projects<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.mutate(|s| {
            for name in names {
                let name = name.as_ref();
                if s.projects.contains_key(name) {
                    s.remove_project(name)?;
                } else {
                    tracing::debug!(project = name, "skipping delete of missing project");
                }
            }
            Ok(())
        })
    }

    /// Copy a project with all its folders and files. The copy's sources are
    /// independent: they declare types distinct from the original's.
    pub fn copy_project(&self, from: &str, to: &str) -> Result<ProjectId> {
        self.mutate(|s| {
            let source = s.require_project(from)?.clone();
            let id = s.add_project(source.config_as(to))?;
            let folders: Vec<SmolStr> = source.folders().cloned().collect();
            for folder in &folders {
                s.project_mut(to)?.add_folder(folder);
            }
            for (path, file) in source.files() {
                let text = s
                    .contents
                    .get(&file)
                    .cloned()
                    .ok_or_else(|| Error::ResourceNotFound(format!("/{}/{}", from, path)))?;
                s.add_file(to, path, text)?;
            }
            tracing::debug!(from, to, files = source.files().count(), "copied project");
            Ok(id)
        })
    }

    /// Create a folder, and any missing parents, inside a project.
    pub fn create_folder(&self, path: &str) -> Result<()> {
        let (project, rel) = split_path(path)?;
        if rel.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        self.mutate(|s| {
            let project = s.project_mut(project)?;
            if project.has_folder(rel) || project.file(rel).is_some() {
                return Err(Error::ResourceExists(path.to_string()));
            }
            project.add_folder(rel);
            Ok(())
        })
    }

    /// Create a file. Its parent folder must already exist.
    pub fn create_file(&self, path: &str, contents: &str) -> Result<FileId> {
        let (project_name, rel) = split_path(path)?;
        if rel.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        self.mutate(|s| {
            let project = s.require_project(project_name)?;
            if project.file(rel).is_some() || project.has_folder(rel) {
                return Err(Error::ResourceExists(path.to_string()));
            }
            let parent = parent_folder(rel);
            if !project.has_folder(parent) {
                return Err(Error::FolderNotFound(format!("/{}/{}", project_name, parent)));
            }
            let id = s.add_file(project_name, rel, Arc::from(contents))?;
            tracing::debug!(path, %id, "created file");
            Ok(id)
        })
    }

    pub fn set_file_contents(&self, path: &str, contents: &str) -> Result<()> {
        let (project_name, rel) = split_path(path)?;
        self.mutate(|s| {
            let project = s.require_project(project_name)?;
            let id = project
                .file(rel)
                .ok_or_else(|| Error::ResourceNotFound(path.to_string()))?;
            let is_unit = project.is_compilation_unit(rel);
            let text: Arc<str> = Arc::from(contents);
            s.contents.insert(id, text.clone());
            if is_unit {
                s.sources
                    .insert(id, Arc::new(SourceFile::new(id, project_name, rel, text)));
            }
            s.rebuild_types(project_name)
        })
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        let (project_name, rel) = split_path(path)?;
        self.mutate(|s| {
            let id = s
                .project_mut(project_name)?
                .remove_file(rel)
                .ok_or_else(|| Error::ResourceNotFound(path.to_string()))?;
            s.contents.remove(&id);
            s.sources.remove(&id);
            s.rebuild_types(project_name)
        })
    }

    /// Register an archive compiled from stub sources.
    pub fn register_archive<N: AsRef<str>, T: AsRef<str>>(
        &self,
        path: &str,
        sources: &[(N, T)],
        module: Option<ModuleDescription>,
    ) -> Result<ArchiveId> {
        self.mutate(|s| {
            if s.archives.contains_key(path) {
                return Err(Error::ResourceExists(path.to_string()));
            }
            let archive = Archive::from_sources(s.ids.archive(), path, sources, module)?;
            let id = archive.id;
            s.archives.insert(SmolStr::new(path), Arc::new(archive));
            Ok(id)
        })
    }

    /// Bind (or rebind) a classpath variable to a registered archive.
    pub fn set_classpath_variable(&self, name: &str, archive_path: &str) -> Result<()> {
        self.mutate(|s| {
            if !s.archives.contains_key(archive_path) {
                return Err(Error::ArchiveNotFound(archive_path.to_string()));
            }
            s.variables
                .insert(SmolStr::new(name), SmolStr::new(archive_path));
            Ok(())
        })
    }

    pub fn project(&self, name: &str) -> Result<Arc<Project>> {
        self.snapshot().require_project(name).cloned()
    }

    pub fn compilation_unit(&self, path: &str) -> Result<FileId> {
        self.snapshot().compilation_unit(path)
    }

    pub fn find_type(&self, file: FileId, simple_name: &str) -> Result<TypeKey> {
        self.snapshot().find_type(file, simple_name)
    }

    pub fn find_method<S: AsRef<str>>(
        &self,
        owner: &TypeKey,
        selector: &str,
        params: &[S],
    ) -> Result<MethodHandle> {
        self.snapshot().find_method(owner, selector, params)
    }

    pub fn find_field(&self, owner: &TypeKey, name: &str) -> Result<FieldHandle> {
        self.snapshot().find_field(owner, name)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
