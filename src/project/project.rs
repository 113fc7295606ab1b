//! Java projects and their classpath configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::{FileId, ProjectId};
use crate::env::ModuleDescription;
use crate::hir::{SourceFile, TypeKey};

/// One entry of a project's build path, after its own source folders.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClasspathEntry {
    /// An archive named by its registered path.
    Library { path: SmolStr },
    /// An archive named through a classpath variable, e.g. `JCL_LIB`.
    Variable { name: SmolStr },
    /// Another project's sources. Its own entries are only inherited when it
    /// marks them `exported`.
    Project { name: SmolStr, exported: bool },
}

/// Everything needed to create a project.
///
/// ```
/// use jseek::ProjectConfig;
///
/// let config = ProjectConfig::new("P2").variable("JCL_LIB").requires("P1");
/// assert_eq!(config.name(), "P2");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectConfig {
    name: SmolStr,
    source_folders: Vec<SmolStr>,
    classpath: Vec<ClasspathEntry>,
    module: Option<ModuleDescription>,
}

impl ProjectConfig {
    /// A project whose root is its only source folder, with an empty
    /// classpath.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            source_folders: vec![SmolStr::default()],
            classpath: Vec::new(),
            module: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the source folders. `""` is the project root; an empty list
    /// makes a project with no sources.
    pub fn source_folders<S: AsRef<str>>(mut self, folders: &[S]) -> Self {
        self.source_folders = folders
            .iter()
            .map(|f| SmolStr::new(f.as_ref().trim_matches('/')))
            .collect();
        self
    }

    pub fn library(mut self, path: impl Into<SmolStr>) -> Self {
        self.classpath.push(ClasspathEntry::Library { path: path.into() });
        self
    }

    pub fn variable(mut self, name: impl Into<SmolStr>) -> Self {
        self.classpath.push(ClasspathEntry::Variable { name: name.into() });
        self
    }

    pub fn requires(mut self, project: impl Into<SmolStr>) -> Self {
        self.classpath.push(ClasspathEntry::Project {
            name: project.into(),
            exported: false,
        });
        self
    }

    pub fn requires_exported(mut self, project: impl Into<SmolStr>) -> Self {
        self.classpath.push(ClasspathEntry::Project {
            name: project.into(),
            exported: true,
        });
        self
    }

    pub fn entry(mut self, entry: ClasspathEntry) -> Self {
        self.classpath.push(entry);
        self
    }

    pub fn module(mut self, module: ModuleDescription) -> Self {
        self.module = Some(module);
        self
    }
}

/// A project inside one workspace snapshot.
#[derive(Clone, Debug)]
pub struct Project {
    pub id: ProjectId,
    pub name: SmolStr,
    source_folders: Vec<SmolStr>,
    classpath: Vec<ClasspathEntry>,
    module: Option<ModuleDescription>,
    folders: BTreeSet<SmolStr>,
    /// Project-relative path → file, for every resource.
    files: BTreeMap<SmolStr, FileId>,
    /// Qualified name → type, over compilation units in source folders.
    types: FxHashMap<SmolStr, TypeKey>,
    /// Every package with a compilation unit, and every prefix of one.
    packages: FxHashSet<SmolStr>,
}

impl Project {
    pub(crate) fn new(id: ProjectId, config: ProjectConfig) -> Self {
        let folders = config
            .source_folders
            .iter()
            .filter(|f| !f.is_empty())
            .cloned()
            .collect();
        Self {
            id,
            name: config.name,
            source_folders: config.source_folders,
            classpath: config.classpath,
            module: config.module,
            folders,
            files: BTreeMap::new(),
            types: FxHashMap::default(),
            packages: FxHashSet::default(),
        }
    }

    /// Configuration that recreates this project under another name.
    pub fn config_as(&self, name: impl Into<SmolStr>) -> ProjectConfig {
        ProjectConfig {
            name: name.into(),
            source_folders: self.source_folders.clone(),
            classpath: self.classpath.clone(),
            module: self.module.clone(),
        }
    }

    pub fn source_folders(&self) -> &[SmolStr] {
        &self.source_folders
    }

    pub fn classpath(&self) -> &[ClasspathEntry] {
        &self.classpath
    }

    pub fn module(&self) -> Option<&ModuleDescription> {
        self.module.as_ref()
    }

    /// Names of projects this one requires directly.
    pub fn required_projects(&self) -> impl Iterator<Item = &SmolStr> {
        self.classpath.iter().filter_map(|entry| match entry {
            ClasspathEntry::Project { name, .. } => Some(name),
            _ => None,
        })
    }

    pub fn requires(&self, project: &str) -> bool {
        self.required_projects().any(|name| name == project)
    }

    pub fn folders(&self) -> impl Iterator<Item = &SmolStr> {
        self.folders.iter()
    }

    pub fn has_folder(&self, path: &str) -> bool {
        path.is_empty() || self.folders.contains(path)
    }

    pub(crate) fn add_folder(&mut self, path: &str) {
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            self.folders.insert(SmolStr::new(&prefix));
        }
    }

    /// Every resource, ordered by path.
    pub fn files(&self) -> impl Iterator<Item = (&SmolStr, FileId)> {
        self.files.iter().map(|(path, &id)| (path, id))
    }

    pub fn file(&self, path: &str) -> Option<FileId> {
        self.files.get(path).copied()
    }

    pub(crate) fn insert_file(&mut self, path: SmolStr, id: FileId) {
        self.files.insert(path, id);
    }

    pub(crate) fn remove_file(&mut self, path: &str) -> Option<FileId> {
        self.files.remove(path)
    }

    /// Whether the resource at `path` is a Java compilation unit on this
    /// project's source path.
    pub fn is_compilation_unit(&self, path: &str) -> bool {
        path.ends_with(".java")
            && self.source_folders.iter().any(|folder| {
                folder.is_empty()
                    || path
                        .strip_prefix(folder.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }

    /// Compilation units in source folders, ordered by path.
    pub fn compilation_units(&self) -> impl Iterator<Item = (&SmolStr, FileId)> {
        self.files().filter(|(path, _)| self.is_compilation_unit(path))
    }

    pub fn lookup_type(&self, qualified_name: &str) -> Option<&TypeKey> {
        self.types.get(qualified_name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeKey> {
        self.types.values()
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    /// Recompute the type and package tables from the current files. The
    /// first declaration of a qualified name, in path order, wins.
    pub(crate) fn rebuild_types(&mut self, sources: &FxHashMap<FileId, Arc<SourceFile>>) {
        let mut types = FxHashMap::default();
        let mut packages = FxHashSet::default();
        for (_, id) in self.compilation_units() {
            let Some(file) = sources.get(&id) else {
                continue;
            };
            if file.unit().is_some() {
                let package = file.package();
                let mut prefix = String::new();
                for segment in package.split('.').filter(|s| !s.is_empty()) {
                    if !prefix.is_empty() {
                        prefix.push('.');
                    }
                    prefix.push_str(segment);
                    packages.insert(SmolStr::new(&prefix));
                }
            }
            for info in file.types() {
                types
                    .entry(info.key.qualified_name.clone())
                    .or_insert_with(|| info.key.clone());
            }
        }
        self.types = types;
        self.packages = packages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(config: ProjectConfig) -> Project {
        Project::new(ProjectId::new(0), config)
    }

    #[test]
    fn test_config_builder() {
        let config = ProjectConfig::new("P3")
            .variable("JCL_LIB")
            .requires("P0")
            .requires_exported("P2");
        let p = project(config);
        assert_eq!(p.source_folders(), [""]);
        assert_eq!(p.required_projects().collect::<Vec<_>>(), ["P0", "P2"]);
        assert!(p.requires("P2"));
        assert!(!p.requires("P1"));
    }

    #[test]
    fn test_compilation_units_respect_source_folders() {
        let root = project(ProjectConfig::new("P"));
        assert!(root.is_compilation_unit("p/X.java"));
        assert!(!root.is_compilation_unit("p/readme.txt"));

        let src = project(ProjectConfig::new("P").source_folders(&["src"]));
        assert!(src.is_compilation_unit("src/p/X.java"));
        assert!(!src.is_compilation_unit("srcx/X.java"));
        assert!(!src.is_compilation_unit("p/X.java"));

        let none = project(ProjectConfig::new("P").source_folders::<&str>(&[]));
        assert!(!none.is_compilation_unit("X.java"));
    }

    #[test]
    fn test_folders_include_parents() {
        let mut p = project(ProjectConfig::new("P"));
        p.add_folder("a/b/c");
        assert!(p.has_folder("a"));
        assert!(p.has_folder("a/b"));
        assert!(p.has_folder("a/b/c"));
        assert!(p.has_folder(""));
        assert!(!p.has_folder("b"));
    }

    #[test]
    fn test_rebuild_types_indexes_packages() {
        let mut p = project(ProjectConfig::new("P"));
        let file = Arc::new(SourceFile::new(
            FileId::new(1),
            "P",
            "a/b/X.java",
            "package a.b; public class X {}",
        ));
        p.insert_file(file.path.clone(), file.id);
        let mut sources = FxHashMap::default();
        sources.insert(file.id, file);
        p.rebuild_types(&sources);
        assert!(p.lookup_type("a.b.X").is_some());
        assert!(p.has_package("a"));
        assert!(p.has_package("a.b"));
        assert!(!p.has_package("b"));
    }
}
