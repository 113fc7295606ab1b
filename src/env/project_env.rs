//! The name environment of one project: its sources, then its classpath.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::module::{ModuleContext, ModuleDescription, NamedModule, UnnamedModule, is_visible};
use super::{ModuleAwareNameEnvironment, NameEnvironment, NameEnvironmentAnswer};
use crate::base::ArchiveId;
use crate::hir::TypeKey;
use crate::project::{Archive, ClasspathEntry, Project, WorkspaceSnapshot};

/// One place types can come from, in lookup order.
#[derive(Clone, Debug)]
pub enum ClasspathProvider {
    /// Compilation units in a project's source folders.
    Sources(Arc<Project>),
    Archive(Arc<Archive>),
}

impl ClasspathProvider {
    fn module(&self) -> Option<&ModuleDescription> {
        match self {
            ClasspathProvider::Sources(project) => project.module(),
            ClasspathProvider::Archive(archive) => archive.module(),
        }
    }

    fn lookup(&self, qualified_name: &str) -> Option<&TypeKey> {
        match self {
            ClasspathProvider::Sources(project) => project.lookup_type(qualified_name),
            ClasspathProvider::Archive(archive) => archive.lookup_type(qualified_name),
        }
    }

    fn has_package(&self, package: &str) -> bool {
        match self {
            ClasspathProvider::Sources(project) => project.has_package(package),
            ClasspathProvider::Archive(archive) => archive.has_package(package),
        }
    }
}

/// Who the project's own code is.
#[derive(Clone, Debug)]
enum Reader {
    Unnamed(UnnamedModule),
    Named(NamedModule),
}

impl Reader {
    fn context(&self) -> &dyn ModuleContext {
        match self {
            Reader::Unnamed(ctx) => ctx,
            Reader::Named(ctx) => ctx,
        }
    }
}

/// Resolves names exactly as code in `project` sees them.
///
/// Lookup order is the project's own source folders, then each classpath
/// entry as declared. A required project contributes its sources and the
/// entries it marks as exported, transitively; the first provider that
/// declares a visible type wins.
#[derive(Debug)]
pub struct ProjectEnvironment<'s> {
    snapshot: &'s WorkspaceSnapshot,
    project: Arc<Project>,
    providers: Vec<ClasspathProvider>,
    reader: Reader,
}

impl<'s> ProjectEnvironment<'s> {
    pub fn new(snapshot: &'s WorkspaceSnapshot, project: Arc<Project>) -> Self {
        let reader = match project.module() {
            Some(module) => Reader::Named(NamedModule::new(module)),
            None => Reader::Unnamed(UnnamedModule),
        };
        let mut builder = ProviderBuilder {
            snapshot,
            providers: Vec::new(),
            visited: FxHashSet::default(),
            archives: FxHashSet::default(),
        };
        builder.expand(&project, true);
        Self {
            snapshot,
            project,
            providers: builder.providers,
            reader,
        }
    }

    pub fn snapshot(&self) -> &'s WorkspaceSnapshot {
        self.snapshot
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn providers(&self) -> &[ClasspathProvider] {
        &self.providers
    }

    /// The module context of the project's own code.
    pub fn reader(&self) -> &dyn ModuleContext {
        self.reader.context()
    }

    /// Whether `name`'s sources are on this project's classpath.
    pub fn sees_project(&self, name: &str) -> bool {
        self.providers
            .iter()
            .any(|p| matches!(p, ClasspathProvider::Sources(project) if project.name == name))
    }

    pub fn sees_archive(&self, id: ArchiveId) -> bool {
        self.providers
            .iter()
            .any(|p| matches!(p, ClasspathProvider::Archive(archive) if archive.id == id))
    }

    /// Look a dotted qualified name up as the project's own code would.
    pub fn lookup(&self, qualified_name: &str) -> Option<TypeKey> {
        self.lookup_in(qualified_name, self.reader.context())
    }

    fn lookup_in(&self, qualified_name: &str, ctx: &dyn ModuleContext) -> Option<TypeKey> {
        self.providers.iter().find_map(|provider| {
            let key = provider.lookup(qualified_name)?;
            let package = self
                .snapshot
                .type_info(key)
                .map(|info| info.package.clone())
                .unwrap_or_else(|| SmolStr::new(key.qualifier()));
            is_visible(provider.module(), &package, ctx).then(|| key.clone())
        })
    }

    /// Whether the dotted `package` exists on this classpath.
    pub fn has_package(&self, package: &str) -> bool {
        self.has_package_in(package, self.reader.context())
    }

    fn has_package_in(&self, package: &str, ctx: &dyn ModuleContext) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.has_package(package) && package_visible(provider.module(), package, ctx))
    }
}

/// A package is visible when the provider exports it or one of its
/// sub-packages to `ctx`.
fn package_visible(provider: Option<&ModuleDescription>, package: &str, ctx: &dyn ModuleContext) -> bool {
    match provider {
        None => ctx.module_name().is_none(),
        Some(module) => {
            if ctx.module_name() == Some(module.name.as_str()) {
                return true;
            }
            ctx.reads(&module.name)
                && module.exports.iter().any(|exported| {
                    exported == package
                        || exported
                            .strip_prefix(package)
                            .is_some_and(|rest| rest.starts_with('.'))
                })
        }
    }
}

struct ProviderBuilder<'s> {
    snapshot: &'s WorkspaceSnapshot,
    providers: Vec<ClasspathProvider>,
    visited: FxHashSet<SmolStr>,
    archives: FxHashSet<ArchiveId>,
}

impl ProviderBuilder<'_> {
    fn expand(&mut self, project: &Arc<Project>, is_root: bool) {
        if !self.visited.insert(project.name.clone()) {
            return;
        }
        self.providers.push(ClasspathProvider::Sources(project.clone()));
        for entry in project.classpath() {
            match entry {
                ClasspathEntry::Project { name, exported } => {
                    if !is_root && !exported {
                        continue;
                    }
                    match self.snapshot.project(name) {
                        Some(required) => self.expand(required, false),
                        None => tracing::trace!(project = %project.name, required = %name, "required project is missing"),
                    }
                }
                library => {
                    // archives of a required project are never re-exported
                    if !is_root {
                        continue;
                    }
                    match self.snapshot.resolve_library(library) {
                        Some(archive) => {
                            if self.archives.insert(archive.id) {
                                self.providers.push(ClasspathProvider::Archive(archive.clone()));
                            }
                        }
                        None => tracing::trace!(project = %project.name, entry = ?library, "library is not registered"),
                    }
                }
            }
        }
    }
}

fn join(segments: &[&str]) -> String {
    segments.join(".")
}

fn in_package(package: &[&str], name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", join(package), name)
    }
}

impl NameEnvironment for ProjectEnvironment<'_> {
    fn find_type(&self, compound_type_name: &[&str]) -> NameEnvironmentAnswer {
        self.find_module_type(compound_type_name, self.reader.context())
    }

    fn find_type_in_package(&self, type_name: &str, package_name: &[&str]) -> NameEnvironmentAnswer {
        self.find_module_type_in_package(type_name, package_name, self.reader.context())
    }

    fn is_package(&self, parent_package_name: &[&str], package_name: &str) -> bool {
        self.is_module_package(parent_package_name, package_name, self.reader.context())
    }
}

impl ModuleAwareNameEnvironment for ProjectEnvironment<'_> {
    fn find_module_type(
        &self,
        compound_type_name: &[&str],
        module_context: &dyn ModuleContext,
    ) -> NameEnvironmentAnswer {
        if compound_type_name.is_empty() {
            return NameEnvironmentAnswer::NotFound;
        }
        self.lookup_in(&join(compound_type_name), module_context).into()
    }

    fn find_module_type_in_package(
        &self,
        type_name: &str,
        package_name: &[&str],
        module_context: &dyn ModuleContext,
    ) -> NameEnvironmentAnswer {
        if type_name.is_empty() {
            return NameEnvironmentAnswer::NotFound;
        }
        self.lookup_in(&in_package(package_name, type_name), module_context)
            .into()
    }

    fn is_module_package(
        &self,
        parent_package_name: &[&str],
        package_name: &str,
        module_context: &dyn ModuleContext,
    ) -> bool {
        !package_name.is_empty()
            && self.has_package_in(&in_package(parent_package_name, package_name), module_context)
    }
}
