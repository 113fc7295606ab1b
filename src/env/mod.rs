//! Name environments: the compiler-facing view of a project's classpath.
//!
//! ```text
//! ModuleAwareNameEnvironment   find_module_type / find_module_type_in_package / is_module_package
//!          │  (adds a &dyn ModuleContext)
//! NameEnvironment              find_type / find_type_in_package / is_package
//!          │
//! ProjectEnvironment           own sources → classpath entries, in order
//! ```
//!
//! Every query is a pure read of an immutable snapshot. Missing types are
//! answered with [`NameEnvironmentAnswer::NotFound`], never with an error.

mod module;
mod project_env;

pub use module::{JAVA_BASE, ModuleContext, ModuleDescription, NamedModule, UnnamedModule};
pub use project_env::{ClasspathProvider, ProjectEnvironment};

use crate::hir::TypeKey;

/// Result of a type lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameEnvironmentAnswer {
    /// Declared in a compilation unit of some project.
    Source(TypeKey),
    /// Declared in an archive.
    Binary(TypeKey),
    NotFound,
}

impl NameEnvironmentAnswer {
    pub fn is_found(&self) -> bool {
        !matches!(self, NameEnvironmentAnswer::NotFound)
    }

    pub fn type_key(&self) -> Option<&TypeKey> {
        match self {
            NameEnvironmentAnswer::Source(key) | NameEnvironmentAnswer::Binary(key) => Some(key),
            NameEnvironmentAnswer::NotFound => None,
        }
    }

    pub fn into_type_key(self) -> Option<TypeKey> {
        match self {
            NameEnvironmentAnswer::Source(key) | NameEnvironmentAnswer::Binary(key) => Some(key),
            NameEnvironmentAnswer::NotFound => None,
        }
    }
}

impl From<Option<TypeKey>> for NameEnvironmentAnswer {
    fn from(key: Option<TypeKey>) -> Self {
        match key {
            Some(key) if key.origin.is_binary() => NameEnvironmentAnswer::Binary(key),
            Some(key) => NameEnvironmentAnswer::Source(key),
            None => NameEnvironmentAnswer::NotFound,
        }
    }
}

/// Type and package lookup from the environment's own point of view.
pub trait NameEnvironment {
    /// `["java", "lang", "Object"]`. Member types continue the compound
    /// name: `["p", "X", "Inner"]`.
    fn find_type(&self, compound_type_name: &[&str]) -> NameEnvironmentAnswer;

    fn find_type_in_package(&self, type_name: &str, package_name: &[&str])
    -> NameEnvironmentAnswer;

    /// Whether `parent.package_name` names a package. An empty parent asks
    /// about a top-level package.
    fn is_package(&self, parent_package_name: &[&str], package_name: &str) -> bool;
}

/// The same queries, answered for an explicit reader module.
pub trait ModuleAwareNameEnvironment: NameEnvironment {
    fn find_module_type(
        &self,
        compound_type_name: &[&str],
        module_context: &dyn ModuleContext,
    ) -> NameEnvironmentAnswer;

    fn find_module_type_in_package(
        &self,
        type_name: &str,
        package_name: &[&str],
        module_context: &dyn ModuleContext,
    ) -> NameEnvironmentAnswer;

    fn is_module_package(
        &self,
        parent_package_name: &[&str],
        package_name: &str,
        module_context: &dyn ModuleContext,
    ) -> bool;
}
