//! Module contexts: who is asking, and what they can read.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The module every named module reads implicitly.
pub const JAVA_BASE: &str = "java.base";

/// Declared shape of a named module, as a `module-info` would give it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescription {
    pub name: String,
    #[serde(default)]
    pub requires: Vec<String>,
    /// Dotted package names visible to readers of this module.
    #[serde(default)]
    pub exports: Vec<String>,
}

impl ModuleDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn requires(mut self, module: impl Into<String>) -> Self {
        self.requires.push(module.into());
        self
    }

    pub fn exports(mut self, package: impl Into<String>) -> Self {
        self.exports.push(package.into());
        self
    }

    pub fn exports_package(&self, package: &str) -> bool {
        self.exports.iter().any(|p| p == package)
    }
}

/// The reading side of a lookup.
///
/// Lookups never inspect a context beyond these two questions, so classic
/// classpath resolution and module-path resolution share one query surface.
pub trait ModuleContext {
    /// `None` for the unnamed module.
    fn module_name(&self) -> Option<&str>;

    /// Whether code in this context may read the named module.
    fn reads(&self, module: &str) -> bool;
}

/// Classic classpath code: reads every module.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnnamedModule;

impl ModuleContext for UnnamedModule {
    fn module_name(&self) -> Option<&str> {
        None
    }

    fn reads(&self, _module: &str) -> bool {
        true
    }
}

/// Code inside a named module: reads itself, `java.base` and its `requires`.
#[derive(Clone, Debug)]
pub struct NamedModule {
    name: SmolStr,
    requires: Vec<SmolStr>,
}

impl NamedModule {
    pub fn new(description: &ModuleDescription) -> Self {
        Self {
            name: SmolStr::new(&description.name),
            requires: description.requires.iter().map(SmolStr::new).collect(),
        }
    }
}

impl ModuleContext for NamedModule {
    fn module_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn reads(&self, module: &str) -> bool {
        module == self.name || module == JAVA_BASE || self.requires.iter().any(|r| r == module)
    }
}

/// Whether a type in `package`, provided by `provider`, is visible from `ctx`.
pub(crate) fn is_visible(
    provider: Option<&ModuleDescription>,
    package: &str,
    ctx: &dyn ModuleContext,
) -> bool {
    match provider {
        // the unnamed module is only readable from the unnamed module
        None => ctx.module_name().is_none(),
        Some(module) => {
            ctx.module_name() == Some(module.name.as_str())
                || (module.exports_package(package) && ctx.reads(&module.name))
        }
    }
}
