//! # jseek
//!
//! Cross-project search over a workspace of Java projects: declarations,
//! references and all occurrences of types, methods and fields, bounded by
//! element, hierarchy or workspace scopes and classified by accuracy.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! search   → patterns, scopes, word index, match locator, result collector
//!   ↓
//! hir      → source files, symbols, name/expression resolution, type hierarchies
//!   ↓
//! env      → module-aware name environments over a project's classpath
//!   ↓
//! project  → workspace snapshots, projects, archives, manifest loading
//!   ↓
//! syntax   → lexer, parser and visitor for the Java subset
//!   ↓
//! base     → primitives (FileId, ArchiveId, TextRange, LineIndex)
//! ```
//!
//! ## Example
//!
//! ```
//! use jseek::{
//!     LimitTo, ProjectConfig, ResultCollector, SearchEngine, SearchFor, SearchPattern,
//!     SearchScope, Workspace,
//! };
//! use jseek::hir::Element;
//!
//! let ws = Workspace::new();
//! ws.create_project(ProjectConfig::new("P1").variable("JCL_LIB")).unwrap();
//! let pattern =
//!     SearchPattern::from_string("Object", SearchFor::Type, LimitTo::Declarations, true).unwrap();
//! let snapshot = ws.snapshot();
//! let scope = SearchScope::from_elements(&snapshot, &[Element::Project("P1".into())]).unwrap();
//! let mut collector = ResultCollector::new().show_project(true);
//! SearchEngine::new().search(&ws, &pattern, &scope, &mut collector).unwrap();
//! assert_eq!(collector.to_string(), "/JCL/jclMin.jar [in P1] java.lang.Object");
//! ```

/// Foundation types: FileId, ArchiveId, TextRange, LineIndex
pub mod base;

/// Name environments and module contexts
pub mod env;

pub mod error;

/// Source model: symbols, resolution, type hierarchies
pub mod hir;

/// Workspace, projects, archives and loading
pub mod project;

/// Search engine
pub mod search;

/// Java lexer, parser and syntax tree
pub mod syntax;

pub use error::{Error, Result};

pub use base::{ArchiveId, FileId, LineCol, LineIndex, TextRange, TextSize};
pub use env::{
    ModuleAwareNameEnvironment, ModuleContext, ModuleDescription, NameEnvironment,
    NameEnvironmentAnswer, NamedModule, ProjectEnvironment, UnnamedModule,
};
pub use hir::{Element, FieldHandle, MethodHandle, TypeKey};
pub use project::{ClasspathEntry, ProjectConfig, Workspace, WorkspaceLoader, WorkspaceSnapshot};
pub use search::{
    Accuracy, LimitTo, ResultCollector, SearchEngine, SearchFor, SearchMatch, SearchPattern,
    SearchRequestor, SearchScope,
};
