//! Projects, archives and the workspace that holds them.
//!
//! A [`Workspace`] is the only mutable object in the crate. Everything else
//! reads an immutable [`WorkspaceSnapshot`].

mod archive;
mod manifest;
#[allow(clippy::module_inception)]
mod project;
mod workspace;
mod workspace_loader;

pub use archive::{Archive, JCL_ARCHIVE_PATH, JCL_VARIABLE};
pub use manifest::{ArchiveManifest, EntryManifest, MANIFEST_FILE, ProjectManifest, WorkspaceManifest};
pub use project::{ClasspathEntry, Project, ProjectConfig};
pub use workspace::{Workspace, WorkspaceSnapshot};
pub use workspace_loader::WorkspaceLoader;
