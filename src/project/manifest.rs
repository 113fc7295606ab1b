//! `workspace.json`: the on-disk description of a workspace.
//!
//! ```json
//! {
//!   "archives": [{ "path": "/lib/util.jar", "sources": "libs/util" }],
//!   "variables": { "UTIL_LIB": "/lib/util.jar" },
//!   "projects": [
//!     { "name": "P0" },
//!     {
//!       "name": "P1",
//!       "classpath": [
//!         { "kind": "variable", "name": "JCL_LIB" },
//!         { "kind": "project", "name": "P0", "exported": true }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Each project's files live in a directory named after the project, next
//! to the manifest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::project::{ClasspathEntry, ProjectConfig};
use crate::env::ModuleDescription;
use crate::error::Result;

/// File name the loader looks for at the workspace root.
pub const MANIFEST_FILE: &str = "workspace.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceManifest {
    #[serde(default)]
    pub archives: Vec<ArchiveManifest>,
    /// Variable name → archive path. `JCL_LIB` is always bound.
    #[serde(default)]
    pub variables: IndexMap<String, String>,
    #[serde(default)]
    pub projects: Vec<ProjectManifest>,
}

impl WorkspaceManifest {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// An archive compiled from a directory of stub sources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Workspace-visible path, e.g. `/lib/util.jar`.
    pub path: String,
    /// Directory of `.java` stubs, relative to the manifest.
    pub sources: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleDescription>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    /// Defaults to the project root.
    #[serde(default = "default_source_folders")]
    pub source_folders: Vec<String>,
    #[serde(default)]
    pub classpath: Vec<EntryManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleDescription>,
}

fn default_source_folders() -> Vec<String> {
    vec![String::new()]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryManifest {
    Library {
        path: String,
    },
    Variable {
        name: String,
    },
    Project {
        name: String,
        #[serde(default)]
        exported: bool,
    },
}

impl From<&EntryManifest> for ClasspathEntry {
    fn from(entry: &EntryManifest) -> Self {
        match entry {
            EntryManifest::Library { path } => ClasspathEntry::Library {
                path: SmolStr::new(path),
            },
            EntryManifest::Variable { name } => ClasspathEntry::Variable {
                name: SmolStr::new(name),
            },
            EntryManifest::Project { name, exported } => ClasspathEntry::Project {
                name: SmolStr::new(name),
                exported: *exported,
            },
        }
    }
}

impl ProjectManifest {
    pub fn to_config(&self) -> ProjectConfig {
        let mut config = ProjectConfig::new(self.name.as_str()).source_folders(&self.source_folders);
        for entry in &self.classpath {
            config = config.entry(entry.into());
        }
        if let Some(module) = &self.module {
            config = config.module(module.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest_with_defaults() {
        let manifest = WorkspaceManifest::from_json(
            r#"{
                "projects": [
                    { "name": "P0" },
                    { "name": "P1", "classpath": [
                        { "kind": "variable", "name": "JCL_LIB" },
                        { "kind": "project", "name": "P0" }
                    ] }
                ]
            }"#,
        )
        .unwrap();
        assert!(manifest.archives.is_empty());
        assert_eq!(manifest.projects[0].source_folders, [""]);
        let config = manifest.projects[1].to_config();
        assert_eq!(config, ProjectConfig::new("P1").variable("JCL_LIB").requires("P0"));
    }

    #[test]
    fn test_manifest_round_trips_modules() {
        let manifest = WorkspaceManifest {
            archives: vec![ArchiveManifest {
                path: "/lib/a.jar".into(),
                sources: "libs/a".into(),
                module: Some(ModuleDescription::new("a").exports("a.api")),
            }],
            variables: IndexMap::from([("A_LIB".to_string(), "/lib/a.jar".to_string())]),
            projects: vec![],
        };
        let text = manifest.to_json().unwrap();
        assert_eq!(WorkspaceManifest::from_json(&text).unwrap(), manifest);
    }

    #[test]
    fn test_unknown_entry_kind_is_an_error() {
        let err = WorkspaceManifest::from_json(
            r#"{ "projects": [{ "name": "P", "classpath": [{ "kind": "jar" }] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::Manifest(_)));
    }
}
