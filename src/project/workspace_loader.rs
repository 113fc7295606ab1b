use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use super::manifest::{MANIFEST_FILE, WorkspaceManifest};
use super::workspace::Workspace;
use crate::error::Result;

/// Loads a workspace from a directory holding a `workspace.json`.
pub struct WorkspaceLoader;

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read the manifest at `root` and build a fresh workspace from it.
    pub fn load_directory<P: AsRef<Path>>(&self, root: P) -> Result<Workspace> {
        let root = root.as_ref();
        let text = fs::read_to_string(root.join(MANIFEST_FILE))?;
        let manifest = WorkspaceManifest::from_json(&text)?;
        let workspace = Workspace::new();
        self.load_manifest_into(root, &manifest, &workspace)?;
        Ok(workspace)
    }

    /// Register archives, bind variables, then create every project with its
    /// files.
    pub fn load_manifest_into(&self, root: &Path, manifest: &WorkspaceManifest, workspace: &Workspace) -> Result<()> {
        for archive in &manifest.archives {
            let dir = root.join(&archive.sources);
            let sources: Vec<(String, String)> = read_tree(&dir)?
                .into_iter()
                .filter(|(rel, _)| rel.ends_with(".java"))
                .collect();
            workspace.register_archive(&archive.path, &sources, archive.module.clone())?;
        }
        for (name, path) in &manifest.variables {
            workspace.set_classpath_variable(name, path)?;
        }
        for project in &manifest.projects {
            workspace.create_project(project.to_config())?;
            let dir = root.join(&project.name);
            if !dir.is_dir() {
                tracing::debug!(project = %project.name, "project has no directory");
                continue;
            }
            for folder in collect_folders(&dir) {
                let path = format!("/{}/{}", project.name, folder);
                if !workspace.project(&project.name)?.has_folder(&folder) {
                    workspace.create_folder(&path)?;
                }
            }
            for (rel, text) in read_tree(&dir)? {
                workspace.create_file(&format!("/{}/{}", project.name, rel), &text)?;
            }
        }
        tracing::debug!(
            root = %root.display(),
            projects = manifest.projects.len(),
            archives = manifest.archives.len(),
            "loaded workspace"
        );
        Ok(())
    }
}

impl Default for WorkspaceLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn relative(dir: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(dir).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Sub-directories of `dir`, parents before children.
fn collect_folders(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| relative(dir, entry.path()))
        .collect()
}

/// Every readable UTF-8 file under `dir` as `(relative path, text)`, sorted
/// by path. Unreadable files are skipped with a warning.
fn read_tree(dir: &Path) -> Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )
        .into());
    }
    let paths: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    // read files in parallel
    let mut files: Vec<(String, String)> = paths
        .par_iter()
        .filter_map(|path| {
            let rel = relative(dir, path)?;
            match fs::read_to_string(path) {
                Ok(text) => Some((rel, text)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable file");
                    None
                }
            }
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
