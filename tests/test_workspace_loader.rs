//! Loading a workspace from a directory on disk.

use std::fs;
use std::path::Path;

use jseek::hir::Element;
use jseek::{
    Error, LimitTo, ResultCollector, SearchEngine, SearchFor, SearchPattern, SearchScope,
    WorkspaceLoader,
};
use tempfile::TempDir;

const MANIFEST: &str = r#"{
    "archives": [{ "path": "/lib/util.jar", "sources": "libs/util" }],
    "variables": { "UTIL_LIB": "/lib/util.jar" },
    "projects": [
        { "name": "P1" },
        {
            "name": "P2",
            "classpath": [
                { "kind": "variable", "name": "JCL_LIB" },
                { "kind": "project", "name": "P1" }
            ]
        },
        {
            "name": "P3",
            "classpath": [{ "kind": "variable", "name": "UTIL_LIB" }]
        }
    ]
}"#;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn workspace_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "workspace.json", MANIFEST);
    write(
        root,
        "P1/p/X.java",
        "package p;\npublic class X {\n\tprotected void foo() {\n\t}\n}",
    );
    write(
        root,
        "P2/q/Y.java",
        "package q;\nimport p.X;\npublic class Y extends X {\n\tvoid bar() {\n\t\tfoo();\n\t}\n}",
    );
    write(root, "libs/util/util/A.java", "package util;\npublic class A {}");
    dir
}

#[test]
fn test_loaded_workspace_searches_like_a_built_one() {
    let dir = workspace_dir();
    let ws = WorkspaceLoader::new().load_directory(dir.path()).unwrap();
    let snapshot = ws.snapshot();
    let file = snapshot.compilation_unit("/P1/p/X.java").unwrap();
    let x = snapshot.find_type(file, "X").unwrap();
    let foo = snapshot.find_method::<&str>(&x, "foo", &[]).unwrap();
    let scope = SearchScope::hierarchy(&snapshot, &x).unwrap();
    let pattern = SearchPattern::for_element(foo, LimitTo::References).unwrap();
    let mut collector = ResultCollector::new().show_project(true);
    SearchEngine::new()
        .search(&ws, &pattern, &scope, &mut collector)
        .unwrap();
    assert_eq!(collector.to_string(), "q/Y.java [in P2] q.Y.bar() -> void [foo()]");
}

#[test]
fn test_archives_and_variables_are_registered() {
    let dir = workspace_dir();
    let ws = WorkspaceLoader::new().load_directory(dir.path()).unwrap();
    let snapshot = ws.snapshot();
    assert!(snapshot.archive_by_path("/lib/util.jar").is_some());

    let pattern = SearchPattern::from_string("A", SearchFor::Type, LimitTo::Declarations, true).unwrap();
    let scope = SearchScope::from_elements(&snapshot, &[Element::Project("P3".into())]).unwrap();
    let mut collector = ResultCollector::new().show_project(true);
    SearchEngine::new()
        .search(&ws, &pattern, &scope, &mut collector)
        .unwrap();
    assert_eq!(collector.to_string(), "/lib/util.jar [in P3] util.A");
}

#[test]
fn test_project_without_directory_is_empty() {
    let dir = workspace_dir();
    fs::remove_dir_all(dir.path().join("P1")).unwrap();
    let ws = WorkspaceLoader::new().load_directory(dir.path()).unwrap();
    let project = ws.project("P1").unwrap();
    assert_eq!(project.compilation_units().count(), 0);
}

#[test]
fn test_malformed_manifest_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "workspace.json", "{ \"projects\": [ { } ] }");
    assert!(matches!(
        WorkspaceLoader::new().load_directory(dir.path()),
        Err(Error::Manifest(_))
    ));
}

#[test]
fn test_missing_archive_sources_is_io_error() {
    let dir = workspace_dir();
    fs::remove_dir_all(dir.path().join("libs")).unwrap();
    assert!(matches!(
        WorkspaceLoader::new().load_directory(dir.path()),
        Err(Error::Io(_))
    ));
}
