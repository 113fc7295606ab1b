//! Module-aware name lookup through a project's classpath.

use jseek::{
    ModuleAwareNameEnvironment, ModuleDescription, NameEnvironment, NameEnvironmentAnswer,
    NamedModule, ProjectConfig, UnnamedModule, Workspace,
};
use rstest::{fixture, rstest};

const UTIL_JAR: &str = "/lib/util.jar";

#[fixture]
fn workspace() -> Workspace {
    let ws = Workspace::new();
    ws.register_archive(
        UTIL_JAR,
        &[
            ("util/api/A.java", "package util.api; public class A {}"),
            ("util/internal/B.java", "package util.internal; public class B {}"),
        ],
        Some(ModuleDescription::new("util").exports("util.api")),
    )
    .unwrap();
    ws.create_project(
        ProjectConfig::new("P1")
            .variable("JCL_LIB")
            .library(UTIL_JAR),
    )
    .unwrap();
    ws.create_folder("/P1/p").unwrap();
    ws.create_file("/P1/p/X.java", "package p; public class X { public class Inner {} }")
        .unwrap();
    ws
}

#[rstest]
fn test_classic_lookups(workspace: Workspace) {
    let snapshot = workspace.snapshot();
    let env = snapshot.environment("P1").unwrap();

    assert!(matches!(
        env.find_type(&["java", "lang", "Object"]),
        NameEnvironmentAnswer::Binary(_)
    ));
    assert!(matches!(
        env.find_type_in_package("X", &["p"]),
        NameEnvironmentAnswer::Source(_)
    ));
    let inner = env.find_type(&["p", "X", "Inner"]).into_type_key().unwrap();
    assert_eq!(inner.qualified_name, "p.X.Inner");
    assert_eq!(env.find_type(&["p", "Missing"]), NameEnvironmentAnswer::NotFound);
    assert_eq!(env.find_type(&[]), NameEnvironmentAnswer::NotFound);
}

#[rstest]
#[case(&[], "java", true)]
#[case(&["java"], "lang", true)]
#[case(&[], "p", true)]
#[case(&[], "util", true)]
#[case(&["util"], "api", true)]
#[case(&[], "q", false)]
#[case(&["java"], "", false)]
fn test_packages_for_classpath_code(
    workspace: Workspace,
    #[case] parent: &[&str],
    #[case] name: &str,
    #[case] expected: bool,
) {
    let snapshot = workspace.snapshot();
    let env = snapshot.environment("P1").unwrap();
    assert_eq!(env.is_package(parent, name), expected);
}

#[rstest]
fn test_unexported_package_is_hidden_from_other_modules(workspace: Workspace) {
    let snapshot = workspace.snapshot();
    let env = snapshot.environment("P1").unwrap();
    let itself = NamedModule::new(&ModuleDescription::new("util"));
    let client = NamedModule::new(&ModuleDescription::new("app").requires("util"));
    let stranger = NamedModule::new(&ModuleDescription::new("other"));

    assert!(!env.is_module_package(&["util"], "internal", &client));
    assert!(env.is_module_package(&["util"], "internal", &itself));
    assert!(env.is_module_package(&["util"], "api", &client));
    assert!(!env.is_module_package(&["util"], "api", &stranger));

    assert!(env.find_module_type(&["util", "api", "A"], &client).is_found());
    assert!(!env.find_module_type(&["util", "internal", "B"], &client).is_found());
    assert!(env.find_module_type(&["util", "internal", "B"], &itself).is_found());
    assert!(!env.find_module_type(&["util", "api", "A"], &stranger).is_found());
}

#[rstest]
fn test_named_modules_cannot_read_classpath_sources(workspace: Workspace) {
    let snapshot = workspace.snapshot();
    let env = snapshot.environment("P1").unwrap();
    let client = NamedModule::new(&ModuleDescription::new("app"));

    assert!(env.find_module_type_in_package("X", &["p"], &UnnamedModule).is_found());
    assert!(!env.find_module_type_in_package("X", &["p"], &client).is_found());
    // java.base is read by every named module
    assert!(env.find_module_type(&["java", "lang", "String"], &client).is_found());
    assert!(!env.is_module_package(&[], "p", &client));
}

#[rstest]
fn test_required_project_sources_are_visible(workspace: Workspace) {
    workspace
        .create_project(ProjectConfig::new("P2").variable("JCL_LIB").requires("P1"))
        .unwrap();
    let snapshot = workspace.snapshot();
    let env = snapshot.environment("P2").unwrap();
    assert!(env.find_type(&["p", "X"]).is_found());
    // libraries of a required project are not inherited
    assert!(!env.find_type(&["util", "api", "A"]).is_found());
    let util = snapshot.archive_by_path(UTIL_JAR).unwrap();
    assert!(!env.sees_archive(util.id));
    assert!(snapshot.environment("P1").unwrap().sees_archive(util.id));
}
