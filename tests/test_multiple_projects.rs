//! Searches spanning several projects.
//!
//! Each test builds its own workspace; the fixture deletes the projects it
//! created when dropped, whatever the search outcome was.

use jseek::hir::Element;
use jseek::{
    LimitTo, ProjectConfig, ResultCollector, SearchEngine, SearchFor, SearchPattern, SearchScope,
    Workspace,
};

struct Fixture {
    ws: Workspace,
    projects: Vec<String>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            ws: Workspace::new(),
            projects: Vec::new(),
        }
    }

    /// A project with the root as its only source folder and nothing on
    /// its classpath.
    fn plain_project(&mut self, name: &str) {
        self.project(ProjectConfig::new(name));
    }

    fn project(&mut self, config: ProjectConfig) {
        self.projects.push(config.name().to_string());
        self.ws.create_project(config).unwrap();
    }

    fn folder(&self, path: &str) {
        self.ws.create_folder(path).unwrap();
    }

    fn file(&self, path: &str, text: &str) {
        self.ws.create_file(path, text).unwrap();
    }

    fn search(&self, pattern: &SearchPattern, scope: &SearchScope, collector: ResultCollector) -> String {
        let mut collector = collector;
        SearchEngine::new()
            .search(&self.ws, pattern, scope, &mut collector)
            .unwrap();
        collector.to_string()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self.ws.delete_projects(&self.projects);
    }
}

fn method_references_in_hierarchy(fx: &Fixture, cu: &str, ty: &str, collector: ResultCollector) -> String {
    let snapshot = fx.ws.snapshot();
    let file = snapshot.compilation_unit(cu).unwrap();
    let owner = snapshot.find_type(file, ty).unwrap();
    let method = snapshot.find_method::<&str>(&owner, "foo", &[]).unwrap();
    let scope = SearchScope::hierarchy(&snapshot, &owner).unwrap();
    let pattern = SearchPattern::for_element(method, LimitTo::References).unwrap();
    fx.search(&pattern, &scope, collector)
}

fn setup_two_level_hierarchy(fx: &mut Fixture) {
    fx.plain_project("P1");
    fx.folder("/P1/p");
    fx.file(
        "/P1/p/X.java",
        "package p;\n\
         public class X {\n\
         \tprotected void foo() {\n\
         \t}\n\
         \tvoid bar() {\n\
         \t\tfoo();\n\
         \t}\n\
         }",
    );
    fx.project(ProjectConfig::new("P2").variable("JCL_LIB").requires("P1"));
    fx.file(
        "/P2/Y.java",
        "import p.X;\n\
         public class Y extends X {\n\
         \tprotected void foo() {\n\
         \t}\n\
         }",
    );
}

#[test]
fn test_hierarchy_scope_finds_reference_in_supertype() {
    let mut fx = Fixture::new();
    setup_two_level_hierarchy(&mut fx);
    let found = method_references_in_hierarchy(&fx, "/P2/Y.java", "Y", ResultCollector::new().show_project(true));
    assert_eq!(found, "p/X.java [in P1] p.X.bar() -> void [foo()]");
}

#[test]
fn test_hierarchy_scope_from_grandchild() {
    let mut fx = Fixture::new();
    setup_two_level_hierarchy(&mut fx);
    fx.file(
        "/P2/Z.java",
        "public class Z extends Y {\n\
         \tprotected void foo() {\n\
         \t}\n\
         }",
    );
    let found = method_references_in_hierarchy(&fx, "/P2/Z.java", "Z", ResultCollector::new().show_project(true));
    assert_eq!(found, "p/X.java [in P1] p.X.bar() -> void [foo()]");
}

#[test]
fn test_hierarchy_scope_includes_dependent_projects() {
    let mut fx = Fixture::new();
    fx.plain_project("P1");
    fx.folder("/P1/p");
    fx.file(
        "/P1/p/X.java",
        "package p;\n\
         public class X {\n\
         \tprotected void foo() {\n\
         \t}\n\
         }",
    );
    fx.project(ProjectConfig::new("P2").variable("JCL_LIB").requires("P1"));
    fx.folder("/P2/q");
    fx.file(
        "/P2/q/Y.java",
        "package q;\n\
         import p.X;\n\
         public class Y extends X {\n\
         \tvoid bar() {\n\
         \t\tfoo();\n\
         \t}\n\
         }",
    );
    let found = method_references_in_hierarchy(&fx, "/P1/p/X.java", "X", ResultCollector::new().show_project(true));
    assert_eq!(found, "q/Y.java [in P2] q.Y.bar() -> void [foo()]");
}

fn setup_four_projects(fx: &mut Fixture) {
    fx.plain_project("P0");
    fx.folder("/P0/p0");
    fx.file(
        "/P0/p0/X.java",
        "package p0;\n\
         public class X {\n\
         \x20 public static X TheX;\n\
         \tpublic void foo() {\n\
         \t}\n\
         }",
    );
    fx.project(ProjectConfig::new("P1").variable("JCL_LIB").requires("P0"));
    fx.folder("/P1/p1");
    fx.file(
        "/P1/p1/T.java",
        "package p1;\n\
         import p0.X;\n\
         public class T {\n\
         \tpublic X zork() {\n\
         \t\treturn X.TheX;\n\
         \t}\n\
         }",
    );
    fx.project(
        ProjectConfig::new("P2")
            .variable("JCL_LIB")
            .requires("P0")
            .requires("P1"),
    );
    fx.folder("/P2/p2");
    fx.file(
        "/P2/p2/Y.java",
        "package p2;\n\
         import p0.X;\n\
         import p1.T;\n\
         public class Y extends X {\n\
         \tpublic void bar() {\n\
         \t\tnew T().zork().foo();\n\
         \t}\n\
         }",
    );
    fx.project(
        ProjectConfig::new("P3")
            .variable("JCL_LIB")
            .requires("P0")
            .requires("P2"),
    );
    fx.folder("/P3/p3");
    fx.file(
        "/P3/p3/Z.java",
        "package p3;\n\
         import p0.X;\n\
         import p2.Y;\n\
         public class Z extends Y {\n\
         \tstatic {\n\
         \t\tX.TheX = new Z(); // zork() will actually answer an instance of Z\n\
         \t}\n\
         \tpublic void foo() {\n\
         \t} // refs should find one in Y.bar()\n\
         }",
    );
}

#[test]
fn test_hierarchy_scope_reference_through_other_project_is_exact() {
    let mut fx = Fixture::new();
    setup_four_projects(&mut fx);
    let found = method_references_in_hierarchy(
        &fx,
        "/P3/p3/Z.java",
        "Z",
        ResultCollector::new().show_project(true).show_accuracy(true),
    );
    assert_eq!(found, "p2/Y.java [in P2] p2.Y.bar() -> void [foo()] EXACT_MATCH");
}

#[test]
fn test_hierarchy_scope_covers_dependency_chain() {
    let mut fx = Fixture::new();
    setup_four_projects(&mut fx);
    let snapshot = fx.ws.snapshot();
    let file = snapshot.compilation_unit("/P3/p3/Z.java").unwrap();
    let z = snapshot.find_type(file, "Z").unwrap();
    let scope = SearchScope::hierarchy(&snapshot, &z).unwrap();
    assert_eq!(scope.projects(), ["P0", "P1", "P2", "P3"]);
    // T is visible from the hierarchy but not part of it
    let t_file = snapshot.compilation_unit("/P1/p1/T.java").unwrap();
    let t = snapshot.find_type(t_file, "T").unwrap();
    assert!(!scope.encloses_type(&snapshot, &t));
    assert!(scope.encloses_type(&snapshot, &z));
}

#[test]
fn test_search_results_are_deterministic() {
    let mut fx = Fixture::new();
    setup_four_projects(&mut fx);
    let pattern = SearchPattern::from_string("X", SearchFor::Type, LimitTo::AllOccurrences, true).unwrap();
    let snapshot = fx.ws.snapshot();
    let scope = SearchScope::workspace(&snapshot);
    let first = fx.search(&pattern, &scope, ResultCollector::new().show_project(true));
    let second = fx.search(&pattern, &scope, ResultCollector::new().show_project(true));
    assert_eq!(first, second);
    assert!(first.starts_with("p0/X.java [in P0] p0.X [X]"));
}

fn setup_copied_projects(fx: &mut Fixture) {
    fx.plain_project("P1");
    fx.folder("/P1/p");
    fx.file(
        "/P1/p/I.java",
        "package p;\n\
         public interface I {\n\
         \x20   void method(Object o);\n\
         }",
    );
    fx.file(
        "/P1/p/C.java",
        "package p;\n\
         public class C implements I {\n\
         \x20   void method(Object o) {\n\
         \x20   }\n\
         }",
    );
    fx.ws.copy_project("P1", "P2").unwrap();
    fx.projects.push("P2".to_string());
}

#[test]
fn test_method_occurrences_bind_to_one_copy() {
    let mut fx = Fixture::new();
    setup_copied_projects(&mut fx);
    let snapshot = fx.ws.snapshot();
    let scope = SearchScope::from_elements(
        &snapshot,
        &[Element::Project("P1".into()), Element::Project("P2".into())],
    )
    .unwrap();
    let file = snapshot.compilation_unit("/P1/p/I.java").unwrap();
    let i = snapshot.find_type(file, "I").unwrap();
    let method = snapshot.find_method(&i, "method", &["QObject;"]).unwrap();
    let pattern = SearchPattern::for_element(method, LimitTo::AllOccurrences).unwrap();
    assert_eq!(
        fx.search(&pattern, &scope, ResultCollector::new().show_project(true)),
        "p/C.java [in P1] p.C.method(Object) -> void [method]\n\
         p/I.java [in P1] p.I.method(Object) -> void [method]"
    );
}

#[test]
fn test_string_method_occurrences_report_every_copy() {
    let mut fx = Fixture::new();
    setup_copied_projects(&mut fx);
    let snapshot = fx.ws.snapshot();
    let scope = SearchScope::from_elements(
        &snapshot,
        &[Element::Project("P1".into()), Element::Project("P2".into())],
    )
    .unwrap();
    let pattern =
        SearchPattern::from_string("method(Object)", SearchFor::Method, LimitTo::AllOccurrences, true).unwrap();
    assert_eq!(
        fx.search(&pattern, &scope, ResultCollector::new().show_project(true)),
        "p/C.java [in P1] p.C.method(Object) -> void [method]\n\
         p/I.java [in P1] p.I.method(Object) -> void [method]\n\
         p/C.java [in P2] p.C.method(Object) -> void [method]\n\
         p/I.java [in P2] p.I.method(Object) -> void [method]"
    );
}

#[test]
fn test_type_declaration_in_shared_archive() {
    let mut fx = Fixture::new();
    let no_sources: &[&str] = &[];
    fx.project(ProjectConfig::new("P1").source_folders(no_sources).variable("JCL_LIB"));
    fx.project(ProjectConfig::new("P2").source_folders(no_sources).variable("JCL_LIB"));
    let pattern = SearchPattern::from_string("Object", SearchFor::Type, LimitTo::Declarations, true).unwrap();
    let snapshot = fx.ws.snapshot();

    let scope = SearchScope::from_elements(&snapshot, &[Element::Project("P1".into())]).unwrap();
    assert_eq!(
        fx.search(&pattern, &scope, ResultCollector::new().show_project(true)),
        "/JCL/jclMin.jar [in P1] java.lang.Object"
    );

    let scope = SearchScope::from_elements(&snapshot, &[Element::Project("P2".into())]).unwrap();
    assert_eq!(
        fx.search(&pattern, &scope, ResultCollector::new().show_project(true)),
        "/JCL/jclMin.jar [in P2] java.lang.Object"
    );

    // reached through both projects, the archive is reported once
    let scope = SearchScope::from_elements(
        &snapshot,
        &[Element::Project("P1".into()), Element::Project("P2".into())],
    )
    .unwrap();
    assert_eq!(
        fx.search(&pattern, &scope, ResultCollector::new().show_project(true)),
        "/JCL/jclMin.jar [in P1] java.lang.Object"
    );
}

#[test]
fn test_search_sees_snapshot_before_or_after_change() {
    let mut fx = Fixture::new();
    setup_two_level_hierarchy(&mut fx);
    let before = fx.ws.snapshot();
    fx.ws
        .set_file_contents("/P1/p/X.java", "package p;\npublic class X {\n\tprotected void foo() {}\n}")
        .unwrap();
    let pattern = SearchPattern::from_string("foo", SearchFor::Method, LimitTo::References, true).unwrap();

    let mut old = ResultCollector::new();
    let scope = SearchScope::workspace(&before);
    SearchEngine::new()
        .search_snapshot(&before, &pattern, &scope, &mut old)
        .unwrap();
    assert_eq!(old.to_string(), "p/X.java p.X.bar() -> void [foo()]");

    let after = fx.ws.snapshot();
    let mut new = ResultCollector::new();
    let scope = SearchScope::workspace(&after);
    SearchEngine::new()
        .search_snapshot(&after, &pattern, &scope, &mut new)
        .unwrap();
    assert!(new.is_empty());
}
