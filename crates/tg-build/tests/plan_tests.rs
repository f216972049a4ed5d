//! Build plan tests against real declaration trees

use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use tg_build::{BuildError, BuildPlan, SrcFs, TargetCache, TargetRef, TARGETS_FILE};

/// Create a source tree with one declaration file per entry
fn create_tree(files: &[(&str, &str)]) -> (TempDir, TargetCache) {
    let dir = tempfile::tempdir().unwrap();
    for (directory, content) in files {
        let directory = dir.path().join(directory);
        fs::create_dir_all(&directory).unwrap();
        fs::write(directory.join(TARGETS_FILE), content).unwrap();
    }
    let cache = TargetCache::new(SrcFs::new(dir.path()).unwrap());
    (dir, cache)
}

fn target(s: &str) -> TargetRef {
    TargetRef::parse(s).unwrap()
}

fn plan_order(plan: &BuildPlan) -> Vec<String> {
    plan.refs().map(ToString::to_string).collect()
}

#[test]
fn test_dependencies_come_first() {
    let (_temp, mut cache) = create_tree(&[(
        "p",
        r#"
c_binary(name = "A", deps = [":B", ":C"])
c_library(name = "B")
c_library(name = "C", deps = [":B"])
"#,
    )]);

    let plan = BuildPlan::resolve(&mut cache, &[target("//p:A")]).unwrap();
    assert_eq!(plan_order(&plan), vec!["//p:B", "//p:C", "//p:A"]);
}

#[test]
fn test_every_target_after_its_deps() {
    let (_temp, mut cache) = create_tree(&[
        ("app", "c_binary(name = 'main', deps = ['//lib:net', '//lib:log'])"),
        (
            "lib",
            "c_library(name = 'net', deps = [':base', ':log'])\n\
             c_library(name = 'log', deps = [':base'])\n\
             c_library(name = 'base')",
        ),
    ]);

    let plan = BuildPlan::resolve(&mut cache, &[target("//app:main")]).unwrap();
    assert_eq!(plan.len(), 4);

    let order = plan_order(&plan);
    let position = |s: &str| order.iter().position(|o| o == s).unwrap();
    for (target_ref, planned) in plan.iter() {
        for dep in planned.deps() {
            assert!(
                position(&dep.to_string()) < position(&target_ref.to_string()),
                "{dep} should precede {target_ref}"
            );
        }
    }
}

#[test]
fn test_shared_dependency_planned_once() {
    let (_temp, mut cache) = create_tree(&[(
        "p",
        "c_binary(name = 'x', deps = [':z'])\n\
         c_binary(name = 'y', deps = [':z'])\n\
         c_library(name = 'z')",
    )]);

    let plan = BuildPlan::resolve(&mut cache, &[target("//p:x"), target("//p:y")]).unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan_order(&plan)[0], "//p:z");
}

#[test]
fn test_cycle_reports_closing_edge() {
    let (_temp, mut cache) = create_tree(&[(
        "p",
        "c_library(name = 'A', deps = [':B'])\n\
         c_library(name = 'B', deps = [':C'])\n\
         c_library(name = 'C', deps = [':A'])",
    )]);

    let err = BuildPlan::resolve(&mut cache, &[target("//p:A")]).unwrap_err();
    match &err {
        BuildError::CircularDependency {
            dependency,
            dependent,
        } => {
            assert_eq!(dependency, &target("//p:A"));
            assert_eq!(dependent, &target("//p:C"));
        }
        other => panic!("Expected CircularDependency, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "//p:A -> ... -> //p:C -> //p:A: Circular dependency."
    );
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let (_temp, mut cache) = create_tree(&[("p", "c_library(name = 'A', deps = [':A'])")]);
    let err = BuildPlan::resolve(&mut cache, &[target("//p:A")]).unwrap_err();
    assert!(matches!(err, BuildError::CircularDependency { .. }));
}

#[test]
fn test_transitive_deps_keep_last_occurrence() {
    let (_temp, mut cache) = create_tree(&[(
        "p",
        "c_binary(name = 'W', deps = [':X', ':Y'])\n\
         c_library(name = 'X', deps = [':Y'])\n\
         c_library(name = 'Y', deps = [':Z'])\n\
         c_library(name = 'Z')",
    )]);

    let plan = BuildPlan::resolve(&mut cache, &[target("//p:W")]).unwrap();
    let transitive = plan.transitive_deps();
    // X contributes [X, Y, Z], then Y contributes [Y, Z]
    assert_eq!(
        transitive[&target("//p:W")],
        vec![target("//p:X"), target("//p:Y"), target("//p:Z")]
    );
    assert_eq!(transitive[&target("//p:Z")], Vec::<TargetRef>::new());
}

#[test]
fn test_missing_dependency() {
    let (_temp, mut cache) = create_tree(&[("p", "c_binary(name = 'A', deps = ['//q:gone'])")]);
    let err = BuildPlan::resolve(&mut cache, &[target("//p:A")]).unwrap_err();
    match err {
        BuildError::MissingTarget { target: missing } => assert_eq!(missing, target("//q:gone")),
        other => panic!("Expected MissingTarget, got {other:?}"),
    }
}

#[test]
fn test_duplicate_target_reported() {
    let (_temp, mut cache) = create_tree(&[
        (
            "p",
            "c_library(name = 'A', deps = ['//q:B'])\nc_library(name = 'A', srcs = ['a.c'])",
        ),
        ("q", "c_library(name = 'B')"),
    ]);
    let err = BuildPlan::resolve(&mut cache, &[target("//p:A")]).unwrap_err();
    match err {
        BuildError::DuplicateTarget { target: duplicate } => {
            assert_eq!(duplicate, target("//p:A"))
        }
        other => panic!("Expected DuplicateTarget, got {other:?}"),
    }
    // //q was never reached
    assert_eq!(cache.load_count(), 1);
}

#[test]
fn test_each_directory_loaded_once() {
    let (_temp, mut cache) = create_tree(&[
        ("a", "c_binary(name = 'x', deps = ['//b:y', '//b:z'])"),
        ("b", "c_library(name = 'y', deps = [':z'])\nc_library(name = 'z')"),
    ]);

    BuildPlan::resolve(&mut cache, &[target("//a:x")]).unwrap();
    assert_eq!(cache.load_count(), 2);

    BuildPlan::resolve(&mut cache, &[target("//b:y")]).unwrap();
    assert_eq!(cache.load_count(), 2);
}

#[test]
fn test_local_dependency_resolved_against_repository() {
    let (temp, mut cache) = create_tree(&[
        ("repo/app", "c_binary(name = 'main', deps = ['@/lib:core'])"),
        ("repo/lib", "c_library(name = 'core')"),
    ]);
    fs::create_dir_all(temp.path().join("repo/.git")).unwrap();

    let plan = BuildPlan::resolve(&mut cache, &[target("//repo/app:main")]).unwrap();
    assert_eq!(plan_order(&plan), vec!["//repo/lib:core", "//repo/app:main"]);
}

#[test]
fn test_summary_serializes() {
    let (_temp, mut cache) = create_tree(&[(
        "p",
        "cxx_binary(name = 'A', deps = [':B'])\ncxx_library(name = 'B')",
    )]);
    let plan = BuildPlan::resolve(&mut cache, &[target("//p:A")]).unwrap();

    let json = serde_json::to_value(plan.summary()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"target": "//p:B", "kind": "cxx_library", "deps": [], "transitive_deps": []},
            {"target": "//p:A", "kind": "cxx_binary", "deps": ["//p:B"], "transitive_deps": ["//p:B"]},
        ])
    );
}
