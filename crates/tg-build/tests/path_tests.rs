//! Path algebra tests

use proptest::prelude::*;
use rstest::rstest;
use tg_build::path::{
    combine_paths, is_absolute_path, is_local_path, is_name, is_path, is_relative_path,
};
use tg_build::BuildError;

fn no_local_root(_: &str) -> Option<String> {
    None
}

/// Treats the first path segment as the local root: `//repo/a/b` -> `//repo`
fn first_segment_root(path: &str) -> Option<String> {
    let rest = path.strip_prefix("//")?;
    let head = rest.split('/').next()?;
    Some(format!("//{head}"))
}

#[rstest]
#[case("/", true, false, false)]
#[case("//a", true, false, false)]
#[case("//a/b.c", true, false, false)]
#[case("@", false, true, false)]
#[case("@/x", false, true, false)]
#[case("", false, false, true)]
#[case("a/b", false, false, true)]
#[case("-x/+y", false, false, true)]
fn test_path_classification(
    #[case] input: &str,
    #[case] absolute: bool,
    #[case] local: bool,
    #[case] relative: bool,
) {
    assert_eq!(is_absolute_path(input), absolute, "absolute {input:?}");
    assert_eq!(is_local_path(input), local, "local {input:?}");
    assert_eq!(is_relative_path(input), relative, "relative {input:?}");
    assert!(is_path(input));
}

#[rstest]
#[case("//")]
#[case("///a")]
#[case("/a")]
#[case("a/")]
#[case("a//b")]
#[case("//a/../b")]
#[case("./a")]
#[case("@a")]
#[case("a/@")]
#[case("a b")]
fn test_invalid_paths(#[case] input: &str) {
    assert!(!is_path(input), "{input:?} should not be a path");
}

#[rstest]
#[case("//a", &["b", "c/d"], "//a/b/c/d")]
#[case("//a", &["", "b", ""], "//a/b")]
#[case("//a", &["b", "//x", "y"], "//x/y")]
#[case("/", &["a"], "//a")]
#[case("//a/b", &[], "//a/b")]
fn test_combine_paths(#[case] base: &str, #[case] parts: &[&str], #[case] expected: &str) {
    assert_eq!(combine_paths(base, parts, no_local_root).unwrap(), expected);
}

#[test]
fn test_combine_local_part() {
    let combined = combine_paths("//repo/lib/net", &["@/base"], first_segment_root).unwrap();
    assert_eq!(combined, "//repo/base");

    let combined = combine_paths("//repo/lib", &["@"], first_segment_root).unwrap();
    assert_eq!(combined, "//repo");

    let combined = combine_paths("//other", &["x", "@/y"], first_segment_root).unwrap();
    assert_eq!(combined, "//other/y");
}

#[test]
fn test_combine_local_part_without_root() {
    let err = combine_paths("//a", &["@/b"], no_local_root).unwrap_err();
    match err {
        BuildError::LocalRootNotFound { path } => assert_eq!(path, "//a"),
        other => panic!("Expected LocalRootNotFound, got {other:?}"),
    }
}

#[rstest]
#[case("a", &[])]
#[case("@", &[])]
#[case("", &["a"])]
#[case("//a", &["../b"])]
#[case("//a", &["b/"])]
fn test_combine_rejects(#[case] base: &str, #[case] parts: &[&str]) {
    assert!(matches!(
        combine_paths(base, parts, no_local_root),
        Err(BuildError::InvalidAddress { .. })
    ));
}

fn token() -> impl Strategy<Value = String> {
    "[0-9A-Za-z_+-][0-9A-Za-z._+-]{0,6}"
}

fn absolute_path() -> impl Strategy<Value = String> {
    prop::collection::vec(token(), 0..4).prop_map(|segments| {
        if segments.is_empty() {
            "/".to_string()
        } else {
            segments.iter().map(|s| format!("/{s}")).collect::<String>().replacen('/', "//", 1)
        }
    })
}

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(token(), 1..4).prop_map(|segments| segments.join("/"))
}

proptest! {
    #[test]
    fn prop_generated_paths_classify(path in absolute_path(), rel in relative_path()) {
        prop_assert!(is_absolute_path(&path));
        prop_assert!(is_relative_path(&rel));
        prop_assert!(!is_absolute_path(&rel));
    }

    #[test]
    fn prop_relative_part_extends_base(base in absolute_path(), rel in relative_path()) {
        let combined = combine_paths(&base, &[rel.as_str()], no_local_root).unwrap();
        prop_assert!(combined.starts_with(&base));
        prop_assert!(combined.ends_with(&rel));
        prop_assert!(is_absolute_path(&combined));
    }

    #[test]
    fn prop_empty_part_is_identity(base in absolute_path()) {
        let combined = combine_paths(&base, &[""], no_local_root).unwrap();
        prop_assert_eq!(combined, base);
    }

    #[test]
    fn prop_absolute_part_replaces_base(base in absolute_path(), other in absolute_path()) {
        let combined = combine_paths(&base, &[other.as_str()], no_local_root).unwrap();
        prop_assert_eq!(combined, other);
    }

    #[test]
    fn prop_tokens_are_names(name in token()) {
        prop_assert!(is_name(&name));
    }
}
