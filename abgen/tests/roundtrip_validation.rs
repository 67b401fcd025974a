//! Schema-defect detection: every defect in `invalid/invalid.toml` is
//! reported in one error, and nothing is written.

mod common;

use std::sync::LazyLock;

use common::fixture;

static INVALID_RESULT: LazyLock<Result<String, String>> = LazyLock::new(|| {
    abgen::generate(&fixture("invalid/invalid.toml")).map_err(|e| format!("{e:#}"))
});

fn error() -> &'static str {
    INVALID_RESULT
        .as_ref()
        .expect_err("invalid schema should not generate")
}

#[test]
fn all_defects_are_reported_together() {
    let err = error();
    assert!(err.starts_with("validating schema: "), "{err}");
    assert!(err.contains("12 schema defect(s) found"), "{err}");
}

#[test]
fn each_defect_names_its_declaration() {
    let err = error();
    for expected in [
        "enum `Mode` — underlying type",
        "field `items` of struct `Buffer` — count field `length` does not exist",
        "field `next` of struct `Buffer` — struct contains itself by value",
        "param `value` of function `UseExternal` — unresolved type `DefinedElsewhere`",
        "function `LoseVm` — converts handles or records but has no `vmid` parameter",
        "param `where` of event `Moved` — callback parameters cannot be records or arrays",
        "field `link` of struct `Ring` — struct contains itself by value",
        "field `ring` of struct `Link` — struct contains itself by value",
        "param `parent` of function `GetParent` — `out_attr` is only supported",
        "param `known` of function `GetParent` — `out_attr` is only supported",
        "return type of function `GetChildren` — array returns of handles or records",
        "param `flags` of function `SetFlags` — bool array parameters are not supported",
    ] {
        assert!(err.contains(expected), "error should contain `{expected}`, got:\n{err}");
    }
}

#[test]
fn known_types_are_not_reported() {
    let err = error();
    assert!(
        !err.contains("unresolved type `KnownStruct`"),
        "KnownStruct is declared and must not be reported, got:\n{err}"
    );
}

#[test]
fn run_writes_nothing_on_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let schema = tmp.path().join("invalid.toml");
    std::fs::copy(fixture("invalid/invalid.toml"), &schema).unwrap();

    let err = abgen::run(&schema, None).unwrap_err();
    assert!(format!("{err:#}").contains("schema defect(s)"), "{err:#}");
    assert!(!tmp.path().join("ShouldNotExist.cs").exists());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = abgen::generate_from_str("[output\nnamespace = 1").unwrap_err();
    assert!(format!("{err:#}").starts_with("parsing schema"), "{err:#}");

    let err = abgen::generate_from_str("[output]\nlibrary = \"X\"\n").unwrap_err();
    assert!(format!("{err:#}").contains("namespace"), "{err:#}");
}

#[test]
fn missing_schema_file_names_the_path() {
    let err = abgen::generate(&fixture("does-not-exist.toml")).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("loading schema from"), "{msg}");
    assert!(msg.contains("does-not-exist.toml"), "{msg}");
}

#[test]
fn empty_target_list_is_rejected() {
    let err = abgen::generate_from_str("[output]\nnamespace = \"X\"\ntargets = []\n").unwrap_err();
    assert!(format!("{err:#}").contains("output.targets"), "{err:#}");
}
