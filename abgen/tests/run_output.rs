//! End-to-end runs through `abgen::run`, writing into temporary directories.

mod common;

use common::{block, fixture};

#[test]
fn run_writes_next_to_schema_by_default() {
    let tmp = tempfile::tempdir().unwrap();
    let schema = tmp.path().join("modern_only.toml");
    std::fs::copy(fixture("modern_only.toml"), &schema).unwrap();

    let written = abgen::run(&schema, None).unwrap();
    assert_eq!(written, tmp.path().join("Generated.cs"));

    let on_disk = std::fs::read_to_string(&written).unwrap();
    assert_eq!(on_disk, abgen::generate(&schema).unwrap());
}

#[test]
fn run_honors_output_override_and_creates_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("nested/dir/Simple.cs");

    let written = abgen::run(&fixture("simple.toml"), Some(&output)).unwrap();
    assert_eq!(written, output);
    assert!(output.exists());
    assert!(!fixture("SimpleGenerated.cs").exists());
}

#[test]
fn generation_is_deterministic() {
    let first = abgen::generate(&fixture("simple.toml")).unwrap();
    let second = abgen::generate(&fixture("simple.toml")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn single_target_emits_one_native_surface() {
    let source = abgen::generate(&fixture("modern_only.toml")).unwrap();
    assert!(source.contains("internal partial class BridgeNativeFunctions : BridgeFunctions {"));
    assert!(!source.contains("NativeLegacy"), "{source}");
    assert!(!source.contains("EntryPointsLegacy"), "{source}");
    assert!(source.contains("using System.Runtime.InteropServices;\n\nusing BOOL = System.Int32;"));
    assert!(!source.contains("using System.Text;"));

    // `Int32` is canonicalized to `int`.
    let size = block(&source, "public struct Size {");
    assert!(size.contains("public int width;"), "{size}");

    let body = block(&source, "public override bool GetSize(");
    assert!(
        body.contains("var result = EntryPoints.GetSize(vmid, Unwrap(vmid, ac), out sizeTemp);"),
        "{body}"
    );
    assert!(body.contains("GC.KeepAlive(ac);\n      size = Wrap(vmid, sizeTemp);"), "{body}");
}
