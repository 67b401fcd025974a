//! Generates the Java Access Bridge interop source from `access_bridge.toml`.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// The Access Bridge schema, embedded so the generator runs from any
/// working directory.
pub const SCHEMA: &str = include_str!("../access_bridge.toml");

/// Path of the schema file in the source tree.
pub fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("access_bridge.toml")
}

/// Generate the interop source and write it to `output`.
pub fn generate(output: &Path) -> Result<()> {
    let source = abgen::generate_from_str(SCHEMA)?;
    abgen::write_output(output, &source)
}
