//! abgen: declarative ABI schema → dual-surface C# interop glue.
//!
//! Reads a TOML description of a native library's exported functions,
//! callbacks, enums, structs and classes, and emits one C# source file with
//! an application-facing API, a native-layout API per target bitness, and
//! the conversion code between them.
//!
//! # Quick start
//!
//! Generate the source file next to its schema (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads the schema, validates it, writes the generated source.
//! abgen::run(Path::new("access_bridge.toml"), None).unwrap();
//! ```
//!
//! Or get the source text without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let source = abgen::generate(Path::new("access_bridge.toml")).unwrap();
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

pub mod config;
pub mod emit;
pub mod extract;
pub mod model;
pub mod validate;
pub mod writer;

/// Run the full pipeline: load the schema, collect the model, validate it,
/// emit the source, and write the output file.
///
/// `schema_path` is the path to a schema TOML file.
/// `output` optionally overrides the output file path from the schema.
///
/// Returns the path the source was written to. Nothing is written when any
/// step fails.
pub fn run(schema_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let schema = config::load_schema(schema_path)
        .with_context(|| format!("loading schema from {}", schema_path.display()))?;

    let base_dir = schema_path.parent().unwrap_or_else(|| Path::new("."));

    let source = generate_from_schema(&schema)?;

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&schema.output.file),
    };
    write_output(&output_path, &source)?;
    Ok(output_path)
}

/// Parse a schema file and return the generated source without writing to
/// disk.
pub fn generate(schema_path: &Path) -> Result<String> {
    let schema = config::load_schema(schema_path)
        .with_context(|| format!("loading schema from {}", schema_path.display()))?;

    generate_from_schema(&schema)
}

/// Generate source from schema text already in memory.
pub fn generate_from_str(schema_text: &str) -> Result<String> {
    let schema = config::parse_schema(schema_text).context("parsing schema")?;
    generate_from_schema(&schema)
}

/// Generate source from an already-loaded [`config::Schema`].
pub fn generate_from_schema(schema: &config::Schema) -> Result<String> {
    info!(
        namespace = %schema.output.namespace,
        functions = schema.function.len(),
        events = schema.event.len(),
        "loaded schema"
    );

    let library = extract::extract_library(schema);

    // Cross-references are only checked now, so every defect in the schema
    // is reported in one error before anything is emitted.
    validate::check_library(&library).context("validating schema")?;

    emit::emit_source(&schema.output, &schema.alias, &library)
}

/// Write generated source to `path`, creating parent directories.
pub fn write_output(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    std::fs::write(path, source)
        .with_context(|| format!("writing output to {}", path.display()))?;

    info!(
        path = %path.display(),
        size = source.len(),
        "wrote interop source"
    );
    Ok(())
}
