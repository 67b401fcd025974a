//! Schema types for the declarative ABI description (`*.toml`).
//!
//! The schema lists every exported function, event callback, enum, struct
//! and class of the native library. It is the only input of the generator.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root of a schema file.
#[derive(Debug, Deserialize)]
pub struct Schema {
    pub output: OutputConfig,
    /// Extra `using Name = Target;` aliases, written after the built-in
    /// `BOOL`/`JOBJECT64`/`JOBJECT32` aliases.
    #[serde(default)]
    pub alias: Vec<AliasConfig>,
    #[serde(default)]
    pub function: Vec<FunctionConfig>,
    #[serde(default)]
    pub event: Vec<EventConfig>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumConfig>,
    #[serde(default, rename = "struct")]
    pub structs: Vec<TypeConfig>,
    #[serde(default, rename = "class")]
    pub classes: Vec<TypeConfig>,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// C# namespace of the generated file.
    pub namespace: String,
    /// Name stem of the generated classes (`{library}Functions`,
    /// `{library}EntryPoints`, ...).
    #[serde(default = "default_library")]
    pub library: String,
    /// Output file path, relative to the schema file.
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
    /// License text written as a comment block at the top of the file.
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default = "default_usings")]
    pub usings: Vec<String>,
    /// Native targets to emit. Each target gets its own native surface.
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,
}

fn default_library() -> String {
    "AccessBridge".to_string()
}

fn default_output_file() -> PathBuf {
    PathBuf::from("Generated.cs")
}

fn default_usings() -> Vec<String> {
    vec![
        "System".to_string(),
        "System.Runtime.InteropServices".to_string(),
        "System.Text".to_string(),
    ]
}

fn default_targets() -> Vec<TargetConfig> {
    vec![TargetConfig::Modern, TargetConfig::Legacy]
}

/// Native handle width of the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetConfig {
    /// 64-bit object handles.
    Modern,
    /// 32-bit object handles of the legacy bridge.
    Legacy,
}

#[derive(Debug, Deserialize)]
pub struct AliasConfig {
    pub name: String,
    pub target: String,
}

/// An exported native function.
#[derive(Debug, Deserialize)]
pub struct FunctionConfig {
    pub name: String,
    #[serde(default = "default_return_type")]
    pub returns: String,
    /// Marshaling of the return value (delegate-typed returns).
    #[serde(default)]
    pub return_marshal: Option<MarshalConfig>,
    #[serde(default)]
    pub params: Vec<ParamConfig>,
}

fn default_return_type() -> String {
    "void".to_string()
}

/// A native callback, registered through a `Set{name}` entry point.
#[derive(Debug, Deserialize)]
pub struct EventConfig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ParamConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Omitted means `in`, unless the type carries a trailing `&`.
    #[serde(default)]
    pub direction: Option<DirectionConfig>,
    #[serde(default)]
    pub marshal: Option<MarshalConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionConfig {
    In,
    /// Language-level output parameter (`out`).
    Out,
    /// In/out parameter (`ref`).
    Ref,
    /// Caller-allocated buffer written by the callee (`[Out]`).
    OutAttr,
}

#[derive(Debug, Deserialize)]
pub struct EnumConfig {
    pub name: String,
    #[serde(default = "default_enum_underlying")]
    pub underlying: String,
    #[serde(default)]
    pub flags: bool,
    #[serde(default)]
    pub members: Vec<EnumMemberConfig>,
}

fn default_enum_underlying() -> String {
    "int".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EnumMemberConfig {
    pub name: String,
    /// Literal text, emitted verbatim (e.g. `0x10`, `1 << 3`).
    pub value: String,
}

/// A struct or class declaration.
#[derive(Debug, Deserialize)]
pub struct TypeConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Sibling field holding the runtime element count of an array field.
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub marshal: Option<MarshalConfig>,
}

/// Native marshaling annotation, only honored on the native surface.
#[derive(Debug, Clone, Deserialize)]
pub struct MarshalConfig {
    /// `UnmanagedType` member name, e.g. `ByValTStr`.
    pub kind: String,
    #[serde(default)]
    pub size_const: Option<u32>,
    #[serde(default)]
    pub size_param_index: Option<u16>,
}

/// Load and parse a schema file.
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read schema file {}: {}", path.display(), e))?;
    parse_schema(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse schema file {}: {}", path.display(), e))
}

/// Parse schema text already in memory.
pub fn parse_schema(content: &str) -> anyhow::Result<Schema> {
    let schema: Schema = toml::from_str(content)?;
    Ok(schema)
}
