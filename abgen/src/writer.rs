//! Source writer: indentation-tracking text sink plus type-name resolution
//! for the two code surfaces.
//!
//! The writer holds no mode flag of its own. Every resolution call takes a
//! [`Mode`] value, so callers that need the other surface's spelling pass
//! [`Mode::inverted`] instead of toggling and restoring shared state.

use crate::config::TargetConfig;
use crate::model::{LibraryDefinition, MarshalAs, TypeKind, TypeReference, HANDLE_TYPE};

const INDENT_WIDTH: usize = 2;

/// Native integer type of booleans (alias emitted in the file header).
pub const NATIVE_BOOL: &str = "BOOL";

/// Native handle width of the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Modern,
    Legacy,
}

impl Target {
    /// Native spelling of the opaque handle type.
    pub fn handle_type(self) -> &'static str {
        match self {
            Target::Modern => "JOBJECT64",
            Target::Legacy => "JOBJECT32",
        }
    }

    /// Suffix appended to every class generated for this target.
    pub fn class_suffix(self) -> &'static str {
        match self {
            Target::Modern => "",
            Target::Legacy => "Legacy",
        }
    }

    /// Suffix appended to native struct and class names.
    pub fn record_suffix(self) -> &'static str {
        match self {
            Target::Modern => "Native",
            Target::Legacy => "NativeLegacy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Target::Modern => "modern",
            Target::Legacy => "legacy",
        }
    }
}

impl From<TargetConfig> for Target {
    fn from(cfg: TargetConfig) -> Self {
        match cfg {
            TargetConfig::Modern => Target::Modern,
            TargetConfig::Legacy => Target::Legacy,
        }
    }
}

/// Which surface a type name or annotation is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub native: bool,
    pub target: Target,
}

impl Mode {
    pub fn native(target: Target) -> Self {
        Mode {
            native: true,
            target,
        }
    }

    pub fn application(target: Target) -> Self {
        Mode {
            native: false,
            target,
        }
    }

    /// The other surface of the same target.
    pub fn inverted(self) -> Self {
        Mode {
            native: !self.native,
            target: self.target,
        }
    }
}

/// Where a marshaling annotation is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTarget {
    Field,
    Param,
    Return,
}

/// Text sink for one generated file.
pub struct SourceWriter<'lib> {
    library: &'lib LibraryDefinition,
    out: String,
    indent: usize,
}

impl<'lib> SourceWriter<'lib> {
    pub fn new(library: &'lib LibraryDefinition) -> Self {
        SourceWriter {
            library,
            out: String::new(),
            indent: 0,
        }
    }

    pub fn library(&self) -> &'lib LibraryDefinition {
        self.library
    }

    pub fn indent(&mut self) {
        self.indent += INDENT_WIDTH;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(INDENT_WIDTH);
    }

    /// Write one line prefixed with the current indentation. Empty lines are
    /// written without trailing whitespace.
    pub fn write_line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            self.out.extend(std::iter::repeat_n(' ', self.indent));
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.out.push('\n');
    }

    /// `header {` followed by an indent.
    pub fn open_block(&mut self, header: impl AsRef<str>) {
        self.write_line(format!("{} {{", header.as_ref()));
        self.indent();
    }

    pub fn close_block(&mut self) {
        self.outdent();
        self.write_line("}");
    }

    pub fn begin_region(&mut self, name: impl AsRef<str>) {
        self.write_line(format!("#region {}", name.as_ref()));
    }

    pub fn end_region(&mut self) {
        self.write_line("#endregion");
    }

    pub fn into_string(self) -> String {
        self.out
    }

    // -----------------------------------------------------------------------
    // Type-name resolution
    // -----------------------------------------------------------------------

    /// Spelling of `ty` on the surface selected by `mode`.
    ///
    /// Handles become a fixed-width integer natively (width chosen by the
    /// target) and the handle class on the application surface. Booleans
    /// become `BOOL` natively. Structs and classes get the target's native
    /// record suffix. Everything else keeps its logical name.
    pub fn type_name(&self, ty: &TypeReference, mode: Mode) -> String {
        match ty {
            TypeReference::Array { element, .. } => {
                format!("{}[]", self.type_name(element, mode))
            }
            TypeReference::Named(name) => match self.library.kind_of(ty) {
                TypeKind::Handle if mode.native => mode.target.handle_type().to_string(),
                TypeKind::Handle => HANDLE_TYPE.to_string(),
                TypeKind::Bool if mode.native => NATIVE_BOOL.to_string(),
                TypeKind::Struct | TypeKind::Class if mode.native => {
                    format!("{name}{}", mode.target.record_suffix())
                }
                _ => name.clone(),
            },
        }
    }

    /// `[MarshalAs(...)]` text for an annotation, or `None` on the
    /// application surface (annotations only describe native layout).
    pub fn marshal_attribute(
        &self,
        marshal: Option<&MarshalAs>,
        mode: Mode,
        target: AttributeTarget,
    ) -> Option<String> {
        if !mode.native {
            return None;
        }
        let marshal = marshal?;
        let mut args = format!("UnmanagedType.{}", marshal.kind);
        if let Some(size) = marshal.size_const {
            args.push_str(&format!(", SizeConst = {size}"));
        }
        if let Some(index) = marshal.size_param_index {
            args.push_str(&format!(", SizeParamIndex = {index}"));
        }
        let prefix = match target {
            AttributeTarget::Return => "return: ",
            AttributeTarget::Field | AttributeTarget::Param => "",
        };
        Some(format!("[{prefix}MarshalAs({args})]"))
    }
}
