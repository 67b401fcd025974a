//! Declarations: enums, structs, classes, delegates and abstract members.
//!
//! These are straight structural mappings. The only per-surface difference
//! is type spelling and marshaling annotations, both resolved through the
//! [`SourceWriter`] for the given [`Mode`].

use tracing::{debug, trace};

use crate::model::*;
use crate::writer::{AttributeTarget, Mode, SourceWriter};

pub(crate) const STRUCT_LAYOUT: &str =
    "[StructLayout(LayoutKind.Sequential, CharSet = CharSet.Unicode)]";
pub(crate) const FUNCTION_POINTER: &str =
    "[UnmanagedFunctionPointer(CallingConvention.Cdecl, CharSet = CharSet.Unicode)]";

/// Direction keyword (or attribute) written before a parameter type.
fn direction_prefix(param: &ParameterDefinition, mode: Mode) -> &'static str {
    match param.direction {
        Direction::In => "",
        Direction::Out => "out ",
        Direction::Ref => "ref ",
        Direction::OutAttr if mode.native => "[Out] ",
        Direction::OutAttr => "",
    }
}

pub(crate) fn param_decl(w: &SourceWriter<'_>, param: &ParameterDefinition, mode: Mode) -> String {
    let mut decl = String::new();
    if let Some(attr) = w.marshal_attribute(param.marshal.as_ref(), mode, AttributeTarget::Param) {
        decl.push_str(&attr);
        decl.push(' ');
    }
    decl.push_str(direction_prefix(param, mode));
    decl.push_str(&w.type_name(&param.ty, mode));
    decl.push(' ');
    decl.push_str(&param.name);
    decl
}

pub(crate) fn param_list(
    w: &SourceWriter<'_>,
    params: &[ParameterDefinition],
    mode: Mode,
) -> String {
    params
        .iter()
        .map(|p| param_decl(w, p, mode))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `public abstract R Name(params);` on the application surface.
pub(crate) fn write_abstract_function(
    w: &mut SourceWriter<'_>,
    f: &FunctionDefinition,
    mode: Mode,
) {
    let line = format!(
        "public abstract {} {}({});",
        w.type_name(&f.return_type, mode),
        f.name,
        param_list(w, &f.params, mode)
    );
    w.write_line(line);
}

/// A delegate type. Native delegates carry the calling convention and the
/// return marshaling annotation.
pub(crate) fn write_delegate(
    w: &mut SourceWriter<'_>,
    f: &FunctionDefinition,
    name: &str,
    mode: Mode,
) {
    if mode.native {
        w.write_line(FUNCTION_POINTER);
    }
    let return_attr = w.marshal_attribute(f.return_marshal.as_ref(), mode, AttributeTarget::Return);
    if let Some(attr) = return_attr {
        w.write_line(attr);
    }
    let line = format!(
        "public delegate {} {}({});",
        w.type_name(&f.return_type, mode),
        name,
        param_list(w, &f.params, mode)
    );
    w.write_line(line);
    trace!(name, native = mode.native, "  delegate");
}

pub(crate) fn write_enum(w: &mut SourceWriter<'_>, en: &EnumDefinition, mode: Mode) {
    if en.is_flags {
        w.write_line("[Flags]");
    }
    let header = format!(
        "public enum {} : {}",
        en.name,
        w.type_name(&en.underlying, mode)
    );
    w.open_block(header);
    for member in &en.members {
        w.write_line(format!("{} = {},", member.name, member.value));
    }
    w.close_block();
    debug!(name = %en.name, members = en.members.len(), "emitted enum");
}

/// Struct or class declaration for one surface.
pub(crate) fn write_record(
    w: &mut SourceWriter<'_>,
    record: &TypeDefinition,
    is_class: bool,
    mode: Mode,
) {
    if mode.native {
        w.write_line(STRUCT_LAYOUT);
    }
    let keyword = if is_class { "class" } else { "struct" };
    let name = w.type_name(&TypeReference::named(record.name.as_str()), mode);
    w.open_block(format!("public {keyword} {name}"));
    for field in &record.fields {
        let field_attr = w.marshal_attribute(field.marshal.as_ref(), mode, AttributeTarget::Field);
        if let Some(attr) = field_attr {
            w.write_line(attr);
        }
        let ty = w.type_name(&field.ty, mode);
        // Struct fields cannot carry initializers; copy routines allocate
        // missing class instances instead.
        let line = if is_class && w.library().kind_of(&field.ty) == TypeKind::Class {
            format!("public {ty} {} = new {ty}();", field.name)
        } else {
            format!("public {ty} {};", field.name)
        };
        w.write_line(line);
    }
    w.close_block();
    debug!(name = %name, fields = record.fields.len(), keyword, "emitted record");
}
