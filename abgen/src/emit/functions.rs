//! Function implementation synthesis.
//!
//! Each application-level function forwards to the native entry point of the
//! same name. Parameters that differ between the two surfaces go through a
//! native temporary:
//!
//! 1. temporaries are declared ahead of the call (pre-populated for `ref`),
//! 2. the entry point is invoked with the temporaries substituted,
//! 3. every input handle is kept alive past the call,
//! 4. output temporaries are wrapped back into the caller's parameters,
//! 5. the return value is converted.

use tracing::debug;

use crate::model::*;
use crate::writer::{Mode, SourceWriter};

use super::decls::param_list;

/// Parameters of one function, partitioned by the treatment they need.
/// Every list keeps declaration order.
#[derive(Debug, Default)]
pub struct ParamBuckets<'a> {
    /// Handles the callee writes (`out`, `ref`, `[Out]`).
    pub out_handles: Vec<&'a ParameterDefinition>,
    /// Handles passed by value; these need a liveness guard after the call.
    pub in_handles: Vec<&'a ParameterDefinition>,
    /// Structs the callee writes.
    pub structs: Vec<&'a ParameterDefinition>,
    /// Classes the callee writes.
    pub classes: Vec<&'a ParameterDefinition>,
}

/// Partition the parameters of `f`. Pure; emits nothing.
pub fn classify_params<'a>(
    f: &'a FunctionDefinition,
    library: &LibraryDefinition,
) -> ParamBuckets<'a> {
    let mut buckets = ParamBuckets::default();
    for p in &f.params {
        match library.kind_of(&p.ty) {
            TypeKind::Handle if p.is_written() => buckets.out_handles.push(p),
            TypeKind::Handle => buckets.in_handles.push(p),
            TypeKind::Struct if p.is_written() => buckets.structs.push(p),
            TypeKind::Class if p.is_written() => buckets.classes.push(p),
            _ => {}
        }
    }
    buckets
}

fn temp_name(param: &ParameterDefinition) -> String {
    format!("{}Temp", param.name)
}

/// Direction keyword used at a call site. `[Out]` parameters have none.
fn call_keyword(param: &ParameterDefinition) -> &'static str {
    match param.direction {
        Direction::Out => "out ",
        Direction::Ref => "ref ",
        Direction::In | Direction::OutAttr => "",
    }
}

/// Argument expression passed to the native entry point for `param`.
fn call_argument(param: &ParameterDefinition, library: &LibraryDefinition) -> String {
    let keyword = call_keyword(param);
    match library.kind_of(&param.ty) {
        TypeKind::Handle | TypeKind::Struct | TypeKind::Class if param.is_written() => {
            format!("{keyword}{}", temp_name(param))
        }
        TypeKind::Handle | TypeKind::Struct | TypeKind::Class => {
            format!("Unwrap(vmid, {})", param.name)
        }
        TypeKind::Bool => format!("{keyword}ToBOOL({})", param.name),
        _ => format!("{keyword}{}", param.name),
    }
}

/// `public override R Name(params) { ... }` for one function.
pub(crate) fn write_function_impl(w: &mut SourceWriter<'_>, f: &FunctionDefinition, mode: Mode) {
    let library = w.library();
    let app = Mode::application(mode.target);
    let buckets = classify_params(f, library);

    let header = format!(
        "public override {} {}({})",
        w.type_name(&f.return_type, app),
        f.name,
        param_list(w, &f.params, app)
    );
    w.open_block(header);

    // Native temporaries, in bucket order.
    for p in &buckets.out_handles {
        if p.is_ref() {
            w.write_line(format!("var {} = Unwrap(vmid, {});", temp_name(p), p.name));
        } else {
            let line = format!("{} {};", w.type_name(&p.ty, mode), temp_name(p));
            w.write_line(line);
        }
    }
    for p in &buckets.structs {
        let native = w.type_name(&p.ty, mode);
        match p.direction {
            Direction::Ref => {
                w.write_line(format!("var {} = Unwrap(vmid, {});", temp_name(p), p.name))
            }
            Direction::Out => w.write_line(format!("{native} {};", temp_name(p))),
            Direction::OutAttr | Direction::In => {
                w.write_line(format!("var {} = new {native}();", temp_name(p)))
            }
        }
    }
    for p in &buckets.classes {
        if p.is_ref() {
            w.write_line(format!("var {} = Unwrap(vmid, {});", temp_name(p), p.name));
        } else {
            let native = w.type_name(&p.ty, mode);
            w.write_line(format!("var {} = new {native}();", temp_name(p)));
        }
    }

    // The call.
    let args = f
        .params
        .iter()
        .map(|p| call_argument(p, library))
        .collect::<Vec<_>>()
        .join(", ");
    if f.return_type.is_void() {
        w.write_line(format!("EntryPoints.{}({args});", f.name));
    } else {
        w.write_line(format!("var result = EntryPoints.{}({args});", f.name));
    }

    // Input handles must outlive the native call.
    for p in &buckets.in_handles {
        w.write_line(format!("GC.KeepAlive({});", p.name));
    }

    // Wrap outputs back into the application surface.
    for p in buckets.out_handles.iter().chain(&buckets.structs) {
        w.write_line(format!("{} = Wrap(vmid, {});", p.name, temp_name(p)));
    }
    for p in &buckets.classes {
        if p.is_out() {
            let app_type = w.type_name(&p.ty, app);
            w.write_line(format!("{} = new {app_type}();", p.name));
        }
        w.write_line(format!("CopyWrap(vmid, {}, {});", temp_name(p), p.name));
    }

    match library.kind_of(&f.return_type) {
        TypeKind::Void => {}
        TypeKind::Bool => w.write_line("return ToBool(result);"),
        TypeKind::Handle | TypeKind::Struct | TypeKind::Class => {
            w.write_line("return Wrap(vmid, result);")
        }
        _ => w.write_line("return result;"),
    }
    w.close_block();

    debug!(
        name = %f.name,
        target = mode.target.label(),
        out_handles = buckets.out_handles.len(),
        in_handles = buckets.in_handles.len(),
        structs = buckets.structs.len(),
        classes = buckets.classes.len(),
        "emitted function implementation"
    );
}
