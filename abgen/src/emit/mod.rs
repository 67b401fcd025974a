//! Emitter: definition model → C# interop source.
//!
//! The file holds one application surface and one native surface per target.
//! The native surface consists of the entry-point container, the native
//! events class, native records, and the two implementation classes that
//! convert between the surfaces.

use anyhow::Result;
use heck::ToLowerCamelCase;
use tracing::{debug, info};

use crate::config::{AliasConfig, OutputConfig};
use crate::model::*;
use crate::writer::{Mode, SourceWriter, Target, NATIVE_BOOL};

mod conversions;
mod decls;
mod events;
mod functions;

pub use functions::{ParamBuckets, classify_params};

/// Names of the generated classes.
pub(crate) struct ClassNames<'a> {
    stem: &'a str,
}

impl<'a> ClassNames<'a> {
    pub(crate) fn new(stem: &'a str) -> Self {
        ClassNames { stem }
    }

    pub(crate) fn functions(&self) -> String {
        format!("{}Functions", self.stem)
    }

    pub(crate) fn events(&self) -> String {
        format!("{}Events", self.stem)
    }

    pub(crate) fn entry_points(&self, target: Target) -> String {
        format!("{}EntryPoints{}", self.stem, target.class_suffix())
    }

    pub(crate) fn native_events(&self, target: Target) -> String {
        format!("{}NativeEvents{}", self.stem, target.class_suffix())
    }

    pub(crate) fn native_functions(&self, target: Target) -> String {
        format!("{}NativeFunctions{}", self.stem, target.class_suffix())
    }

    pub(crate) fn events_forwarder(&self, target: Target) -> String {
        format!("{}NativeEventsForwarder{}", self.stem, target.class_suffix())
    }
}

/// Emit the complete source file.
pub fn emit_source(
    output: &OutputConfig,
    aliases: &[AliasConfig],
    library: &LibraryDefinition,
) -> Result<String> {
    let names = ClassNames::new(&output.library);
    let mut targets: Vec<Target> = Vec::new();
    for t in &output.targets {
        let t = Target::from(*t);
        if !targets.contains(&t) {
            targets.push(t);
        }
    }
    if targets.is_empty() {
        anyhow::bail!("`output.targets` must name at least one target");
    }

    let mut w = SourceWriter::new(library);

    write_header(&mut w, output, aliases);
    w.open_block(format!("namespace {}", output.namespace));

    // Enums have one spelling on both surfaces; the target is irrelevant.
    write_application_surface(&mut w, &names, library, targets[0]);
    for target in &targets {
        w.blank_line();
        write_native_surface(&mut w, &names, library, *target);
    }

    w.close_block();

    let source = w.into_string();
    info!(
        namespace = %output.namespace,
        targets = targets.len(),
        bytes = source.len(),
        "emitted interop source"
    );
    Ok(source)
}

fn write_header(w: &mut SourceWriter<'_>, output: &OutputConfig, aliases: &[AliasConfig]) {
    match &output.license {
        Some(license) => {
            for line in license.trim_end().lines() {
                if line.is_empty() {
                    w.write_line("//");
                } else {
                    w.write_line(format!("// {line}"));
                }
            }
        }
        None => {
            w.write_line("// <auto-generated>");
            w.write_line("// Generated by abgen. Do not edit; regenerate from the schema instead.");
            w.write_line("// </auto-generated>");
        }
    }
    w.blank_line();

    for using in &output.usings {
        w.write_line(format!("using {using};"));
    }
    w.blank_line();

    w.write_line(format!("using {NATIVE_BOOL} = System.Int32;"));
    w.write_line(format!("using {} = System.Int64;", Target::Modern.handle_type()));
    w.write_line(format!("using {} = System.Int32;", Target::Legacy.handle_type()));
    for alias in aliases {
        w.write_line(format!("using {} = {};", alias.name, alias.target));
    }
    w.blank_line();
}

// ---------------------------------------------------------------------------
// Application surface
// ---------------------------------------------------------------------------

fn write_application_surface(
    w: &mut SourceWriter<'_>,
    names: &ClassNames<'_>,
    library: &LibraryDefinition,
    target: Target,
) {
    let mode = Mode::application(target);
    w.begin_region("Application level types");

    w.open_block(format!("public abstract class {}", names.functions()));
    for f in &library.functions {
        decls::write_abstract_function(w, f, mode);
    }
    w.close_block();
    w.blank_line();

    w.open_block(format!("public abstract class {} : IDisposable", names.events()));
    for e in &library.events {
        w.write_line(format!(
            "public abstract event {} {};",
            e.delegate.name, e.name
        ));
    }
    w.write_line("public abstract void Dispose();");
    w.close_block();
    w.blank_line();

    if !library.events.is_empty() {
        w.begin_region("Event handler delegates");
        for e in &library.events {
            decls::write_delegate(w, &e.delegate, &e.delegate.name, mode);
        }
        w.end_region();
        w.blank_line();
    }

    for en in &library.enums {
        decls::write_enum(w, en, mode);
        w.blank_line();
    }
    write_records(w, library, mode);

    w.end_region();
    debug!("emitted application surface");
}

fn write_records(w: &mut SourceWriter<'_>, library: &LibraryDefinition, mode: Mode) {
    for s in &library.structs {
        decls::write_record(w, s, false, mode);
        w.blank_line();
    }
    for c in &library.classes {
        decls::write_record(w, c, true, mode);
        w.blank_line();
    }
}

// ---------------------------------------------------------------------------
// Native surface
// ---------------------------------------------------------------------------

fn write_native_surface(
    w: &mut SourceWriter<'_>,
    names: &ClassNames<'_>,
    library: &LibraryDefinition,
    target: Target,
) {
    let mode = Mode::native(target);
    w.begin_region(format!("Native level types ({})", target.label()));

    write_entry_points(w, names, library, mode);
    w.blank_line();
    write_native_events_class(w, names, library, mode);
    w.blank_line();
    write_records(w, library, mode);
    write_native_functions_class(w, names, library, mode);
    w.blank_line();
    write_events_forwarder_class(w, names, library, mode);

    w.end_region();
    debug!(target = target.label(), "emitted native surface");
}

/// Constructor plus a read-only property exposing the wrapped collaborator.
fn write_collaborator(w: &mut SourceWriter<'_>, class: &str, ty: &str, property: &str) {
    let param = property.to_lower_camel_case();
    let field = format!("_{param}");
    w.write_line(format!("private readonly {ty} {field};"));
    w.blank_line();
    w.open_block(format!("public {class}({ty} {param})"));
    w.write_line(format!("{field} = {param};"));
    w.close_block();
    w.blank_line();
    w.open_block(format!("public {ty} {property}"));
    w.write_line(format!("get {{ return {field}; }}"));
    w.close_block();
}

fn write_entry_points(
    w: &mut SourceWriter<'_>,
    names: &ClassNames<'_>,
    library: &LibraryDefinition,
    mode: Mode,
) {
    let native_events = names.native_events(mode.target);
    w.open_block(format!(
        "internal partial class {}",
        names.entry_points(mode.target)
    ));

    w.begin_region("Entry point delegate types");
    for f in &library.functions {
        decls::write_delegate(w, f, &format!("{}FP", f.name), mode);
    }
    for e in &library.events {
        w.write_line(decls::FUNCTION_POINTER);
        w.write_line(format!(
            "public delegate void Set{}FP({native_events}.{} fp);",
            e.name, e.delegate.name
        ));
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Entry points");
    for f in &library.functions {
        w.write_line(format!("public {0}FP {0} {{ get; set; }}", f.name));
    }
    for e in &library.events {
        w.write_line(format!("public Set{0}FP Set{0} {{ get; set; }}", e.name));
    }
    w.end_region();

    w.close_block();
}

fn write_native_events_class(
    w: &mut SourceWriter<'_>,
    names: &ClassNames<'_>,
    library: &LibraryDefinition,
    mode: Mode,
) {
    let class = names.native_events(mode.target);
    w.open_block(format!("internal partial class {class}"));
    write_collaborator(w, &class, &names.entry_points(mode.target), "EntryPoints");
    w.blank_line();

    w.begin_region("Event delegate types");
    for e in &library.events {
        decls::write_delegate(w, &e.delegate, &e.delegate.name, mode);
    }
    w.end_region();
    w.blank_line();

    events::write_native_events(w, &library.events, mode);
    w.close_block();
}

fn write_native_functions_class(
    w: &mut SourceWriter<'_>,
    names: &ClassNames<'_>,
    library: &LibraryDefinition,
    mode: Mode,
) {
    let class = names.native_functions(mode.target);
    w.open_block(format!(
        "internal partial class {class} : {}",
        names.functions()
    ));
    write_collaborator(w, &class, &names.entry_points(mode.target), "EntryPoints");
    w.blank_line();

    w.begin_region("Function implementations");
    for (i, f) in library.functions.iter().enumerate() {
        if i > 0 {
            w.blank_line();
        }
        functions::write_function_impl(w, f, mode);
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Struct conversions");
    for s in &library.structs {
        conversions::write_record_conversions(w, s, false, mode.target);
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Class conversions");
    for c in &library.classes {
        conversions::write_record_conversions(w, c, true, mode.target);
    }
    w.end_region();
    w.blank_line();

    write_scalar_conversions(w, mode, true);
    w.close_block();
}

fn write_events_forwarder_class(
    w: &mut SourceWriter<'_>,
    names: &ClassNames<'_>,
    library: &LibraryDefinition,
    mode: Mode,
) {
    let class = names.events_forwarder(mode.target);
    w.open_block(format!("internal partial class {class} : {}", names.events()));
    write_collaborator(w, &class, &names.native_events(mode.target), "NativeEvents");
    w.blank_line();

    events::write_forwarding_events(w, &library.events, mode);
    w.blank_line();

    w.open_block("public override void Dispose()");
    w.write_line("DetachForwarders();");
    w.close_block();
    w.blank_line();

    write_scalar_conversions(w, mode, false);
    w.close_block();
}

/// Boolean and handle conversions used by the generated glue.
fn write_scalar_conversions(w: &mut SourceWriter<'_>, mode: Mode, with_unwrap: bool) {
    let handle = mode.target.handle_type();
    w.begin_region("Handle and boolean conversions");

    w.open_block(format!("private static bool ToBool({NATIVE_BOOL} value)"));
    w.write_line("return value != 0;");
    w.close_block();
    w.blank_line();

    if with_unwrap {
        w.open_block(format!("private static {NATIVE_BOOL} ToBOOL(bool value)"));
        w.write_line("return value ? 1 : 0;");
        w.close_block();
        w.blank_line();
    }

    w.open_block(format!("private {HANDLE_TYPE} Wrap(int vmid, {handle} handle)"));
    w.write_line(format!("return new {HANDLE_TYPE}(vmid, handle);"));
    w.close_block();

    if with_unwrap {
        w.blank_line();
        w.open_block(format!(
            "private {handle} Unwrap(int vmid, {HANDLE_TYPE} objectHandle)"
        ));
        w.open_block("if (objectHandle == null)");
        w.write_line("return 0;");
        w.close_block();
        w.write_line(format!("return ({handle})objectHandle.Handle;"));
        w.close_block();
    }

    w.end_region();
}
