//! Event plumbing.
//!
//! Two layers share the same registration pattern. The native events class
//! registers one callback with the library through `Set{Event}`; the
//! forwarder registers one forwarding method with the native events class.
//! Both register on the first subscriber and unregister on the last, tracked
//! by an explicit subscriber count.

use heck::ToLowerCamelCase;
use tracing::debug;

use crate::model::*;
use crate::writer::{Mode, SourceWriter};

use super::decls::param_list;

/// `_propertyChange` for `PropertyChange`.
pub(crate) fn field_name(event: &EventDefinition) -> String {
    format!("_{}", event.name.to_lower_camel_case())
}

fn subscribers_name(event: &EventDefinition) -> String {
    format!("{}Subscribers", field_name(event))
}

fn argument_names(f: &FunctionDefinition) -> String {
    f.params
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `add`/`remove` accessors. `register`/`unregister` are the statements run on
/// the 0→1 and 1→0 subscriber transitions.
fn write_accessors(
    w: &mut SourceWriter<'_>,
    event: &EventDefinition,
    register: &[String],
    unregister: &[String],
) {
    let field = field_name(event);
    let subscribers = subscribers_name(event);

    w.open_block("add");
    w.open_block("if (value == null)");
    w.write_line("return;");
    w.close_block();
    w.write_line(format!("{field} += value;"));
    w.write_line(format!("{subscribers}++;"));
    w.open_block(format!("if ({subscribers} == 1)"));
    for line in register {
        w.write_line(line);
    }
    w.close_block();
    w.close_block();

    w.open_block("remove");
    w.open_block("if (value == null)");
    w.write_line("return;");
    w.close_block();
    w.write_line(format!("var previous = {field};"));
    w.write_line(format!("{field} -= value;"));
    // Removing a handler that was never added leaves the field untouched.
    w.open_block(format!("if (ReferenceEquals(previous, {field}))"));
    w.write_line("return;");
    w.close_block();
    w.write_line(format!("{subscribers}--;"));
    w.open_block(format!("if ({subscribers} == 0)"));
    for line in unregister {
        w.write_line(line);
    }
    w.close_block();
    w.close_block();
}

/// `protected virtual void On{Event}(...)`, invoking current subscribers.
fn write_raiser(w: &mut SourceWriter<'_>, event: &EventDefinition, mode: Mode) {
    let f = &event.delegate;
    let header = format!(
        "protected virtual void On{}({})",
        event.name,
        param_list(w, &f.params, mode)
    );
    w.open_block(header);
    w.write_line(format!("var handler = {};", field_name(event)));
    w.open_block("if (handler != null)");
    w.write_line(format!("handler({});", argument_names(f)));
    w.close_block();
    w.close_block();
}

// ---------------------------------------------------------------------------
// Native layer
// ---------------------------------------------------------------------------

/// Fields, accessors and raisers of the native events class.
pub(crate) fn write_native_events(
    w: &mut SourceWriter<'_>,
    events: &[EventDefinition],
    mode: Mode,
) {
    w.begin_region("Event fields");
    for event in events {
        let handler = &event.delegate.name;
        let field = field_name(event);
        w.write_line(format!("private {handler} {field};"));
        // The delegate handed to native code must stay reachable while registered.
        w.write_line(format!("private {handler} {field}Callback;"));
        w.write_line(format!("private int {};", subscribers_name(event)));
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Event properties");
    for event in events {
        let field = field_name(event);
        w.open_block(format!(
            "public event {} {}",
            event.delegate.name, event.name
        ));
        write_accessors(
            w,
            event,
            &[
                format!("{field}Callback = On{};", event.name),
                format!("EntryPoints.Set{}({field}Callback);", event.name),
            ],
            &[
                format!("EntryPoints.Set{}(null);", event.name),
                format!("{field}Callback = null;"),
            ],
        );
        w.close_block();
        debug!(name = %event.name, target = mode.target.label(), "emitted native event");
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Event raisers");
    for event in events {
        write_raiser(w, event, mode);
    }
    w.end_region();
}

// ---------------------------------------------------------------------------
// Application layer
// ---------------------------------------------------------------------------

/// Argument passed from a native callback to the application raiser.
fn forwarded_argument(param: &ParameterDefinition, library: &LibraryDefinition) -> String {
    match library.kind_of(&param.ty) {
        TypeKind::Handle => format!("Wrap(vmid, {})", param.name),
        TypeKind::Bool => format!("ToBool({})", param.name),
        _ => param.name.clone(),
    }
}

/// Fields, accessors, raisers, forwarders and the detach routine of the
/// application events implementation. `mode` is the native mode of the
/// target; forwarders receive native arguments.
pub(crate) fn write_forwarding_events(
    w: &mut SourceWriter<'_>,
    events: &[EventDefinition],
    mode: Mode,
) {
    let app = Mode::application(mode.target);
    let library = w.library();

    w.begin_region("Event fields");
    for event in events {
        w.write_line(format!(
            "private {} {};",
            event.delegate.name,
            field_name(event)
        ));
        w.write_line(format!("private int {};", subscribers_name(event)));
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Event properties");
    for event in events {
        w.open_block(format!(
            "public override event {} {}",
            event.delegate.name, event.name
        ));
        write_accessors(
            w,
            event,
            &[format!("NativeEvents.{0} += Forward{0};", event.name)],
            &[format!("NativeEvents.{0} -= Forward{0};", event.name)],
        );
        w.close_block();
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Event raisers");
    for event in events {
        write_raiser(w, event, app);
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Event forwarders");
    for event in events {
        let f = &event.delegate;
        let header = format!(
            "private void Forward{}({})",
            event.name,
            param_list(w, &f.params, mode)
        );
        w.open_block(header);
        let args = f
            .params
            .iter()
            .map(|p| forwarded_argument(p, library))
            .collect::<Vec<_>>()
            .join(", ");
        w.write_line(format!("On{}({args});", event.name));
        w.close_block();
        debug!(name = %event.name, target = mode.target.label(), "emitted event forwarder");
    }
    w.end_region();
    w.blank_line();

    w.begin_region("Detach forwarders");
    w.open_block("private void DetachForwarders()");
    for event in events {
        w.write_line(format!("NativeEvents.{0} -= Forward{0};", event.name));
        w.write_line(format!("{} = null;", field_name(event)));
        w.write_line(format!("{} = 0;", subscribers_name(event)));
    }
    w.close_block();
    w.end_region();
}
