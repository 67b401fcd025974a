//! Extraction: schema declarations → definition model.
//!
//! The collector is a straight mapping: declaration order is preserved and no
//! cross-reference is checked here. Dangling names surface later, when
//! [`crate::validate`] runs as part of generation.

use tracing::{debug, trace, warn};

use crate::config::{
    DirectionConfig, EnumConfig, EventConfig, FieldConfig, FunctionConfig, MarshalConfig,
    ParamConfig, Schema, TypeConfig,
};
use crate::model::*;

/// Build the [`LibraryDefinition`] for a schema.
pub fn extract_library(schema: &Schema) -> LibraryDefinition {
    let library = LibraryDefinition {
        functions: schema.function.iter().map(extract_function).collect(),
        events: schema.event.iter().map(extract_event).collect(),
        enums: schema.enums.iter().map(extract_enum).collect(),
        structs: schema.structs.iter().map(extract_type).collect(),
        classes: schema.classes.iter().map(extract_type).collect(),
        aliases: schema.alias.iter().map(|a| a.name.clone()).collect(),
    };

    debug!(
        functions = library.functions.len(),
        events = library.events.len(),
        enums = library.enums.len(),
        structs = library.structs.len(),
        classes = library.classes.len(),
        "collected library definition"
    );
    library
}

// ---------------------------------------------------------------------------
// Type strings
// ---------------------------------------------------------------------------

/// Parse a schema type string.
///
/// A trailing `&` marks a by-reference type; it is stripped before
/// classification and reported through the second tuple element. Each `[]`
/// suffix wraps the element in an array. The innermost name is canonicalized
/// if it is a primitive and passed through otherwise.
pub fn parse_type(text: &str) -> (TypeReference, bool) {
    let text = text.trim();
    let (text, by_ref) = match text.strip_suffix('&') {
        Some(pointee) => (pointee.trim_end(), true),
        None => (text, false),
    };
    (parse_type_inner(text), by_ref)
}

fn parse_type_inner(text: &str) -> TypeReference {
    match text.strip_suffix("[]") {
        Some(element) => TypeReference::array(parse_type_inner(element.trim_end())),
        None => {
            let name = canonical_primitive(text).unwrap_or(text);
            TypeReference::named(name)
        }
    }
}

fn extract_marshal(marshal: &Option<MarshalConfig>) -> Option<MarshalAs> {
    marshal.as_ref().map(|m| MarshalAs {
        kind: m.kind.clone(),
        size_const: m.size_const,
        size_param_index: m.size_param_index,
    })
}

// ---------------------------------------------------------------------------
// Functions and events
// ---------------------------------------------------------------------------

fn extract_function(f: &FunctionConfig) -> FunctionDefinition {
    let (return_type, _) = parse_type(&f.returns);
    let params: Vec<ParameterDefinition> = f.params.iter().map(extract_param).collect();
    trace!(name = %f.name, params = params.len(), "  function");
    FunctionDefinition {
        name: f.name.clone(),
        return_type,
        params,
        return_marshal: extract_marshal(&f.return_marshal),
    }
}

fn extract_event(e: &EventConfig) -> EventDefinition {
    let params: Vec<ParameterDefinition> = e.params.iter().map(extract_param).collect();
    trace!(name = %e.name, params = params.len(), "  event");
    EventDefinition {
        name: e.name.clone(),
        delegate: FunctionDefinition {
            name: format!("{}EventHandler", e.name),
            return_type: TypeReference::named("void"),
            params,
            return_marshal: None,
        },
    }
}

fn extract_param(p: &ParamConfig) -> ParameterDefinition {
    let (ty, by_ref) = parse_type(&p.ty);
    let direction = match (p.direction, by_ref) {
        (Some(DirectionConfig::In), true) => {
            warn!(param = %p.name, "by-reference type declared as `in`; treating as `ref`");
            Direction::Ref
        }
        (Some(DirectionConfig::In), false) | (None, false) => Direction::In,
        (None, true) | (Some(DirectionConfig::Ref), _) => Direction::Ref,
        (Some(DirectionConfig::Out), _) => Direction::Out,
        (Some(DirectionConfig::OutAttr), _) => Direction::OutAttr,
    };
    ParameterDefinition {
        name: p.name.clone(),
        ty,
        direction,
        marshal: extract_marshal(&p.marshal),
    }
}

// ---------------------------------------------------------------------------
// Enums, structs and classes
// ---------------------------------------------------------------------------

fn extract_enum(e: &EnumConfig) -> EnumDefinition {
    let (underlying, _) = parse_type(&e.underlying);
    trace!(name = %e.name, members = e.members.len(), "  enum");
    EnumDefinition {
        name: e.name.clone(),
        underlying,
        is_flags: e.flags,
        members: e
            .members
            .iter()
            .map(|m| EnumMemberDefinition {
                name: m.name.clone(),
                value: m.value.clone(),
            })
            .collect(),
    }
}

fn extract_type(t: &TypeConfig) -> TypeDefinition {
    trace!(name = %t.name, fields = t.fields.len(), "  record");
    TypeDefinition {
        name: t.name.clone(),
        fields: t.fields.iter().map(|f| extract_field(&t.name, f)).collect(),
    }
}

fn extract_field(owner: &str, f: &FieldConfig) -> FieldDefinition {
    let (mut ty, by_ref) = parse_type(&f.ty);
    if by_ref {
        warn!(owner = %owner, field = %f.name, "by-reference marker ignored on field");
    }
    if let Some(count) = &f.count {
        match &mut ty {
            TypeReference::Array { count_field, .. } => *count_field = Some(count.clone()),
            TypeReference::Named(_) => {
                warn!(
                    owner = %owner,
                    field = %f.name,
                    count = %count,
                    "count binding on non-array field ignored"
                );
            }
        }
    }
    FieldDefinition {
        name: f.name.clone(),
        ty,
        marshal: extract_marshal(&f.marshal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_schema;

    #[test]
    fn parse_type_unwraps_reference_and_arrays() {
        assert_eq!(parse_type("Int32"), (TypeReference::named("int"), false));
        assert_eq!(parse_type("Point&"), (TypeReference::named("Point"), true));
        assert_eq!(
            parse_type("int[][]"),
            (
                TypeReference::array(TypeReference::array(TypeReference::named("int"))),
                false
            )
        );
        assert_eq!(
            parse_type(" JavaObjectHandle[] & "),
            (TypeReference::array(TypeReference::named(HANDLE_TYPE)), true)
        );
    }

    #[test]
    fn extraction_preserves_order_and_directions() {
        let schema = parse_schema(
            r#"
            [output]
            namespace = "Interop"

            [[function]]
            name = "GetAccessibleContextFromHWND"
            returns = "Boolean"
            params = [
              { name = "window", type = "WindowHandle" },
              { name = "vmid", type = "int", direction = "out" },
              { name = "ac", type = "JavaObjectHandle", direction = "out" },
            ]

            [[function]]
            name = "DoAccessibleActions"
            returns = "bool"
            params = [
              { name = "vmid", type = "int" },
              { name = "actionsToDo", type = "AccessibleActionsToDo&" },
              { name = "failure", type = "int", direction = "out" },
              { name = "name", type = "StringBuilder", direction = "out_attr" },
            ]
            "#,
        )
        .unwrap();
        let lib = extract_library(&schema);
        assert_eq!(lib.functions.len(), 2);
        assert_eq!(lib.functions[0].name, "GetAccessibleContextFromHWND");
        assert!(lib.functions[0].return_type.is_bool());

        let params = &lib.functions[1].params;
        assert_eq!(params[0].direction, Direction::In);
        assert_eq!(params[1].direction, Direction::Ref);
        assert_eq!(params[1].ty, TypeReference::named("AccessibleActionsToDo"));
        assert_eq!(params[2].direction, Direction::Out);
        assert_eq!(params[3].direction, Direction::OutAttr);
    }

    #[test]
    fn count_binding_only_attaches_to_array_fields() {
        let schema = parse_schema(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Values"
            fields = [
              { name = "count", type = "int" },
              { name = "values", type = "int[]", count = "count", marshal = { kind = "ByValArray", size_const = 32 } },
              { name = "other", type = "int", count = "count" },
            ]
            "#,
        )
        .unwrap();
        let lib = extract_library(&schema);
        let values = &lib.structs[0].fields[1];
        assert_eq!(
            values.ty,
            TypeReference::Array {
                element: Box::new(TypeReference::named("int")),
                count_field: Some("count".to_string()),
            }
        );
        assert_eq!(values.marshal.as_ref().unwrap().size_const, Some(32));
        assert_eq!(lib.structs[0].fields[2].ty, TypeReference::named("int"));
    }

    #[test]
    fn events_get_void_handler_signature() {
        let schema = parse_schema(
            r#"
            [output]
            namespace = "Interop"

            [[event]]
            name = "Ping"
            params = [
              { name = "vmid", type = "int" },
              { name = "evt", type = "JavaObjectHandle" },
              { name = "source", type = "JavaObjectHandle" },
            ]

            [[enum]]
            name = "Role"
            members = [{ name = "A", value = "0x01" }, { name = "B", value = "1 << 2" }]
            "#,
        )
        .unwrap();
        let lib = extract_library(&schema);
        let ping = &lib.events[0];
        assert_eq!(ping.delegate.name, "PingEventHandler");
        assert!(ping.delegate.return_type.is_void());
        assert_eq!(ping.delegate.params.len(), 3);
        assert_eq!(lib.enums[0].members[1].value, "1 << 2");
        assert_eq!(lib.enums[0].underlying, TypeReference::named("int"));
    }
}
