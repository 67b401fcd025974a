//! Schema-defect detection, run at generation time.
//!
//! The collector accepts any schema that deserializes. Before any code is
//! emitted, this pass walks every type reference and reports all defects at
//! once so a broken schema fails the build with actionable diagnostics
//! instead of producing C# that does not compile.

use std::collections::HashSet;

use anyhow::Result;

use crate::model::*;

/// A single defect with context about where it was found.
struct Defect {
    context: String,
    message: String,
}

/// Check every cross-reference in the library.
pub fn check_library(library: &LibraryDefinition) -> Result<()> {
    let mut defects: Vec<Defect> = Vec::new();

    check_duplicates(library, &mut defects);

    for en in &library.enums {
        let underlying_ok = en
            .underlying
            .name()
            .is_some_and(is_integer_primitive);
        if !underlying_ok {
            defects.push(Defect {
                context: format!("enum `{}`", en.name),
                message: format!("underlying type {:?} is not an integer primitive", en.underlying),
            });
        }
    }

    for (kind, records) in [("struct", &library.structs), ("class", &library.classes)] {
        for record in records {
            for field in &record.fields {
                let context = format!("field `{}` of {kind} `{}`", field.name, record.name);
                collect_unresolved(&field.ty, library, &context, &mut defects);
                check_count_binding(record, field, &context, &mut defects);
                if kind == "struct" && contains_by_value(library, &field.ty, &record.name) {
                    defects.push(Defect {
                        context,
                        message: "struct contains itself by value".to_string(),
                    });
                }
            }
        }
    }

    for f in &library.functions {
        let context = format!("function `{}`", f.name);
        check_signature(f, library, &context, &mut defects);
        check_function_params(f, library, &context, &mut defects);
    }
    for e in &library.events {
        let context = format!("event `{}`", e.name);
        check_signature(&e.delegate, library, &context, &mut defects);
        check_event_params(&e.delegate, library, &context, &mut defects);
    }

    if defects.is_empty() {
        return Ok(());
    }

    let mut msg = format!("{} schema defect(s) found:\n", defects.len());
    for d in &defects {
        msg.push_str(&format!("\n  • {} — {}", d.context, d.message));
    }
    anyhow::bail!("{msg}");
}

fn check_duplicates(library: &LibraryDefinition, out: &mut Vec<Defect>) {
    let mut types = HashSet::new();
    let type_names = library
        .enums
        .iter()
        .map(|e| e.name.as_str())
        .chain(library.structs.iter().map(|s| s.name.as_str()))
        .chain(library.classes.iter().map(|c| c.name.as_str()))
        .chain(library.aliases.iter().map(String::as_str));
    for name in type_names {
        if !types.insert(name) {
            out.push(Defect {
                context: format!("type `{name}`"),
                message: "declared more than once".to_string(),
            });
        }
    }

    // Every event also claims a `Set{name}` entry point.
    let mut entry_points = HashSet::new();
    let names = library
        .functions
        .iter()
        .map(|f| f.name.clone())
        .chain(library.events.iter().map(|e| format!("Set{}", e.name)));
    for name in names {
        if !entry_points.insert(name.clone()) {
            out.push(Defect {
                context: format!("entry point `{name}`"),
                message: "declared more than once".to_string(),
            });
        }
    }
}

fn check_signature(
    f: &FunctionDefinition,
    library: &LibraryDefinition,
    context: &str,
    out: &mut Vec<Defect>,
) {
    collect_unresolved(&f.return_type, library, &format!("return type of {context}"), out);
    for p in &f.params {
        collect_unresolved(
            &p.ty,
            library,
            &format!("param `{}` of {context}", p.name),
            out,
        );
        if p.ty.is_void() {
            out.push(Defect {
                context: format!("param `{}` of {context}", p.name),
                message: "parameters cannot be void".to_string(),
            });
        }
    }

    let needs_vmid = library.needs_conversion(&f.return_type)
        || f.params.iter().any(|p| library.needs_conversion(&p.ty));
    if needs_vmid {
        match f.vmid_param() {
            None => out.push(Defect {
                context: context.to_string(),
                message: "converts handles or records but has no `vmid` parameter".to_string(),
            }),
            Some(p) if p.ty.name() != Some("int") => out.push(Defect {
                context: context.to_string(),
                message: format!("`vmid` must be `int`, found {:?}", p.ty),
            }),
            Some(_) => {}
        }
    }
}

/// True if a value of `ty` holds a `target` struct inline, directly or
/// through nested struct fields. Arrays and classes are references and
/// break the chain.
fn contains_by_value(library: &LibraryDefinition, ty: &TypeReference, target: &str) -> bool {
    let mut visited = HashSet::new();
    reaches(library, ty, target, &mut visited)
}

fn reaches<'a>(
    library: &'a LibraryDefinition,
    ty: &TypeReference,
    target: &str,
    visited: &mut HashSet<&'a str>,
) -> bool {
    let Some(record) = ty.name().and_then(|name| library.find_struct(name)) else {
        return false;
    };
    if record.name == target {
        return true;
    }
    if !visited.insert(record.name.as_str()) {
        return false;
    }
    record
        .fields
        .iter()
        .any(|field| reaches(library, &field.ty, target, visited))
}

/// Shapes the function implementation synthesis has no conversion for.
fn check_function_params(
    f: &FunctionDefinition,
    library: &LibraryDefinition,
    context: &str,
    out: &mut Vec<Defect>,
) {
    let unsupported_return = match library.kind_of(&f.return_type) {
        TypeKind::Array if library.needs_conversion(&f.return_type) => {
            Some("array returns of handles or records are not supported")
        }
        TypeKind::Array if f.return_type.contains_bool() => {
            Some("bool array returns are not supported")
        }
        _ => None,
    };
    if let Some(message) = unsupported_return {
        out.push(Defect {
            context: format!("return type of {context}"),
            message: message.to_string(),
        });
    }

    for p in &f.params {
        let kind = library.kind_of(&p.ty);
        let unsupported = match kind {
            TypeKind::Bool if p.is_written() => Some("written bool parameters are not supported"),
            TypeKind::Handle | TypeKind::Struct if p.direction == Direction::OutAttr => {
                Some("`out_attr` is only supported for classes and buffers; use `out` or `ref`")
            }
            TypeKind::Array if library.needs_conversion(&p.ty) => {
                Some("array parameters of handles or records are not supported")
            }
            TypeKind::Array if p.ty.contains_bool() => {
                Some("bool array parameters are not supported")
            }
            _ => None,
        };
        if let Some(message) = unsupported {
            out.push(Defect {
                context: format!("param `{}` of {context}", p.name),
                message: message.to_string(),
            });
        }
    }
}

/// Callbacks only forward scalars: handles are wrapped, bools converted,
/// everything else is passed through unchanged.
fn check_event_params(
    f: &FunctionDefinition,
    library: &LibraryDefinition,
    context: &str,
    out: &mut Vec<Defect>,
) {
    for p in &f.params {
        let message = if p.is_written() {
            Some("callback parameters must be inputs")
        } else {
            match library.kind_of(&p.ty) {
                TypeKind::Struct | TypeKind::Class | TypeKind::Array => {
                    Some("callback parameters cannot be records or arrays")
                }
                _ => None,
            }
        };
        if let Some(message) = message {
            out.push(Defect {
                context: format!("param `{}` of {context}", p.name),
                message: message.to_string(),
            });
        }
    }
}

fn check_count_binding(
    record: &TypeDefinition,
    field: &FieldDefinition,
    context: &str,
    out: &mut Vec<Defect>,
) {
    let TypeReference::Array {
        count_field: Some(count),
        ..
    } = &field.ty
    else {
        return;
    };
    match record.field(count) {
        None => out.push(Defect {
            context: context.to_string(),
            message: format!("count field `{count}` does not exist"),
        }),
        Some(sibling) if !sibling.ty.name().is_some_and(is_integer_primitive) => {
            out.push(Defect {
                context: context.to_string(),
                message: format!("count field `{count}` is not an integer"),
            })
        }
        Some(_) => {}
    }
}

/// Recursively walk a type reference and collect every name the library
/// cannot classify.
fn collect_unresolved(
    ty: &TypeReference,
    library: &LibraryDefinition,
    context: &str,
    out: &mut Vec<Defect>,
) {
    match ty {
        TypeReference::Array { element, .. } => {
            if element.is_void() {
                out.push(Defect {
                    context: context.to_string(),
                    message: "arrays of void are not allowed".to_string(),
                });
            }
            collect_unresolved(element, library, context, out);
        }
        TypeReference::Named(name) => {
            if library.kind_of(ty) == TypeKind::Unknown {
                out.push(Defect {
                    context: context.to_string(),
                    message: format!("unresolved type `{name}`"),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_schema;
    use crate::extract::extract_library;

    fn check(schema: &str) -> Result<()> {
        check_library(&extract_library(&parse_schema(schema).unwrap()))
    }

    #[test]
    fn valid_schema_passes() {
        check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Point"
            fields = [{ name = "x", type = "int" }, { name = "y", type = "int" }]

            [[function]]
            name = "TryGetPoint"
            returns = "bool"
            params = [
              { name = "vmid", type = "int" },
              { name = "p", type = "Point", direction = "out" },
            ]
            "#,
        )
        .unwrap();
    }

    #[test]
    fn all_defects_are_reported_together() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Values"
            fields = [
              { name = "values", type = "int[]", count = "missing" },
              { name = "mystery", type = "Mystery" },
            ]

            [[function]]
            name = "GetContext"
            params = [{ name = "ac", type = "JavaObjectHandle", direction = "out" }]
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.starts_with("3 schema defect(s)"), "{err}");
        assert!(err.contains("count field `missing` does not exist"), "{err}");
        assert!(err.contains("unresolved type `Mystery`"), "{err}");
        assert!(err.contains("no `vmid` parameter"), "{err}");
    }

    #[test]
    fn event_entry_point_collision_is_reported() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[function]]
            name = "SetPing"

            [[event]]
            name = "Ping"
            params = [{ name = "vmid", type = "int" }]
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("entry point `SetPing`"), "{err}");
    }

    #[test]
    fn callbacks_reject_records() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Point"
            fields = [{ name = "x", type = "int" }]

            [[event]]
            name = "Moved"
            params = [{ name = "vmid", type = "int" }, { name = "p", type = "Point" }]
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("param `p` of event `Moved`"), "{err}");
        assert!(err.contains("cannot be records or arrays"), "{err}");
    }

    #[test]
    fn count_field_must_be_integer() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Values"
            fields = [
              { name = "count", type = "string" },
              { name = "values", type = "int[]", count = "count" },
            ]
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("is not an integer"), "{err}");
    }

    #[test]
    fn out_attr_handles_and_structs_are_rejected() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Point"
            fields = [{ name = "x", type = "int" }]

            [[function]]
            name = "GetParent"
            params = [
              { name = "vmid", type = "int" },
              { name = "parent", type = "JavaObjectHandle", direction = "out_attr" },
            ]

            [[function]]
            name = "GetPoint"
            params = [
              { name = "vmid", type = "int" },
              { name = "p", type = "Point", direction = "out_attr" },
            ]
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.starts_with("2 schema defect(s)"), "{err}");
        assert!(err.contains("param `parent` of function `GetParent`"), "{err}");
        assert!(err.contains("param `p` of function `GetPoint`"), "{err}");
        assert!(err.contains("use `out` or `ref`"), "{err}");
    }

    #[test]
    fn unconvertible_arrays_are_rejected() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[function]]
            name = "GetChildren"
            returns = "JavaObjectHandle[]"
            params = [{ name = "vmid", type = "int" }]

            [[function]]
            name = "SetFlags"
            params = [{ name = "flags", type = "bool[]" }]

            [[function]]
            name = "GetFlags"
            returns = "bool[][]"
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.starts_with("3 schema defect(s)"), "{err}");
        assert!(
            err.contains("return type of function `GetChildren` — array returns"),
            "{err}"
        );
        assert!(
            err.contains("param `flags` of function `SetFlags` — bool array parameters"),
            "{err}"
        );
        assert!(
            err.contains("return type of function `GetFlags` — bool array returns"),
            "{err}"
        );
    }

    #[test]
    fn indirect_struct_cycles_are_reported() {
        let err = check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "A"
            fields = [{ name = "b", type = "B" }]

            [[struct]]
            name = "B"
            fields = [{ name = "a", type = "A" }]
            "#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.starts_with("2 schema defect(s)"), "{err}");
        assert!(err.contains("field `b` of struct `A` — struct contains itself"), "{err}");
        assert!(err.contains("field `a` of struct `B` — struct contains itself"), "{err}");
    }

    #[test]
    fn struct_chains_through_arrays_and_classes_are_allowed() {
        check(
            r#"
            [output]
            namespace = "Interop"

            [[struct]]
            name = "Node"
            fields = [
              { name = "count", type = "int" },
              { name = "children", type = "Node[]", count = "count" },
              { name = "extra", type = "Holder" },
              { name = "inner", type = "Leaf" },
            ]

            [[struct]]
            name = "Leaf"
            fields = [{ name = "x", type = "int" }]

            [[class]]
            name = "Holder"
            fields = [{ name = "node", type = "Node" }]
            "#,
        )
        .unwrap();
    }
}
