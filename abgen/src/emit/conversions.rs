//! Wrap/unwrap synthesis for structs and classes.
//!
//! Every record gets four routines on the functions implementation class:
//! `Wrap` (native → application, allocating), `Unwrap` (application →
//! native, allocating) and the in-place `CopyWrap`/`CopyUnwrap` that both
//! allocating routines delegate to. Field copies recurse structurally.

use tracing::{debug, trace};

use crate::model::*;
use crate::writer::{Mode, SourceWriter, Target};

/// Direction of a conversion between the two surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conversion {
    /// Native → application.
    Wrap,
    /// Application → native.
    Unwrap,
}

impl Conversion {
    fn source_mode(self, target: Target) -> Mode {
        match self {
            Conversion::Wrap => Mode::native(target),
            Conversion::Unwrap => Mode::application(target),
        }
    }

    fn dest_mode(self, target: Target) -> Mode {
        self.source_mode(target).inverted()
    }

    fn value_fn(self) -> &'static str {
        match self {
            Conversion::Wrap => "Wrap",
            Conversion::Unwrap => "Unwrap",
        }
    }

    fn copy_fn(self) -> &'static str {
        match self {
            Conversion::Wrap => "CopyWrap",
            Conversion::Unwrap => "CopyUnwrap",
        }
    }

    fn bool_fn(self) -> &'static str {
        match self {
            Conversion::Wrap => "ToBool",
            Conversion::Unwrap => "ToBOOL",
        }
    }
}

/// `new T[count]`, with the count placed before any jagged `[]` suffixes
/// (`int[]` elements allocate as `new int[count][]`).
fn array_allocation(element_type: &str, count: &str) -> String {
    match element_type.find('[') {
        Some(idx) => format!(
            "new {}[{count}]{}",
            &element_type[..idx],
            &element_type[idx..]
        ),
        None => format!("new {element_type}[{count}]"),
    }
}

/// Emit the four conversion routines for one record.
pub(crate) fn write_record_conversions(
    w: &mut SourceWriter<'_>,
    record: &TypeDefinition,
    is_class: bool,
    target: Target,
) {
    for conversion in [Conversion::Wrap, Conversion::Unwrap] {
        write_allocating(w, record, is_class, target, conversion);
        w.blank_line();
    }
    for conversion in [Conversion::Wrap, Conversion::Unwrap] {
        write_copy(w, record, is_class, target, conversion);
        w.blank_line();
    }
    debug!(name = %record.name, target = target.label(), "emitted record conversions");
}

fn write_allocating(
    w: &mut SourceWriter<'_>,
    record: &TypeDefinition,
    is_class: bool,
    target: Target,
    conversion: Conversion,
) {
    let ty = TypeReference::named(record.name.as_str());
    let src_type = w.type_name(&ty, conversion.source_mode(target));
    let dest_type = w.type_name(&ty, conversion.dest_mode(target));

    w.open_block(format!(
        "private {dest_type} {}(int vmid, {src_type} info)",
        conversion.value_fn()
    ));
    if is_class {
        w.open_block("if (info == null)");
        w.write_line("return null;");
        w.close_block();
        w.write_line(format!("var result = new {dest_type}();"));
        w.write_line(format!("{}(vmid, info, result);", conversion.copy_fn()));
    } else {
        w.write_line(format!("var result = new {dest_type}();"));
        w.write_line(format!("{}(vmid, info, ref result);", conversion.copy_fn()));
    }
    w.write_line("return result;");
    w.close_block();
}

fn write_copy(
    w: &mut SourceWriter<'_>,
    record: &TypeDefinition,
    is_class: bool,
    target: Target,
    conversion: Conversion,
) {
    let ty = TypeReference::named(record.name.as_str());
    let src_type = w.type_name(&ty, conversion.source_mode(target));
    let dest_type = w.type_name(&ty, conversion.dest_mode(target));
    let by_ref = if is_class { "" } else { "ref " };

    w.open_block(format!(
        "private void {}(int vmid, {src_type} infoSrc, {by_ref}{dest_type} infoDest)",
        conversion.copy_fn()
    ));
    for field in &record.fields {
        let src = format!("infoSrc.{}", field.name);
        let dest = format!("infoDest.{}", field.name);
        let count = match &field.ty {
            TypeReference::Array {
                count_field: Some(count),
                ..
            } => Some(format!("infoSrc.{count}")),
            _ => None,
        };
        trace!(record = %record.name, field = %field.name, "  field copy");
        let copy = FieldCopy {
            target,
            conversion,
            in_place: true,
            depth: 0,
        };
        copy.write(w, &field.ty, &src, &dest, count.as_deref());
    }
    w.close_block();
}

/// Per-value copy rule, applied to fields and, recursively, to array elements.
#[derive(Clone, Copy)]
struct FieldCopy {
    target: Target,
    conversion: Conversion,
    /// Class values are populated in place (fields) rather than replaced
    /// with a freshly wrapped instance (array elements).
    in_place: bool,
    /// Array nesting depth, used to name loop variables.
    depth: usize,
}

impl FieldCopy {
    fn write(
        self,
        w: &mut SourceWriter<'_>,
        ty: &TypeReference,
        src: &str,
        dest: &str,
        count: Option<&str>,
    ) {
        let conversion = self.conversion;
        match ty {
            TypeReference::Array { element, .. } => {
                self.write_array(w, element, src, dest, count)
            }
            TypeReference::Named(_) => match w.library().kind_of(ty) {
                TypeKind::Struct | TypeKind::Handle => w.write_line(format!(
                    "{dest} = {}(vmid, {src});",
                    conversion.value_fn()
                )),
                TypeKind::Class if self.in_place => {
                    let dest_type = w.type_name(ty, conversion.dest_mode(self.target));
                    w.open_block(format!("if ({src} != null)"));
                    w.open_block(format!("if ({dest} == null)"));
                    w.write_line(format!("{dest} = new {dest_type}();"));
                    w.close_block();
                    w.write_line(format!("{}(vmid, {src}, {dest});", conversion.copy_fn()));
                    w.close_block();
                }
                TypeKind::Class => w.write_line(format!(
                    "{dest} = {}(vmid, {src});",
                    conversion.value_fn()
                )),
                TypeKind::Bool => {
                    w.write_line(format!("{dest} = {}({src});", conversion.bool_fn()))
                }
                _ => w.write_line(format!("{dest} = {src};")),
            },
        }
    }

    /// Null-guarded, element-wise array copy. The element count comes from
    /// the bound count field when there is one, otherwise from the source
    /// array itself, and exactly that many elements are allocated. The
    /// destination array is spelled in the destination surface while the
    /// elements reuse this copy rule.
    fn write_array(
        self,
        w: &mut SourceWriter<'_>,
        element: &TypeReference,
        src: &str,
        dest: &str,
        count: Option<&str>,
    ) {
        let count_var = format!("count{}", self.depth);
        let index = format!("i{}", self.depth);
        let element_type = w.type_name(element, self.conversion.dest_mode(self.target));

        w.open_block(format!("if ({src} != null)"));
        match count {
            Some(count) => w.write_line(format!("var {count_var} = {count};")),
            None => w.write_line(format!("var {count_var} = {src}.Length;")),
        }
        w.write_line(format!(
            "{dest} = {};",
            array_allocation(&element_type, &count_var)
        ));
        w.open_block(format!(
            "for (var {index} = 0; {index} < {count_var}; {index}++)"
        ));
        let inner = FieldCopy {
            in_place: false,
            depth: self.depth + 1,
            ..self
        };
        inner.write(
            w,
            element,
            &format!("{src}[{index}]"),
            &format!("{dest}[{index}]"),
            None,
        );
        w.close_block();
        w.close_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_schema;
    use crate::extract::extract_library;

    #[test]
    fn jagged_arrays_allocate_outer_dimension() {
        assert_eq!(array_allocation("int", "count0"), "new int[count0]");
        assert_eq!(array_allocation("int[]", "count0"), "new int[count0][]");
        assert_eq!(
            array_allocation("PointNative[][]", "n"),
            "new PointNative[n][][]"
        );
    }

    #[test]
    fn counted_array_reads_count_field() {
        let lib = extract_library(
            &parse_schema(
                r#"
                [output]
                namespace = "Interop"

                [[struct]]
                name = "Values"
                fields = [
                  { name = "count", type = "int" },
                  { name = "values", type = "int[]", count = "count" },
                ]
                "#,
            )
            .unwrap(),
        );
        let mut w = SourceWriter::new(&lib);
        write_copy(&mut w, &lib.structs[0], false, Target::Modern, Conversion::Wrap);
        let text = w.into_string();
        assert!(
            text.starts_with(
                "private void CopyWrap(int vmid, ValuesNative infoSrc, ref Values infoDest) {\n"
            ),
            "{text}"
        );
        assert!(text.contains("  infoDest.count = infoSrc.count;\n"), "{text}");
        assert!(text.contains("var count0 = infoSrc.count;"), "{text}");
        assert!(text.contains("infoDest.values = new int[count0];"), "{text}");
        assert!(text.contains("infoDest.values[i0] = infoSrc.values[i0];"), "{text}");
        assert!(!text.contains(".Length"), "{text}");
    }

    #[test]
    fn unwrap_allocates_exactly_count_elements() {
        let lib = extract_library(
            &parse_schema(
                r#"
                [output]
                namespace = "Interop"

                [[struct]]
                name = "ActionInfo"
                fields = [{ name = "name", type = "string" }]

                [[struct]]
                name = "ActionsToDo"
                fields = [
                  { name = "actionsCount", type = "int" },
                  { name = "actions", type = "ActionInfo[]", count = "actionsCount", marshal = { kind = "ByValArray", size_const = 32 } },
                ]
                "#,
            )
            .unwrap(),
        );
        let mut w = SourceWriter::new(&lib);
        write_copy(&mut w, &lib.structs[1], false, Target::Legacy, Conversion::Unwrap);
        let text = w.into_string();
        assert!(text.contains("var count0 = infoSrc.actionsCount;"), "{text}");
        assert!(
            text.contains("infoDest.actions = new ActionInfoNativeLegacy[count0];"),
            "{text}"
        );
        assert!(text.contains("for (var i0 = 0; i0 < count0; i0++)"), "{text}");
        assert!(
            text.contains("infoDest.actions[i0] = Unwrap(vmid, infoSrc.actions[i0]);"),
            "{text}"
        );
    }

    #[test]
    fn nested_class_fields_are_filled_in_place() {
        let lib = extract_library(
            &parse_schema(
                r#"
                [output]
                namespace = "Interop"

                [[class]]
                name = "Inner"
                fields = [{ name = "value", type = "int" }]

                [[class]]
                name = "Outer"
                fields = [{ name = "inner", type = "Inner" }]
                "#,
            )
            .unwrap(),
        );
        let mut w = SourceWriter::new(&lib);
        write_copy(&mut w, &lib.classes[1], true, Target::Modern, Conversion::Wrap);
        let text = w.into_string();
        assert!(
            text.starts_with(
                "private void CopyWrap(int vmid, OuterNative infoSrc, Outer infoDest) {\n"
            ),
            "{text}"
        );
        assert!(text.contains("CopyWrap(vmid, infoSrc.inner, infoDest.inner);"), "{text}");
        assert!(!text.contains("infoDest.inner = Wrap("), "{text}");
    }
}
