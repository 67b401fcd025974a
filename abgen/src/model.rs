//! Definition model: the bridge between the schema and the code generator.
//!
//! These types are independent of both the TOML schema and the emitted C#,
//! which keeps the collector and the generator testable in isolation. The
//! whole model is built once per run and never mutated afterwards.

/// Logical name of the opaque object handle type.
pub const HANDLE_TYPE: &str = "JavaObjectHandle";

/// Framework types that may appear in a schema without a declaration.
pub const FRAMEWORK_TYPES: &[&str] = &["StringBuilder", "IntPtr"];

/// The closed set of primitive names, in canonical (C# keyword) spelling,
/// together with the aliases accepted for each of them.
const PRIMITIVES: &[(&str, &[&str])] = &[
    ("void", &["Void"]),
    ("bool", &["Boolean"]),
    ("string", &["String"]),
    ("float", &["Single"]),
    ("double", &["Double"]),
    ("sbyte", &["SByte", "int8"]),
    ("byte", &["Byte", "uint8"]),
    ("short", &["Int16", "int16"]),
    ("ushort", &["UInt16", "uint16"]),
    ("int", &["Int32", "int32"]),
    ("uint", &["UInt32", "uint32"]),
    ("long", &["Int64", "int64"]),
    ("ulong", &["UInt64", "uint64"]),
    ("char", &["Char"]),
];

/// Returns the canonical spelling of a primitive type name, or `None` if
/// `name` is not a primitive.
pub fn canonical_primitive(name: &str) -> Option<&'static str> {
    PRIMITIVES
        .iter()
        .find(|(canonical, aliases)| *canonical == name || aliases.contains(&name))
        .map(|(canonical, _)| *canonical)
}

/// Returns true for the integer primitives usable as array element counts.
pub fn is_integer_primitive(name: &str) -> bool {
    matches!(
        name,
        "sbyte" | "byte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong"
    )
}

/// A field, parameter or return type, independent of its native or
/// application representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeReference {
    /// Primitive, enum, struct, class, alias or the opaque handle marker.
    Named(String),
    /// `T[]`. Fields may bind a sibling field holding the element count.
    Array {
        element: Box<TypeReference>,
        count_field: Option<String>,
    },
}

impl TypeReference {
    pub fn named(name: impl Into<String>) -> Self {
        TypeReference::Named(name.into())
    }

    pub fn array(element: TypeReference) -> Self {
        TypeReference::Array {
            element: Box::new(element),
            count_field: None,
        }
    }

    /// The logical name of a named type, `None` for arrays.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeReference::Named(name) => Some(name),
            TypeReference::Array { .. } => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.name() == Some("void")
    }

    pub fn is_bool(&self) -> bool {
        self.name() == Some("bool")
    }

    /// True if `bool` appears anywhere in the type, including array elements.
    pub fn contains_bool(&self) -> bool {
        match self {
            TypeReference::Named(_) => self.is_bool(),
            TypeReference::Array { element, .. } => element.contains_bool(),
        }
    }
}

/// Native marshaling annotation (`[MarshalAs(...)]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalAs {
    pub kind: String,
    pub size_const: Option<u32>,
    pub size_param_index: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeReference,
    pub marshal: Option<MarshalAs>,
}

/// Parameter directionality. The variants are mutually exclusive, so a
/// parameter can never be both `out` and `ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    In,
    /// Language-level output parameter.
    Out,
    /// In/out parameter.
    Ref,
    /// Pointer to a caller-allocated buffer, written by the callee.
    OutAttr,
}

#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: String,
    pub ty: TypeReference,
    pub direction: Direction,
    pub marshal: Option<MarshalAs>,
}

impl ParameterDefinition {
    pub fn is_out(&self) -> bool {
        self.direction == Direction::Out
    }

    pub fn is_ref(&self) -> bool {
        self.direction == Direction::Ref
    }

    /// True for every direction in which the callee writes the value.
    pub fn is_written(&self) -> bool {
        self.direction != Direction::In
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: TypeReference,
    pub params: Vec<ParameterDefinition>,
    pub return_marshal: Option<MarshalAs>,
}

impl FunctionDefinition {
    /// The virtual machine id parameter that keys every handle conversion.
    pub fn vmid_param(&self) -> Option<&ParameterDefinition> {
        self.params.iter().find(|p| p.name == "vmid")
    }
}

/// A native callback. `delegate` describes the callback signature.
#[derive(Debug, Clone)]
pub struct EventDefinition {
    pub name: String,
    pub delegate: FunctionDefinition,
}

/// Struct and class declarations share one shape; the library keeps them
/// in separate lists because they marshal differently (inline value vs.
/// caller-allocated reference).
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct EnumDefinition {
    pub name: String,
    pub underlying: TypeReference,
    pub is_flags: bool,
    pub members: Vec<EnumMemberDefinition>,
}

#[derive(Debug, Clone)]
pub struct EnumMemberDefinition {
    pub name: String,
    /// Literal value text, preserved exactly as written.
    pub value: String,
}

/// The aggregate root produced by the collector.
#[derive(Debug, Default)]
pub struct LibraryDefinition {
    pub functions: Vec<FunctionDefinition>,
    pub events: Vec<EventDefinition>,
    pub enums: Vec<EnumDefinition>,
    pub structs: Vec<TypeDefinition>,
    pub classes: Vec<TypeDefinition>,
    /// Names declared through `using` aliases (e.g. `WindowHandle`).
    pub aliases: Vec<String>,
}

/// Classification of a type reference against the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Bool,
    /// Any other primitive, including `string`.
    Primitive,
    Handle,
    Enum,
    Struct,
    Class,
    /// Alias or framework type, passed through unchanged.
    External,
    Array,
    Unknown,
}

impl LibraryDefinition {
    pub fn find_struct(&self, name: &str) -> Option<&TypeDefinition> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_class(&self, name: &str) -> Option<&TypeDefinition> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, ty: &TypeReference) -> TypeKind {
        let name = match ty {
            TypeReference::Array { .. } => return TypeKind::Array,
            TypeReference::Named(name) => name.as_str(),
        };
        match name {
            "void" => TypeKind::Void,
            "bool" => TypeKind::Bool,
            HANDLE_TYPE => TypeKind::Handle,
            _ if canonical_primitive(name).is_some() => TypeKind::Primitive,
            _ if self.find_struct(name).is_some() => TypeKind::Struct,
            _ if self.find_class(name).is_some() => TypeKind::Class,
            _ if self.enums.iter().any(|e| e.name == name) => TypeKind::Enum,
            _ if self.aliases.iter().any(|a| a == name) || FRAMEWORK_TYPES.contains(&name) => {
                TypeKind::External
            }
            _ => TypeKind::Unknown,
        }
    }

    /// True if converting a value of `ty` between surfaces needs a `vmid`
    /// (handles, and records or arrays reaching handles through their fields).
    pub fn needs_conversion(&self, ty: &TypeReference) -> bool {
        match self.kind_of(ty) {
            TypeKind::Handle | TypeKind::Struct | TypeKind::Class => true,
            TypeKind::Array => match ty {
                TypeReference::Array { element, .. } => self.needs_conversion(element),
                TypeReference::Named(_) => false,
            },
            _ => false,
        }
    }
}
