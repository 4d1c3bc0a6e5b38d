//! # Type Mapping
//!
//! Converts the Rust type of a handler parameter into a JSON Schema fragment.
//! Handles primitives, collections (`Vec<T>`, slices, sets), optionality
//! (`Option<T>`) and the `Header<T>` marker that moves a parameter from the
//! query string to the request headers.

use serde::Serialize;
use serde_json::{json, Value};
use syn::{GenericArgument, PathArguments, PathSegment, Type};

/// The scalar JSON Schema types a parameter can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// A string type. Also the fallback for anything unrecognized.
    String,
    /// An integer type.
    Integer,
    /// A floating point number.
    Number,
    /// A boolean type.
    Boolean,
}

/// Schema of a parameter value: a scalar or an array of schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSchema {
    /// `{type: <scalar>}`
    Scalar(JsonType),
    /// `{type: array, items: <schema>}`
    Array(Box<TypeSchema>),
}

impl TypeSchema {
    /// Renders the JSON Schema fragment.
    pub fn to_json(&self) -> Value {
        match self {
            TypeSchema::Scalar(t) => json!({ "type": t }),
            TypeSchema::Array(items) => json!({
                "type": "array",
                "items": items.to_json(),
            }),
        }
    }
}

impl Default for TypeSchema {
    fn default() -> Self {
        TypeSchema::Scalar(JsonType::String)
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Query string (the default).
    #[default]
    Query,
    /// Request header, selected by the `Header<T>` marker type.
    Header,
}

/// Everything a parameter's type says about it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeHint {
    /// The value schema.
    pub schema: TypeSchema,
    /// Query or header.
    pub location: ParamLocation,
    /// Set for `Option<T>`, which makes the parameter optional without a default.
    pub optional: bool,
}

/// Maps an optional type annotation to a [`TypeHint`].
///
/// A missing or unrecognized type degrades to a required string query parameter.
///
/// # Examples
/// ```
/// use route_openapi::type_mapping::map_type;
/// use serde_json::json;
///
/// let ty: syn::Type = syn::parse_str("Vec<i64>").unwrap();
/// let hint = map_type(Some(&ty));
/// assert_eq!(hint.schema.to_json(), json!({"type": "array", "items": {"type": "integer"}}));
/// ```
pub fn map_type(ty: Option<&Type>) -> TypeHint {
    ty.map(classify).unwrap_or_default()
}

/// Recursively classifies a syn type node.
fn classify(ty: &Type) -> TypeHint {
    match ty {
        Type::Reference(r) => classify(&r.elem),
        Type::Paren(p) => classify(&p.elem),
        Type::Group(g) => classify(&g.elem),
        Type::Slice(s) => array_of(Some(&s.elem)),
        Type::Array(a) => array_of(Some(&a.elem)),
        Type::Path(type_path) if type_path.qself.is_none() => match type_path.path.segments.last() {
            Some(segment) => classify_segment(segment),
            None => TypeHint::default(),
        },
        _ => TypeHint::default(),
    }
}

fn classify_segment(segment: &PathSegment) -> TypeHint {
    let inner = first_type_arg(segment);

    match segment.ident.to_string().as_str() {
        "Option" => TypeHint {
            optional: true,
            ..map_type(inner)
        },
        "Header" => TypeHint {
            location: ParamLocation::Header,
            ..map_type(inner)
        },

        // Containers
        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet" => array_of(inner),

        // Smart pointers and Cow are transparent
        "Box" | "Rc" | "Arc" | "Cow" => map_type(inner),

        name => scalar(json_type_of(name)),
    }
}

/// Maps a scalar type name. Unknown names fall back to `string`.
fn json_type_of(name: &str) -> JsonType {
    match name {
        "bool" => JsonType::Boolean,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => JsonType::Integer,
        n if n.starts_with("NonZero") => JsonType::Integer,
        "f32" | "f64" => JsonType::Number,
        _ => JsonType::String,
    }
}

fn array_of(elem: Option<&Type>) -> TypeHint {
    TypeHint {
        schema: TypeSchema::Array(Box::new(map_type(elem).schema)),
        ..TypeHint::default()
    }
}

fn scalar(t: JsonType) -> TypeHint {
    TypeHint {
        schema: TypeSchema::Scalar(t),
        ..TypeHint::default()
    }
}

/// First type argument of `Name<T, ...>`, skipping lifetimes (`Cow<'a, str>`).
fn first_type_arg(segment: &PathSegment) -> Option<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}
