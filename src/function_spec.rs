//! # Function Specs
//!
//! Maps a handler signature to an OpenAPI operation: one parameter per
//! declared argument, the doc comment as description and the standard
//! response catalog.

use crate::signature::{HandlerSignature, ParamSignature};
use crate::type_mapping::{map_type, ParamLocation};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

/// An OpenAPI parameter object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    /// `query` or `header`.
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Parameter name.
    pub name: String,
    /// Annotation description, empty when none was given.
    pub description: String,
    /// True when the parameter has no default and is not an `Option`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// JSON Schema of the value, including its `default`.
    pub schema: Value,
}

/// An OpenAPI response object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSpec {
    /// Human readable status text.
    pub description: String,
    /// Media types keyed by content type.
    pub content: IndexMap<String, Value>,
}

/// An OpenAPI operation object built from a function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSpec {
    /// Set by the document assembler from the route pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The function's doc comment.
    pub description: String,
    /// One entry per declared parameter.
    pub parameters: Vec<ParameterSpec>,
    /// Status code to response.
    pub responses: IndexMap<String, ResponseSpec>,
}

/// Builds the operation for a handler function.
pub fn function_spec(signature: &HandlerSignature) -> OperationSpec {
    OperationSpec {
        summary: None,
        description: signature.doc.clone(),
        parameters: signature.params.iter().map(parameter_spec).collect(),
        responses: response_catalog(),
    }
}

/// Builds the parameter object for one declared argument.
///
/// A parameter without a default is required unless its type is `Option<T>`.
/// The default, when present, is recorded in the schema.
pub fn parameter_spec(param: &ParamSignature) -> ParameterSpec {
    let hint = map_type(Some(&param.ty));
    let mut schema = hint.schema.to_json();

    if let (Some(default), Value::Object(map)) = (&param.default, &mut schema) {
        map.insert("default".to_string(), default.clone());
    }

    ParameterSpec {
        location: hint.location,
        name: param.name.clone(),
        description: param.description.clone().unwrap_or_default(),
        required: param.default.is_none() && !hint.optional,
        schema,
    }
}

/// The responses every function operation documents.
pub fn response_catalog() -> IndexMap<String, ResponseSpec> {
    let mut responses = IndexMap::new();
    responses.insert(
        "200".to_string(),
        ResponseSpec {
            description: "Successful Response".to_string(),
            content: IndexMap::from([("application/json".to_string(), json!({}))]),
        },
    );

    for (code, text) in [
        ("400", "Bad request"),
        ("401", "Not authorized"),
        ("403", "Forbidden"),
        ("404", "Not found"),
        ("500", "Internal server error"),
    ] {
        responses.insert(
            code.to_string(),
            ResponseSpec {
                description: text.to_string(),
                content: IndexMap::from([("text/html".to_string(), json!({ "example": text }))]),
            },
        );
    }

    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::extract_signature;
    use pretty_assertions::assert_eq;

    fn spec_of(code: &str) -> OperationSpec {
        let item: syn::ItemFn = syn::parse_str(code).expect("fn");
        function_spec(&extract_signature(&item.attrs, &item.sig))
    }

    fn param_json(spec: &OperationSpec, name: &str) -> Value {
        let param = spec
            .parameters
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("no parameter {}", name));
        serde_json::to_value(param).unwrap()
    }

    #[test]
    fn test_required_follows_default() {
        let spec = spec_of("fn f(a: i64, #[param(default = 0)] b: i64) {}");
        assert!(spec.parameters[0].required);
        assert!(!spec.parameters[1].required);
    }

    #[test]
    fn test_option_is_not_required() {
        let spec = spec_of("fn f(page: Option<u32>) {}");
        assert_eq!(
            param_json(&spec, "page"),
            json!({"in": "query", "name": "page", "description": "", "schema": {"type": "integer"}})
        );
    }

    #[test]
    fn test_list_parameter_schema() {
        let spec = spec_of(
            r#"fn f(
                #[param(description = "List of ints", default = [0])] li: Vec<i64>,
                lf: Vec<f64>,
            ) {}"#,
        );
        assert_eq!(
            param_json(&spec, "li"),
            json!({
                "in": "query",
                "name": "li",
                "description": "List of ints",
                "schema": {"type": "array", "items": {"type": "integer"}, "default": [0]}
            })
        );
        assert_eq!(
            param_json(&spec, "lf"),
            json!({
                "in": "query",
                "name": "lf",
                "description": "",
                "required": true,
                "schema": {"type": "array", "items": {"type": "number"}}
            })
        );
    }

    #[test]
    fn test_header_and_untyped_fallback() {
        let spec = spec_of(r#"fn f(#[param(default = "")] h: Header, id: Uuid) {}"#);
        assert_eq!(
            param_json(&spec, "h"),
            json!({"in": "header", "name": "h", "description": "", "schema": {"type": "string", "default": ""}})
        );
        assert_eq!(
            param_json(&spec, "id")["schema"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn test_description_and_responses() {
        let spec = spec_of("/// Sums things.\nfn f() {}");
        assert_eq!(spec.description, "Sums things.");
        assert!(spec.parameters.is_empty());

        let codes: Vec<&str> = spec.responses.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["200", "400", "401", "403", "404", "500"]);
        assert_eq!(
            serde_json::to_value(&spec.responses["404"]).unwrap(),
            json!({"description": "Not found", "content": {"text/html": {"example": "Not found"}}})
        );
        assert_eq!(
            serde_json::to_value(&spec.responses["200"]).unwrap(),
            json!({"description": "Successful Response", "content": {"application/json": {}}})
        );
    }
}
