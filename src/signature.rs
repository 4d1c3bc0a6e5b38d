//! # Signature Extraction
//!
//! Reads what a handler declares about itself: its doc comment, and for each
//! parameter the name, type and the optional `#[param(...)]` annotation.
//!
//! ```ignore
//! /// Adds up the values.
//! #[handler]
//! pub fn total(
//!     #[param("Values to add")] values: Vec<f64>,
//!     #[param(description = "Round to", default = 2)] digits: u8,
//!     token: Header,
//! ) -> String { .. }
//! ```

use quote::ToTokens;
use serde_json::{Number, Value};
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, FnArg, Lit, LitStr, Pat, Signature, Token, UnOp};
use tracing::{debug, warn};

/// A handler function as declared in source.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSignature {
    /// The function name.
    pub name: String,
    /// The dedented doc comment, empty when the function has none.
    pub doc: String,
    /// Parameters in declaration order, receivers excluded.
    pub params: Vec<ParamSignature>,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSignature {
    /// Parameter name with any `r#` prefix removed.
    pub name: String,
    /// The declared type.
    pub ty: syn::Type,
    /// Description from `#[param("...")]` or `#[param(description = "...")]`.
    pub description: Option<String>,
    /// Default from `#[param(default = ...)]`, converted to JSON.
    pub default: Option<Value>,
}

/// Annotation content of a single parameter.
#[derive(Debug, Default)]
struct ParamAnnotation {
    description: Option<String>,
    default: Option<Value>,
}

/// Extracts the signature of a function from its attributes and `fn` signature.
pub fn extract_signature(attrs: &[Attribute], sig: &Signature) -> HandlerSignature {
    let mut params = Vec::new();

    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let name = match pat_type.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.unraw().to_string(),
            other => {
                debug!(
                    function = %sig.ident,
                    pattern = %other.to_token_stream(),
                    "skipping destructured parameter"
                );
                continue;
            }
        };
        let annotation = param_annotation(&pat_type.attrs, &name);
        params.push(ParamSignature {
            name,
            ty: (*pat_type.ty).clone(),
            description: annotation.description,
            default: annotation.default,
        });
    }

    HandlerSignature {
        name: sig.ident.unraw().to_string(),
        doc: doc_comment(attrs),
        params,
    }
}

/// Collects `///` and `#[doc = "..."]` lines into one dedented string.
pub fn doc_comment(attrs: &[Attribute]) -> String {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .collect();

    dedent(&lines.join("\n"))
}

/// Removes the common leading whitespace of non-blank lines and trims
/// surrounding blank lines.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.get(indent..).unwrap_or(line.trim_start()).trim_end()
            }
        })
        .collect::<Vec<&str>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn param_annotation(attrs: &[Attribute], name: &str) -> ParamAnnotation {
    let mut annotation = ParamAnnotation::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("param")) {
        match attr.parse_args_with(parse_param_args) {
            Ok(parsed) => {
                if parsed.description.is_some() {
                    annotation.description = parsed.description;
                }
                if parsed.default.is_some() {
                    annotation.default = parsed.default;
                }
            }
            Err(error) => {
                warn!(parameter = name, %error, "ignoring malformed #[param] annotation");
            }
        }
    }

    annotation
}

/// Parses `"description"`, `key = value` pairs, or a leading description
/// followed by pairs: `#[param("Round to", default = 2)]`.
///
/// The whole attribute is rejected when any part of it is malformed.
fn parse_param_args(input: ParseStream) -> syn::Result<ParamAnnotation> {
    let mut annotation = ParamAnnotation::default();

    if input.peek(LitStr) {
        let lit: LitStr = input.parse()?;
        annotation.description = Some(lit.value());
        if input.is_empty() {
            return Ok(annotation);
        }
        input.parse::<Token![,]>()?;
    }

    while !input.is_empty() {
        let key = input.call(syn::Ident::parse_any)?;
        input.parse::<Token![=]>()?;
        if key == "description" {
            let lit: LitStr = input.parse()?;
            annotation.description = Some(lit.value());
        } else if key == "default" {
            let expr: Expr = input.parse()?;
            annotation.default = Some(expr_to_json(&expr));
        } else {
            return Err(syn::Error::new_spanned(
                &key,
                "expected `description` or `default`",
            ));
        }
        if input.is_empty() {
            break;
        }
        input.parse::<Token![,]>()?;
    }

    Ok(annotation)
}

/// Converts a default-value expression into JSON.
///
/// Literals, negated numbers, arrays, `vec![..]`, `None` and plain string
/// conversions become JSON values. Anything else is kept as source text.
///
/// # Examples
/// ```
/// use route_openapi::signature::expr_to_json;
/// use serde_json::json;
///
/// let expr: syn::Expr = syn::parse_str("vec![1, -2]").unwrap();
/// assert_eq!(expr_to_json(&expr), json!([1, -2]));
/// ```
pub fn expr_to_json(expr: &Expr) -> Value {
    literal_value(expr).unwrap_or_else(|| Value::String(expr.to_token_stream().to_string()))
}

fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(lit) => lit_value(&lit.lit),
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => match literal_value(&unary.expr)? {
            Value::Number(n) => negate(&n),
            _ => None,
        },
        Expr::Array(array) => sequence(array.elems.iter()),
        Expr::Macro(mac) if mac.mac.path.is_ident("vec") => {
            let elems = mac
                .mac
                .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
                .ok()?;
            sequence(elems.iter())
        }
        Expr::Path(path) if path.path.is_ident("None") => Some(Value::Null),
        Expr::Reference(r) => literal_value(&r.expr),
        Expr::Paren(p) => literal_value(&p.expr),
        Expr::Group(g) => literal_value(&g.expr),
        Expr::MethodCall(call)
            if call.args.is_empty()
                && matches!(
                    call.method.to_string().as_str(),
                    "to_string" | "to_owned" | "into"
                ) =>
        {
            literal_value(&call.receiver)
        }
        Expr::Call(call) => {
            let Expr::Path(func) = call.func.as_ref() else {
                return None;
            };
            let func = func
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect::<Vec<String>>()
                .join("::");
            match (func.as_str(), call.args.len()) {
                ("Some" | "String::from" | "Box::new", 1) => literal_value(&call.args[0]),
                ("String::new", 0) => Some(Value::String(String::new())),
                ("Vec::new", 0) => Some(Value::Array(Vec::new())),
                _ => None,
            }
        }
        _ => None,
    }
}

fn sequence<'a>(elems: impl Iterator<Item = &'a Expr>) -> Option<Value> {
    elems
        .map(literal_value)
        .collect::<Option<Vec<Value>>>()
        .map(Value::Array)
}

fn lit_value(lit: &Lit) -> Option<Value> {
    match lit {
        Lit::Str(s) => Some(Value::String(s.value())),
        Lit::Char(c) => Some(Value::String(c.value().to_string())),
        Lit::Bool(b) => Some(Value::Bool(b.value)),
        Lit::Int(i) => i
            .base10_parse::<i64>()
            .map(Value::from)
            .or_else(|_| i.base10_parse::<u64>().map(Value::from))
            .ok(),
        Lit::Float(f) => f
            .base10_parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

fn negate(n: &Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return i.checked_neg().map(Value::from);
    }
    n.as_f64().and_then(|f| Number::from_f64(-f)).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse_fn(code: &str) -> HandlerSignature {
        let item: syn::ItemFn = syn::parse_str(code).expect("fn");
        extract_signature(&item.attrs, &item.sig)
    }

    fn default_of(code: &str) -> Value {
        let expr: Expr = syn::parse_str(code).expect(code);
        expr_to_json(&expr)
    }

    #[test]
    fn test_extract_params_and_annotations() {
        let sig = parse_fn(
            r#"
            /// Adds numbers.
            fn total(
                values: Vec<i64>,
                #[param("List of floats")] weights: Vec<f64>,
                #[param(description = "First value", default = 0)] i1: i64,
                r#type: String,
            ) -> String { String::new() }
            "#,
        );

        assert_eq!(sig.name, "total");
        assert_eq!(sig.doc, "Adds numbers.");
        let names: Vec<&str> = sig.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["values", "weights", "i1", "type"]);

        assert_eq!(sig.params[0].description, None);
        assert_eq!(sig.params[0].default, None);
        assert_eq!(sig.params[1].description.as_deref(), Some("List of floats"));
        assert_eq!(sig.params[2].description.as_deref(), Some("First value"));
        assert_eq!(sig.params[2].default, Some(json!(0)));
    }

    #[test]
    fn test_receivers_and_patterns_are_skipped() {
        let item: syn::ItemImpl = syn::parse_str(
            "impl Page { fn get(&self, (a, b): (i32, i32), name: &str) -> String { String::new() } }",
        )
        .expect("impl");
        let syn::ImplItem::Fn(method) = &item.items[0] else {
            panic!("expected a method");
        };
        let sig = extract_signature(&method.attrs, &method.sig);
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.params[0].name, "name");
    }

    #[test]
    fn test_malformed_annotation_is_ignored() {
        let sig = parse_fn("fn f(#[param(colour = 3)] x: i32) {}");
        assert_eq!(sig.params[0].description, None);
        assert_eq!(sig.params[0].default, None);
    }

    #[test]
    fn test_shorthand_description_with_default() {
        let sig = parse_fn(r#"fn f(#[param("Round to", default = 5)] x: i32) {}"#);
        assert_eq!(sig.params[0].description.as_deref(), Some("Round to"));
        assert_eq!(sig.params[0].default, Some(json!(5)));
    }

    #[test]
    fn test_partly_malformed_annotation_is_ignored_whole() {
        let sig = parse_fn("fn f(#[param(default = 5, colour = 3)] x: i32) {}");
        assert_eq!(sig.params[0].description, None);
        assert_eq!(sig.params[0].default, None);
    }

    #[test]
    fn test_valid_annotation_survives_malformed_sibling() {
        let sig = parse_fn(
            r#"fn f(#[param(description = "Kept")] #[param(default = 1, colour = 3)] x: i32) {}"#,
        );
        assert_eq!(sig.params[0].description.as_deref(), Some("Kept"));
        assert_eq!(sig.params[0].default, None);
    }

    #[test]
    fn test_missing_doc_is_empty() {
        assert_eq!(parse_fn("fn f() {}").doc, "");
    }

    #[test]
    fn test_doc_is_dedented() {
        let sig = parse_fn(
            r#"
            ///
            /// This is a **Markdown** docstring.
            ///
            ///     indented code
            fn f() {}
            "#,
        );
        assert_eq!(
            sig.doc,
            "This is a **Markdown** docstring.\n\n    indented code"
        );
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(default_of("0"), json!(0));
        assert_eq!(default_of("-3"), json!(-3));
        assert_eq!(default_of("0.5"), json!(0.5));
        assert_eq!(default_of("-1.5f32"), json!(-1.5));
        assert_eq!(default_of("\"Total\""), json!("Total"));
        assert_eq!(default_of("'x'"), json!("x"));
        assert_eq!(default_of("true"), json!(true));
        assert_eq!(default_of("None"), Value::Null);
    }

    #[test]
    fn test_default_collections_and_conversions() {
        assert_eq!(default_of("[0]"), json!([0]));
        assert_eq!(default_of("vec![0.0]"), json!([0.0]));
        assert_eq!(default_of("vec![]"), json!([]));
        assert_eq!(default_of("Vec::new()"), json!([]));
        assert_eq!(default_of("\"abc\".to_string()"), json!("abc"));
        assert_eq!(default_of("String::from(\"abc\")"), json!("abc"));
        assert_eq!(default_of("Some(200)"), json!(200));
    }

    #[test]
    fn test_default_fallback_is_source_text() {
        assert_eq!(default_of("u32::MAX"), json!("u32 :: MAX"));
    }
}
