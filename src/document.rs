//! # Document Assembly
//!
//! Walks the route table and builds the OpenAPI document: one path item per
//! normalized pattern, function operations inferred from handler sources and
//! explicit `openapi:` overrides merged on top.

use crate::config::{Application, UrlConfig, FUNCTION_HANDLER};
use crate::error::{AppError, AppResult};
use crate::function_spec::{function_spec, response_catalog, OperationSpec};
use crate::merge::merge_overwrite;
use crate::naming::{normalize_pattern, summary};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// The OpenAPI version written into every document.
pub const OPENAPI_VERSION: &str = "3.0.2";

/// Serialization format of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `application/json`
    #[default]
    Json,
    /// `application/yaml`
    Yaml,
}

impl OutputFormat {
    /// Parses `json`, `yaml` or `yml`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    /// The `Content-Type` to serve the document with.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Yaml => "application/yaml",
        }
    }

    /// Serializes the document.
    pub fn render(self, document: &Value) -> AppResult<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(document)?,
            OutputFormat::Yaml => serde_yaml::to_string(document)?,
        })
    }
}

/// Generates the document for an application.
///
/// `info` and `servers` come from the kwargs of the entry named `key`, or of
/// the first `OpenAPIHandler` entry when no key is given.
pub fn generate(app: &Application, key: Option<&str>) -> AppResult<Value> {
    let entry = match key {
        Some(key) => Some(app.config.url.get(key).ok_or_else(|| {
            AppError::Config(format!("no url entry named `{}`", key))
        })?),
        None => app.config.openapi_entry().map(|(_, url)| url),
    };

    let mut info = json!({ "title": "API", "version": "1.0.0" });
    if let Some(explicit) = entry.and_then(|url| url.kwargs.info.as_ref()) {
        merge_overwrite(&mut info, explicit);
    }
    let servers = entry
        .and_then(|url| url.kwargs.servers.clone())
        .unwrap_or_else(|| json!([]));

    let mut paths = Map::new();
    for (name, url) in &app.config.url {
        let pattern = normalize_pattern(&url.pattern);
        debug!(url = %name, %pattern, handler = %url.handler, "building path item");
        let item = path_item(app, name, url)?;
        paths.insert(pattern, item);
    }

    Ok(json!({
        "openapi": OPENAPI_VERSION,
        "info": info,
        "servers": servers,
        "paths": paths,
    }))
}

/// Builds the path item for one route table entry.
pub fn path_item(app: &Application, name: &str, url: &UrlConfig) -> AppResult<Value> {
    let summary = summary(&normalize_pattern(&url.pattern), &url.handler);

    let mut item = json!({
        "get": {
            "summary": summary,
            "responses": response_catalog(),
        }
    });

    if url.handler == FUNCTION_HANDLER {
        if let Some(mut operation) = function_operation(app, name, url) {
            operation.summary = Some(summary);
            let operation = serde_json::to_value(operation)?;
            if let Value::Object(methods) = &mut item {
                for method in url.methods() {
                    methods.insert(method.to_lowercase(), operation.clone());
                }
            }
        }
    }

    if let Some(overrides) = &url.openapi {
        merge_overwrite(&mut item, overrides);
    }

    Ok(item)
}

/// Resolves and maps the handler function of a `FunctionHandler` entry.
///
/// Failures degrade to `None` so the rest of the document is still produced.
fn function_operation(
    app: &Application,
    name: &str,
    url: &UrlConfig,
) -> Option<OperationSpec> {
    let Some(function) = url.kwargs.function.as_deref() else {
        warn!(url = %name, "FunctionHandler has no kwargs.function; documenting summary only");
        return None;
    };

    match app.sources.resolve(function) {
        Ok(signature) => Some(function_spec(&signature)),
        Err(error) => {
            warn!(url = %name, function, %error, "cannot introspect handler; documenting summary only");
            None
        }
    }
}

/// Checks that the document deserializes as an OpenAPI 3.0 document.
pub fn validate(document: &Value) -> AppResult<openapiv3::OpenAPI> {
    serde_json::from_value(document.clone()).map_err(|e| AppError::Validation(e.to_string()))
}
