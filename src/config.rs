//! # Route Table
//!
//! The application configuration: where the handler sources live and which
//! URL patterns are served by which handler.

use crate::error::{AppError, AppResult};
use crate::source::SourceTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Handler name for routes backed by a plain function.
pub const FUNCTION_HANDLER: &str = "FunctionHandler";

/// Handler name for routes serving the generated document.
pub const OPENAPI_HANDLER: &str = "OpenAPIHandler";

/// Methods a function handler answers when `kwargs.methods` is not set.
pub const DEFAULT_METHODS: [&str; 6] = ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];

/// Top level of the route table file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Crate root of the handler sources, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// URL entries keyed by name, in declaration order.
    #[serde(default)]
    pub url: IndexMap<String, UrlConfig>,
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UrlConfig {
    /// URL pattern, e.g. `/./docs` or `/total`.
    pub pattern: String,
    /// Handler class name, e.g. `FunctionHandler`.
    pub handler: String,
    /// Handler arguments.
    #[serde(default)]
    pub kwargs: Kwargs,
    /// Explicit OpenAPI path item, merged over the inferred one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<Value>,
}

/// Handler arguments this crate understands. Everything else is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Kwargs {
    /// Handler function path for `FunctionHandler`, e.g. `handlers::total`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// HTTP methods the function answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Methods>,
    /// `info` object for `OpenAPIHandler`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    /// `servers` list for `OpenAPIHandler`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Value>,
    /// Default output format for `OpenAPIHandler`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Other handler arguments.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `methods: [GET, POST]` or `methods: "GET, POST"`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Methods {
    /// A YAML list.
    List(Vec<String>),
    /// A comma or whitespace separated string.
    Text(String),
}

impl Methods {
    /// Method names, upper-cased, in declaration order.
    pub fn names(&self) -> Vec<String> {
        let names: Vec<&str> = match self {
            Methods::List(list) => list.iter().map(String::as_str).collect(),
            Methods::Text(text) => text
                .split(|c: char| c == ',' || c.is_whitespace())
                .collect(),
        };
        names
            .into_iter()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_uppercase)
            .collect()
    }
}

impl UrlConfig {
    /// Methods this entry's function answers.
    pub fn methods(&self) -> Vec<String> {
        match &self.kwargs.methods {
            Some(methods) => methods.names(),
            None => DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Parses a route table from YAML text.
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        for (key, url) in &config.url {
            if url.pattern.trim().is_empty() {
                return Err(AppError::Config(format!("url `{}` has an empty pattern", key)));
            }
        }
        Ok(config)
    }

    /// The first `OpenAPIHandler` entry, if any.
    pub fn openapi_entry(&self) -> Option<(&String, &UrlConfig)> {
        self.url
            .iter()
            .find(|(_, url)| url.handler == OPENAPI_HANDLER)
    }
}

/// A loaded application: its route table and its handler sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// The route table.
    pub config: AppConfig,
    /// The handler sources.
    pub sources: SourceTree,
}

impl Application {
    /// Loads the route table at `path`, resolving `source` relative to it.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).map_err(|error| AppError::ReadFile {
            filepath: path.to_path_buf(),
            error,
        })?;
        let config = AppConfig::from_yaml(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        debug!(config = %path.display(), routes = config.url.len(), "loaded route table");
        Ok(Self::from_config(config, base))
    }

    /// Builds an application from a parsed route table.
    ///
    /// Without an explicit `source`, `src/lib.rs` is used when present and
    /// `src/main.rs` otherwise.
    pub fn from_config(config: AppConfig, base: &Path) -> Self {
        let root = match &config.source {
            Some(source) => base.join(source),
            None => {
                let lib = base.join("src").join("lib.rs");
                if lib.is_file() {
                    lib
                } else {
                    base.join("src").join("main.rs")
                }
            }
        };
        Application {
            config,
            sources: SourceTree::new(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const TABLE: &str = r#"
source: app/lib.rs
url:
  docs:
    pattern: /./docs
    handler: OpenAPIHandler
    kwargs:
      info: {title: Demo, version: 1.0.0}
  total:
    pattern: /total
    handler: FunctionHandler
    kwargs:
      function: handlers::total
      methods: [get, Post]
      headers: {X-Frame-Options: deny}
    openapi:
      get: {summary: Add numbers}
"#;

    #[test]
    fn test_parse_route_table() {
        let config = AppConfig::from_yaml(TABLE).unwrap();
        let keys: Vec<&str> = config.url.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["docs", "total"]);

        let total = &config.url["total"];
        assert_eq!(total.kwargs.function.as_deref(), Some("handlers::total"));
        assert_eq!(total.methods(), vec!["GET", "POST"]);
        assert_eq!(
            total.kwargs.extra.get("headers"),
            Some(&json!({"X-Frame-Options": "deny"}))
        );
        assert_eq!(total.openapi, Some(json!({"get": {"summary": "Add numbers"}})));

        let (key, docs) = config.openapi_entry().unwrap();
        assert_eq!(key, "docs");
        assert_eq!(docs.kwargs.info, Some(json!({"title": "Demo", "version": "1.0.0"})));
    }

    #[test]
    fn test_default_and_text_methods() {
        let config = AppConfig::from_yaml(
            "url:\n  a: {pattern: /a, handler: FunctionHandler}\n  b: {pattern: /b, handler: FunctionHandler, kwargs: {methods: 'GET, put'}}\n",
        )
        .unwrap();
        assert_eq!(
            config.url["a"].methods(),
            vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"]
        );
        assert_eq!(config.url["b"].methods(), vec!["GET", "PUT"]);
    }

    #[test]
    fn test_rejects_empty_pattern() {
        let err = AppConfig::from_yaml("url:\n  a: {pattern: '', handler: X}\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = AppConfig::from_yaml("url: [").unwrap_err();
        assert!(matches!(err, AppError::Yaml(_)));
    }

    #[test]
    fn test_source_resolution() {
        let config = AppConfig::from_yaml(TABLE).unwrap();
        let app = Application::from_config(config, Path::new("/srv/app"));
        assert_eq!(app.sources.root(), Path::new("/srv/app/app/lib.rs"));

        let dir = tempfile::tempdir().unwrap();
        let app = Application::from_config(AppConfig::default(), dir.path());
        assert_eq!(app.sources.root(), dir.path().join("src").join("main.rs"));
    }
}
