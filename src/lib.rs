#![deny(missing_docs)]

//! # Route OpenAPI
//!
//! Builds an OpenAPI 3.0 document from an application's route table and the
//! Rust sources of its handler functions.

/// Shared error types.
pub mod error;

/// Route table configuration.
pub mod config;

/// Handler source resolution.
pub mod source;

/// Handler signature extraction.
pub mod signature;

/// Type mapping logic (Rust -> JSON Schema).
pub mod type_mapping;

/// Signature to operation mapping.
pub mod function_spec;

/// Pattern normalization and summaries.
pub mod naming;

/// Override merging.
pub mod merge;

/// Document assembly.
pub mod document;

/// HTTP surface.
pub mod server;

pub use config::{AppConfig, Application, Kwargs, Methods, UrlConfig};
pub use document::{generate, path_item, validate, OutputFormat, OPENAPI_VERSION};
pub use error::{AppError, AppResult};
pub use function_spec::{function_spec, parameter_spec, OperationSpec, ParameterSpec};
pub use merge::merge_overwrite;
pub use signature::{extract_signature, HandlerSignature, ParamSignature};
pub use source::SourceTree;
pub use type_mapping::{map_type, JsonType, ParamLocation, TypeHint, TypeSchema};
