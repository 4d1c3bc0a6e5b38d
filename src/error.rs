//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the crate.

use colored::Colorize;
use derive_more::From;
use std::{
    borrow::Cow,
    ffi::OsStr,
    fmt::{self, Display},
    io,
    path::{Path, PathBuf},
};

/// The Global Error Enum.
///
/// `From` conversions come from `derive_more`. `Display` is written by hand
/// so that source parse failures can render a rustc-style diagnostic.
#[derive(Debug, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    Io(io::Error),

    /// A file could not be read.
    #[from(ignore)]
    ReadFile {
        /// The file that failed.
        filepath: PathBuf,
        /// The underlying IO error.
        error: io::Error,
    },

    /// A handler source file is not valid Rust.
    #[from(ignore)]
    ParseFile {
        /// The syn error, carrying the span of the failure.
        error: syn::Error,
        /// The file that failed to parse.
        filepath: PathBuf,
        /// The file contents, used to render the offending line.
        source_code: String,
    },

    /// Malformed YAML in the route table or YAML output failure.
    Yaml(serde_yaml::Error),

    /// JSON serialization failure.
    Json(serde_json::Error),

    /// Document generation was cancelled on the blocking thread pool.
    Blocking(actix_web::error::BlockingError),

    /// A handler path could not be resolved in the source tree.
    #[from(ignore)]
    Resolve(String),

    /// Invalid route table contents.
    #[from(ignore)]
    Config(String),

    /// The assembled document is not a structurally valid OpenAPI document.
    #[from(ignore)]
    Validation(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::AppError::*;

        match self {
            Io(error) => write!(f, "IO Error: {}", error),
            ReadFile { filepath, error } => {
                write!(f, "Unable to read {}: {}", filepath.display(), error)
            }
            ParseFile {
                error,
                filepath,
                source_code,
            } => render_location(f, error, filepath, source_code),
            Yaml(error) => write!(f, "YAML Error: {}", error),
            Json(error) => write!(f, "JSON Error: {}", error),
            Blocking(error) => write!(f, "Blocking Task Error: {}", error),
            Resolve(msg) => write!(f, "Unresolved handler: {}", msg),
            Config(msg) => write!(f, "Configuration Error: {}", msg),
            Validation(msg) => write!(f, "Invalid OpenAPI document: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

// Render a rustc-style error message, including colors.
//
//     error: Syn unable to parse file
//       --> handlers.rs:40:17
//        |
//     40 | pub fn total(a: i64 b: i64) -> String {
//        |                     ^ expected `,`
//
fn render_location(
    formatter: &mut fmt::Formatter,
    err: &syn::Error,
    filepath: &Path,
    code: &str,
) -> fmt::Result {
    let start = err.span().start();
    let mut end = err.span().end();

    if start.line == end.line && start.column == end.column {
        return render_fallback(formatter, err, filepath);
    }

    let code_line = match start.line.checked_sub(1).and_then(|n| code.lines().nth(n)) {
        Some(line) => line,
        None => return render_fallback(formatter, err, filepath),
    };

    if end.line > start.line {
        end.line = start.line;
        end.column = code_line.len();
    }

    let filename = filepath
        .file_name()
        .map(OsStr::to_string_lossy)
        .unwrap_or(Cow::Borrowed("lib.rs"));

    write!(
        formatter,
        "\n\
         {error}{header}\n\
         {indent}{arrow} {filename}:{linenum}:{colnum}\n\
         {indent} {pipe}\n\
         {label} {pipe} {code}\n\
         {indent} {pipe} {offset}{underline} {message}\n\
         ",
        error = "error".red().bold(),
        header = ": Syn unable to parse file".bold(),
        indent = " ".repeat(start.line.to_string().len()),
        arrow = "-->".blue().bold(),
        filename = filename,
        linenum = start.line,
        colnum = start.column,
        pipe = "|".blue().bold(),
        label = start.line.to_string().blue().bold(),
        code = code_line.trim_end(),
        offset = " ".repeat(start.column),
        underline = "^"
            .repeat(end.column.saturating_sub(start.column).max(1))
            .red()
            .bold(),
        message = err.to_string().red(),
    )
}

fn render_fallback(formatter: &mut fmt::Formatter, err: &syn::Error, filepath: &Path) -> fmt::Result {
    write!(
        formatter,
        "Unable to parse {}: {}",
        filepath.display(),
        err
    )
}
