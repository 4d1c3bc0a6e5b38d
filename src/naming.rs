//! # Naming Utilities
//!
//! Helpers for turning URL patterns from the route table into OpenAPI path keys
//! and human-readable summaries.

/// Collapses `.` path segments, e.g. `/./docs` -> `/docs`.
///
/// Applied until no `/./` remains so that `/././docs` also collapses.
pub fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = pattern.to_string();
    while normalized.contains("/./") {
        normalized = normalized.replace("/./", "/");
    }
    normalized
}

/// Derives a display name from the alphanumeric segments of a URL pattern.
///
/// Segments with no alphanumeric character (`(.*)`, `.`, empty) are dropped.
/// The rest are split on hyphens, underscores and whitespace and capitalized,
/// so `/api/url-like_this` becomes `Api Url Like This`.
pub fn url_name(pattern: &str) -> String {
    let names: Vec<&str> = pattern
        .split('/')
        .filter(|part| part.chars().any(char::is_alphanumeric))
        .collect();

    names
        .join(" ")
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(capitalize)
        .collect::<Vec<String>>()
        .join(" ")
}

/// Builds the operation summary shown for a route: `"<Name>: <handler>"`.
pub fn summary(pattern: &str, handler: &str) -> String {
    format!("{}: {}", url_name(pattern), handler)
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
