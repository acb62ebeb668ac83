//! Error types for pattern compilation and tree walking
//!
//! These are configuration-class failures: each one aborts the whole run
//! before any file is touched. File I/O errors are reported through `anyhow`
//! with path context instead (see `file_processor`).

use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning pattern lines into a pattern set
#[derive(Debug, Error)]
pub enum PatternError {
    /// Not a comment, not blank and not exactly two tab-separated fields
    #[error("invalid line in pattern file: {line:?}")]
    InvalidLine { line: String },

    #[error("search pattern is not valid UTF-8: {line:?}")]
    NonUtf8Pattern { line: String },

    #[error("error parsing pattern: {pattern:?}: {source}{}", hint_suffix(.hint))]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
        hint: Option<String>,
    },

    #[error("replacement {template:?} refers to group {reference:?}, which pattern {pattern:?} does not define")]
    InvalidTemplate {
        pattern: String,
        template: String,
        reference: String,
    },
}

/// Failure while expanding root paths into a file list
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("invalid exclusion pattern {pattern:?}: {source}")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(" (hint: {})", hint),
        None => String::new(),
    }
}

/// Suggest a fix for a search pattern that failed to compile.
pub fn regex_hint(err: &regex::Error, pattern: &str) -> Option<String> {
    let message = err.to_string().to_lowercase();

    if message.contains("unclosed") || message.contains("unopened") {
        return Some("unbalanced group or class; use --literal to search for the text verbatim".to_string());
    }
    if message.contains("repetition operator missing expression") {
        return Some(format!(
            "'{}' starts with a quantifier; escape it with a backslash or use --literal",
            pattern
        ));
    }
    if message.contains("look-around") || message.contains("backreferences") {
        return Some("look-around and backreferences are not supported in search patterns".to_string());
    }
    if matches!(err, regex::Error::CompiledTooBig(_)) {
        return Some("pattern is too large; split it into several lines".to_string());
    }
    if message.contains("unrecognized escape") {
        return Some("unknown escape sequence; double the backslash to match it literally".to_string());
    }
    None
}
