//! Actionable messages for failed file operations
//!
//! A rewrite touches up to three paths per file (source, temp file, backup).
//! These helpers name the path and the step that failed and suggest a way
//! out, so a stopped run can be resumed.

use std::io::{self, ErrorKind};
use std::path::Path;

fn parent_of(path: &Path) -> String {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
        _ => ".".to_string(),
    }
}

/// Message for a permission failure while `operation` on `path`
pub fn permission_error(path: &Path, operation: &str) -> String {
    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. Backups and temp files are created beside each file; make sure '{}' is writable\n\
         3. Skip the file with --exclude if it should not be touched",
        operation,
        path.display(),
        path.display(),
        parent_of(path)
    )
}

/// Message for a path that disappeared while `operation` on it
pub fn not_found_error(path: &Path, operation: &str) -> String {
    format!(
        "File not found when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check the path is correct\n\
         2. Another process may have moved or deleted it during the run",
        operation,
        path.display()
    )
}

fn storage_full_error(path: &Path, operation: &str) -> String {
    format!(
        "No space left when {} '{}'\n\n\
         The original file is untouched. Free some space (or run with --clean\n\
         to drop backups as you go) and run again.",
        operation,
        path.display()
    )
}

/// Describe a failed file operation, with fixes for the common causes.
pub fn io_error_message(path: &Path, operation: &str, err: &io::Error) -> String {
    match err.kind() {
        ErrorKind::PermissionDenied => permission_error(path, operation),
        ErrorKind::NotFound => not_found_error(path, operation),
        ErrorKind::StorageFull => storage_full_error(path, operation),
        _ => format!("Failed {} '{}': {}", operation, path.display(), err),
    }
}
