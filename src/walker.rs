//! Tree driver
//!
//! Expands root paths into a file list, then hands each file to the
//! [`FileProcessor`] one at a time. The full list is collected before the
//! first file is touched, so renames made during the run never feed back
//! into the walk.

use crate::backup_manager::is_backup_or_temp;
use crate::error::WalkError;
use crate::file_processor::{FileOutcome, FileProcessor};
use crate::tally::Tally;
use anyhow::Result;
use regex::Regex;
use std::path::PathBuf;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

/// Skip dot-files and dot-directories unless told otherwise
pub const DEFAULT_EXCLUDE: &str = r"\.";

/// Compile an exclusion pattern. It is anchored at the start of the base
/// name but not at the end, so `\.` excludes every name starting with a dot.
pub fn compile_exclude(pattern: &str) -> Result<Regex, WalkError> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|source| WalkError::InvalidExclude {
        pattern: pattern.to_string(),
        source,
    })
}

fn is_excluded(entry: &DirEntry, exclude: &Regex) -> bool {
    exclude.is_match(&entry.file_name().to_string_lossy())
}

/// Files under `roots`, in traversal order.
///
/// A root that is a file is returned as is. Below a directory root, entries
/// whose base name matches `exclude` are pruned (directories are not
/// descended into) and backup and temp files are always skipped.
/// Unreadable directories are logged and skipped.
pub fn walk_files(roots: &[PathBuf], exclude: &Regex) -> Result<Vec<PathBuf>, WalkError> {
    let mut files = Vec::new();

    for root in roots {
        if !root.exists() {
            return Err(WalkError::PathNotFound(root.clone()));
        }
        if root.is_file() {
            files.push(root.clone());
            continue;
        }

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e, exclude));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.depth() == 0 || is_backup_or_temp(entry.file_name()) {
                continue;
            }
            let file_type = entry.file_type();
            if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

fn join_display(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite every file under `roots`, calling `on_file` after each one.
///
/// Files are processed sequentially; an error stops the run, leaving files
/// already processed committed and the rest untouched.
pub fn rewrite_files(
    roots: &[PathBuf],
    exclude: &Regex,
    processor: &FileProcessor,
    tally: &mut Tally,
    mut on_file: impl FnMut(&FileOutcome),
) -> Result<()> {
    let paths = walk_files(roots, exclude)?;
    info!("Found {} files in: {}", paths.len(), join_display(roots));

    for path in &paths {
        let outcome = processor.rewrite_file(path, tally)?;
        on_file(&outcome);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_processor::RewriteOptions;
    use crate::pattern_parser::{PatternOptions, parse_patterns};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/lib.rs"), "foo").unwrap();
        fs::write(root.join("src/nested/mod.rs"), "foo").unwrap();
        fs::write(root.join("src/lib.rs.orig"), "old").unwrap();
        fs::write(root.join("src/lib.rs.orig.1"), "older").unwrap();
        fs::write(root.join("src/x.repren.tmp"), "tmp").unwrap();
        fs::write(root.join(".hidden"), "foo").unwrap();
        fs::write(root.join(".git/config"), "foo").unwrap();
        fs::write(root.join("README.md"), "foo").unwrap();
        temp_dir
    }

    fn relative(root: &Path, files: Vec<PathBuf>) -> Vec<String> {
        let mut names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_default_exclusion() {
        let temp_dir = tree();
        let exclude = compile_exclude(DEFAULT_EXCLUDE).unwrap();
        let files = walk_files(&[temp_dir.path().to_path_buf()], &exclude).unwrap();
        assert_eq!(
            relative(temp_dir.path(), files),
            vec!["README.md", "src/lib.rs", "src/nested/mod.rs"]
        );
    }

    #[test]
    fn test_walk_custom_exclusion_prunes_directories() {
        let temp_dir = tree();
        let exclude = compile_exclude("nested|README").unwrap();
        let files = walk_files(&[temp_dir.path().to_path_buf()], &exclude).unwrap();
        assert_eq!(
            relative(temp_dir.path(), files),
            vec![".git/config", ".hidden", "src/lib.rs"]
        );
    }

    #[test]
    fn test_exclusion_anchored_at_start_only() {
        let exclude = compile_exclude("lib").unwrap();
        assert!(exclude.is_match("lib.rs"));
        assert!(exclude.is_match("library"));
        assert!(!exclude.is_match("mylib.rs"));
    }

    #[test]
    fn test_file_root_is_kept_as_is() {
        let temp_dir = tree();
        let exclude = compile_exclude(DEFAULT_EXCLUDE).unwrap();
        let hidden = temp_dir.path().join(".hidden");
        let files = walk_files(std::slice::from_ref(&hidden), &exclude).unwrap();
        assert_eq!(files, vec![hidden]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let exclude = compile_exclude(DEFAULT_EXCLUDE).unwrap();
        let missing = temp_dir.path().join("missing");
        let err = walk_files(&[missing.clone()], &exclude).unwrap_err();
        assert!(matches!(err, WalkError::PathNotFound(p) if p == missing));
    }

    #[test]
    fn test_invalid_exclusion() {
        assert!(matches!(compile_exclude("("), Err(WalkError::InvalidExclude { .. })));
    }

    #[test]
    fn test_rewrite_files_accumulates_tally() {
        let temp_dir = tree();
        let patterns = parse_patterns(b"foo\tbar\n", PatternOptions::default()).unwrap();
        let options = RewriteOptions { by_line: true, clean: true, ..Default::default() };
        let processor = FileProcessor::new(patterns, false, true, options);
        let exclude = compile_exclude(DEFAULT_EXCLUDE).unwrap();

        let mut tally = Tally::new();
        let mut seen = 0;
        rewrite_files(&[temp_dir.path().to_path_buf()], &exclude, &processor, &mut tally, |_| seen += 1).unwrap();

        assert_eq!(seen, 3);
        assert_eq!(tally.files, 3);
        assert_eq!(tally.files_rewritten, 3);
        assert_eq!(tally.matches, 3);
        assert_eq!(fs::read_to_string(temp_dir.path().join("src/nested/mod.rs")).unwrap(), "bar");
        assert_eq!(fs::read_to_string(temp_dir.path().join(".hidden")).unwrap(), "foo");
        assert_eq!(fs::read_to_string(temp_dir.path().join("src/lib.rs.orig")).unwrap(), "old");
    }
}
