//! repren: multi-pattern search and replace with file renaming
//!
//! This library exposes repren's engine for the binary and for the
//! integration and property-based tests. The main binary is at src/main.rs.

pub mod backup_manager;
pub mod case_style;
pub mod cli;
pub mod config;
pub mod error;
pub mod error_helpers;
pub mod file_processor;
pub mod logger;
pub mod matcher;
pub mod pattern_parser;
pub mod replacer;
pub mod report;
pub mod tally;
pub mod walker;

// Re-export commonly used types for convenience
pub use backup_manager::BackupManager;
pub use case_style::{CaseStyle, all_case_variants, split_name};
pub use error::{PatternError, WalkError};
pub use file_processor::{FileOutcome, FileProcessor, RewriteOptions, Transform, transform_file, transform_stream};
pub use matcher::{MatchCandidate, OverlapConflict, Resolution, find_candidates, resolve_overlaps};
pub use pattern_parser::{PatternOptions, PatternRule, PatternSet, parse_patterns};
pub use replacer::{apply_replacements, multi_replace};
pub use tally::{MatchCounts, Tally};
pub use walker::{compile_exclude, rewrite_files, walk_files};
