//! End-to-end rewrite scenarios against the library API

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use repren::{
    FileProcessor, MatchCounts, PatternOptions, PatternSet, RewriteOptions, Tally, compile_exclude, parse_patterns,
    Transform, rewrite_files, transform_file,
};

fn patterns(lines: &str) -> PatternSet {
    parse_patterns(lines.as_bytes(), PatternOptions::default()).unwrap()
}

fn run(root: &Path, processor: &FileProcessor) -> Tally {
    let exclude = compile_exclude(r"\.").unwrap();
    let mut tally = Tally::new();
    rewrite_files(&[root.to_path_buf()], &exclude, processor, &mut tally, |_| {}).unwrap();
    tally
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn line_mode() -> RewriteOptions {
    RewriteOptions { by_line: true, ..Default::default() }
}

#[test]
fn test_foo_to_bar_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "foo foo baz").unwrap();

    let processor = FileProcessor::new(patterns("foo\tbar\n"), false, true, line_mode());
    let tally = run(temp_dir.path(), &processor);

    assert_eq!(fs::read_to_string(&file).unwrap(), "bar bar baz");
    assert_eq!(fs::read_to_string(temp_dir.path().join("a.txt.orig")).unwrap(), "foo foo baz");
    assert_eq!(listing(temp_dir.path()), vec!["a.txt", "a.txt.orig"]);
    assert_eq!(tally.matches, 2);
    assert_eq!(tally.valid_matches, 2);
    assert_eq!(tally.files, 1);
    assert_eq!(tally.files_rewritten, 1);
    assert_eq!(tally.renames, 0);
}

#[test]
fn test_priority_keeps_first_listed_rule() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "xxxy").unwrap();

    let processor = FileProcessor::new(patterns("xxx\tyyy\nxxy\tzzz\n"), false, true, line_mode());
    let tally = run(temp_dir.path(), &processor);

    assert_eq!(fs::read_to_string(&file).unwrap(), "yyyy");
    assert_eq!(tally.matches, 2);
    assert_eq!(tally.valid_matches, 1);
    assert_eq!(tally.skipped_matches(), 1);
}

#[test]
fn test_second_run_does_not_clobber_backup() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "one").unwrap();

    let first = FileProcessor::new(patterns("one\ttwo\n"), false, true, line_mode());
    run(temp_dir.path(), &first);
    let second = FileProcessor::new(patterns("two\tthree\n"), false, true, line_mode());
    run(temp_dir.path(), &second);

    assert_eq!(fs::read_to_string(&file).unwrap(), "three");
    assert_eq!(fs::read_to_string(temp_dir.path().join("a.txt.orig")).unwrap(), "one");
    assert_eq!(fs::read_to_string(temp_dir.path().join("a.txt.orig.1")).unwrap(), "two");
}

#[test]
fn test_clean_leaves_no_backups() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.txt"), "foo").unwrap();

    let options = RewriteOptions { clean: true, ..line_mode() };
    let processor = FileProcessor::new(patterns("foo\tbar\n"), false, true, options);
    run(temp_dir.path(), &processor);

    assert_eq!(listing(temp_dir.path()), vec!["a.txt"]);
}

#[test]
fn test_full_mode_renames_and_rewrites() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("foo_dir")).unwrap();
    fs::write(temp_dir.path().join("foo_dir/foo.txt"), "use foo;\n").unwrap();
    fs::write(temp_dir.path().join("other.txt"), "nothing here\n").unwrap();

    let processor = FileProcessor::new(patterns("foo\tbar\n"), true, true, line_mode());
    let tally = run(temp_dir.path(), &processor);

    let moved = temp_dir.path().join("bar_dir/bar.txt");
    assert_eq!(fs::read_to_string(&moved).unwrap(), "use bar;\n");
    assert_eq!(fs::read_to_string(temp_dir.path().join("foo_dir/foo.txt.orig")).unwrap(), "use foo;\n");
    assert!(!temp_dir.path().join("foo_dir/foo.txt").exists());
    assert_eq!(tally.files, 2);
    assert_eq!(tally.renames, 1);
    assert_eq!(tally.files_rewritten, 1);
    assert_eq!(tally.files_changed, 1);
}

#[test]
fn test_renames_only_keeps_contents() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("foo.txt"), "foo").unwrap();

    let processor = FileProcessor::new(patterns("foo\tbar\n"), true, false, line_mode());
    let tally = run(temp_dir.path(), &processor);

    assert_eq!(listing(temp_dir.path()), vec!["bar.txt"]);
    assert_eq!(fs::read_to_string(temp_dir.path().join("bar.txt")).unwrap(), "foo");
    assert_eq!(tally.renames, 1);
    assert_eq!(tally.matches, 0);
}

#[test]
fn test_rename_never_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("foo.txt"), "from foo").unwrap();
    fs::write(temp_dir.path().join("bar.txt"), "already here").unwrap();

    let processor = FileProcessor::new(patterns("foo\tbar\n"), true, false, line_mode());
    run(temp_dir.path(), &processor);

    assert_eq!(fs::read_to_string(temp_dir.path().join("bar.txt")).unwrap(), "already here");
    assert_eq!(fs::read_to_string(temp_dir.path().join("bar.txt.1")).unwrap(), "from foo");
}

#[test]
fn test_exclusion_skips_matching_names() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("target")).unwrap();
    fs::write(temp_dir.path().join("target/out.txt"), "foo").unwrap();
    fs::write(temp_dir.path().join(".env"), "foo").unwrap();
    fs::write(temp_dir.path().join("src.txt"), "foo").unwrap();

    let processor = FileProcessor::new(patterns("foo\tbar\n"), false, true, line_mode());
    let exclude = compile_exclude(r"\.|target").unwrap();
    let mut tally = Tally::new();
    let mut seen: Vec<PathBuf> = Vec::new();
    rewrite_files(&[temp_dir.path().to_path_buf()], &exclude, &processor, &mut tally, |outcome| {
        seen.push(outcome.source.clone())
    })
    .unwrap();

    assert_eq!(seen, vec![temp_dir.path().join("src.txt")]);
    assert_eq!(fs::read_to_string(temp_dir.path().join("target/out.txt")).unwrap(), "foo");
    assert_eq!(fs::read_to_string(temp_dir.path().join(".env")).unwrap(), "foo");
}

#[test]
fn test_failed_temp_write_leaves_files_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("a.txt");
    fs::write(&source, "foo foo").unwrap();
    // A directory squatting on the temp path makes creating the temp file fail
    fs::create_dir(temp_dir.path().join("a.txt.repren.tmp")).unwrap();

    let set = patterns("foo\tbar\n");
    let mut transform = |input: &[u8]| repren::multi_replace(input, &set, None);
    let mut tally = Tally::new();
    let result = transform_file(Some(&mut transform as &mut Transform<'_>), &source, &source, &line_mode(), &mut tally);

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&source).unwrap(), "foo foo");
    assert!(!temp_dir.path().join("a.txt.orig").exists());
}

#[test]
fn test_unwritable_destination_leaves_source_intact() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("a.txt");
    let dest = temp_dir.path().join("b.txt");
    fs::write(&source, "line one\nline two\n").unwrap();

    // The destination directory is a file, so nothing can be written there
    fs::write(temp_dir.path().join("blocker"), "").unwrap();
    let blocked_dest = temp_dir.path().join("blocker/b.txt");

    let mut identity = |input: &[u8]| (input.to_vec(), MatchCounts::default());
    let mut tally = Tally::new();
    let result = transform_file(Some(&mut identity as &mut Transform<'_>), &source, &blocked_dest, &line_mode(), &mut tally);

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&source).unwrap(), "line one\nline two\n");
    assert!(!dest.exists());
    assert_eq!(listing(temp_dir.path()), vec!["a.txt", "blocker"]);
}

#[test]
fn test_dry_run_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("foo.txt"), "foo foo baz").unwrap();

    let options = RewriteOptions { dry_run: true, ..line_mode() };
    let processor = FileProcessor::new(patterns("foo\tbar\n"), true, true, options);
    let tally = run(temp_dir.path(), &processor);

    assert_eq!(listing(temp_dir.path()), vec!["foo.txt"]);
    assert_eq!(fs::read_to_string(temp_dir.path().join("foo.txt")).unwrap(), "foo foo baz");
    assert_eq!(tally.matches, 2);
    assert_eq!(tally.renames, 1);
    assert_eq!(tally.files_changed, 1);
}
