use crate::file_processor::Preview;
use crate::tally::Tally;
use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::IsTerminal;

/// Number of unchanged lines shown around each change in a preview
const CONTEXT_LINES: usize = 2;

pub struct Report;

impl Report {
    /// Auto-detect if we should use colors on the given stream
    pub fn should_use_color(is_terminal: bool) -> bool {
        // Check NO_COLOR env var (https://no-color.org/)
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        is_terminal
    }

    pub fn stdout_color() -> bool {
        Self::should_use_color(std::io::stdout().is_terminal())
    }

    pub fn stderr_color() -> bool {
        Self::should_use_color(std::io::stderr().is_terminal())
    }

    /// End-of-run summary lines
    pub fn format_summary(tally: &Tally, dry_run: bool) -> String {
        let change_words = if dry_run { "Dry run: Would have changed" } else { "Changed" };
        format!(
            "Read {} files ({} bytes), found {} matches ({} skipped due to overlaps)\n\
             {} {} files ({} rewritten and {} renamed)\n",
            tally.files,
            tally.bytes,
            tally.matches,
            tally.skipped_matches(),
            change_words,
            tally.files_changed,
            tally.files_rewritten,
            tally.renames
        )
    }

    /// Summary for stdin mode, where there are no files to count
    pub fn format_stream_summary(tally: &Tally) -> String {
        format!(
            "Read {} bytes, found {} matches ({} skipped due to overlaps)\n",
            tally.bytes,
            tally.matches,
            tally.skipped_matches()
        )
    }

    /// Unified diff of a dry-run preview
    pub fn format_preview(preview: &Preview, use_color: bool) -> String {
        let before = String::from_utf8_lossy(&preview.before);
        let after = String::from_utf8_lossy(&preview.after);
        let diff = TextDiff::from_lines(before.as_ref(), after.as_ref());
        let path = preview.path.display().to_string();

        let mut output = String::new();
        let header = format!("--- {}\n+++ {}\n", path, path);
        if use_color {
            output.push_str(&header.bold().to_string());
        } else {
            output.push_str(&header);
        }

        for hunk in diff.unified_diff().context_radius(CONTEXT_LINES).iter_hunks() {
            let hunk_header = format!("{}\n", hunk.header());
            if use_color {
                output.push_str(&hunk_header.cyan().to_string());
            } else {
                output.push_str(&hunk_header);
            }

            for change in hunk.iter_changes() {
                let (sign, line) = match change.tag() {
                    ChangeTag::Equal => (" ", change.to_string_lossy()),
                    ChangeTag::Delete => ("-", change.to_string_lossy()),
                    ChangeTag::Insert => ("+", change.to_string_lossy()),
                };
                let mut text = format!("{}{}", sign, line);
                if change.missing_newline() {
                    text.push_str("\n\\ No newline at end of file\n");
                }
                if use_color {
                    let colored_text = match change.tag() {
                        ChangeTag::Equal => text.dimmed(),
                        ChangeTag::Delete => text.red(),
                        ChangeTag::Insert => text.green(),
                    };
                    output.push_str(&colored_text.to_string());
                } else {
                    output.push_str(&text);
                }
            }
        }

        output
    }

    /// One-line diagnostic for a fatal error, with its context chain
    pub fn format_error(err: &anyhow::Error, use_color: bool) -> String {
        let prefix = if use_color { "error".red().bold().to_string() } else { "error".to_string() };
        format!("{}: {:#}", prefix, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_summary() {
        let tally = Tally {
            files: 3,
            bytes: 120,
            matches: 5,
            valid_matches: 4,
            files_changed: 2,
            files_rewritten: 2,
            renames: 1,
        };
        let summary = Report::format_summary(&tally, false);
        assert_eq!(
            summary,
            "Read 3 files (120 bytes), found 5 matches (1 skipped due to overlaps)\n\
             Changed 2 files (2 rewritten and 1 renamed)\n"
        );
        assert!(Report::format_summary(&tally, true).contains("Dry run: Would have changed 2 files"));
    }

    #[test]
    fn test_format_stream_summary() {
        let mut tally = Tally::new();
        tally.bytes = 7;
        tally.matches = 2;
        tally.valid_matches = 2;
        assert_eq!(
            Report::format_stream_summary(&tally),
            "Read 7 bytes, found 2 matches (0 skipped due to overlaps)\n"
        );
    }

    #[test]
    fn test_format_preview_plain() {
        let preview = Preview {
            path: PathBuf::from("src/lib.rs"),
            before: b"a\nfoo\nb\n".to_vec(),
            after: b"a\nbar\nb\n".to_vec(),
        };
        let output = Report::format_preview(&preview, false);
        assert!(output.starts_with("--- src/lib.rs\n+++ src/lib.rs\n@@"));
        assert!(output.contains("-foo\n"));
        assert!(output.contains("+bar\n"));
        assert!(output.contains(" a\n"));
    }

    #[test]
    fn test_format_preview_missing_newline() {
        let preview = Preview {
            path: PathBuf::from("x"),
            before: b"foo".to_vec(),
            after: b"bar".to_vec(),
        };
        let output = Report::format_preview(&preview, false);
        assert!(output.contains("-foo\n\\ No newline at end of file\n"));
    }

    #[test]
    fn test_format_error_plain() {
        let err = anyhow::anyhow!("disk full").context("Failed to commit a.txt");
        assert_eq!(Report::format_error(&err, false), "error: Failed to commit a.txt: disk full");
    }
}
