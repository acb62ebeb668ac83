use crate::backup_manager::{BackupManager, make_parent_dirs, move_file, temp_path_for};
use crate::error_helpers::io_error_message;
use crate::pattern_parser::PatternSet;
use crate::replacer::multi_replace;
use crate::tally::{MatchCounts, Tally};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// A content transform: bytes in, rewritten bytes and match counts out.
///
/// The rewrite engine depends only on this contract, never on how the
/// transform was built.
pub type Transform<'a> = dyn FnMut(&[u8]) -> (Vec<u8>, MatchCounts) + 'a;

/// Options applied uniformly to every file of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Run the transform once per line instead of once per file
    pub by_line: bool,
    /// Compute everything, change nothing on disk
    pub dry_run: bool,
    /// Delete the backup once the rewrite is committed
    pub clean: bool,
    /// Overwrite an existing backup instead of suffixing a new one
    pub clobber_backups: bool,
    /// Keep before/after content of changed files (dry run only)
    pub preview: bool,
}

/// Counts from pushing one stream through a transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub counts: MatchCounts,
    pub bytes_read: u64,
}

/// Original and transformed content of one file, for diff display
#[derive(Debug, Clone)]
pub struct Preview {
    pub path: PathBuf,
    pub before: Vec<u8>,
    pub after: Vec<u8>,
}

/// What happened to one file
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    /// Where the file ended up (or would, in a dry run)
    pub dest: PathBuf,
    pub counts: MatchCounts,
    /// Backup left on disk, if any
    pub backup: Option<PathBuf>,
    pub preview: Option<Preview>,
}

impl FileOutcome {
    pub fn renamed(&self) -> bool {
        self.dest != self.source
    }

    pub fn rewritten(&self) -> bool {
        self.counts.found > 0
    }

    pub fn changed(&self) -> bool {
        self.rewritten() || self.renamed()
    }
}

/// Push `reader` through `transform` into `writer`, either in one piece or
/// line by line (each line keeps its trailing `\n`).
pub fn transform_stream<R: BufRead, W: Write>(
    transform: &mut Transform<'_>,
    mut reader: R,
    mut writer: W,
    by_line: bool,
) -> io::Result<StreamStats> {
    let mut stats = StreamStats::default();

    if by_line {
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            stats.bytes_read += n as u64;
            let (new_line, counts) = transform(&line);
            stats.counts.add(counts);
            writer.write_all(&new_line)?;
        }
    } else {
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents)?;
        stats.bytes_read = contents.len() as u64;
        let (new_contents, counts) = transform(&contents);
        stats.counts = counts;
        writer.write_all(&new_contents)?;
    }

    writer.flush()?;
    Ok(stats)
}

/// Apply `transform` to the file at `source`, committing the result at
/// `dest` (which may equal `source`).
///
/// Output is written to `<dest>.repren.tmp` first. Only once that write has
/// fully succeeded is the original moved aside to `<source>.orig` and the
/// temp file moved into place. A failed read or write leaves the source
/// untouched. In a dry run the output goes nowhere and nothing on disk
/// changes, but counts and the tally are exactly those of a real run.
///
/// Without a transform, a differing `dest` is a plain move.
pub fn transform_file(
    transform: Option<&mut Transform<'_>>,
    source: &Path,
    dest: &Path,
    options: &RewriteOptions,
    tally: &mut Tally,
) -> Result<FileOutcome> {
    let mut outcome = FileOutcome {
        source: source.to_path_buf(),
        dest: dest.to_path_buf(),
        counts: MatchCounts::default(),
        backup: None,
        preview: None,
    };

    match transform {
        Some(transform) => {
            let (stats, preview) = if options.dry_run {
                dry_run_stream(transform, source, options)?
            } else {
                (write_temp(transform, source, dest, options.by_line)?, None)
            };
            outcome.counts = stats.counts;
            outcome.preview = preview;
            tally.record_scan(stats.bytes_read, stats.counts);

            if !options.dry_run {
                let temp = temp_path_for(dest);
                if dest != source || stats.counts.found > 0 {
                    let (landed, backup) = commit(source, &temp, dest, options)?;
                    outcome.dest = landed;
                    outcome.backup = backup;
                } else {
                    fs::remove_file(&temp)
                        .with_context(|| format!("Failed to remove temp file: {}", temp.display()))?;
                }
            }
        }
        None => {
            if dest != source && !options.dry_run {
                make_parent_dirs(dest)?;
                outcome.dest = move_file(source, dest, false)
                    .with_context(|| format!("Failed to rename {}", source.display()))?;
            }
        }
    }

    tally.files += 1;
    if outcome.rewritten() {
        tally.files_rewritten += 1;
    }
    if outcome.renamed() {
        tally.renames += 1;
    }
    if outcome.changed() {
        tally.files_changed += 1;
    }

    Ok(outcome)
}

fn open_source(source: &Path) -> Result<BufReader<File>> {
    let file = File::open(source)
        .map_err(|e| anyhow::anyhow!(io_error_message(source, "reading", &e)))?;
    Ok(BufReader::new(file))
}

fn dry_run_stream(
    transform: &mut Transform<'_>,
    source: &Path,
    options: &RewriteOptions,
) -> Result<(StreamStats, Option<Preview>)> {
    let mut reader = open_source(source)?;
    if !options.preview {
        let stats = transform_stream(transform, reader, io::sink(), options.by_line)
            .with_context(|| format!("Failed to read file: {}", source.display()))?;
        return Ok((stats, None));
    }

    let mut before = Vec::new();
    reader
        .read_to_end(&mut before)
        .with_context(|| format!("Failed to read file: {}", source.display()))?;
    let mut after = Vec::new();
    let stats = transform_stream(transform, &before[..], &mut after, options.by_line)?;
    let preview = (stats.counts.found > 0).then(|| Preview {
        path: source.to_path_buf(),
        before,
        after,
    });
    Ok((stats, preview))
}

/// Write the transformed content of `source` to the temp path beside `dest`.
fn write_temp(transform: &mut Transform<'_>, source: &Path, dest: &Path, by_line: bool) -> Result<StreamStats> {
    let temp = temp_path_for(dest);
    let metadata = fs::metadata(source)
        .map_err(|e| anyhow::anyhow!(io_error_message(source, "reading", &e)))?;
    let reader = open_source(source)?;

    make_parent_dirs(&temp)?;
    let file = File::create(&temp)
        .map_err(|e| anyhow::anyhow!(io_error_message(&temp, "creating temp file", &e)))?;

    let written = (|| -> Result<StreamStats> {
        let stats = transform_stream(transform, reader, BufWriter::new(&file), by_line)
            .with_context(|| format!("Failed to write {} from {}", temp.display(), source.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to flush temp file: {}", temp.display()))?;
        copy_permissions(&metadata, &temp)
            .with_context(|| format!("Failed to set permissions on {}", temp.display()))?;
        Ok(stats)
    })();

    if written.is_err() {
        // The source has not been touched yet; just drop the partial output.
        let _ = fs::remove_file(&temp);
    }
    written
}

/// Move the original aside, move the temp file into place, and optionally
/// drop the backup. Returns the final destination and the kept backup.
fn commit(source: &Path, temp: &Path, dest: &Path, options: &RewriteOptions) -> Result<(PathBuf, Option<PathBuf>)> {
    let backups = BackupManager::new(options.clobber_backups);
    let backup = backups.move_aside(source)?;

    let landed = match move_file(temp, dest, false) {
        Ok(landed) => landed,
        Err(e) => {
            if let Err(restore) = fs::rename(&backup, source) {
                error!(
                    backup = %backup.display(),
                    "could not restore {} from backup: {}",
                    source.display(),
                    restore
                );
            }
            return Err(e.context(format!("Failed to commit {}", dest.display())));
        }
    };
    debug!(dest = %landed.display(), "committed");

    if options.clean {
        backups.remove_backup(&backup)?;
        Ok((landed, None))
    } else {
        Ok((landed, Some(backup)))
    }
}

fn copy_permissions(from: &fs::Metadata, to: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = from.permissions().mode() & 0o777;
        fs::set_permissions(to, fs::Permissions::from_mode(mode))
    }
    #[cfg(not(unix))]
    {
        fs::set_permissions(to, from.permissions())
    }
}

/// Raw bytes of a path, for matching patterns against it
pub fn path_to_bytes(path: &Path) -> Cow<'_, [u8]> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Cow::Borrowed(path.as_os_str().as_bytes())
    }
    #[cfg(not(unix))]
    {
        match path.to_string_lossy() {
            Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
            Cow::Owned(s) => Cow::Owned(s.into_bytes()),
        }
    }
}

pub fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    #[cfg(unix)]
    {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;
        PathBuf::from(OsString::from_vec(bytes))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Applies one pattern set to file contents and/or file paths
pub struct FileProcessor {
    patterns: PatternSet,
    do_renames: bool,
    do_contents: bool,
    options: RewriteOptions,
}

impl FileProcessor {
    pub fn new(patterns: PatternSet, do_renames: bool, do_contents: bool, options: RewriteOptions) -> Self {
        Self {
            patterns,
            do_renames,
            do_contents,
            options,
        }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Destination of `path` after applying the patterns to the path itself
    pub fn destination(&self, path: &Path) -> PathBuf {
        if !self.do_renames {
            return path.to_path_buf();
        }
        let (renamed, _) = multi_replace(&path_to_bytes(path), &self.patterns, None);
        path_from_bytes(renamed)
    }

    pub fn rewrite_file(&self, path: &Path, tally: &mut Tally) -> Result<FileOutcome> {
        let dest = self.destination(path);
        let source_name = path.display().to_string();
        let mut replace_contents =
            |input: &[u8]| multi_replace(input, &self.patterns, Some(&source_name));
        let transform = if self.do_contents {
            Some(&mut replace_contents as &mut Transform<'_>)
        } else {
            None
        };

        let outcome = transform_file(transform, path, &dest, &self.options, tally)?;

        if outcome.rewritten() {
            info!("modify: {}: {} matches", path.display(), outcome.counts.found);
        }
        if outcome.renamed() {
            info!("rename: {} -> {}", path.display(), outcome.dest.display());
        }
        Ok(outcome)
    }
}
