use crate::error_helpers::io_error_message;
use anyhow::{Context, Result};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Suffix of the copy of the original kept beside each rewritten file
pub const BACKUP_SUFFIX: &str = ".orig";
/// Suffix of the transient output written beside each destination
pub const TEMP_SUFFIX: &str = ".repren.tmp";

// foo.orig, foo.orig.1, foo.orig.2, ...
static BACKUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.orig(\.[0-9]+)?$").expect("static regex"));

/// `path` with `suffix` appended to its final component
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn temp_path_for(dest: &Path) -> PathBuf {
    append_suffix(dest, TEMP_SUFFIX)
}

/// True for file names this tool itself leaves behind.
pub fn is_backup_or_temp(file_name: &OsStr) -> bool {
    let name = file_name.to_string_lossy();
    name.ends_with(TEMP_SUFFIX) || BACKUP_NAME.is_match(&name)
}

/// First of `path`, `path.1`, `path.2`, ... that does not exist yet.
pub fn unique_destination(path: &Path) -> PathBuf {
    let mut candidate = path.to_path_buf();
    let mut i = 1;
    while candidate.symlink_metadata().is_ok() {
        candidate = append_suffix(path, &format!(".{}", i));
        i += 1;
    }
    candidate
}

/// Create the parent directories of `path` if needed.
pub fn make_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(io_error_message(parent, "creating directory", &e))
            })?;
        }
    }
    Ok(())
}

/// Move `source` to `dest` and return where it landed.
///
/// Without `clobber`, an existing `dest` is never replaced: the file goes to
/// the first free `dest.N` instead. Moves across filesystems fall back to
/// copy-and-delete.
pub fn move_file(source: &Path, dest: &Path, clobber: bool) -> Result<PathBuf> {
    let dest = if clobber { dest.to_path_buf() } else { unique_destination(dest) };

    match fs::rename(source, &dest) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %source.display(), to = %dest.display(), "rename crosses devices, copying");
            fs::copy(source, &dest)
                .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
            fs::remove_file(source)
                .with_context(|| format!("Failed to remove {} after copy", source.display()))?;
        }
        Err(e) => {
            let message = io_error_message(source, "moving", &e);
            return Err(anyhow::Error::new(e).context(message))
                .with_context(|| format!("Failed to move {} to {}", source.display(), dest.display()));
        }
    }

    Ok(dest)
}

/// Keeps the original of each rewritten file beside it as `<source>.orig`
pub struct BackupManager {
    clobber: bool,
}

impl BackupManager {
    /// With `clobber`, an existing `.orig` is overwritten instead of the new
    /// backup going to `.orig.1`, `.orig.2`, ...
    pub fn new(clobber: bool) -> Self {
        Self { clobber }
    }

    pub fn backup_path(&self, source: &Path) -> PathBuf {
        append_suffix(source, BACKUP_SUFFIX)
    }

    /// Move `source` to its backup path, returning the path actually used.
    pub fn move_aside(&self, source: &Path) -> Result<PathBuf> {
        let backup = move_file(source, &self.backup_path(source), self.clobber)
            .with_context(|| format!("Failed to back up {}", source.display()))?;
        debug!(source = %source.display(), backup = %backup.display(), "backup created");
        Ok(backup)
    }

    pub fn remove_backup(&self, backup: &Path) -> Result<()> {
        fs::remove_file(backup)
            .with_context(|| format!("Failed to remove backup: {}", backup.display()))
    }
}
