//! Run-scoped counters
//!
//! A `Tally` is created once per run and passed by `&mut` through the tree
//! driver and the file rewrite engine. Processing is sequential, so there is
//! exactly one writer at a time. A parallel driver would give each worker its
//! own `Tally` and fold them together with [`Tally::merge`].

/// Match counts produced by one application of a transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    /// Every candidate match, before overlap resolution
    pub found: usize,
    /// Candidates accepted after overlap resolution
    pub valid: usize,
}

impl MatchCounts {
    pub fn new(found: usize, valid: usize) -> Self {
        Self { found, valid }
    }

    pub fn add(&mut self, other: MatchCounts) {
        self.found += other.found;
        self.valid += other.valid;
    }

    /// Number of candidates dropped because they overlapped a winner
    pub fn skipped(&self) -> usize {
        self.found - self.valid
    }
}

/// Aggregate statistics for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    /// Files visited by the rewrite engine
    pub files: usize,
    /// Content bytes fed through the transform (paths are not counted)
    pub bytes: u64,
    /// Content matches found, before overlap resolution
    pub matches: usize,
    /// Content matches accepted after overlap resolution
    pub valid_matches: usize,
    /// Files whose content was rewritten or whose path changed
    pub files_changed: usize,
    /// Files with at least one content match
    pub files_rewritten: usize,
    /// Files whose destination path differs from the source path
    pub renames: usize,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the content scan of one file (or one stdin stream).
    pub fn record_scan(&mut self, bytes: u64, counts: MatchCounts) {
        self.bytes += bytes;
        self.matches += counts.found;
        self.valid_matches += counts.valid;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.files += other.files;
        self.bytes += other.bytes;
        self.matches += other.matches;
        self.valid_matches += other.valid_matches;
        self.files_changed += other.files_changed;
        self.files_rewritten += other.files_rewritten;
        self.renames += other.renames;
    }

    pub fn skipped_matches(&self) -> usize {
        self.matches - self.valid_matches
    }
}
