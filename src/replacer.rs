//! Replacement applier
//!
//! Rebuilds the input from a resolved match set: untouched spans are copied
//! verbatim and each accepted match is replaced by its rule's template with
//! group references expanded against that match's captures.

use crate::matcher::{MatchCandidate, find_candidates, resolve_overlaps};
use crate::pattern_parser::PatternSet;
use crate::tally::MatchCounts;

/// Produce the rewritten bytes for `input`.
///
/// `matches` must be sorted by start offset and pairwise disjoint, as
/// returned by [`resolve_overlaps`].
pub fn apply_replacements(input: &[u8], matches: &[MatchCandidate<'_, '_>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;
    for m in matches {
        out.extend_from_slice(&input[pos..m.start()]);
        m.captures.expand(m.replacement(), &mut out);
        pos = m.end();
    }
    out.extend_from_slice(&input[pos..]);
    out
}

/// Replace every occurrence of every pattern simultaneously, so that no
/// replacement is itself re-matched. `{xxx -> yyy, yyy -> xxx}` swaps.
///
/// Overlapping matches are resolved in favour of the earlier pattern; each
/// dropped match is logged against `source_name` when one is given.
pub fn multi_replace(input: &[u8], patterns: &PatternSet, source_name: Option<&str>) -> (Vec<u8>, MatchCounts) {
    let resolution = resolve_overlaps(find_candidates(input, patterns), source_name);
    let output = apply_replacements(input, &resolution.accepted);
    (output, MatchCounts::new(resolution.found, resolution.accepted.len()))
}
