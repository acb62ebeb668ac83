//! Match resolver
//!
//! Every rule scans the input on its own. The candidates of all rules are
//! pooled in rule order and inserted one by one into a start-sorted accepted
//! list; a candidate that overlaps the accepted neighbour on its left or its
//! right is dropped and never retried. Earlier rules therefore win contested
//! spans regardless of span length.

use crate::pattern_parser::{PatternRule, PatternSet};
use regex::bytes::Captures;
use std::fmt;
use tracing::warn;

/// One occurrence of one rule in the input
#[derive(Debug)]
pub struct MatchCandidate<'h, 'p> {
    /// Index of the originating rule in the pattern set
    pub rule_index: usize,
    pub rule: &'p PatternRule,
    pub captures: Captures<'h>,
}

impl<'h, 'p> MatchCandidate<'h, 'p> {
    pub fn start(&self) -> usize {
        self.whole().start()
    }

    pub fn end(&self) -> usize {
        self.whole().end()
    }

    /// The matched bytes
    pub fn text(&self) -> &'h [u8] {
        self.whole().as_bytes()
    }

    pub fn replacement(&self) -> &'p [u8] {
        self.rule.replacement()
    }

    /// True iff the half-open spans `[start, end)` intersect.
    pub fn overlaps(&self, other: &MatchCandidate<'_, '_>) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    fn whole(&self) -> regex::bytes::Match<'h> {
        self.captures.get(0).expect("group 0 is always present")
    }
}

/// Which accepted neighbour blocked a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A candidate dropped because it overlapped an already accepted match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapConflict {
    pub rejected_text: Vec<u8>,
    pub rejected_pattern: String,
    pub rejected_span: (usize, usize),
    pub winner_text: Vec<u8>,
    pub winner_pattern: String,
    pub winner_span: (usize, usize),
    pub side: Side,
}

impl OverlapConflict {
    fn new(rejected: &MatchCandidate<'_, '_>, winner: &MatchCandidate<'_, '_>, side: Side) -> Self {
        Self {
            rejected_text: rejected.text().to_vec(),
            rejected_pattern: rejected.rule.pattern().to_string(),
            rejected_span: (rejected.start(), rejected.end()),
            winner_text: winner.text().to_vec(),
            winner_pattern: winner.rule.pattern().to_string(),
            winner_span: (winner.start(), winner.end()),
            side,
        }
    }
}

impl fmt::Display for OverlapConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipping overlapping match '{}' of '{}' that overlaps '{}' of '{}' on its {}",
            String::from_utf8_lossy(&self.rejected_text),
            self.rejected_pattern,
            String::from_utf8_lossy(&self.winner_text),
            self.winner_pattern,
            self.side
        )
    }
}

/// Outcome of overlap resolution
#[derive(Debug)]
pub struct Resolution<'h, 'p> {
    /// Pairwise disjoint, sorted by start offset then end offset
    pub accepted: Vec<MatchCandidate<'h, 'p>>,
    pub conflicts: Vec<OverlapConflict>,
    /// Number of candidates before resolution
    pub found: usize,
}

/// Scan `input` once per rule, pooling candidates in rule order.
pub fn find_candidates<'h, 'p>(input: &'h [u8], patterns: &'p PatternSet) -> Vec<MatchCandidate<'h, 'p>> {
    let mut candidates = Vec::new();
    for (rule_index, rule) in patterns.iter().enumerate() {
        for captures in rule.regex().captures_iter(input) {
            candidates.push(MatchCandidate { rule_index, rule, captures });
        }
    }
    candidates
}

/// Select a disjoint, start-sorted subset of `candidates`, preferring those
/// that come first in the pool. Each rejection is logged against
/// `source_name` when one is given.
pub fn resolve_overlaps<'h, 'p>(
    candidates: Vec<MatchCandidate<'h, 'p>>,
    source_name: Option<&str>,
) -> Resolution<'h, 'p> {
    let found = candidates.len();
    let mut accepted: Vec<MatchCandidate<'h, 'p>> = Vec::with_capacity(found);
    let mut conflicts = Vec::new();

    for candidate in candidates {
        // Ordered by (start, end) so an empty match sorts before a wider one
        // starting at the same offset.
        let span = (candidate.start(), candidate.end());
        let index = accepted.partition_point(|m| (m.start(), m.end()) < span);

        let blocked_by = if index > 0 && accepted[index - 1].overlaps(&candidate) {
            Some((index - 1, Side::Left))
        } else if index < accepted.len() && accepted[index].overlaps(&candidate) {
            Some((index, Side::Right))
        } else {
            None
        };

        match blocked_by {
            Some((winner, side)) => {
                let conflict = OverlapConflict::new(&candidate, &accepted[winner], side);
                if let Some(name) = source_name {
                    warn!(source = name, "{}", conflict);
                }
                conflicts.push(conflict);
            }
            None => accepted.insert(index, candidate),
        }
    }

    Resolution { accepted, conflicts, found }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_parser::{PatternOptions, parse_patterns};

    fn set(lines: &str) -> PatternSet {
        parse_patterns(lines.as_bytes(), PatternOptions::default()).unwrap()
    }

    fn spans(resolution: &Resolution<'_, '_>) -> Vec<(usize, usize, usize)> {
        resolution
            .accepted
            .iter()
            .map(|m| (m.start(), m.end(), m.rule_index))
            .collect()
    }

    #[test]
    fn test_candidates_pooled_in_rule_order() {
        let patterns = set("b\tx\na\ty\n");
        let candidates = find_candidates(b"abab", &patterns);
        let order: Vec<(usize, usize)> = candidates.iter().map(|c| (c.rule_index, c.start())).collect();
        assert_eq!(order, vec![(0, 1), (0, 3), (1, 0), (1, 2)]);
    }

    #[test]
    fn test_disjoint_matches_all_accepted_and_sorted() {
        let patterns = set("b\tx\na\ty\n");
        let resolution = resolve_overlaps(find_candidates(b"abab", &patterns), None);
        assert_eq!(spans(&resolution), vec![(0, 1, 1), (1, 2, 0), (2, 3, 1), (3, 4, 0)]);
        assert!(resolution.conflicts.is_empty());
        assert_eq!(resolution.found, 4);
    }

    #[test]
    fn test_earlier_rule_wins_overlap() {
        let patterns = set("xxx\tyyy\nxxy\tzzz\n");
        // "xxx" at 0..3, "xxy" at 1..4 overlaps it.
        let resolution = resolve_overlaps(find_candidates(b"xxxy", &patterns), Some("input"));
        assert_eq!(spans(&resolution), vec![(0, 3, 0)]);
        assert_eq!(resolution.conflicts.len(), 1);
        let conflict = &resolution.conflicts[0];
        assert_eq!(conflict.rejected_text, b"xxy");
        assert_eq!(conflict.winner_text, b"xxx");
        assert_eq!(conflict.side, Side::Left);
    }

    #[test]
    fn test_shorter_earlier_rule_beats_longer_later_rule() {
        let patterns = set("oba\t1\nfoobar\t2\n");
        let resolution = resolve_overlaps(find_candidates(b"foobar", &patterns), None);
        assert_eq!(spans(&resolution), vec![(2, 5, 0)]);
        assert_eq!(resolution.conflicts[0].side, Side::Right);
        assert_eq!(
            resolution.conflicts[0].to_string(),
            "Skipping overlapping match 'foobar' of 'foobar' that overlaps 'oba' of 'oba' on its right"
        );
    }

    #[test]
    fn test_rejected_match_is_not_retried() {
        // "bc" loses to "ab"; "cd" then fits beside "ab" even though "bc" never did.
        let patterns = set("ab\t1\nbc\t2\ncd\t3\n");
        let resolution = resolve_overlaps(find_candidates(b"abcd", &patterns), None);
        assert_eq!(spans(&resolution), vec![(0, 2, 0), (2, 4, 2)]);
        assert_eq!(resolution.conflicts.len(), 1);
    }

    #[test]
    fn test_empty_match_at_boundary_does_not_overlap() {
        let patterns = set("ab\t1\n^\t2\n");
        let resolution = resolve_overlaps(find_candidates(b"ab", &patterns), None);
        assert_eq!(spans(&resolution), vec![(0, 0, 1), (0, 2, 0)]);
    }

    #[test]
    fn test_empty_match_listed_first_sorts_before_wider_match() {
        let patterns = set("^\tHDR \nab\tX\n");
        let resolution = resolve_overlaps(find_candidates(b"ab", &patterns), None);
        assert_eq!(spans(&resolution), vec![(0, 0, 0), (0, 2, 1)]);
        assert!(resolution.conflicts.is_empty());
    }

    #[test]
    fn test_empty_match_inside_span_is_rejected() {
        let patterns = set("abc\t1\n\\B\t2\n");
        let resolution = resolve_overlaps(find_candidates(b"abc", &patterns), None);
        assert_eq!(spans(&resolution), vec![(0, 3, 0)]);
        assert_eq!(resolution.conflicts.len(), 2);
    }

    #[test]
    fn test_no_candidates() {
        let patterns = set("zzz\t1\n");
        let resolution = resolve_overlaps(find_candidates(b"abc", &patterns), None);
        assert!(resolution.accepted.is_empty());
        assert_eq!(resolution.found, 0);
    }
}
