//! Pattern compiler
//!
//! Turns `SEARCH<TAB>REPLACEMENT` lines into an ordered [`PatternSet`].
//! Position in the set is priority: when two rules match overlapping spans,
//! the rule compiled first wins (see `matcher`).

use crate::case_style::all_case_variants;
use crate::error::{PatternError, regex_hint};
use regex::bytes::{Regex, RegexBuilder};
use std::fmt;

/// Options controlling how search fields are compiled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternOptions {
    /// Treat the search field as literal text rather than a regex
    pub literal: bool,
    /// Require a word boundary on both sides of every match
    pub word_breaks: bool,
    /// Case-insensitive matching
    pub insensitive: bool,
    /// Let `.` match newlines
    pub dotall: bool,
    /// Expand every pair into its lowerCamel/UpperCamel/lower_/UPPER_ variants
    pub preserve_case: bool,
}

/// A compiled search regex and its replacement template
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    replacement: Vec<u8>,
}

impl PatternRule {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The source text of the compiled regex
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replacement template, with `$N` / `${name}` group references
    pub fn replacement(&self) -> &[u8] {
        &self.replacement
    }
}

/// Ordered, immutable list of pattern rules shared by every file of a run
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<PatternRule>,
}

impl PatternSet {
    /// Compile a single search/replacement pair (the `--from`/`--to` form).
    pub fn from_pair(search: &[u8], replacement: &[u8], options: PatternOptions) -> Result<Self, PatternError> {
        let mut set = PatternSet::default();
        set.push_pair(search, replacement, options)?;
        Ok(set)
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternRule> {
        self.rules.iter()
    }

    fn push_pair(&mut self, search: &[u8], replacement: &[u8], options: PatternOptions) -> Result<(), PatternError> {
        let search = if options.literal {
            let text = std::str::from_utf8(search).map_err(|_| PatternError::NonUtf8Pattern {
                line: String::from_utf8_lossy(search).into_owned(),
            })?;
            regex::escape(text).into_bytes()
        } else {
            search.to_vec()
        };

        if !options.preserve_case {
            let rule = compile_rule(&search, replacement.to_vec(), options)?;
            self.rules.push(rule);
            return Ok(());
        }

        // The verbatim pair goes first so it keeps priority over its variants.
        // Expanded pairs already in the set, from this line or an earlier
        // one, are dropped.
        let variants = all_case_variants(&search).into_iter().zip(all_case_variants(replacement));
        for (search, replacement) in std::iter::once((search, replacement.to_vec())).chain(variants) {
            let rule = compile_rule(&search, replacement, options)?;
            if !self.contains(&rule) {
                self.rules.push(rule);
            }
        }
        Ok(())
    }

    fn contains(&self, rule: &PatternRule) -> bool {
        self.rules
            .iter()
            .any(|r| r.pattern() == rule.pattern() && r.replacement == rule.replacement)
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a PatternRule;
    type IntoIter = std::slice::Iter<'a, PatternRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Using {} patterns:", self.rules.len())?;
        for rule in &self.rules {
            writeln!(
                f,
                "  '{}' -> '{}'",
                rule.pattern(),
                String::from_utf8_lossy(&rule.replacement)
            )?;
        }
        Ok(())
    }
}

/// Parse pattern-file content into a pattern set.
///
/// Blank lines and lines whose first non-whitespace character is `#` are
/// ignored. Every other line must hold exactly two tab-separated fields.
/// The first bad line aborts parsing; no partial set is returned.
pub fn parse_patterns(input: &[u8], options: PatternOptions) -> Result<PatternSet, PatternError> {
    let mut set = PatternSet::default();

    for line in input.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() || trimmed.starts_with(b"#") {
            continue;
        }

        let fields: Vec<&[u8]> = line.split(|&b| b == b'\t').collect();
        let [search, replacement] = fields.as_slice() else {
            return Err(PatternError::InvalidLine {
                line: String::from_utf8_lossy(line).into_owned(),
            });
        };
        set.push_pair(search, replacement, options)?;
    }

    Ok(set)
}

fn compile_rule(search: &[u8], replacement: Vec<u8>, options: PatternOptions) -> Result<PatternRule, PatternError> {
    let search = std::str::from_utf8(search).map_err(|_| PatternError::NonUtf8Pattern {
        line: String::from_utf8_lossy(search).into_owned(),
    })?;

    let pattern = if options.word_breaks {
        format!(r"\b(?:{})\b", search)
    } else {
        search.to_string()
    };

    // Byte semantics: `.` matches any single byte, while `\w`, `\b` and case
    // folding are ASCII only.
    let regex = RegexBuilder::new(&pattern)
        .unicode(false)
        .case_insensitive(options.insensitive)
        .dot_matches_new_line(options.dotall)
        .build()
        .map_err(|source| PatternError::InvalidRegex {
            hint: regex_hint(&source, &pattern),
            pattern: pattern.clone(),
            source,
        })?;

    validate_template(&regex, &replacement)?;

    Ok(PatternRule { regex, replacement })
}

/// A group reference found in a replacement template
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupRef<'t> {
    Number(usize),
    Named(&'t str),
}

/// Check every group reference in `template` against the groups `regex`
/// defines, following the `regex` crate's expansion grammar: `$$` is a
/// literal dollar, `${...}` is a braced reference, and `$` followed by the
/// longest run of `[0-9A-Za-z_]` is a bare reference. A `$` that starts no
/// valid reference is literal.
fn validate_template(regex: &Regex, template: &[u8]) -> Result<(), PatternError> {
    let mut rest = template;
    while let Some(pos) = rest.iter().position(|&b| b == b'$') {
        rest = &rest[pos..];
        if rest.get(1) == Some(&b'$') {
            rest = &rest[2..];
            continue;
        }
        let Some((group, end)) = find_group_ref(rest) else {
            rest = &rest[1..];
            continue;
        };
        let known = match group {
            GroupRef::Number(index) => index < regex.captures_len(),
            GroupRef::Named(name) => regex.capture_names().flatten().any(|n| n == name),
        };
        if !known {
            return Err(PatternError::InvalidTemplate {
                pattern: regex.as_str().to_string(),
                template: String::from_utf8_lossy(template).into_owned(),
                reference: String::from_utf8_lossy(&rest[..end]).into_owned(),
            });
        }
        rest = &rest[end..];
    }
    Ok(())
}

/// Parse a group reference at the start of `rest` (which begins with `$`).
/// Returns the reference and the number of bytes it spans.
fn find_group_ref(rest: &[u8]) -> Option<(GroupRef<'_>, usize)> {
    if rest.get(1) == Some(&b'{') {
        let close = rest[2..].iter().position(|&b| b == b'}')? + 2;
        let name = std::str::from_utf8(&rest[2..close]).ok().filter(|n| !n.is_empty())?;
        return Some((group_ref(name), close + 1));
    }
    let len = rest[1..]
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_')
        .count();
    if len == 0 {
        return None;
    }
    let name = std::str::from_utf8(&rest[1..1 + len]).ok()?;
    Some((group_ref(name), 1 + len))
}

fn group_ref(name: &str) -> GroupRef<'_> {
    match name.parse::<usize>() {
        Ok(index) => GroupRef::Number(index),
        Err(_) => GroupRef::Named(name),
    }
}
