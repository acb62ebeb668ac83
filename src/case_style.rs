//! Identifier case styles
//!
//! Splits identifiers into words (on underscores, or on camel-case boundaries
//! when there are none) and re-renders them as lowerCamel, UpperCamel,
//! lower_underscore or UPPER_UNDERSCORE. Everything works on bytes; the word
//! scanner only recognises ASCII word characters, so case mapping is ASCII.

use regex::bytes::Regex;
use std::sync::LazyLock;

// FooBarBaz -> Foo, Bar, Baz
// XMLFooHTTPBar -> XML, Foo, HTTP, Bar
static CAMEL_LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)([^A-Z])([A-Z])").expect("static regex"));
static CAMEL_ACRONYM_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)([A-Z])([A-Z][^A-Z])").expect("static regex"));
static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?-u)\w+").expect("static regex"));

const WORD_BREAK: u8 = b'\t';

/// One of the four identifier formatting conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStyle {
    /// `fooBarBaz`
    LowerCamel,
    /// `FooBarBaz`
    UpperCamel,
    /// `foo_bar_baz`
    LowerUnderscore,
    /// `FOO_BAR_BAZ`
    UpperUnderscore,
}

impl CaseStyle {
    /// All styles, in the fixed order variants are generated in
    pub const ALL: [CaseStyle; 4] = [
        CaseStyle::LowerCamel,
        CaseStyle::UpperCamel,
        CaseStyle::LowerUnderscore,
        CaseStyle::UpperUnderscore,
    ];

    /// Join an already split word sequence in this style.
    pub fn render<W: AsRef<[u8]>>(self, words: &[W]) -> Vec<u8> {
        match self {
            CaseStyle::LowerCamel => {
                let mut out = Vec::new();
                let mut iter = words.iter();
                if let Some(first) = iter.next() {
                    out.extend(first.as_ref().to_ascii_lowercase());
                }
                for word in iter {
                    out.extend(capitalize(word.as_ref()));
                }
                out
            }
            CaseStyle::UpperCamel => words.iter().flat_map(|w| capitalize(w.as_ref())).collect(),
            CaseStyle::LowerUnderscore => join_underscore(words, |w| w.to_ascii_lowercase()),
            CaseStyle::UpperUnderscore => join_underscore(words, |w| w.to_ascii_uppercase()),
        }
    }

    /// Split `name` and render it in this style.
    pub fn apply(self, name: &[u8]) -> Vec<u8> {
        self.render(&split_name(name))
    }
}

/// Split a camel-case or underscore-formatted name into words.
///
/// Names containing an underscore are split strictly on underscores, so
/// doubled, leading or trailing underscores yield empty words.
pub fn split_name(name: &[u8]) -> Vec<Vec<u8>> {
    if name.contains(&b'_') {
        return name.split(|&b| b == b'_').map(<[u8]>::to_vec).collect();
    }
    let pass1 = CAMEL_LOWER_UPPER.replace_all(name, &b"${1}\t${2}"[..]);
    let pass2 = CAMEL_ACRONYM_END.replace_all(&pass1, &b"${1}\t${2}"[..]);
    pass2.split(|&b| b == WORD_BREAK).map(<[u8]>::to_vec).collect()
}

/// Uppercase the first byte and lowercase the rest. Empty words stay empty.
fn capitalize(word: &[u8]) -> Vec<u8> {
    match word.split_first() {
        Some((first, rest)) => {
            let mut out = Vec::with_capacity(word.len());
            out.push(first.to_ascii_uppercase());
            out.extend(rest.to_ascii_lowercase());
            out
        }
        None => Vec::new(),
    }
}

fn join_underscore<W: AsRef<[u8]>>(words: &[W], case: impl Fn(&[u8]) -> Vec<u8>) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(b'_');
        }
        out.extend(case(word.as_ref()));
    }
    out
}

pub fn to_lower_camel(name: &[u8]) -> Vec<u8> {
    CaseStyle::LowerCamel.apply(name)
}

pub fn to_upper_camel(name: &[u8]) -> Vec<u8> {
    CaseStyle::UpperCamel.apply(name)
}

pub fn to_lower_underscore(name: &[u8]) -> Vec<u8> {
    CaseStyle::LowerUnderscore.apply(name)
}

pub fn to_upper_underscore(name: &[u8]) -> Vec<u8> {
    CaseStyle::UpperUnderscore.apply(name)
}

/// Apply `style` to every run of word characters in `expr`, leaving
/// punctuation, path separators and regex syntax between them untouched.
pub fn transform_expr(expr: &[u8], style: CaseStyle) -> Vec<u8> {
    NAME.replace_all(expr, |caps: &regex::bytes::Captures<'_>| style.apply(&caps[0]))
        .into_owned()
}

/// Every case variant of `expr`, in [`CaseStyle::ALL`] order.
pub fn all_case_variants(expr: &[u8]) -> [Vec<u8>; 4] {
    CaseStyle::ALL.map(|style| transform_expr(expr, style))
}
