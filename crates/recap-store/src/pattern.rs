//! Redis-style glob matching for `keys(pattern)`.
//!
//! Patterns follow Redis `KEYS` rules and are rewritten into globset syntax
//! before compiling: braces and commas are literal, `[^...]` negates while
//! `[!...]` does not, ranges may be reversed, and an unclosed `[` class runs to
//! the end of the pattern.

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::Chars;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Result, StoreError};

/// Characters with a positional meaning inside a globset class, ascending
const CLASS_SPECIALS: [char; 4] = ['!', '-', ']', '^'];

/// Compiled key pattern (`*`, `?`, `\` escapes and `[...]` classes)
#[derive(Debug, Clone)]
pub struct KeyPattern {
    raw: String,
    /// `None` for patterns no key can match, such as an empty class
    matcher: Option<GlobMatcher>,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = match translate(pattern) {
            Some(glob) => Some(
                GlobBuilder::new(&glob)
                    .literal_separator(false)
                    .backslash_escape(true)
                    .build()
                    .map_err(|e| StoreError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };

        Ok(Self {
            raw: pattern.to_string(),
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, key: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(key))
    }

    /// Literal prefix shared by every matching key (empty if the pattern starts with a wildcard)
    pub fn literal_prefix(&self) -> &str {
        let end = self
            .raw
            .find(|c| matches!(c, '*' | '?' | '[' | '\\'))
            .unwrap_or(self.raw.len());
        &self.raw[..end]
    }
}

/// Rewrite a Redis pattern as a globset pattern, `None` when nothing can match
fn translate(pattern: &str) -> Option<String> {
    let mut glob = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                while chars.next_if_eq(&'*').is_some() {}
                glob.push('*');
            }
            '?' => glob.push('?'),
            // A trailing backslash is itself literal
            '\\' => push_literal(&mut glob, chars.next().unwrap_or('\\')),
            '[' => glob.push_str(&translate_class(&mut chars)?),
            c => push_literal(&mut glob, c),
        }
    }
    Some(glob)
}

fn push_literal(glob: &mut String, c: char) {
    if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | ',' | '\\') {
        glob.push('\\');
    }
    glob.push(c);
}

/// Translate one class, positioned just after its `[`
fn translate_class(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let negated = chars.next_if_eq(&'^').is_some();
    let mut ranges = Vec::new();

    while let Some(c) = chars.next() {
        match c {
            ']' => break,
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                ranges.push((escaped, escaped));
            }
            c => {
                let mut lookahead = chars.clone();
                match (lookahead.next(), lookahead.next()) {
                    (Some('-'), Some(end)) => {
                        chars.next();
                        chars.next();
                        ranges.push(if c <= end { (c, end) } else { (end, c) });
                    }
                    _ => ranges.push((c, c)),
                }
            }
        }
    }

    if ranges.is_empty() {
        return negated.then(|| "?".to_string());
    }
    Some(class_glob(negated, &ranges))
}

fn class_glob(negated: bool, ranges: &[(char, char)]) -> String {
    let mut plain = Vec::new();
    let mut specials = BTreeSet::new();
    for &(lo, hi) in ranges {
        split_specials(lo, hi, &mut plain, &mut specials);
    }

    let leading_bang = !negated
        && plain.is_empty()
        && !specials.contains(&']')
        && (specials.contains(&'!') || specials.contains(&'^'));
    if leading_bang {
        // `!` or `^` first would read as negation; spell the set as alternates
        let members: Vec<String> = specials.iter().map(|c| format!("\\{c}")).collect();
        return format!("{{{}}}", members.join(","));
    }

    let mut glob = String::from("[");
    if negated {
        glob.push('!');
    }
    if specials.contains(&']') {
        glob.push(']');
    }
    for (lo, hi) in plain {
        glob.push(lo);
        if hi != lo {
            glob.push('-');
            glob.push(hi);
        }
    }
    for c in ['!', '^'] {
        if specials.contains(&c) {
            glob.push(c);
        }
    }
    if specials.contains(&'-') {
        glob.push('-');
    }
    glob.push(']');
    glob
}

/// Split `lo..=hi` around the class specials, collecting them separately
fn split_specials(
    lo: char,
    hi: char,
    plain: &mut Vec<(char, char)>,
    specials: &mut BTreeSet<char>,
) {
    let mut start = lo;
    for special in CLASS_SPECIALS {
        if special < start || special > hi {
            continue;
        }
        specials.insert(special);
        if special > start {
            plain.push((start, char::from(special as u8 - 1)));
        }
        start = char::from(special as u8 + 1);
    }
    if start <= hi {
        plain.push((start, hi));
    }
}
