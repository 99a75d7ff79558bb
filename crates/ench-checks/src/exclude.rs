//! Glob-based entity exclusion
//!
//! Patterns use shell glob syntax: `*` matches any run of characters, `?`
//! a single character, `[abc]` / `[a-z]` a character class and `[!abc]` its
//! negation. The whole entity ID must match. Matching is case-insensitive.

use crate::CheckError;
use ench_core::EntityId;
use regex::Regex;
use tracing::trace;

/// Compiled set of exclusion patterns
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: Vec<(String, Regex)>,
}

impl ExclusionFilter {
    /// Compile the given glob patterns
    pub fn new<I, S>(patterns: I) -> Result<Self, CheckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let pattern = p.as_ref().trim().to_lowercase();
                Regex::new(&glob_to_regex(&pattern))
                    .map(|re| (pattern.clone(), re))
                    .map_err(|source| CheckError::InvalidPattern { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Whether the entity must be skipped by every check
    pub fn is_excluded(&self, entity_id: &EntityId) -> bool {
        self.matching_pattern(entity_id).is_some()
    }

    /// The first pattern matching the entity, if any
    pub fn matching_pattern(&self, entity_id: &EntityId) -> Option<&str> {
        let folded = entity_id.folded();
        let found = self
            .patterns
            .iter()
            .find(|(_, re)| re.is_match(&folded))
            .map(|(pattern, _)| pattern.as_str());
        if let Some(pattern) = found {
            trace!(entity_id = %entity_id, pattern, "Entity excluded");
        }
        found
    }
}

/// One-off check of an entity ID against uncompiled patterns
///
/// Invalid patterns never match.
pub fn is_excluded(entity_id: &str, patterns: &[String]) -> bool {
    let folded = entity_id.to_lowercase();
    patterns.iter().any(|p| {
        Regex::new(&glob_to_regex(&p.to_lowercase()))
            .map(|re| re.is_match(&folded))
            .unwrap_or(false)
    })
}

/// Translate a shell glob into an anchored regular expression
///
/// An unterminated `[` is taken literally.
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut k = i + 1;
                    if chars[k] == '!' {
                        out.push('^');
                        k += 1;
                    }
                    for &c in &chars[k..end] {
                        if matches!(c, '\\' | '[' | ']' | '&' | '~' | '^') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`
///
/// A `]` directly after `[` or `[!` belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}
