//! Glob patterns for catalog filters and histogram exclusions.
//!
//! Supports:
//! - `*` matches any sequence of characters, including none
//! - `?` matches exactly one character
//!
//! Matching ignores ASCII case, as SQL Server's default collations do.

use std::fmt;

/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    folded: Vec<char>,
}

impl GlobPattern {
    /// Compiles a pattern.
    pub fn new(pattern: &str) -> Self {
        let raw = pattern.trim().to_string();
        let mut folded: Vec<char> = Vec::with_capacity(raw.len());
        for c in raw.chars().map(|c| c.to_ascii_lowercase()) {
            // Runs of stars are equivalent to one
            if c == '*' && folded.last() == Some(&'*') {
                continue;
            }
            folded.push(c);
        }
        Self { raw, folded }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern is the single wildcard `*`.
    pub fn matches_everything(&self) -> bool {
        self.folded == ['*']
    }

    /// Tests `text` against the pattern.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
        let pattern = &self.folded;

        let (mut p, mut t) = (0usize, 0usize);
        // Position of the last star seen, and the text index it was tried at
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            match pattern.get(p) {
                Some('*') => {
                    backtrack = Some((p, t));
                    p += 1;
                }
                Some(&c) if c == '?' || c == text[t] => {
                    p += 1;
                    t += 1;
                }
                _ => match backtrack {
                    Some((star, from)) => {
                        p = star + 1;
                        t = from + 1;
                        backtrack = Some((star, from + 1));
                    }
                    None => return false,
                },
            }
        }

        pattern[p..].iter().all(|c| *c == '*')
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for GlobPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

/// Checks if a name matches any of the patterns.
pub fn matches_any(patterns: &[GlobPattern], name: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(name))
}

/// Splits a comma-separated pattern list, ignoring empty entries.
pub fn parse_list(list: &str) -> Vec<GlobPattern> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(GlobPattern::new)
        .collect()
}
