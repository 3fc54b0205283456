// SPDX-License-Identifier: MIT

//! Addressing nodes inside a property-list tree.
//!
//! A [`PlistPath`] is written as `key.sub[2].leaf`: dot-separated dictionary keys and
//! bracketed array indexes. A backslash escapes `.`, `[`, `]` or `\` inside a key.

use std::{fmt, str::FromStr};

use crate::core::error::{EditError, Result};

/// One step from a container to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Dictionary key.
    Key(String),
    /// Array position.
    Index(usize),
}

impl Segment {
    /// The label shown for the child this segment leads to.
    pub fn label(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Location of a node relative to the root of a tree. Empty for the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlistPath {
    segments: Vec<Segment>,
}

impl PlistPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns this path extended by one segment.
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Splits off the last segment; `None` for the root.
    pub fn split_last(&self) -> Option<(PlistPath, &Segment)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (PlistPath::new(parent.to_vec()), last))
    }

    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

impl<S: Into<Segment>> FromIterator<S> for PlistPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl FromStr for PlistPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| EditError::invalid_path(s, reason);

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut has_key = false;
        let mut after_dot = false;
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    key.push(chars.next().ok_or_else(|| invalid("dangling escape"))?);
                    has_key = true;
                    after_dot = false;
                }
                '.' => {
                    if has_key {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    } else if after_dot || !matches!(segments.last(), Some(Segment::Index(_))) {
                        return Err(invalid("empty key"));
                    }
                    has_key = false;
                    after_dot = true;
                }
                '[' => {
                    if has_key {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    } else if after_dot {
                        return Err(invalid("empty key"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) => digits.push(d),
                            None => return Err(invalid("unterminated index")),
                        }
                    }
                    let index = digits
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| invalid("array index must be a non-negative integer"))?;
                    segments.push(Segment::Index(index));
                    has_key = false;
                    after_dot = false;
                }
                ']' => return Err(invalid("unbalanced `]`")),
                c => {
                    key.push(c);
                    has_key = true;
                    after_dot = false;
                }
            }
        }

        if has_key {
            segments.push(Segment::Key(key));
        } else if after_dot {
            return Err(invalid("trailing `.`"));
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for PlistPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    for c in key.chars() {
                        if matches!(c, '.' | '[' | ']' | '\\') {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn parse(s: &str) -> PlistPath {
        s.parse().unwrap()
    }

    #[test]
    fn parses_keys_and_indexes() {
        assert_eq!(parse(""), PlistPath::root());
        assert_eq!(
            parse("persistent-apps[3].tile-data"),
            PlistPath::new(vec![
                "persistent-apps".into(),
                Segment::Index(3),
                "tile-data".into()
            ])
        );
        assert_eq!(parse("[0][1]"), PlistPath::new(vec![Segment::Index(0), Segment::Index(1)]));
    }

    #[test]
    fn escapes_round_trip_through_display() {
        let path = PlistPath::new(vec![
            "com.apple.dock".into(),
            Segment::Index(2),
            "a\\b[c]".into(),
        ]);
        let text = path.to_string();
        assert_eq!(text, r"com\.apple\.dock[2].a\\b\[c\]");
        assert_eq!(parse(&text), path);
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in [".a", "a..b", "a.", "a[", "a[x]", "a]", "a[-1]", "a\\", "a.[0]"] {
            assert!(
                matches!(bad.parse::<PlistPath>(), Err(EditError::InvalidPath { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn orders_indexes_numerically() {
        assert!(parse("a[2]") < parse("a[10]"));
        assert!(parse("a") < parse("a[0]"));
    }
}
