//! Comment types keyed by byte ranges
//!
//! A comment is attached to a half-open byte range `[offset, offset+length)`
//! of a binary document. Ranges may nest but must not partially overlap;
//! the store enforces that contract, not these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the byte range a comment is attached to
///
/// Keys are totally ordered by offset ascending, then length ascending,
/// which is the store's snapshot iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RangeKey {
    /// Start of the range in document bytes
    pub offset: u64,
    /// Length of the range in bytes (zero-length ranges are allowed)
    pub length: u64,
}

impl RangeKey {
    /// Create a key for the range `[offset, offset+length)`
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end of the range
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Whether this range contains `other`
    ///
    /// Containment is inclusive on both sides: a range contains itself, and
    /// a zero-length range at the start of a longer one is contained by it.
    pub fn contains(&self, other: &RangeKey) -> bool {
        self.offset <= other.offset && self.end() >= other.end()
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}+{}", self.offset, self.length)
    }
}

/// A comment attached to one byte range of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// The comment text; the tree displays only the first line
    pub text: String,
    /// Creation timestamp
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment with the current time
    pub fn new(text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            text: text.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the text and touch the modification timestamp
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.updated_at = Utc::now();
    }

    /// The text up to the first line break (CR or LF)
    ///
    /// This is the single-line form shown next to a tree row.
    pub fn first_line(&self) -> &str {
        match self.text.find(['\r', '\n']) {
            Some(i) => &self.text[..i],
            None => &self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering() {
        let mut keys = vec![
            RangeKey::new(10, 5),
            RangeKey::new(0, 100),
            RangeKey::new(10, 20),
            RangeKey::new(50, 10),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                RangeKey::new(0, 100),
                RangeKey::new(10, 5),
                RangeKey::new(10, 20),
                RangeKey::new(50, 10),
            ]
        );
    }

    #[test]
    fn test_containment() {
        let outer = RangeKey::new(0, 100);
        let inner = RangeKey::new(10, 20);
        let zero = RangeKey::new(10, 0);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
        assert!(inner.contains(&zero));
    }

    #[test]
    fn test_first_line() {
        assert_eq!(Comment::new("line one\nline two").first_line(), "line one");
        assert_eq!(Comment::new("line one\r\nline two").first_line(), "line one");
        assert_eq!(Comment::new("no break").first_line(), "no break");
        assert_eq!(Comment::new("").first_line(), "");
    }

    #[test]
    fn test_serialization() {
        let comment = Comment::new("checksum region");

        let json = serde_json::to_string(&comment).unwrap();
        assert!(json.contains("createdAt"));
        assert!(json.contains("checksum region"));

        // Verify round-trip
        let parsed: Comment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, comment);
    }
}
