//! Byte-keyed ranges over the sorted key space of the storage engine.
//!
//! Keys compare lexicographically as unsigned bytes. A missing bound (`None`)
//! is open: it extends to the beginning or end of the key space, and its
//! inclusiveness flag carries no meaning.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to an index. Only the id is carried; the index strategy
/// itself lives outside the planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRef(String);

impl IndexRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IndexRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for IndexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contiguous interval of the key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: Option<Vec<u8>>,
    pub end: Option<Vec<u8>>,
    pub start_inclusive: bool,
    pub end_inclusive: bool,
}

impl KeyRange {
    pub fn new(
        start: Option<Vec<u8>>,
        start_inclusive: bool,
        end: Option<Vec<u8>>,
        end_inclusive: bool,
    ) -> Self {
        Self {
            start,
            end,
            start_inclusive,
            end_inclusive,
        }
    }

    /// `[start, end)`
    pub fn half_open(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self::new(Some(start.into()), true, Some(end.into()), false)
    }

    /// `[start, end]`
    pub fn closed(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self::new(Some(start.into()), true, Some(end.into()), true)
    }

    /// The whole key space.
    pub fn all() -> Self {
        Self::new(None, true, None, true)
    }

    pub fn is_open_start(&self) -> bool {
        self.start.is_none()
    }

    pub fn is_open_end(&self) -> bool {
        self.end.is_none()
    }

    /// Longest bound in bytes; open bounds count as zero.
    pub fn max_key_len(&self) -> usize {
        let start = self.start.as_ref().map_or(0, Vec::len);
        let end = self.end.as_ref().map_or(0, Vec::len);
        start.max(end)
    }

    /// True when no key can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => match s.cmp(e) {
                Ordering::Greater => true,
                Ordering::Equal => !(self.start_inclusive && self.end_inclusive),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            None => true,
            Some(s) => match key.cmp(s.as_slice()) {
                Ordering::Greater => true,
                Ordering::Equal => self.start_inclusive,
                Ordering::Less => false,
            },
        };
        let before_end = match &self.end {
            None => true,
            Some(e) => match key.cmp(e.as_slice()) {
                Ordering::Less => true,
                Ordering::Equal => self.end_inclusive,
                Ordering::Greater => false,
            },
        };
        after_start && before_end
    }

    /// Intersection of two ranges, `None` when they do not overlap.
    pub fn clip(&self, other: &KeyRange) -> Option<KeyRange> {
        let (start, start_inclusive) = match (&self.start, &other.start) {
            (None, None) => (None, true),
            (Some(a), None) => (Some(a.clone()), self.start_inclusive),
            (None, Some(b)) => (Some(b.clone()), other.start_inclusive),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Greater => (Some(a.clone()), self.start_inclusive),
                Ordering::Less => (Some(b.clone()), other.start_inclusive),
                Ordering::Equal => (
                    Some(a.clone()),
                    self.start_inclusive && other.start_inclusive,
                ),
            },
        };
        let (end, end_inclusive) = match (&self.end, &other.end) {
            (None, None) => (None, true),
            (Some(a), None) => (Some(a.clone()), self.end_inclusive),
            (None, Some(b)) => (Some(b.clone()), other.end_inclusive),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Less => (Some(a.clone()), self.end_inclusive),
                Ordering::Greater => (Some(b.clone()), other.end_inclusive),
                Ordering::Equal => (Some(a.clone()), self.end_inclusive && other.end_inclusive),
            },
        };
        let clipped = KeyRange::new(start, start_inclusive, end, end_inclusive);
        (!clipped.is_empty()).then_some(clipped)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start {
            None => f.write_str("(-inf")?,
            Some(s) => write!(f, "{}{}", if self.start_inclusive { '[' } else { '(' }, to_hex(s))?,
        }
        f.write_str(", ")?;
        match &self.end {
            None => f.write_str("+inf)"),
            Some(e) => write!(f, "{}{}", to_hex(e), if self.end_inclusive { ']' } else { ')' }),
        }
    }
}

/// One storage extent (tablet/region) of an index: `(prev_end_row, end_row]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Extent {
    pub index: IndexRef,
    pub prev_end_row: Option<Vec<u8>>,
    pub end_row: Option<Vec<u8>>,
}

impl Extent {
    pub fn new(index: IndexRef, prev_end_row: Option<Vec<u8>>, end_row: Option<Vec<u8>>) -> Self {
        Self {
            index,
            prev_end_row,
            end_row,
        }
    }

    /// The keys this extent hosts.
    pub fn data_range(&self) -> KeyRange {
        KeyRange::new(
            self.prev_end_row.clone(),
            self.prev_end_row.is_none(),
            self.end_row.clone(),
            true,
        )
    }
}

/// Lowercase hex, two chars per byte.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse lowercase or uppercase hex (no prefix) into bytes.
pub fn from_hex(s: &str) -> crate::error::Result<Vec<u8>> {
    let s = s.trim();
    hex::decode(s).map_err(|e| crate::error::Error::Range(format!("hex key '{s}': {e}")))
}
