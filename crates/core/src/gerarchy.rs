//! Classification of a generalization hierarchy ("gerarchy").
//!
//! Three facets packed as bits. When `SUBSET` is set the other two facets
//! carry no meaning and every derived predicate other than [`is_subset`]
//! reads false.
//!
//! [`is_subset`]: GerarchyType::is_subset

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GerarchyType(u8);

impl GerarchyType {
    pub const EXCLUSIVE: u8 = 1 << 0;
    pub const TOTAL: u8 = 1 << 1;
    pub const SUBSET: u8 = 1 << 2;

    pub fn new(total: bool, exclusive: bool) -> Self {
        let mut bits = 0;
        if total {
            bits |= Self::TOTAL;
        }
        if exclusive {
            bits |= Self::EXCLUSIVE;
        }
        GerarchyType(bits)
    }

    pub fn subset() -> Self {
        GerarchyType(Self::SUBSET)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Decode a bit pattern. Returns `None` if any bit outside the three
    /// facets is set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits & !(Self::EXCLUSIVE | Self::TOTAL | Self::SUBSET) == 0).then_some(GerarchyType(bits))
    }

    /// `total` or `partial`, as the `total` flag.
    pub fn coverage(word: &str) -> Option<bool> {
        match word {
            "total" => Some(true),
            "partial" => Some(false),
            _ => None,
        }
    }

    /// `exclusive` or `overlapped`, as the `exclusive` flag.
    pub fn disjointness(word: &str) -> Option<bool> {
        match word {
            "exclusive" => Some(true),
            "overlapped" => Some(false),
            _ => None,
        }
    }

    pub fn is_subset(self) -> bool {
        self.0 & Self::SUBSET != 0
    }

    pub fn is_total(self) -> bool {
        !self.is_subset() && self.0 & Self::TOTAL != 0
    }

    pub fn is_partial(self) -> bool {
        !self.is_subset() && !self.is_total()
    }

    pub fn is_exclusive(self) -> bool {
        !self.is_subset() && self.0 & Self::EXCLUSIVE != 0
    }

    pub fn is_overlapped(self) -> bool {
        !self.is_subset() && !self.is_exclusive()
    }
}

impl fmt::Display for GerarchyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_subset() {
            return f.write_str("subset");
        }
        let coverage = if self.is_total() { "total" } else { "partial" };
        let disjointness = if self.is_exclusive() {
            "exclusive"
        } else {
            "overlapped"
        };
        write!(f, "{} {}", coverage, disjointness)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid gerarchy type '{0}'")]
pub struct InvalidGerarchyType(pub String);

impl FromStr for GerarchyType {
    type Err = InvalidGerarchyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidGerarchyType(s.to_owned());
        let words: Vec<&str> = s.split_whitespace().collect();
        match words.as_slice() {
            ["subset"] => Ok(GerarchyType::subset()),
            [coverage, disjointness] => {
                let total = GerarchyType::coverage(coverage).ok_or_else(invalid)?;
                let exclusive = GerarchyType::disjointness(disjointness).ok_or_else(invalid)?;
                Ok(GerarchyType::new(total, exclusive))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for GerarchyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
