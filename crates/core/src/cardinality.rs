//! Cardinality values: `(min, max)` pairs where either bound may be "many".

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One bound of a cardinality: a concrete count or the sentinel "many",
/// written `N` (or `n`) in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalityValue {
    Count(u32),
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cardinality '{0}'")]
pub struct InvalidCardinality(pub String);

impl FromStr for CardinalityValue {
    type Err = InvalidCardinality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" | "n" => Ok(CardinalityValue::Many),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse::<u32>()
                .map(CardinalityValue::Count)
                .map_err(|_| InvalidCardinality(s.to_owned())),
            _ => Err(InvalidCardinality(s.to_owned())),
        }
    }
}

impl fmt::Display for CardinalityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardinalityValue::Count(n) => write!(f, "{}", n),
            CardinalityValue::Many => f.write_str("N"),
        }
    }
}

impl From<u32> for CardinalityValue {
    fn from(n: u32) -> Self {
        CardinalityValue::Count(n)
    }
}

/// An ordered `(min, max)` pair, written `min:max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub min: CardinalityValue,
    pub max: CardinalityValue,
}

impl Cardinality {
    pub fn new(min: impl Into<CardinalityValue>, max: impl Into<CardinalityValue>) -> Self {
        Cardinality {
            min: min.into(),
            max: max.into(),
        }
    }
}

impl FromStr for Cardinality {
    type Err = InvalidCardinality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once(':')
            .ok_or_else(|| InvalidCardinality(s.to_owned()))?;
        let bad = |_| InvalidCardinality(s.to_owned());
        Ok(Cardinality {
            min: min.parse().map_err(bad)?,
            max: max.parse().map_err(bad)?,
        })
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min, self.max)
    }
}

impl Serialize for Cardinality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CardinalityValue::{Count, Many};

    #[test]
    fn value_text_round_trips() {
        for v in [Count(0), Count(1), Count(42), Count(u32::MAX), Many] {
            assert_eq!(v.to_string().parse::<CardinalityValue>(), Ok(v));
        }
    }

    #[test]
    fn lowercase_n_is_many() {
        assert_eq!("n".parse::<CardinalityValue>(), Ok(Many));
    }

    #[test]
    fn rejects_garbage_and_overflow() {
        for s in ["", "x", "-1", "1.5", "NN", "99999999999"] {
            assert!(s.parse::<CardinalityValue>().is_err(), "{}", s);
        }
    }

    #[test]
    fn pair_text_round_trips() {
        for s in ["0:1", "1:1", "0:N", "N:N", "3:7"] {
            let card: Cardinality = s.parse().unwrap();
            assert_eq!(card.to_string(), s);
        }
        assert_eq!("0:N".parse::<Cardinality>(), Ok(Cardinality::new(0, Many)));
    }

    #[test]
    fn pair_requires_colon_and_both_bounds() {
        for s in ["1", "1:", ":1", "1:2:3", "a:b"] {
            assert!(s.parse::<Cardinality>().is_err(), "{}", s);
        }
    }

    #[test]
    fn serializes_as_text() {
        let json = serde_json::to_string(&Cardinality::new(1, Many)).unwrap();
        assert_eq!(json, "\"1:N\"");
    }
}
