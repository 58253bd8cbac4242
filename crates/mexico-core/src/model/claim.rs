use crate::model::roll::{MAX_FACE, MIN_FACE, Roll};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// An announced roll, kept in canonical `(high, low)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[u8; 2]", try_from = "[u8; 2]")]
pub struct Claim {
    high: u8,
    low: u8,
}

impl Claim {
    /// Builds a claim from two faces in any order.
    pub const fn new(a: u8, b: u8) -> Option<Self> {
        if a < MIN_FACE || a > MAX_FACE || b < MIN_FACE || b > MAX_FACE {
            return None;
        }
        if a >= b {
            Some(Self { high: a, low: b })
        } else {
            Some(Self { high: b, low: a })
        }
    }

    /// Caller guarantees `1 <= low <= high <= 6`.
    pub(crate) const fn ordered(high: u8, low: u8) -> Self {
        Self { high, low }
    }

    /// The truthful claim for a roll.
    pub const fn from_roll(roll: Roll) -> Self {
        Self {
            high: roll.high(),
            low: roll.low(),
        }
    }

    pub const fn high(self) -> u8 {
        self.high
    }

    pub const fn low(self) -> u8 {
        self.low
    }

    pub const fn is_pair(self) -> bool {
        self.high == self.low
    }
}

impl From<Claim> for [u8; 2] {
    fn from(claim: Claim) -> Self {
        [claim.high, claim.low]
    }
}

impl TryFrom<[u8; 2]> for Claim {
    type Error = ParseClaimError;

    fn try_from(value: [u8; 2]) -> Result<Self, Self::Error> {
        Claim::new(value[0], value[1]).ok_or(ParseClaimError)
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.high, self.low)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseClaimError;

impl fmt::Display for ParseClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("claim must be two die faces between 1 and 6")
    }
}

impl std::error::Error for ParseClaimError {}

impl FromStr for Claim {
    type Err = ParseClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut digits = s.trim().chars().filter_map(|c| c.to_digit(10));
        let (Some(a), Some(b), None) = (digits.next(), digits.next(), digits.next()) else {
            return Err(ParseClaimError);
        };
        Claim::new(a as u8, b as u8).ok_or(ParseClaimError)
    }
}
