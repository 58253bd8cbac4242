use super::ClaimRules;
use crate::model::claim::Claim;
use crate::model::roll::Roll;
use crate::model::{DOUBLE, MEXICAN, NORMAL};
use std::cmp::Ordering;

/// Every claim from weakest to strongest.
const LADDER: [Claim; 21] = [
    Claim::ordered(3, 1),
    Claim::ordered(3, 2),
    Claim::ordered(4, 1),
    Claim::ordered(4, 2),
    Claim::ordered(4, 3),
    Claim::ordered(5, 1),
    Claim::ordered(5, 2),
    Claim::ordered(5, 3),
    Claim::ordered(5, 4),
    Claim::ordered(6, 1),
    Claim::ordered(6, 2),
    Claim::ordered(6, 3),
    Claim::ordered(6, 4),
    Claim::ordered(6, 5),
    Claim::ordered(1, 1),
    Claim::ordered(2, 2),
    Claim::ordered(3, 3),
    Claim::ordered(4, 4),
    Claim::ordered(5, 5),
    Claim::ordered(6, 6),
    Claim::ordered(2, 1),
];

/// Standard Mexico ordering: plain numbers, then pairs, then `21` on top.
///
/// `next_higher` saturates at `21`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MexicoRules;

impl MexicoRules {
    /// Position of the claim on the ladder, 0 being the weakest.
    pub fn rank(claim: &Claim) -> usize {
        LADDER
            .iter()
            .position(|entry| entry == claim)
            .unwrap_or(0)
    }

    pub fn top() -> Claim {
        ladder_claim(LADDER.len() - 1)
    }

    pub fn is_mexican(claim: &Claim) -> bool {
        claim.high() == 2 && claim.low() == 1
    }
}

impl ClaimRules for MexicoRules {
    fn compare(&self, a: &Claim, b: &Claim) -> Ordering {
        Self::rank(a).cmp(&Self::rank(b))
    }

    fn next_higher(&self, claim: &Claim) -> Claim {
        let next = (Self::rank(claim) + 1).min(LADDER.len() - 1);
        ladder_claim(next)
    }

    fn categorize(&self, claim: &Claim) -> String {
        let label = if Self::is_mexican(claim) {
            MEXICAN
        } else if claim.is_pair() {
            DOUBLE
        } else {
            NORMAL
        };
        label.to_string()
    }

    fn matches_roll(&self, claim: &Claim, roll: &Roll) -> bool {
        self.compare(&Claim::from_roll(*roll), claim) != Ordering::Less
    }
}

fn ladder_claim(index: usize) -> Claim {
    LADDER[index]
}
