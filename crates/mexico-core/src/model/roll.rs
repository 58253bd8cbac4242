use core::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_FACE: u8 = 1;
pub const MAX_FACE: u8 = 6;

/// The two hidden dice behind a claim. Order is whatever the cup produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roll {
    first: u8,
    second: u8,
}

impl Roll {
    pub const fn new(first: u8, second: u8) -> Option<Self> {
        if is_face(first) && is_face(second) {
            Some(Self { first, second })
        } else {
            None
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            first: rng.gen_range(MIN_FACE..=MAX_FACE),
            second: rng.gen_range(MIN_FACE..=MAX_FACE),
        }
    }

    pub const fn first(self) -> u8 {
        self.first
    }

    pub const fn second(self) -> u8 {
        self.second
    }

    pub const fn high(self) -> u8 {
        if self.first >= self.second {
            self.first
        } else {
            self.second
        }
    }

    pub const fn low(self) -> u8 {
        if self.first >= self.second {
            self.second
        } else {
            self.first
        }
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.first, self.second)
    }
}

const fn is_face(value: u8) -> bool {
    value >= MIN_FACE && value <= MAX_FACE
}
