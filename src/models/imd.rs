//! Index of Multiple Deprivation deciles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// IMD decile, ordered by rank: 1 is the most deprived tenth of areas and
/// 10 the least deprived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ImdDecile(u8);

impl ImdDecile {
    /// Most deprived decile
    pub const MOST_DEPRIVED: Self = Self(1);
    /// Least deprived decile
    pub const LEAST_DEPRIVED: Self = Self(10);

    /// Create a decile from its rank, `None` outside 1..=10
    #[must_use]
    pub const fn new(rank: u8) -> Option<Self> {
        if rank >= 1 && rank <= 10 {
            Some(Self(rank))
        } else {
            None
        }
    }

    /// Create a decile from any integer rank
    #[must_use]
    pub fn from_i64(rank: i64) -> Option<Self> {
        u8::try_from(rank).ok().and_then(Self::new)
    }

    /// Rank of the decile
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ImdDecile {
    type Error = String;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        Self::new(rank).ok_or_else(|| format!("IMD decile must be between 1 and 10, got {rank}"))
    }
}

impl From<ImdDecile> for u8 {
    fn from(decile: ImdDecile) -> Self {
        decile.0
    }
}

impl fmt::Display for ImdDecile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
