//! Age bands used when summarising waiting time by age.

use std::fmt;

use serde::Serialize;

/// Age band of a patient at referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AgeBand {
    /// 0 to 17
    Child,
    /// 18 to 34
    YoungAdult,
    /// 35 to 49
    Adult,
    /// 50 to 64
    OlderAdult,
    /// 65 to 79
    Senior,
    /// 80 and over
    Elderly,
}

impl AgeBand {
    /// Band for an age in whole years; negative ages have no band
    #[must_use]
    pub const fn from_age(age: i64) -> Option<Self> {
        match age {
            0..=17 => Some(Self::Child),
            18..=34 => Some(Self::YoungAdult),
            35..=49 => Some(Self::Adult),
            50..=64 => Some(Self::OlderAdult),
            65..=79 => Some(Self::Senior),
            80.. => Some(Self::Elderly),
            _ => None,
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Child => "0-17",
            Self::YoungAdult => "18-34",
            Self::Adult => "35-49",
            Self::OlderAdult => "50-64",
            Self::Senior => "65-79",
            Self::Elderly => "80+",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
