//! Coarse ethnicity groups
//!
//! This module defines the seven groups fine-grained ethnicity labels are
//! aggregated into, so each analysis group has a usable sample size.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse ethnicity group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EthnicGroup {
    /// White British
    #[serde(rename = "White British")]
    WhiteBritish,
    /// White Irish or any other White background
    #[serde(rename = "White – Irish or Other")]
    WhiteIrishOrOther,
    /// Black or Black British
    #[serde(rename = "Black")]
    Black,
    /// Mixed or multiple ethnic groups
    #[serde(rename = "Mixed")]
    Mixed,
    /// Not known, not stated or declined
    #[serde(rename = "Unknown/Unwilling")]
    UnknownUnwilling,
    /// Any other ethnic group
    #[serde(rename = "Other ethnicities")]
    OtherEthnicities,
    /// Asian or Asian British
    #[serde(rename = "Asian")]
    Asian,
}

impl EthnicGroup {
    /// All groups in reporting order
    pub const ALL: [Self; 7] = [
        Self::WhiteBritish,
        Self::WhiteIrishOrOther,
        Self::Black,
        Self::Mixed,
        Self::UnknownUnwilling,
        Self::OtherEthnicities,
        Self::Asian,
    ];

    /// Display label, also used in the mapping artifact and exported tables
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WhiteBritish => "White British",
            Self::WhiteIrishOrOther => "White – Irish or Other",
            Self::Black => "Black",
            Self::Mixed => "Mixed",
            Self::UnknownUnwilling => "Unknown/Unwilling",
            Self::OtherEthnicities => "Other ethnicities",
            Self::Asian => "Asian",
        }
    }

    /// Look up a group by its display label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|group| group.label() == label)
    }
}

impl fmt::Display for EthnicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
