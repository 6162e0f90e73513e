//! Domain types for RTT records.

pub mod age_band;
pub mod ethnicity;
pub mod imd;

pub use age_band::AgeBand;
pub use ethnicity::EthnicGroup;
pub use imd::ImdDecile;
