//! Utility functions shared by the pipeline stages

pub mod arrow;
pub mod io;
pub mod logging;
