//! Data types shared by the pipeline stages.

pub mod claim;
pub mod config;
pub mod contracts;
pub mod report;
pub mod source;
pub mod verdict;
