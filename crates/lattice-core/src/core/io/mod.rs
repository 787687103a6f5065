//! Loading of job definition files.
//!
//! A job definition is parsed into loosely typed file records first and then converted
//! into the [`crate::core::models`] types. Every structural or range problem found during
//! conversion is collected so that a single load reports all of them.

pub mod toml_job;
pub mod traits;
