//! # Workflows Module
//!
//! The user-facing entry points of the library.
//!
//! - [`generate`] - Single-job and batch generation of solver jobs on disk
//! - [`validate`] - Geometry checks of every parameter set without writing anything
//!
//! Both share one resolution step: a parameter set is applied to a copy of the base
//! geometry, the copy is validated, and each fallback substituted for an unresolved
//! value is reported as an `unresolved_value` error of that job.

pub mod generate;
pub mod validate;
