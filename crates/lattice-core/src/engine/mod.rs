//! # Engine Module
//!
//! Pure transformations that take a loaded job to rendered solver code.
//!
//! ## Overview
//!
//! Nothing in this module touches the filesystem except loading templates and reading a
//! source file for inspection. The per-job state machine that sequences these pieces,
//! and writes their results, lives in [`crate::workflows`].
//!
//! ## Architecture
//!
//! - **Parametric Expansion** ([`parametric`]) - Cartesian expansion of sweeps into parameter sets
//! - **Geometry Resolution** ([`builder`]) - Applying a parameter set to a copy of the base geometry
//! - **Geometry Validation** ([`validation`]) - Overlap, penetration and thickness-safety checks
//! - **Rendering** ([`render`]) - The template collaborator boundary and the built-in renderer
//! - **Code Checks** ([`code_check`]) - Static checks of rendered solver source
//! - **Reports** ([`report`]) - Error/warning accumulation shared by both validators
//! - **Configuration** ([`config`]) - Generation settings and their builder
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine error taxonomy and skip-vs-abort classification

pub mod builder;
pub mod code_check;
pub mod config;
pub mod error;
pub mod parametric;
pub mod progress;
pub mod render;
pub mod report;
pub mod validation;
