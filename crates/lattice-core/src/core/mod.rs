//! # Core Module
//!
//! Fundamental data structures and I/O for lattice job definitions.
//!
//! - **Lattice Representation** ([`models`]) - Spheres, beams, materials, study settings and
//!   the parametric description of a job
//! - **File I/O** ([`io`]) - Loading job definitions from TOML with collected schema errors
//! - **Utilities** ([`utils`]) - Small geometric helpers shared by the engine

pub mod io;
pub mod models;
pub mod utils;
