//! # latticegen Core Library
//!
//! A library for turning declarative sphere/beam lattice definitions into validated,
//! ready-to-run finite-element jobs for the COMSOL solver.
//!
//! ## Architectural Philosophy
//!
//! The library is arranged in three layers with a strict dependency direction:
//!
//! - **[`core`]: The Foundation.** Stateless data models for lattices (`Geometry`,
//!   `CustomLatticeJob`), parameter paths, and the loader that turns a TOML job definition
//!   into those models after schema validation.
//!
//! - **[`engine`]: The Logic Core.** Pure transformations over the models: parametric
//!   expansion into parameter sets, geometry resolution under a parameter set, geometric
//!   validation, template rendering, and static checks of the rendered solver source.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the
//!   per-job generation pipeline and the batch study generator, owning every filesystem
//!   side effect of the library.

pub mod core;
pub mod engine;
pub mod workflows;
