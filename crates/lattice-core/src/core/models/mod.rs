//! # Core Models Module
//!
//! Plain data describing a custom lattice job. Models carry no validation logic of their
//! own; invariants are established by the loader in [`crate::core::io`] and checked again
//! by the engine where a parameter set can break them.
//!
//! ## Key Components
//!
//! - [`ids`] - Identifier newtypes for spheres and beams
//! - [`sphere`] - Lattice nodes with position, radius and radius ratio
//! - [`beam`] - Struts connecting two spheres
//! - [`geometry`] - The full lattice with its lattice constant
//! - [`material`] - Material properties and mesh settings
//! - [`study`] - Strain study and boundary condition settings
//! - [`parametric`] - Parameter paths, sweeps and defaults
//! - [`job`] - The top-level job definition
//!
//! ## Usage
//!
//! ```ignore
//! use latticegen::core::models::{geometry::Geometry, sphere::Sphere, ids::SphereId};
//! use nalgebra::Point3;
//!
//! let spheres = vec![Sphere::new(SphereId(1), Point3::origin(), 0.3)];
//! let geometry = Geometry::new(1.0, spheres, Vec::new());
//! ```

pub mod beam;
pub mod geometry;
pub mod ids;
pub mod job;
pub mod material;
pub mod parametric;
pub mod sphere;
pub mod study;
