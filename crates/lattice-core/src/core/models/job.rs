use super::geometry::Geometry;
use super::material::{Material, Mesh};
use super::parametric::Parametric;
use super::study::Study;
use std::collections::BTreeMap;

/// Descriptive job header and its parametric section.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub name: String,
    pub description: String,
    pub unit_cell_size: [f64; 3],
    pub parametric: Parametric,
}

/// The aggregate root of a job definition.
///
/// A `CustomLatticeJob` is built once by the loader and then only read. Every per-job
/// customization works on a copy of [`CustomLatticeJob::geometry`].
#[derive(Debug, Clone, PartialEq)]
pub struct CustomLatticeJob {
    pub job: JobInfo,
    pub geometry: Geometry,
    /// Materials keyed by their table name in the job definition.
    pub materials: BTreeMap<String, Material>,
    pub mesh: Mesh,
    pub study: Study,
}

impl CustomLatticeJob {
    /// The material fed to the solver, which is the first entry in key order.
    pub fn primary_material(&self) -> Option<(&str, &Material)> {
        self.materials
            .iter()
            .next()
            .map(|(key, material)| (key.as_str(), material))
    }
}
