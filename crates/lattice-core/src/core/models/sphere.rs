use super::ids::SphereId;
use nalgebra::Point3;

/// A node of the lattice.
///
/// The radius may be left unresolved in the job definition when a global `sphere.radius`
/// parameter is expected to supply it. The ratio scales any global radius applied to this
/// sphere and defaults to `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub id: SphereId,
    /// Center position in lattice coordinates.
    pub position: Point3<f64>,
    pub radius: Option<f64>,
    pub ratio: f64,
}

impl Sphere {
    pub fn new(id: SphereId, position: Point3<f64>, radius: f64) -> Self {
        Self {
            id,
            position,
            radius: Some(radius),
            ratio: 1.0,
        }
    }

    /// Creates a sphere whose radius must come from a parameter set.
    pub fn unresolved(id: SphereId, position: Point3<f64>) -> Self {
        Self {
            id,
            position,
            radius: None,
            ratio: 1.0,
        }
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }
}
