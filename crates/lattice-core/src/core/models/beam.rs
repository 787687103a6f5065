use super::ids::{BeamId, SphereId};

/// A strut connecting the centers of two distinct spheres.
///
/// Endpoints refer to spheres by id. The thickness is the beam diameter; like sphere
/// radii it may be left for a global `beam.thickness` parameter to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    pub id: BeamId,
    pub endpoints: [SphereId; 2],
    pub thickness: Option<f64>,
    pub ratio: f64,
}

impl Beam {
    pub fn new(id: BeamId, endpoints: [SphereId; 2], thickness: f64) -> Self {
        Self {
            id,
            endpoints,
            thickness: Some(thickness),
            ratio: 1.0,
        }
    }

    pub fn unresolved(id: BeamId, endpoints: [SphereId; 2]) -> Self {
        Self {
            id,
            endpoints,
            thickness: None,
            ratio: 1.0,
        }
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    /// Half of the thickness, if resolved.
    pub fn radius(&self) -> Option<f64> {
        self.thickness.map(|t| t / 2.0)
    }
}
