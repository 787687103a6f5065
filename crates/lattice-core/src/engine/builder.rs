use super::error::EngineError;
use super::parametric::ParameterSet;
use crate::core::models::beam::Beam;
use crate::core::models::geometry::Geometry;
use crate::core::models::ids::{BeamId, SphereId};
use crate::core::models::job::CustomLatticeJob;
use crate::core::models::parametric::{ElementField, ParameterPath};
use serde::Serialize;
use tracing::{trace, warn};

pub const DEFAULT_SAFETY_FACTOR: f64 = 0.99;
/// Radius substituted for a sphere that no parameter resolved.
pub const FALLBACK_SPHERE_RADIUS: f64 = 1.0;
/// Thickness substituted for a beam that no parameter resolved.
pub const FALLBACK_BEAM_THICKNESS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SphereData {
    pub id: SphereId,
    pub position: [f64; 3],
    pub radius: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeamData {
    pub id: BeamId,
    pub endpoint1_index: usize,
    pub endpoint2_index: usize,
    pub thickness: f64,
    pub ratio: f64,
}

/// Fully resolved, render-ready geometry values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryData {
    pub lattice_constant: f64,
    pub unit_cell_size: [f64; 3],
    pub spheres: Vec<SphereData>,
    pub beams: Vec<BeamData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    Sphere(SphereId),
    Beam(BeamId),
}

/// Record of a fallback value substituted for an unresolved radius or thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fallback {
    pub element: ElementRef,
    pub value: f64,
}

/// The outcome of applying one parameter set.
///
/// `geometry` keeps `None` for every value no parameter resolved, so validation still
/// sees what is missing. `data` has fallbacks substituted and is what gets rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGeometry {
    pub geometry: Geometry,
    pub data: GeometryData,
    pub fallbacks: Vec<Fallback>,
}

/// Applies parameter sets to copies of a base geometry.
///
/// Values derived from a global parameter are scaled by the element ratio and the
/// safety factor. Literal indexed values are applied unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryBuilder {
    pub safety_factor: f64,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self {
            safety_factor: DEFAULT_SAFETY_FACTOR,
        }
    }
}

impl GeometryBuilder {
    pub fn new(safety_factor: f64) -> Self {
        Self { safety_factor }
    }

    /// Returns a copy of `base` with the parameters of `params` applied.
    ///
    /// Order: global values first, then indexed ratios, then indexed literals. An indexed
    /// literal therefore always wins for its element, whatever the declaration order.
    pub fn apply_parameters(&self, base: &Geometry, params: &ParameterSet) -> Geometry {
        let mut geometry = base.clone();
        let sf = self.safety_factor;
        let global_radius = params.get(&ParameterPath::Global(ElementField::SphereRadius));
        let global_thickness = params.get(&ParameterPath::Global(ElementField::BeamThickness));

        if let Some(radius) = global_radius {
            for sphere in &mut geometry.spheres {
                sphere.radius = Some(radius * sphere.ratio * sf);
            }
        }
        if let Some(thickness) = global_thickness {
            for beam in &mut geometry.beams {
                beam.thickness = Some(thickness * beam.ratio * sf);
            }
        }

        let indexed = params.parameters.iter().filter_map(|(path, value)| match path {
            ParameterPath::Indexed(index, field) => Some((*index, *field, *value)),
            ParameterPath::Global(_) => None,
        });
        let (ratios, literals): (Vec<_>, Vec<_>) =
            indexed.partition(|(_, field, _)| field.is_ratio());

        for (index, field, value) in ratios.into_iter().chain(literals) {
            if !self.apply_indexed(&mut geometry, index, field, value, global_radius, global_thickness) {
                warn!(
                    parameter = %ParameterPath::Indexed(index, field),
                    "Indexed parameter addresses no element; ignored."
                );
            }
        }

        geometry
    }

    fn apply_indexed(
        &self,
        geometry: &mut Geometry,
        index: usize,
        field: ElementField,
        value: f64,
        global_radius: Option<f64>,
        global_thickness: Option<f64>,
    ) -> bool {
        let sf = self.safety_factor;
        let applied = match field {
            ElementField::SphereRatio => geometry.spheres.get_mut(index).map(|sphere| {
                sphere.ratio = value;
                if let Some(radius) = global_radius {
                    sphere.radius = Some(radius * value * sf);
                }
            }),
            ElementField::SphereRadius => geometry
                .spheres
                .get_mut(index)
                .map(|sphere| sphere.radius = Some(value)),
            ElementField::BeamRatio => geometry.beams.get_mut(index).map(|beam| {
                beam.ratio = value;
                if let Some(thickness) = global_thickness {
                    beam.thickness = Some(thickness * value * sf);
                }
            }),
            ElementField::BeamThickness => geometry
                .beams
                .get_mut(index)
                .map(|beam| beam.thickness = Some(value)),
        };
        applied.is_some()
    }

    /// Resolves a beam's endpoint sphere ids to positions in `geometry.spheres`.
    pub fn beam_endpoint_indices(
        geometry: &Geometry,
        beam: &Beam,
    ) -> Result<(usize, usize), EngineError> {
        let lookup = |sphere_id: SphereId| {
            geometry
                .sphere_index(sphere_id)
                .ok_or(EngineError::EndpointNotFound {
                    beam_id: beam.id,
                    sphere_id,
                })
        };
        Ok((lookup(beam.endpoints[0])?, lookup(beam.endpoints[1])?))
    }

    /// Resolves `params` against the job's geometry into render-ready data.
    ///
    /// Unresolved values are replaced by [`FALLBACK_SPHERE_RADIUS`] and
    /// [`FALLBACK_BEAM_THICKNESS`] and recorded in [`ResolvedGeometry::fallbacks`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EndpointNotFound`] if a beam references a sphere id absent
    /// from the geometry.
    pub fn build_geometry_data(
        &self,
        job: &CustomLatticeJob,
        params: &ParameterSet,
    ) -> Result<ResolvedGeometry, EngineError> {
        let geometry = self.apply_parameters(&job.geometry, params);
        let mut fallbacks = Vec::new();

        let mut spheres = Vec::with_capacity(geometry.spheres.len());
        for sphere in &geometry.spheres {
            let radius = sphere.radius.unwrap_or_else(|| {
                fallbacks.push(Fallback {
                    element: ElementRef::Sphere(sphere.id),
                    value: FALLBACK_SPHERE_RADIUS,
                });
                FALLBACK_SPHERE_RADIUS
            });
            spheres.push(SphereData {
                id: sphere.id,
                position: [sphere.position.x, sphere.position.y, sphere.position.z],
                radius,
                ratio: sphere.ratio,
            });
        }

        let mut beams = Vec::with_capacity(geometry.beams.len());
        for beam in &geometry.beams {
            let (endpoint1_index, endpoint2_index) = Self::beam_endpoint_indices(&geometry, beam)?;
            let thickness = beam.thickness.unwrap_or_else(|| {
                fallbacks.push(Fallback {
                    element: ElementRef::Beam(beam.id),
                    value: FALLBACK_BEAM_THICKNESS,
                });
                FALLBACK_BEAM_THICKNESS
            });
            beams.push(BeamData {
                id: beam.id,
                endpoint1_index,
                endpoint2_index,
                thickness,
                ratio: beam.ratio,
            });
        }

        trace!(
            job_id = %params.job_id,
            fallbacks = fallbacks.len(),
            "Resolved geometry data."
        );

        let data = GeometryData {
            lattice_constant: geometry.lattice_constant,
            unit_cell_size: job.job.unit_cell_size,
            spheres,
            beams,
        };
        Ok(ResolvedGeometry {
            geometry,
            data,
            fallbacks,
        })
    }
}
