use super::report::{Issue, Severity, ValidationReport};
use crate::core::models::geometry::Geometry;
use crate::core::utils::geometry::{center_distance, surface_gap};
use itertools::Itertools;
use std::fmt;
use tracing::{debug, instrument};

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_THICKNESS_MARGIN: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryIssueKind {
    SphereOverlap,
    BeamExcessivePenetration,
    ThicknessSafety,
    MissingEndpoint,
    DegenerateBeam,
    UnresolvedRadius,
    UnresolvedThickness,
    /// A value that had to be substituted with a fallback during resolution.
    UnresolvedValue,
}

impl GeometryIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SphereOverlap => "sphere_overlap",
            Self::BeamExcessivePenetration => "beam_excessive_penetration",
            Self::ThicknessSafety => "thickness_safety",
            Self::MissingEndpoint => "missing_endpoint",
            Self::DegenerateBeam => "degenerate_beam",
            Self::UnresolvedRadius => "unresolved_radius",
            Self::UnresolvedThickness => "unresolved_thickness",
            Self::UnresolvedValue => "unresolved_value",
        }
    }
}

/// One geometric finding. `element_ids` holds the sphere and beam ids involved, in the
/// order the message names them.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryIssue {
    pub kind: GeometryIssueKind,
    pub severity: Severity,
    pub message: String,
    pub element_ids: Vec<u32>,
}

impl GeometryIssue {
    pub fn error(kind: GeometryIssueKind, message: impl Into<String>, element_ids: Vec<u32>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            element_ids,
        }
    }

    pub fn warning(kind: GeometryIssueKind, message: impl Into<String>, element_ids: Vec<u32>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            element_ids,
        }
    }
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Issue for GeometryIssue {
    fn severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> &'static str {
        self.kind.as_str()
    }

    fn promoted(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }
}

pub type GeometryReport = ValidationReport<GeometryIssue>;

/// Physical consistency checks over a single geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryValidator {
    /// Slack allowed before two surfaces count as intersecting.
    pub tolerance: f64,
    /// Minimum clearance between the widest beam radius and the smallest sphere radius.
    pub thickness_margin: f64,
}

impl Default for GeometryValidator {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            thickness_margin: DEFAULT_THICKNESS_MARGIN,
        }
    }
}

impl GeometryValidator {
    pub fn new(tolerance: f64, thickness_margin: f64) -> Self {
        Self {
            tolerance,
            thickness_margin,
        }
    }

    #[instrument(skip_all, name = "geometry_validation")]
    pub fn validate(&self, geometry: &Geometry) -> GeometryReport {
        let mut report = GeometryReport::new();

        self.check_sphere_overlaps(geometry, &mut report);
        self.check_beam_connections(geometry, &mut report);
        self.check_thickness_safety(geometry, &mut report);

        debug!(
            spheres = geometry.spheres.len(),
            beams = geometry.beams.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Geometry validation finished."
        );
        report
    }

    fn check_sphere_overlaps(&self, geometry: &Geometry, report: &mut GeometryReport) {
        for (a, b) in geometry.spheres.iter().tuple_combinations() {
            let (first, second) = if a.id <= b.id { (a, b) } else { (b, a) };
            let ids = vec![first.id.0, second.id.0];

            let (Some(r1), Some(r2)) = (first.radius, second.radius) else {
                report.push(GeometryIssue::warning(
                    GeometryIssueKind::UnresolvedRadius,
                    format!(
                        "Spheres {} and {}: radius unresolved, overlap check skipped",
                        first.id, second.id
                    ),
                    ids,
                ));
                continue;
            };

            let distance = center_distance(&first.position, &second.position);
            let min_distance = r1 + r2;
            if distance < min_distance - self.tolerance {
                report.push(GeometryIssue::error(
                    GeometryIssueKind::SphereOverlap,
                    format!(
                        "Spheres {} and {} overlap: center distance {:.6} < radius sum {:.6}",
                        first.id, second.id, distance, min_distance
                    ),
                    ids,
                ));
            }
        }
    }

    fn check_beam_connections(&self, geometry: &Geometry, report: &mut GeometryReport) {
        for beam in &geometry.beams {
            let [id1, id2] = beam.endpoints;
            let (Some(s1), Some(s2)) = (geometry.sphere(id1), geometry.sphere(id2)) else {
                report.push(GeometryIssue::error(
                    GeometryIssueKind::MissingEndpoint,
                    format!(
                        "Beam {} references a sphere that does not exist ({} - {})",
                        beam.id, id1, id2
                    ),
                    vec![beam.id.0, id1.0, id2.0],
                ));
                continue;
            };

            let distance = center_distance(&s1.position, &s2.position);
            if distance < self.tolerance {
                report.push(GeometryIssue::warning(
                    GeometryIssueKind::DegenerateBeam,
                    format!(
                        "Beam {} has zero length: spheres {} and {} share a center",
                        beam.id, s1.id, s2.id
                    ),
                    vec![beam.id.0, s1.id.0, s2.id.0],
                ));
            }

            if beam.thickness.is_none() {
                report.push(GeometryIssue::warning(
                    GeometryIssueKind::UnresolvedThickness,
                    format!("Beam {}: thickness unresolved, connection check skipped", beam.id),
                    vec![beam.id.0],
                ));
                continue;
            }
            let (Some(r1), Some(r2)) = (s1.radius, s2.radius) else {
                report.push(GeometryIssue::warning(
                    GeometryIssueKind::UnresolvedRadius,
                    format!(
                        "Beam {}: endpoint radius unresolved, connection check skipped",
                        beam.id
                    ),
                    vec![beam.id.0, s1.id.0, s2.id.0],
                ));
                continue;
            };

            let gap = surface_gap(&s1.position, r1, &s2.position, r2);
            if gap < -self.tolerance {
                report.push(GeometryIssue::error(
                    GeometryIssueKind::BeamExcessivePenetration,
                    format!(
                        "Beam {} connects overlapping spheres {} and {} (surface gap {:.6})",
                        beam.id, s1.id, s2.id, gap
                    ),
                    vec![beam.id.0, s1.id.0, s2.id.0],
                ));
            }
        }
    }

    fn check_thickness_safety(&self, geometry: &Geometry, report: &mut GeometryReport) {
        let widest_beam = geometry
            .beams
            .iter()
            .filter_map(|b| b.radius().map(|r| (b, r)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let smallest_sphere = geometry
            .spheres
            .iter()
            .filter_map(|s| s.radius.map(|r| (s, r)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let (Some((beam, beam_radius)), Some((sphere, sphere_radius))) =
            (widest_beam, smallest_sphere)
        else {
            return;
        };

        let limit = sphere_radius - self.thickness_margin;
        if beam_radius > limit {
            report.push(GeometryIssue::error(
                GeometryIssueKind::ThicknessSafety,
                format!(
                    "Beam {} radius {:.6} exceeds sphere {} radius {:.6} minus margin {}",
                    beam.id, beam_radius, sphere.id, sphere_radius, self.thickness_margin
                ),
                vec![beam.id.0, sphere.id.0],
            ));
        }
    }
}
