use super::traits::JobDefinitionFile;
use crate::core::models::beam::Beam;
use crate::core::models::geometry::Geometry;
use crate::core::models::ids::{BeamId, SphereId};
use crate::core::models::job::{CustomLatticeJob, JobInfo};
use crate::core::models::material::{Material, Mesh};
use crate::core::models::parametric::{ElementField, ParameterPath, Parametric, ParametricSweep};
use crate::core::models::sphere::Sphere;
use crate::core::models::study::{BoundaryConditions, StrainConfig, Study};
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

const DEFAULT_MESH_TYPE: &str = "FreeTri";
const MESH_SIZE_RANGE: std::ops::RangeInclusive<i64> = 1..=9;
const POISSON_RANGE: std::ops::RangeInclusive<f64> = -1.0..=0.5;
const LEGACY_SWEEP_PREFIX: &str = "sweep";

/// A single schema violation, located by its dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every schema violation found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaErrors(pub Vec<SchemaError>);

impl SchemaErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema validation failed with {} error(s):", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Schema(SchemaErrors),
}

/// Loader for job definitions written in TOML.
pub struct TomlJobFile;

impl JobDefinitionFile for TomlJobFile {
    type Error = LoadError;

    fn parse_str(content: &str) -> Result<CustomLatticeJob, Self::Error> {
        let document: FileDocument = toml::from_str(content)?;
        convert_document(document).map_err(LoadError::Schema)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileDocument {
    job: FileJob,
    geometry: FileGeometry,
    #[serde(default)]
    materials: BTreeMap<String, FileMaterial>,
    mesh: FileMesh,
    study: FileStudy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileJob {
    name: String,
    #[serde(default)]
    description: String,
    unit_cell_size: Vec<f64>,
    #[serde(default)]
    parametric: FileParametric,
}

#[derive(Debug, Deserialize, Default)]
struct FileParametric {
    #[serde(default)]
    default: BTreeMap<String, f64>,
    #[serde(default)]
    sweeps: Vec<FileSweep>,
    #[serde(flatten)]
    extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSweep {
    parameter: String,
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileGeometry {
    lattice_constant: f64,
    #[serde(default)]
    spheres: Vec<FileSphere>,
    #[serde(default)]
    beams: Vec<FileBeam>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSphere {
    id: i64,
    position: Vec<f64>,
    radius: Option<f64>,
    ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileBeam {
    id: i64,
    endpoints: Vec<i64>,
    thickness: Option<f64>,
    ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileMaterial {
    name: Option<String>,
    youngs_modulus: f64,
    poissons_ratio: f64,
    density: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileMesh {
    size: i64,
    #[serde(rename = "type")]
    mesh_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileStudy {
    strain: FileStrain,
    #[serde(default)]
    boundary_conditions: FileBoundaryConditions,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileStrain {
    delta: f64,
    steps: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileBoundaryConditions {
    #[serde(default = "default_true")]
    fixed: bool,
    #[serde(default = "default_true")]
    copyface: bool,
}

impl Default for FileBoundaryConditions {
    fn default() -> Self {
        Self {
            fixed: true,
            copyface: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Default)]
struct Collector {
    errors: Vec<SchemaError>,
}

impl Collector {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(SchemaError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn positive(&mut self, field: &str, value: f64) -> f64 {
        if !(value.is_finite() && value > 0.0) {
            self.push(field, format!("must be a positive number, got {}", value));
        }
        value
    }

    fn point(&mut self, field: &str, values: &[f64]) -> [f64; 3] {
        match values {
            [x, y, z] if values.iter().all(|v| v.is_finite()) => [*x, *y, *z],
            [_, _, _] => {
                self.push(field, "components must be finite numbers");
                [0.0; 3]
            }
            _ => {
                self.push(
                    field,
                    format!("expected exactly 3 components, got {}", values.len()),
                );
                [0.0; 3]
            }
        }
    }

    fn id(&mut self, field: &str, raw: i64) -> u32 {
        match u32::try_from(raw) {
            Ok(id) if id > 0 => id,
            _ => {
                self.push(field, format!("must be a positive integer, got {}", raw));
                0
            }
        }
    }

    fn non_empty(&mut self, field: &str, value: String) -> String {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
        value
    }

    fn finish<T>(self, value: T) -> Result<T, SchemaErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(SchemaErrors(self.errors))
        }
    }
}

fn convert_document(document: FileDocument) -> Result<CustomLatticeJob, SchemaErrors> {
    let mut collector = Collector::default();

    let geometry = convert_geometry(document.geometry, &mut collector);
    let job = convert_job(document.job, &geometry, &mut collector);
    let materials = convert_materials(document.materials, &mut collector);
    let mesh = convert_mesh(document.mesh, &mut collector);
    let study = convert_study(document.study, &mut collector);

    collector.finish(CustomLatticeJob {
        job,
        geometry,
        materials,
        mesh,
        study,
    })
}

fn convert_geometry(file: FileGeometry, c: &mut Collector) -> Geometry {
    let lattice_constant = c.positive("geometry.lattice-constant", file.lattice_constant);

    if file.spheres.is_empty() {
        c.push("geometry.spheres", "at least one sphere is required");
    }

    let mut sphere_ids = HashSet::new();
    let spheres: Vec<Sphere> = file
        .spheres
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let prefix = format!("geometry.spheres[{}]", i);
            let id = c.id(&format!("{}.id", prefix), s.id);
            if id > 0 && !sphere_ids.insert(id) {
                c.push(format!("{}.id", prefix), format!("duplicate sphere id {}", id));
            }
            let [x, y, z] = c.point(&format!("{}.position", prefix), &s.position);
            let radius = s.radius.map(|r| c.positive(&format!("{}.radius", prefix), r));
            let ratio = c.positive(&format!("{}.ratio", prefix), s.ratio.unwrap_or(1.0));
            Sphere {
                id: SphereId(id),
                position: Point3::new(x, y, z),
                radius,
                ratio,
            }
        })
        .collect();

    let mut beam_ids = HashSet::new();
    let beams: Vec<Beam> = file
        .beams
        .into_iter()
        .enumerate()
        .map(|(i, b)| {
            let prefix = format!("geometry.beams[{}]", i);
            let id = c.id(&format!("{}.id", prefix), b.id);
            if id > 0 && !beam_ids.insert(id) {
                c.push(format!("{}.id", prefix), format!("duplicate beam id {}", id));
            }
            let endpoints = convert_endpoints(&prefix, &b.endpoints, &sphere_ids, c);
            let thickness = b
                .thickness
                .map(|t| c.positive(&format!("{}.thickness", prefix), t));
            let ratio = c.positive(&format!("{}.ratio", prefix), b.ratio.unwrap_or(1.0));
            Beam {
                id: BeamId(id),
                endpoints,
                thickness,
                ratio,
            }
        })
        .collect();

    Geometry::new(lattice_constant, spheres, beams)
}

fn convert_endpoints(
    prefix: &str,
    raw: &[i64],
    sphere_ids: &HashSet<u32>,
    c: &mut Collector,
) -> [SphereId; 2] {
    let field = format!("{}.endpoints", prefix);
    let [a, b] = raw else {
        c.push(
            &field,
            format!("expected exactly 2 sphere ids, got {}", raw.len()),
        );
        return [SphereId(0), SphereId(0)];
    };
    let a = c.id(&field, *a);
    let b = c.id(&field, *b);
    if a > 0 && a == b {
        c.push(&field, format!("endpoints must be distinct, got {} twice", a));
    }
    for id in [a, b] {
        if id > 0 && !sphere_ids.contains(&id) {
            c.push(&field, format!("sphere {} does not exist", id));
        }
    }
    [SphereId(a), SphereId(b)]
}

fn convert_job(file: FileJob, geometry: &Geometry, c: &mut Collector) -> JobInfo {
    let name = c.non_empty("job.name", file.name);
    let unit_cell_size = c.point("job.unit-cell-size", &file.unit_cell_size);
    if unit_cell_size.iter().any(|v| *v <= 0.0) {
        c.push("job.unit-cell-size", "components must be positive");
    }
    let parametric = convert_parametric(file.parametric, geometry, c);
    JobInfo {
        name,
        description: file.description,
        unit_cell_size,
        parametric,
    }
}

fn convert_parametric(file: FileParametric, geometry: &Geometry, c: &mut Collector) -> Parametric {
    let mut defaults = BTreeMap::new();
    for (raw, value) in file.default {
        let field = format!("job.parametric.default.\"{}\"", raw);
        if let Some(path) = parse_path(&field, &raw, geometry, c) {
            defaults.insert(path, c.positive(&field, value));
        }
    }

    let mut sweeps = Vec::new();
    for (i, sweep) in file.sweeps.into_iter().enumerate() {
        let prefix = format!("job.parametric.sweeps[{}]", i);
        if let Some(sweep) = convert_sweep(&prefix, sweep, geometry, c) {
            sweeps.push(sweep);
        }
    }

    let mut legacy = Vec::new();
    for (key, value) in file.extra {
        let field = format!("job.parametric.{}", key);
        let number = key
            .strip_prefix(LEGACY_SWEEP_PREFIX)
            .and_then(|n| n.parse::<u32>().ok());
        let Some(number) = number else {
            c.push(field, "unknown field");
            continue;
        };
        match value.try_into::<FileSweep>() {
            Ok(sweep) => legacy.push((number, field, sweep)),
            Err(e) => c.push(field, format!("invalid sweep table: {}", e.message())),
        }
    }
    legacy.sort_by_key(|(number, _, _)| *number);
    for (_, prefix, sweep) in legacy {
        if let Some(sweep) = convert_sweep(&prefix, sweep, geometry, c) {
            sweeps.push(sweep);
        }
    }

    Parametric { defaults, sweeps }
}

fn convert_sweep(
    prefix: &str,
    file: FileSweep,
    geometry: &Geometry,
    c: &mut Collector,
) -> Option<ParametricSweep> {
    let parameter_field = format!("{}.parameter", prefix);
    let values_field = format!("{}.values", prefix);
    let parameter = parse_path(&parameter_field, &file.parameter, geometry, c);
    if file.values.is_empty() {
        c.push(&values_field, "a sweep needs at least one value");
    }
    let values = file
        .values
        .into_iter()
        .map(|v| c.positive(&values_field, v))
        .collect();
    parameter.map(|parameter| ParametricSweep { parameter, values })
}

fn parse_path(
    field: &str,
    raw: &str,
    geometry: &Geometry,
    c: &mut Collector,
) -> Option<ParameterPath> {
    let path = match raw.parse::<ParameterPath>() {
        Ok(path) => path,
        Err(e) => {
            c.push(field, e.to_string());
            return None;
        }
    };
    if let ParameterPath::Indexed(index, element_field) = path {
        let count = match element_field {
            ElementField::SphereRadius | ElementField::SphereRatio => geometry.spheres.len(),
            ElementField::BeamThickness | ElementField::BeamRatio => geometry.beams.len(),
        };
        if index >= count {
            c.push(
                field,
                format!(
                    "index {} out of bounds for {} {}(s)",
                    index,
                    count,
                    element_field.element()
                ),
            );
            return None;
        }
    }
    Some(path)
}

fn convert_materials(
    file: BTreeMap<String, FileMaterial>,
    c: &mut Collector,
) -> BTreeMap<String, Material> {
    if file.is_empty() {
        c.push("materials", "at least one material is required");
    }
    file.into_iter()
        .map(|(key, m)| {
            let prefix = format!("materials.{}", key);
            let youngs_modulus = c.positive(&format!("{}.youngs-modulus", prefix), m.youngs_modulus);
            if !POISSON_RANGE.contains(&m.poissons_ratio) {
                c.push(
                    format!("{}.poissons-ratio", prefix),
                    format!("must be within [-1, 0.5], got {}", m.poissons_ratio),
                );
            }
            let density = c.positive(&format!("{}.density", prefix), m.density);
            let material = Material {
                name: m.name.unwrap_or_else(|| key.clone()),
                youngs_modulus,
                poissons_ratio: m.poissons_ratio,
                density,
            };
            (key, material)
        })
        .collect()
}

fn convert_mesh(file: FileMesh, c: &mut Collector) -> Mesh {
    if !MESH_SIZE_RANGE.contains(&file.size) {
        c.push(
            "mesh.size",
            format!("must be within [1, 9], got {}", file.size),
        );
    }
    let mesh_type = c.non_empty(
        "mesh.type",
        file.mesh_type.unwrap_or_else(|| DEFAULT_MESH_TYPE.to_string()),
    );
    Mesh {
        size: u8::try_from(file.size).unwrap_or(0),
        mesh_type,
    }
}

fn convert_study(file: FileStudy, c: &mut Collector) -> Study {
    let delta = c.positive("study.strain.delta", file.strain.delta);
    let steps = c.non_empty("study.strain.steps", file.strain.steps);
    Study {
        strain: StrainConfig { delta, steps },
        boundary_conditions: BoundaryConditions {
            fixed: file.boundary_conditions.fixed,
            copyface: file.boundary_conditions.copyface,
        },
    }
}

/// Renders a short human-readable overview of a loaded job.
pub fn job_summary(job: &CustomLatticeJob) -> String {
    let geometry = &job.geometry;
    let unresolved_spheres = geometry.spheres.iter().filter(|s| s.radius.is_none()).count();
    let unresolved_beams = geometry.beams.iter().filter(|b| b.thickness.is_none()).count();
    let [ux, uy, uz] = job.job.unit_cell_size;
    let sweeps = &job.job.parametric.sweeps;
    let total_jobs: usize = sweeps.iter().map(|s| s.values.len()).product();
    let materials: Vec<&str> = job.materials.keys().map(String::as_str).collect();

    let mut lines = vec![format!("Job: {}", job.job.name)];
    if !job.job.description.is_empty() {
        lines.push(format!("Description: {}", job.job.description));
    }
    lines.push(format!("Unit cell: {} x {} x {}", ux, uy, uz));
    lines.push(format!("Lattice constant: {}", geometry.lattice_constant));
    lines.push(format!(
        "Spheres: {} ({} unresolved)",
        geometry.spheres.len(),
        unresolved_spheres
    ));
    lines.push(format!(
        "Beams: {} ({} unresolved)",
        geometry.beams.len(),
        unresolved_beams
    ));
    lines.push(format!("Materials: {}", materials.join(", ")));
    lines.push(format!(
        "Mesh: size {} ({})",
        job.mesh.size, job.mesh.mesh_type
    ));
    lines.push(format!(
        "Strain: delta {}, steps {}",
        job.study.strain.delta, job.study.strain.steps
    ));
    lines.push(format!(
        "Parametric: {} sweep(s), {} job(s)",
        sweeps.len(),
        total_jobs
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_JOB: &str = r#"
[job]
name = "Simple cubic"
description = "Two nodes and one strut"
unit-cell-size = [15.0, 15.0, 15.0]

[job.parametric.default]
"beam.thickness" = 0.2

[[job.parametric.sweeps]]
parameter = "sphere.radius"
values = [0.3, 0.4]

[geometry]
lattice-constant = 15.0

[[geometry.spheres]]
id = 1
position = [0.0, 0.0, 0.0]

[[geometry.spheres]]
id = 2
position = [1.0, 0.0, 0.0]
ratio = 0.8

[[geometry.beams]]
id = 10
endpoints = [1, 2]

[materials.steel]
youngs-modulus = 200e9
poissons-ratio = 0.3
density = 7850

[mesh]
size = 5

[study.strain]
delta = 0.01
steps = "0, 0.5, 1"
"#;

    fn schema_errors(content: &str) -> SchemaErrors {
        match TomlJobFile::parse_str(content) {
            Err(LoadError::Schema(errors)) => errors,
            other => panic!("expected schema errors, got {:?}", other),
        }
    }

    #[test]
    fn parses_valid_job() {
        let job = TomlJobFile::parse_str(VALID_JOB).unwrap();

        assert_eq!(job.job.name, "Simple cubic");
        assert_eq!(job.job.unit_cell_size, [15.0, 15.0, 15.0]);
        assert_eq!(job.geometry.spheres.len(), 2);
        assert_eq!(job.geometry.spheres[0].radius, None);
        assert_eq!(job.geometry.spheres[1].ratio, 0.8);
        assert_eq!(job.geometry.beams[0].endpoints, [SphereId(1), SphereId(2)]);
        assert_eq!(job.materials["steel"].name, "steel");
        assert_eq!(job.mesh.size, 5);
        assert_eq!(job.mesh.mesh_type, "FreeTri");
        assert!(job.study.boundary_conditions.fixed);
        assert!(job.study.boundary_conditions.copyface);
        assert_eq!(
            job.job.parametric.defaults[&ParameterPath::Global(ElementField::BeamThickness)],
            0.2
        );
        assert_eq!(
            job.job.parametric.sweeps[0].parameter,
            ParameterPath::Global(ElementField::SphereRadius)
        );
    }

    #[test]
    fn reads_job_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID_JOB.as_bytes()).unwrap();

        let job = TomlJobFile::read_from_path(file.path()).unwrap();
        assert_eq!(job.geometry.beams.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = TomlJobFile::read_from_path("/nonexistent/job.toml");
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn legacy_sweep_keys_are_appended_in_numeric_order() {
        let content = VALID_JOB.replace(
            "[geometry]\n",
            "[job.parametric.sweep2]\nparameter = \"beam.0.thickness\"\nvalues = [0.1]\n\n\
             [job.parametric.sweep1]\nparameter = \"sphere.1.ratio\"\nvalues = [0.5, 0.9]\n\n[geometry]\n",
        );
        let job = TomlJobFile::parse_str(&content).unwrap();
        let parameters: Vec<String> = job
            .job
            .parametric
            .sweeps
            .iter()
            .map(|s| s.parameter.to_string())
            .collect();
        assert_eq!(
            parameters,
            vec!["sphere.radius", "sphere.1.ratio", "beam.0.thickness"]
        );
    }

    #[test]
    fn unknown_parametric_key_is_rejected() {
        let content = VALID_JOB.replace("[geometry]\n", "[job.parametric.extra]\nx = 1\n\n[geometry]\n");
        let errors = schema_errors(&content);
        assert!(errors.contains_field("job.parametric.extra"));
    }

    #[test]
    fn unknown_top_level_field_is_a_parse_error() {
        let content = format!("{}\n[solver]\ncores = 4\n", VALID_JOB);
        assert!(matches!(
            TomlJobFile::parse_str(&content),
            Err(LoadError::Toml(_))
        ));
    }

    #[test]
    fn collects_every_schema_error() {
        let content = VALID_JOB
            .replace("poissons-ratio = 0.3", "poissons-ratio = 0.7")
            .replace("size = 5", "size = 12")
            .replace("endpoints = [1, 2]", "endpoints = [1, 1]");
        let errors = schema_errors(&content);

        assert_eq!(errors.len(), 3);
        assert!(errors.contains_field("materials.steel.poissons-ratio"));
        assert!(errors.contains_field("mesh.size"));
        assert!(errors.contains_field("geometry.beams[0].endpoints"));
    }

    #[test]
    fn rejects_duplicate_ids_and_missing_endpoints() {
        let content = VALID_JOB
            .replace("id = 2\n", "id = 1\n")
            .replace("endpoints = [1, 2]", "endpoints = [1, 3]");
        let errors = schema_errors(&content);

        assert!(errors.contains_field("geometry.spheres[1].id"));
        assert!(
            errors
                .iter()
                .any(|e| e.field == "geometry.beams[0].endpoints"
                    && e.message.contains("sphere 3 does not exist"))
        );
    }

    #[test]
    fn rejects_invalid_and_out_of_bounds_parameter_paths() {
        let content = VALID_JOB
            .replace("parameter = \"sphere.radius\"", "parameter = \"sphere.5.radius\"")
            .replace("\"beam.thickness\" = 0.2", "\"beam.width\" = 0.2");
        let errors = schema_errors(&content);

        assert!(errors.contains_field("job.parametric.sweeps[0].parameter"));
        assert!(errors.contains_field("job.parametric.default.\"beam.width\""));
    }

    #[test]
    fn rejects_empty_sweep_and_missing_materials() {
        let content = VALID_JOB
            .replace("values = [0.3, 0.4]", "values = []")
            .replace(
                "[materials.steel]\nyoungs-modulus = 200e9\npoissons-ratio = 0.3\ndensity = 7850\n",
                "",
            );
        let errors = schema_errors(&content);

        assert!(errors.contains_field("job.parametric.sweeps[0].values"));
        assert!(errors.contains_field("materials"));
    }

    #[test]
    fn summary_reports_counts() {
        let job = TomlJobFile::parse_str(VALID_JOB).unwrap();
        let summary = job_summary(&job);

        assert!(summary.contains("Job: Simple cubic"));
        assert!(summary.contains("Spheres: 2 (2 unresolved)"));
        assert!(summary.contains("Beams: 1 (1 unresolved)"));
        assert!(summary.contains("Parametric: 1 sweep(s), 2 job(s)"));
    }
}
