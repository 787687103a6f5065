use super::validate::check_parameter_set;
use crate::core::models::job::CustomLatticeJob;
use crate::engine::builder::{BeamData, GeometryBuilder, GeometryData, ResolvedGeometry, SphereData};
use crate::engine::code_check::CodeValidator;
use crate::engine::config::GenerationConfig;
use crate::engine::error::EngineError;
use crate::engine::parametric::{ParameterSet, SweepInfo, generate_parameter_sets, sweep_info};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::render::{RenderContext, TemplateRenderer};
use chrono::Local;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const METADATA_FILE_NAME: &str = "metadata.toml";
pub const RESULTS_DIR_NAME: &str = "results";

const SCALE_LENGTH: f64 = 1e-3;
const SCALE_FORCE: f64 = 1e-3;
const ARRAY_ROW_SEPARATOR: &str = ",\n            ";

/// Files written for one generated job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobArtifacts {
    pub job_id: String,
    pub run_id: String,
    pub job_dir: PathBuf,
    pub source_file: PathBuf,
    pub script_file: PathBuf,
    pub metadata_file: PathBuf,
    /// Geometry and code warnings that did not block generation.
    pub warnings: Vec<String>,
}

/// A job that a batch left out, with everything needed to reproduce the failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedJob {
    pub job_id: String,
    /// `resolve`, `geometry`, or `code`.
    pub stage: String,
    pub error: String,
    pub parameters: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub metadata_file: PathBuf,
    pub total_jobs: usize,
    pub jobs: Vec<JobArtifacts>,
    pub skipped: Vec<SkippedJob>,
}

impl StudySummary {
    pub fn generated_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[derive(Debug, Serialize)]
struct Scale {
    length: f64,
    force: f64,
}

#[derive(Debug, Serialize)]
struct MeshRecord<'a> {
    size: u8,
    #[serde(rename = "type")]
    mesh_type: &'a str,
}

#[derive(Debug, Serialize)]
struct StudyRecord<'a> {
    strain_delta: f64,
    strain_steps: &'a str,
    fixed: bool,
    copyface: bool,
}

#[derive(Debug, Serialize)]
struct GeometryRecord<'a> {
    lattice_constant: f64,
    unit_cell_size: [f64; 3],
    num_spheres: usize,
    num_beams: usize,
    beams: &'a [BeamData],
    spheres: &'a [SphereData],
}

#[derive(Debug, Serialize)]
struct JobMetadata<'a> {
    job_id: &'a str,
    run_id: &'a str,
    job_name: &'a str,
    description: &'a str,
    generated_at: &'a str,
    class_name: &'a str,
    source_file: &'a str,
    script_file: &'a str,
    sweep_indices: &'a [usize],
    materials: Vec<&'a str>,
    warnings: &'a [String],
    parameters: BTreeMap<String, f64>,
    scale: Scale,
    mesh: MeshRecord<'a>,
    study: StudyRecord<'a>,
    geometry: GeometryRecord<'a>,
}

#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    run_id: &'a str,
    job_name: &'a str,
    description: &'a str,
    generated_at: &'a str,
    status: &'static str,
    total_jobs: usize,
    generated_jobs: usize,
    skipped_jobs: usize,
    skipped: &'a [SkippedJob],
    parametric_study: &'a SweepInfo,
}

impl<'a> RunMetadata<'a> {
    fn generating(
        job: &'a CustomLatticeJob,
        run_id: &'a str,
        generated_at: &'a str,
        info: &'a SweepInfo,
    ) -> Self {
        Self {
            run_id,
            job_name: &job.job.name,
            description: &job.job.description,
            generated_at,
            status: "generating",
            total_jobs: info.total_jobs,
            generated_jobs: 0,
            skipped_jobs: 0,
            skipped: &[],
            parametric_study: info,
        }
    }

    fn completed(self, generated_jobs: usize, skipped: &'a [SkippedJob]) -> Self {
        Self {
            status: "completed",
            generated_jobs,
            skipped_jobs: skipped.len(),
            skipped,
            ..self
        }
    }
}

pub fn default_run_id() -> String {
    format!("run_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Java class name for a job id; also the stem of the source file.
pub fn class_name_for(job_id: &str) -> String {
    let name: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("job_{}", name)
    } else {
        name
    }
}

fn java_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn create_dir(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), EngineError> {
    fs::write(path, contents).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_toml(path: &Path, record: &impl Serialize) -> Result<(), EngineError> {
    let contents = toml::to_string_pretty(record).map_err(|source| EngineError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    write_file(path, &contents)
}

/// Builds the render context of one job from its resolved geometry.
pub fn build_render_context(
    job: &CustomLatticeJob,
    params: &ParameterSet,
    data: &GeometryData,
    config: &GenerationConfig,
    run_id: &str,
    generated_at: &str,
) -> RenderContext {
    let class_name = class_name_for(&params.job_id);
    let mut ctx = RenderContext::new();

    ctx.insert("source_file", format!("{}.{}", class_name, config.output.source_extension));
    ctx.insert("output_file", format!("{}_results.txt", class_name));
    ctx.insert("class_name", &class_name);
    ctx.insert("job_id", &params.job_id);
    ctx.insert("run_id", run_id);
    ctx.insert("job_name", java_string(&job.job.name));
    ctx.insert("generated_at", generated_at);

    ctx.insert("lattice_constant", data.lattice_constant);
    ctx.insert("unit_cell_size", data.unit_cell_size.iter().join(", "));
    ctx.insert("num_spheres", data.spheres.len());
    ctx.insert("num_beams", data.beams.len());

    let point = |p: &[f64; 3]| format!("{{{}, {}, {}}}", p[0], p[1], p[2]);
    ctx.insert(
        "points",
        data.spheres.iter().map(|s| point(&s.position)).join(ARRAY_ROW_SEPARATOR),
    );
    ctx.insert("sphere_radii", data.spheres.iter().map(|s| s.radius).join(", "));
    ctx.insert("sphere_ratios", data.spheres.iter().map(|s| s.ratio).join(", "));
    ctx.insert(
        "beam_endpoints",
        data.beams
            .iter()
            .map(|b| format!("{{{}, {}}}", b.endpoint1_index, b.endpoint2_index))
            .join(ARRAY_ROW_SEPARATOR),
    );
    ctx.insert(
        "lines",
        data.beams
            .iter()
            .map(|b| {
                format!(
                    "{{{}, {}}}",
                    point(&data.spheres[b.endpoint1_index].position),
                    point(&data.spheres[b.endpoint2_index].position)
                )
            })
            .join(ARRAY_ROW_SEPARATOR),
    );
    ctx.insert("beam_thicknesses", data.beams.iter().map(|b| b.thickness).join(", "));
    ctx.insert("beam_ratios", data.beams.iter().map(|b| b.ratio).join(", "));

    if let Some((_, material)) = job.primary_material() {
        ctx.insert("material_name", java_string(&material.name));
        ctx.insert("youngs_modulus", material.youngs_modulus);
        ctx.insert("poissons_ratio", material.poissons_ratio);
        ctx.insert("density", material.density);
    }
    ctx.insert("mesh_size", job.mesh.size);
    ctx.insert("mesh_type", java_string(&job.mesh.mesh_type));
    ctx.insert("strain_delta", job.study.strain.delta);
    ctx.insert("strain_steps", java_string(&job.study.strain.steps));
    ctx.insert("bc_fixed", job.study.boundary_conditions.fixed);
    ctx.insert("bc_copyface", job.study.boundary_conditions.copyface);

    ctx.insert("solver_command", &config.solver.command);
    ctx.insert("num_cores", config.solver.num_cores);
    ctx
}

/// The per-job state machine, shared by single-job and batch generation.
struct JobPipeline<'a, R: TemplateRenderer + ?Sized> {
    job: &'a CustomLatticeJob,
    config: &'a GenerationConfig,
    renderer: &'a R,
    code_validator: CodeValidator,
    run_id: &'a str,
    run_dir: &'a Path,
}

impl<'a, R: TemplateRenderer + ?Sized> JobPipeline<'a, R> {
    fn new(
        job: &'a CustomLatticeJob,
        config: &'a GenerationConfig,
        renderer: &'a R,
        run_id: &'a str,
        run_dir: &'a Path,
    ) -> Self {
        Self {
            job,
            config,
            renderer,
            code_validator: CodeValidator::new(
                config.code_check.max_line_length,
                config.code_check.max_whitespace_run,
            ),
            run_id,
            run_dir,
        }
    }

    fn resolve(&self, params: &ParameterSet) -> Result<(ResolvedGeometry, Vec<String>), EngineError> {
        if !self.config.validation.enabled {
            let resolved =
                GeometryBuilder::new(self.config.safety_factor).build_geometry_data(self.job, params)?;
            for fallback in &resolved.fallbacks {
                warn!(
                    job_id = %params.job_id,
                    element = ?fallback.element,
                    value = fallback.value,
                    "Unresolved value replaced by fallback; validation is disabled."
                );
            }
            return Ok((resolved, Vec::new()));
        }

        let (resolved, report) = check_parameter_set(self.job, params, self.config)?;
        if !report.is_valid() {
            return Err(EngineError::GeometryInvalid {
                job_id: params.job_id.clone(),
                report,
            });
        }
        let warnings = report.warnings.iter().map(ToString::to_string).collect();
        Ok((resolved, warnings))
    }

    fn run(&self, params: &ParameterSet) -> Result<JobArtifacts, EngineError> {
        let job_dir = self.run_dir.join(&params.job_id);

        let (resolved, mut warnings) = self.resolve(params)?;

        let generated_at = timestamp();
        let context = build_render_context(
            self.job,
            params,
            &resolved.data,
            self.config,
            self.run_id,
            &generated_at,
        );
        let rendered = self.renderer.render(&context)?;

        let code_report = self.code_validator.validate(&rendered.source);
        if !code_report.is_valid() {
            return Err(EngineError::CodeInvalid {
                job_id: params.job_id.clone(),
                report: code_report,
            });
        }
        warnings.extend(code_report.warnings.iter().map(ToString::to_string));

        let class_name = class_name_for(&params.job_id);
        let source_name = format!("{}.{}", class_name, self.config.output.source_extension);
        let script_name = self.config.output.script_name.as_str();

        create_dir(&job_dir)?;
        create_dir(&job_dir.join(RESULTS_DIR_NAME))?;
        let source_file = job_dir.join(&source_name);
        let script_file = job_dir.join(script_name);
        write_file(&source_file, &rendered.source)?;
        write_file(&script_file, &rendered.script)?;

        let metadata_file = job_dir.join(METADATA_FILE_NAME);
        let data = &resolved.data;
        let metadata = JobMetadata {
            job_id: &params.job_id,
            run_id: self.run_id,
            job_name: &self.job.job.name,
            description: &self.job.job.description,
            generated_at: &generated_at,
            class_name: &class_name,
            source_file: &source_name,
            script_file: script_name,
            sweep_indices: &params.sweep_indices,
            materials: self.job.materials.keys().map(String::as_str).collect(),
            warnings: &warnings,
            parameters: params.named_parameters(),
            scale: Scale {
                length: SCALE_LENGTH,
                force: SCALE_FORCE,
            },
            mesh: MeshRecord {
                size: self.job.mesh.size,
                mesh_type: &self.job.mesh.mesh_type,
            },
            study: StudyRecord {
                strain_delta: self.job.study.strain.delta,
                strain_steps: &self.job.study.strain.steps,
                fixed: self.job.study.boundary_conditions.fixed,
                copyface: self.job.study.boundary_conditions.copyface,
            },
            geometry: GeometryRecord {
                lattice_constant: data.lattice_constant,
                unit_cell_size: data.unit_cell_size,
                num_spheres: data.spheres.len(),
                num_beams: data.beams.len(),
                beams: &data.beams,
                spheres: &data.spheres,
            },
        };
        write_toml(&metadata_file, &metadata)?;

        info!(
            job_id = %params.job_id,
            warnings = warnings.len(),
            "Generated job."
        );
        Ok(JobArtifacts {
            job_id: params.job_id.clone(),
            run_id: self.run_id.to_string(),
            job_dir,
            source_file,
            script_file,
            metadata_file,
            warnings,
        })
    }
}

/// Generates a single job; the first error of any stage is returned as is.
#[instrument(skip_all, name = "job_generation", fields(job_id = %params.job_id))]
pub fn generate_job<R: TemplateRenderer + ?Sized>(
    job: &CustomLatticeJob,
    params: &ParameterSet,
    config: &GenerationConfig,
    renderer: &R,
    reporter: &ProgressReporter,
) -> Result<JobArtifacts, EngineError> {
    let run_id = config.output.run_id.clone().unwrap_or_else(default_run_id);
    let run_dir = config.output.base_dir.join(&run_id);

    reporter.report(Progress::StudyStart {
        run_id: run_id.clone(),
        total_jobs: 1,
    });
    let result = create_dir(&run_dir)
        .and_then(|()| JobPipeline::new(job, config, renderer, &run_id, &run_dir).run(params));
    if let Ok(artifacts) = &result {
        reporter.report(Progress::JobGenerated {
            job_id: artifacts.job_id.clone(),
        });
    }
    reporter.report(Progress::StudyFinish {
        generated: usize::from(result.is_ok()),
        skipped: 0,
    });

    result
}

/// Generates every job of the parametric expansion into one run directory.
///
/// Jobs failing geometry or code validation are skipped and recorded; any other error
/// aborts the run. The run metadata is written before the first job and rewritten with
/// the final counts at the end.
#[instrument(skip_all, name = "study_generation")]
pub fn generate_study<R: TemplateRenderer + ?Sized>(
    job: &CustomLatticeJob,
    config: &GenerationConfig,
    renderer: &R,
    reporter: &ProgressReporter,
) -> Result<StudySummary, EngineError> {
    let parameter_sets = generate_parameter_sets(job);
    let info = sweep_info(job);
    let run_id = config.output.run_id.clone().unwrap_or_else(default_run_id);
    let run_dir = config.output.base_dir.join(&run_id);
    let metadata_file = run_dir.join(METADATA_FILE_NAME);
    let started_at = timestamp();

    info!(
        run_id = %run_id,
        total_jobs = parameter_sets.len(),
        sweeps = info.num_sweeps,
        "Starting study generation."
    );
    create_dir(&run_dir)?;
    let run_metadata = RunMetadata::generating(job, &run_id, &started_at, &info);
    write_toml(&metadata_file, &run_metadata)?;

    reporter.report(Progress::StudyStart {
        run_id: run_id.clone(),
        total_jobs: parameter_sets.len() as u64,
    });

    let pipeline = JobPipeline::new(job, config, renderer, &run_id, &run_dir);
    let mut jobs = Vec::new();
    let mut skipped = Vec::new();

    for params in &parameter_sets {
        match pipeline.run(params) {
            Ok(artifacts) => {
                reporter.report(Progress::JobGenerated {
                    job_id: artifacts.job_id.clone(),
                });
                jobs.push(artifacts);
            }
            Err(e) if e.is_job_local() => {
                let parameters = params.named_parameters();
                warn!(
                    job_id = %params.job_id,
                    parameters = ?parameters,
                    error = %e,
                    "Skipping job."
                );
                let stage = e.stage().unwrap_or("unknown");
                reporter.report(Progress::JobSkipped {
                    job_id: params.job_id.clone(),
                    stage,
                    reason: e.to_string(),
                });
                skipped.push(SkippedJob {
                    job_id: params.job_id.clone(),
                    stage: stage.to_string(),
                    error: e.to_string(),
                    parameters,
                });
            }
            Err(e) => {
                reporter.report(Progress::StudyFinish {
                    generated: jobs.len(),
                    skipped: skipped.len(),
                });
                return Err(e);
            }
        }
    }

    reporter.report(Progress::StudyFinish {
        generated: jobs.len(),
        skipped: skipped.len(),
    });

    write_toml(&metadata_file, &run_metadata.completed(jobs.len(), &skipped))?;
    info!(
        run_id = %run_id,
        generated = jobs.len(),
        skipped = skipped.len(),
        "Study generation finished."
    );

    Ok(StudySummary {
        run_id,
        run_dir,
        metadata_file,
        total_jobs: parameter_sets.len(),
        jobs,
        skipped,
    })
}
