use crate::core::models::job::CustomLatticeJob;
use crate::engine::builder::{ElementRef, Fallback, GeometryBuilder, ResolvedGeometry};
use crate::engine::config::GenerationConfig;
use crate::engine::error::EngineError;
use crate::engine::parametric::{ParameterSet, generate_parameter_sets};
use crate::engine::validation::{GeometryIssue, GeometryIssueKind, GeometryReport, GeometryValidator};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Validation outcome of one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCheck {
    pub job_id: String,
    pub parameters: BTreeMap<String, f64>,
    pub report: GeometryReport,
}

fn fallback_issue(fallback: &Fallback) -> GeometryIssue {
    match fallback.element {
        ElementRef::Sphere(id) => GeometryIssue::error(
            GeometryIssueKind::UnresolvedValue,
            format!(
                "Sphere {}: radius not set by the job or any parameter (fallback {} used)",
                id, fallback.value
            ),
            vec![id.0],
        ),
        ElementRef::Beam(id) => GeometryIssue::error(
            GeometryIssueKind::UnresolvedValue,
            format!(
                "Beam {}: thickness not set by the job or any parameter (fallback {} used)",
                id, fallback.value
            ),
            vec![id.0],
        ),
    }
}

/// Resolves `params` and validates the resulting geometry.
///
/// Fallback substitutions are added as errors; strict mode promotes every warning.
pub fn check_parameter_set(
    job: &CustomLatticeJob,
    params: &ParameterSet,
    config: &GenerationConfig,
) -> Result<(ResolvedGeometry, GeometryReport), EngineError> {
    let builder = GeometryBuilder::new(config.safety_factor);
    let validator = GeometryValidator::new(
        config.validation.tolerance,
        config.validation.thickness_margin,
    );

    let resolved = builder.build_geometry_data(job, params)?;
    let mut report = validator.validate(&resolved.geometry);
    for fallback in &resolved.fallbacks {
        report.push(fallback_issue(fallback));
    }
    if config.validation.strict {
        report = report.into_strict();
    }

    debug!(
        job_id = %params.job_id,
        valid = report.is_valid(),
        "Checked parameter set."
    );
    Ok((resolved, report))
}

/// Checks every parameter set of the job's expansion.
#[instrument(skip_all, name = "study_validation")]
pub fn validate_study(
    job: &CustomLatticeJob,
    config: &GenerationConfig,
) -> Result<Vec<JobCheck>, EngineError> {
    generate_parameter_sets(job)
        .into_iter()
        .map(|params| {
            let (_, report) = check_parameter_set(job, &params, config)?;
            Ok(JobCheck {
                parameters: params.named_parameters(),
                job_id: params.job_id,
                report,
            })
        })
        .collect()
}
