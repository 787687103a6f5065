use super::{format_parameters, indent, load_job};
use crate::cli::ValidateArgs;
use crate::config::{self, FlagOverrides};
use crate::error::{CliError, Result};
use latticegen::engine::validation::GeometryValidator;
use latticegen::workflows::validate::{JobCheck, validate_study};
use tracing::info;

pub fn run(args: ValidateArgs) -> Result<()> {
    let flags = FlagOverrides {
        strict: args.strict,
        ..Default::default()
    };
    let app = config::build_config(&args.config, &flags)?;
    let settings = &app.core_config.validation;

    let job = load_job(&args.input)?;
    println!("✓ Schema valid: {}", args.input.display());

    let base_report =
        GeometryValidator::new(settings.tolerance, settings.thickness_margin).validate(&job.geometry);
    println!(
        "Base geometry ({} spheres, {} beams):",
        job.geometry.spheres.len(),
        job.geometry.beams.len()
    );
    println!("{}", indent(&base_report.summary(), "  "));

    info!("Validating every parameter set of the expansion...");
    let checks = validate_study(&job, &app.core_config)?;
    let invalid: Vec<&JobCheck> = checks.iter().filter(|c| !c.report.is_valid()).collect();
    println!(
        "Parameter sets: {} checked, {} valid, {} invalid",
        checks.len(),
        checks.len() - invalid.len(),
        invalid.len()
    );
    for check in &invalid {
        println!(
            "  ✗ {} ({})",
            check.job_id,
            format_parameters(&check.parameters)
        );
        println!("{}", indent(&check.report.summary(), "      "));
    }

    if !base_report.is_valid() {
        return Err(CliError::Validation(
            "the base geometry has errors".to_string(),
        ));
    }
    if !invalid.is_empty() {
        return Err(CliError::Validation(format!(
            "{} of {} parameter set(s) failed geometry validation",
            invalid.len(),
            checks.len()
        )));
    }
    Ok(())
}
