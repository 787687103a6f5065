use super::{format_parameters, indent, load_job, load_renderer};
use crate::cli::GenerateArgs;
use crate::config::{self, AppConfig, FlagOverrides};
use crate::error::{CliError, Result};
use crate::utils::{progress::CliProgressHandler, prompt};
use latticegen::core::models::job::CustomLatticeJob;
use latticegen::engine::config::is_valid_dir_name;
use latticegen::engine::parametric::{generate_parameter_sets, sweep_info};
use latticegen::engine::progress::ProgressReporter;
use latticegen::engine::render::PlaceholderRenderer;
use latticegen::workflows::generate::{StudySummary, generate_job, generate_study};
use std::io;
use tracing::{info, warn};

impl GenerateArgs {
    fn flag_overrides(&self) -> FlagOverrides {
        FlagOverrides {
            output_base_dir: self.output.clone(),
            run_id: self.run_id.clone(),
            template_dir: self.template_dir.clone(),
            no_validate: self.no_validate,
            strict: self.strict,
            num_cores: self.num_cores,
            solver_command: self.solver_command.clone(),
        }
    }
}

pub fn run(args: GenerateArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = config::build_config(&args.config, &args.flag_overrides())?;

    let job = load_job(&args.input)?;
    let renderer = load_renderer(app.template_dir.as_deref())?;

    if !app.core_config.validation.enabled {
        warn!("Geometry validation is disabled; invalid geometries will be generated.");
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if args.single {
        run_single(&job, args.job_id, &app, &renderer, &reporter)
    } else {
        run_batch(&job, args.yes, &app, &renderer, &reporter)
    }
}

fn run_single(
    job: &CustomLatticeJob,
    job_id: Option<String>,
    app: &AppConfig,
    renderer: &PlaceholderRenderer,
    reporter: &ProgressReporter,
) -> Result<()> {
    let mut params = generate_parameter_sets(job)
        .into_iter()
        .next()
        .ok_or_else(|| CliError::Validation("the job expands to no parameter sets".to_string()))?;
    if let Some(job_id) = job_id {
        params.job_id = validate_job_id(job_id)?;
    }

    println!("Generating single job '{}'...", params.job_id);
    let artifacts = generate_job(job, &params, &app.core_config, renderer, reporter)?;

    println!(
        "✓ Job '{}' written to: {}",
        artifacts.job_id,
        artifacts.job_dir.display()
    );
    println!("  Source:   {}", artifacts.source_file.display());
    println!("  Script:   {}", artifacts.script_file.display());
    println!("  Metadata: {}", artifacts.metadata_file.display());
    for warning in &artifacts.warnings {
        println!("  ⚠ {}", warning);
    }
    Ok(())
}

fn validate_job_id(job_id: String) -> Result<String> {
    if is_valid_dir_name(&job_id) {
        Ok(job_id)
    } else {
        Err(CliError::Argument(format!(
            "'{}' is not a valid job id",
            job_id
        )))
    }
}

fn run_batch(
    job: &CustomLatticeJob,
    skip_confirmation: bool,
    app: &AppConfig,
    renderer: &PlaceholderRenderer,
    reporter: &ProgressReporter,
) -> Result<()> {
    let total_jobs = sweep_info(job).total_jobs;
    if total_jobs > app.confirm_threshold && !skip_confirmation {
        let question = format!(
            "This study expands to {} jobs in {}. Continue?",
            total_jobs,
            app.core_config.output.base_dir.display()
        );
        let confirmed = prompt::confirm(&question, &mut io::stdin().lock(), &mut io::stdout())?;
        if !confirmed {
            println!("Aborted; no jobs were generated.");
            return Ok(());
        }
    }

    println!("Generating {} job(s) for '{}'...", total_jobs, job.job.name);
    let summary = generate_study(job, &app.core_config, renderer, reporter)?;
    print_summary(&summary);

    if summary.generated_count() == 0 && summary.total_jobs > 0 {
        return Err(CliError::Validation(format!(
            "all {} job(s) were skipped",
            summary.total_jobs
        )));
    }
    Ok(())
}

fn print_summary(summary: &StudySummary) {
    println!(
        "✓ Run '{}' written to: {}",
        summary.run_id,
        summary.run_dir.display()
    );
    println!(
        "  Generated: {}/{}",
        summary.generated_count(),
        summary.total_jobs
    );
    println!("  Skipped:   {}", summary.skipped_count());
    for skipped in &summary.skipped {
        println!(
            "  ✗ {} [{}] ({})",
            skipped.job_id,
            skipped.stage,
            format_parameters(&skipped.parameters)
        );
        println!("{}", indent(&skipped.error, "      "));
    }
    println!("  Metadata:  {}", summary.metadata_file.display());
}
