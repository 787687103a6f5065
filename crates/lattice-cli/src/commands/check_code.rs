use crate::cli::CheckCodeArgs;
use crate::config::{self, FlagOverrides};
use crate::error::{CliError, Result};
use latticegen::engine::code_check::CodeValidator;

pub fn run(args: CheckCodeArgs) -> Result<()> {
    let app = config::build_config(&args.config, &FlagOverrides::default())?;
    let limits = &app.core_config.code_check;

    let report = CodeValidator::new(limits.max_line_length, limits.max_whitespace_run)
        .validate_source_file(&args.file);

    println!("{}:", args.file.display());
    println!("{}", super::indent(&report.summary(), "  "));

    if report.is_valid() {
        Ok(())
    } else {
        Err(CliError::Validation(format!(
            "{} error(s) in {}",
            report.errors.len(),
            args.file.display()
        )))
    }
}
