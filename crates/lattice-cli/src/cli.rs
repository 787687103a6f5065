use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "latgen - Validate custom sphere/beam lattice studies and generate one solver job per parameter combination.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate solver jobs for every parameter combination of a lattice study.
    Generate(GenerateArgs),
    /// Validate the schema and geometry of a job definition without writing anything.
    Validate(ValidateArgs),
    /// Print a summary of a job definition and its parametric expansion.
    Info(InfoArgs),
    /// Run the post-render checks on an existing solver source file.
    CheckCode(CheckCodeArgs),
    /// Check solver templates for placeholders the renderer cannot fill.
    LintTemplates(LintTemplatesArgs),
}

/// Generator configuration shared by all commands that read one.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Path to a generator configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S validation.tolerance=1e-5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the job definition file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Base directory that receives the run directory.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Directory holding `solver.java.tpl` and `run.bat.tpl`; the built-in templates are
    /// used otherwise.
    #[arg(short, long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Use a fixed run id instead of a timestamped one.
    #[arg(long, value_name = "ID")]
    pub run_id: Option<String>,

    /// Generate only the first parameter set as a single job.
    #[arg(long)]
    pub single: bool,

    /// Job id to use in single-job mode.
    #[arg(long, value_name = "ID", requires = "single")]
    pub job_id: Option<String>,

    /// Skip geometry validation.
    #[arg(long, conflicts_with = "strict")]
    pub no_validate: bool,

    /// Treat geometry warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Do not ask for confirmation before generating a large batch.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Override the number of solver cores written into the run script.
    #[arg(long, value_name = "INT")]
    pub num_cores: Option<usize>,

    /// Override the solver executable invoked by the run script.
    #[arg(long, value_name = "CMD")]
    pub solver_command: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the job definition file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Treat geometry warnings as errors.
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the job definition file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}

/// Arguments for the `check-code` subcommand.
#[derive(Args, Debug)]
pub struct CheckCodeArgs {
    /// Path to the rendered solver source file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `lint-templates` subcommand.
#[derive(Args, Debug)]
pub struct LintTemplatesArgs {
    /// Directory holding the templates to lint; the built-in templates are linted otherwise.
    #[arg(short, long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_overrides() {
        let cli = Cli::try_parse_from([
            "latgen",
            "-vv",
            "generate",
            "-i",
            "job.toml",
            "-o",
            "out",
            "--run-id",
            "run_a",
            "--strict",
            "-y",
            "-S",
            "builder.safety-factor=0.95",
            "solver.num-cores=8",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate command");
        };
        assert_eq!(args.input, PathBuf::from("job.toml"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.run_id.as_deref(), Some("run_a"));
        assert!(args.strict);
        assert!(args.yes);
        assert!(!args.single);
        assert_eq!(
            args.config.set_values,
            vec!["builder.safety-factor=0.95", "solver.num-cores=8"]
        );
    }

    #[test]
    fn job_id_requires_single_mode() {
        let result = Cli::try_parse_from(["latgen", "generate", "-i", "job.toml", "--job-id", "x"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "latgen", "generate", "-i", "job.toml", "--single", "--job-id", "x",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate command");
        };
        assert!(args.single);
        assert_eq!(args.job_id.as_deref(), Some("x"));
    }

    #[test]
    fn no_validate_conflicts_with_strict() {
        let result = Cli::try_parse_from([
            "latgen",
            "generate",
            "-i",
            "job.toml",
            "--no-validate",
            "--strict",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_kebab_case_subcommands() {
        let cli = Cli::try_parse_from(["latgen", "-q", "check-code", "job_001.java"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::CheckCode(ref a) if a.file == PathBuf::from("job_001.java")));

        let cli = Cli::try_parse_from(["latgen", "lint-templates", "-t", "templates"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::LintTemplates(ref a) if a.template_dir == Some(PathBuf::from("templates"))
        ));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["latgen", "-q", "-v", "info", "-i", "job.toml"]).is_err());
    }
}
