use latticegen::engine::{builder, code_check, config as core_config, validation};
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub output_base_dir: PathBuf,
    pub source_extension: String,
    pub script_name: String,
    pub validation_enabled: bool,
    pub strict: bool,
    pub tolerance: f64,
    pub thickness_margin: f64,
    pub safety_factor: f64,
    pub max_line_length: usize,
    pub max_whitespace_run: usize,
    pub solver_command: String,
    pub num_cores: usize,
    /// Batches larger than this ask for confirmation unless `--yes` is given.
    pub confirm_threshold: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_base_dir: PathBuf::from("jobs/comsol"),
            source_extension: core_config::DEFAULT_SOURCE_EXTENSION.to_string(),
            script_name: core_config::DEFAULT_SCRIPT_NAME.to_string(),
            validation_enabled: true,
            strict: false,
            tolerance: validation::DEFAULT_TOLERANCE,
            thickness_margin: validation::DEFAULT_THICKNESS_MARGIN,
            safety_factor: builder::DEFAULT_SAFETY_FACTOR,
            max_line_length: code_check::DEFAULT_MAX_LINE_LENGTH,
            max_whitespace_run: code_check::DEFAULT_MAX_WHITESPACE_RUN,
            solver_command: core_config::DEFAULT_SOLVER_COMMAND.to_string(),
            num_cores: core_config::DEFAULT_NUM_CORES,
            confirm_threshold: 10,
        }
    }
}
