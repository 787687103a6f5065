use super::builder::DEFAULT_SAFETY_FACTOR;
use super::code_check::{DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_WHITESPACE_RUN};
use super::validation::{DEFAULT_THICKNESS_MARGIN, DEFAULT_TOLERANCE};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SOURCE_EXTENSION: &str = "java";
pub const DEFAULT_SCRIPT_NAME: &str = "run.bat";
pub const DEFAULT_SOLVER_COMMAND: &str = "comsol";
pub const DEFAULT_NUM_CORES: usize = 4;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub base_dir: PathBuf,
    /// Fixed run id; a timestamped id is generated when absent.
    pub run_id: Option<String>,
    pub source_extension: String,
    pub script_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    pub enabled: bool,
    /// Promote geometry warnings to errors.
    pub strict: bool,
    pub tolerance: f64,
    pub thickness_margin: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeCheckConfig {
    pub max_line_length: usize,
    pub max_whitespace_run: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub command: String,
    pub num_cores: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub output: OutputConfig,
    pub validation: ValidationConfig,
    pub safety_factor: f64,
    pub code_check: CodeCheckConfig,
    pub solver: SolverConfig,
}

#[derive(Default)]
pub struct GenerationConfigBuilder {
    output_base_dir: Option<PathBuf>,
    run_id: Option<String>,
    source_extension: Option<String>,
    script_name: Option<String>,
    validation_enabled: Option<bool>,
    strict: Option<bool>,
    tolerance: Option<f64>,
    thickness_margin: Option<f64>,
    safety_factor: Option<f64>,
    max_line_length: Option<usize>,
    max_whitespace_run: Option<usize>,
    solver_command: Option<String>,
    num_cores: Option<usize>,
}

impl GenerationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_base_dir(mut self, dir: PathBuf) -> Self {
        self.output_base_dir = Some(dir);
        self
    }
    pub fn run_id(mut self, run_id: Option<String>) -> Self {
        self.run_id = run_id;
        self
    }
    pub fn source_extension(mut self, extension: String) -> Self {
        self.source_extension = Some(extension);
        self
    }
    pub fn script_name(mut self, name: String) -> Self {
        self.script_name = Some(name);
        self
    }
    pub fn validation_enabled(mut self, enabled: bool) -> Self {
        self.validation_enabled = Some(enabled);
        self
    }
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn thickness_margin(mut self, margin: f64) -> Self {
        self.thickness_margin = Some(margin);
        self
    }
    pub fn safety_factor(mut self, factor: f64) -> Self {
        self.safety_factor = Some(factor);
        self
    }
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = Some(length);
        self
    }
    pub fn max_whitespace_run(mut self, run: usize) -> Self {
        self.max_whitespace_run = Some(run);
        self
    }
    pub fn solver_command(mut self, command: String) -> Self {
        self.solver_command = Some(command);
        self
    }
    pub fn num_cores(mut self, n: usize) -> Self {
        self.num_cores = Some(n);
        self
    }

    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        let output = OutputConfig {
            base_dir: self
                .output_base_dir
                .ok_or(ConfigError::MissingParameter("output_base_dir"))?,
            run_id: self.run_id,
            source_extension: self
                .source_extension
                .unwrap_or_else(|| DEFAULT_SOURCE_EXTENSION.to_string()),
            script_name: self
                .script_name
                .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string()),
        };
        if let Some(run_id) = &output.run_id {
            if !is_valid_dir_name(run_id) {
                return Err(invalid("run_id", format!("'{}' is not a valid directory name", run_id)));
            }
        }

        let validation = ValidationConfig {
            enabled: self.validation_enabled.unwrap_or(true),
            strict: self.strict.unwrap_or(false),
            tolerance: self.tolerance.unwrap_or(DEFAULT_TOLERANCE),
            thickness_margin: self.thickness_margin.unwrap_or(DEFAULT_THICKNESS_MARGIN),
        };
        if !(validation.tolerance > 0.0) {
            return Err(invalid("tolerance", "must be positive"));
        }
        if !(validation.thickness_margin >= 0.0) {
            return Err(invalid("thickness_margin", "must not be negative"));
        }

        let safety_factor = self.safety_factor.unwrap_or(DEFAULT_SAFETY_FACTOR);
        if !(safety_factor > 0.0 && safety_factor <= 1.0) {
            return Err(invalid("safety_factor", "must be within (0, 1]"));
        }

        let code_check = CodeCheckConfig {
            max_line_length: self.max_line_length.unwrap_or(DEFAULT_MAX_LINE_LENGTH),
            max_whitespace_run: self.max_whitespace_run.unwrap_or(DEFAULT_MAX_WHITESPACE_RUN),
        };
        if code_check.max_line_length == 0 || code_check.max_whitespace_run == 0 {
            return Err(invalid("code_check", "limits must be positive"));
        }

        let solver = SolverConfig {
            command: self
                .solver_command
                .unwrap_or_else(|| DEFAULT_SOLVER_COMMAND.to_string()),
            num_cores: self.num_cores.unwrap_or(DEFAULT_NUM_CORES),
        };
        if solver.num_cores == 0 {
            return Err(invalid("num_cores", "must be at least 1"));
        }

        Ok(GenerationConfig {
            output,
            validation,
            safety_factor,
            code_check,
            solver,
        })
    }
}

/// Whether `name` names a single directory directly below its parent.
pub fn is_valid_dir_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.into(),
    }
}
