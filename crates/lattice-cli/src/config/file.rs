use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub base_dir: Option<PathBuf>,
    pub run_id: Option<String>,
    pub source_extension: Option<String>,
    pub script_name: Option<String>,
    pub confirm_threshold: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileValidationConfig {
    pub enabled: Option<bool>,
    pub strict: Option<bool>,
    pub tolerance: Option<f64>,
    pub thickness_margin: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileBuilderConfig {
    pub safety_factor: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileCodeCheckConfig {
    pub max_line_length: Option<usize>,
    pub max_whitespace_run: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSolverConfig {
    pub command: Option<String>,
    pub num_cores: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTemplatesConfig {
    pub dir: Option<PathBuf>,
}

/// Generator configuration as written in a TOML file; every field is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub output: Option<FileOutputConfig>,
    pub validation: Option<FileValidationConfig>,
    pub builder: Option<FileBuilderConfig>,
    pub code_check: Option<FileCodeCheckConfig>,
    pub solver: Option<FileSolverConfig>,
    pub templates: Option<FileTemplatesConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
