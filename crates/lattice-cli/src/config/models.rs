use latticegen::engine::config::GenerationConfig;
use std::path::PathBuf;

/// Values given through dedicated command-line flags; they win over every other layer.
#[derive(Debug, Default, Clone)]
pub struct FlagOverrides {
    pub output_base_dir: Option<PathBuf>,
    pub run_id: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub no_validate: bool,
    pub strict: bool,
    pub num_cores: Option<usize>,
    pub solver_command: Option<String>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub core_config: GenerationConfig,
    pub template_dir: Option<PathBuf>,
    pub confirm_threshold: usize,
}
