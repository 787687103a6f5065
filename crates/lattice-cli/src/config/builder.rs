use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, FlagOverrides};
use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use latticegen::engine::config::GenerationConfigBuilder;
use tracing::debug;

pub fn build_config(args: &ConfigArgs, flags: &FlagOverrides) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let output_file = file_config.output.take().unwrap_or_default();
    let validation_file = file_config.validation.take().unwrap_or_default();
    let builder_file = file_config.builder.take().unwrap_or_default();
    let code_check_file = file_config.code_check.take().unwrap_or_default();
    let solver_file = file_config.solver.take().unwrap_or_default();
    let templates_file = file_config.templates.take().unwrap_or_default();

    let output_base_dir = flags
        .output_base_dir
        .clone()
        .or(output_file.base_dir)
        .unwrap_or(defaults.output_base_dir);
    let run_id = flags.run_id.clone().or(output_file.run_id);

    let validation_enabled = if flags.no_validate {
        false
    } else {
        validation_file
            .enabled
            .unwrap_or(defaults.validation_enabled)
    };
    let strict = flags.strict || validation_file.strict.unwrap_or(defaults.strict);

    let num_cores = flags
        .num_cores
        .or(solver_file.num_cores)
        .unwrap_or(defaults.num_cores);
    let solver_command = flags
        .solver_command
        .clone()
        .or(solver_file.command)
        .unwrap_or(defaults.solver_command);

    let core_config = GenerationConfigBuilder::new()
        .output_base_dir(output_base_dir)
        .run_id(run_id)
        .source_extension(
            output_file
                .source_extension
                .unwrap_or(defaults.source_extension),
        )
        .script_name(output_file.script_name.unwrap_or(defaults.script_name))
        .validation_enabled(validation_enabled)
        .strict(strict)
        .tolerance(validation_file.tolerance.unwrap_or(defaults.tolerance))
        .thickness_margin(
            validation_file
                .thickness_margin
                .unwrap_or(defaults.thickness_margin),
        )
        .safety_factor(builder_file.safety_factor.unwrap_or(defaults.safety_factor))
        .max_line_length(
            code_check_file
                .max_line_length
                .unwrap_or(defaults.max_line_length),
        )
        .max_whitespace_run(
            code_check_file
                .max_whitespace_run
                .unwrap_or(defaults.max_whitespace_run),
        )
        .solver_command(solver_command)
        .num_cores(num_cores)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(config = ?core_config, "Resolved generation configuration.");

    Ok(AppConfig {
        core_config,
        template_dir: flags.template_dir.clone().or(templates_file.dir),
        confirm_threshold: output_file
            .confirm_threshold
            .unwrap_or(defaults.confirm_threshold),
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;
        let float = || {
            parser::parse_value::<f64>(key, value_str, "float")
                .map_err(|e| CliError::Config(e.to_string()))
        };
        let integer = || {
            parser::parse_value::<usize>(key, value_str, "integer")
                .map_err(|e| CliError::Config(e.to_string()))
        };

        match key {
            "validation.tolerance" => {
                config
                    .validation
                    .get_or_insert_with(Default::default)
                    .tolerance = Some(float()?);
            }
            "validation.thickness-margin" => {
                config
                    .validation
                    .get_or_insert_with(Default::default)
                    .thickness_margin = Some(float()?);
            }
            "validation.strict" => {
                config.validation.get_or_insert_with(Default::default).strict = Some(
                    parser::parse_value::<bool>(key, value_str, "boolean")
                        .map_err(|e| CliError::Config(e.to_string()))?,
                );
            }
            "builder.safety-factor" => {
                config
                    .builder
                    .get_or_insert_with(Default::default)
                    .safety_factor = Some(float()?);
            }
            "code-check.max-line-length" => {
                config
                    .code_check
                    .get_or_insert_with(Default::default)
                    .max_line_length = Some(integer()?);
            }
            "code-check.max-whitespace-run" => {
                config
                    .code_check
                    .get_or_insert_with(Default::default)
                    .max_whitespace_run = Some(integer()?);
            }
            "solver.command" => {
                config.solver.get_or_insert_with(Default::default).command =
                    Some(value_str.to_string());
            }
            "solver.num-cores" => {
                config.solver.get_or_insert_with(Default::default).num_cores = Some(integer()?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    static CONFIG_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("create temp dir"));

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = CONFIG_DIR.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn args_with(config: Option<PathBuf>, set_values: &[&str]) -> ConfigArgs {
        ConfigArgs {
            config,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn defaults_are_used_without_file_or_flags() {
        let app = build_config(&ConfigArgs::default(), &FlagOverrides::default()).unwrap();
        let cfg = app.core_config;
        let defaults = DefaultsConfig::default();

        assert_eq!(cfg.output.base_dir, Path::new("jobs/comsol"));
        assert_eq!(cfg.output.run_id, None);
        assert_eq!(cfg.output.source_extension, "java");
        assert_eq!(cfg.output.script_name, "run.bat");
        assert!(cfg.validation.enabled);
        assert!(!cfg.validation.strict);
        assert_eq!(cfg.validation.tolerance, defaults.tolerance);
        assert_eq!(cfg.safety_factor, 0.99);
        assert_eq!(cfg.code_check.max_line_length, 120);
        assert_eq!(cfg.code_check.max_whitespace_run, 20);
        assert_eq!(cfg.solver.command, "comsol");
        assert_eq!(cfg.solver.num_cores, 4);
        assert_eq!(app.template_dir, None);
        assert_eq!(app.confirm_threshold, 10);
    }

    #[test]
    fn file_values_replace_defaults() {
        let path = write_config(
            "file_values.toml",
            r#"
            [output]
            base-dir = "studies"
            run-id = "run_from_file"
            confirm-threshold = 100

            [validation]
            strict = true
            tolerance = 1e-4

            [builder]
            safety-factor = 0.9

            [solver]
            num-cores = 16

            [templates]
            dir = "my-templates"
            "#,
        );

        let app = build_config(&args_with(Some(path), &[]), &FlagOverrides::default()).unwrap();
        let cfg = app.core_config;

        assert_eq!(cfg.output.base_dir, Path::new("studies"));
        assert_eq!(cfg.output.run_id.as_deref(), Some("run_from_file"));
        assert!(cfg.validation.strict);
        assert_eq!(cfg.validation.tolerance, 1e-4);
        assert_eq!(cfg.safety_factor, 0.9);
        assert_eq!(cfg.solver.num_cores, 16);
        assert_eq!(cfg.solver.command, "comsol");
        assert_eq!(app.template_dir, Some(PathBuf::from("my-templates")));
        assert_eq!(app.confirm_threshold, 100);
    }

    #[test]
    fn set_values_override_file_values() {
        let path = write_config(
            "set_values.toml",
            "[builder]\nsafety-factor = 0.9\n\n[solver]\nnum-cores = 16\n",
        );
        let args = args_with(
            Some(path),
            &[
                "builder.safety-factor=0.8",
                "solver.num-cores=2",
                "solver.command=comsol batch -np 2",
                "validation.thickness-margin=0.05",
                "validation.strict=true",
                "code-check.max-line-length=90",
                "code-check.max-whitespace-run=8",
            ],
        );

        let cfg = build_config(&args, &FlagOverrides::default())
            .unwrap()
            .core_config;

        assert_eq!(cfg.safety_factor, 0.8);
        assert_eq!(cfg.solver.num_cores, 2);
        assert_eq!(cfg.solver.command, "comsol batch -np 2");
        assert_eq!(cfg.validation.thickness_margin, 0.05);
        assert!(cfg.validation.strict);
        assert_eq!(cfg.code_check.max_line_length, 90);
        assert_eq!(cfg.code_check.max_whitespace_run, 8);
    }

    #[test]
    fn flags_override_set_values() {
        let args = args_with(None, &["solver.num-cores=8", "solver.command=from-set"]);
        let flags = FlagOverrides {
            output_base_dir: Some(PathBuf::from("flag-out")),
            run_id: Some("run_flag".to_string()),
            template_dir: Some(PathBuf::from("flag-templates")),
            no_validate: true,
            strict: false,
            num_cores: Some(2),
            solver_command: Some("from-flag".to_string()),
        };

        let app = build_config(&args, &flags).unwrap();
        let cfg = app.core_config;

        assert_eq!(cfg.output.base_dir, Path::new("flag-out"));
        assert_eq!(cfg.output.run_id.as_deref(), Some("run_flag"));
        assert!(!cfg.validation.enabled);
        assert_eq!(cfg.solver.num_cores, 2);
        assert_eq!(cfg.solver.command, "from-flag");
        assert_eq!(app.template_dir, Some(PathBuf::from("flag-templates")));
    }

    #[test]
    fn strict_flag_wins_over_file() {
        let path = write_config("strict.toml", "[validation]\nstrict = false\n");
        let flags = FlagOverrides {
            strict: true,
            ..Default::default()
        };
        let cfg = build_config(&args_with(Some(path), &[]), &flags)
            .unwrap()
            .core_config;
        assert!(cfg.validation.strict);
    }

    #[test]
    fn unsupported_and_malformed_set_values_are_rejected() {
        let err = build_config(
            &args_with(None, &["optimization.num-solutions=3"]),
            &FlagOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unsupported configuration key"));

        let err = build_config(
            &args_with(None, &["solver.num-cores=many"]),
            &FlagOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid integer value"));

        let err = build_config(&args_with(None, &["validation.strict"]), &FlagOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("Expected KEY=VALUE"));
    }

    #[test]
    fn out_of_range_values_fail_in_the_core_builder() {
        let err = build_config(
            &args_with(None, &["builder.safety-factor=1.5"]),
            &FlagOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("safety_factor")));

        let err = build_config(
            &args_with(None, &["validation.tolerance=0"]),
            &FlagOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("tolerance")));
    }
}
