pub mod check_code;
pub mod generate;
pub mod info;
pub mod lint;
pub mod validate;

use crate::error::{CliError, Result};
use latticegen::core::io::{toml_job::TomlJobFile, traits::JobDefinitionFile};
use latticegen::core::models::job::CustomLatticeJob;
use latticegen::engine::error::EngineError;
use latticegen::engine::render::PlaceholderRenderer;
use std::path::Path;
use tracing::info;

fn load_job(path: &Path) -> Result<CustomLatticeJob> {
    info!("Loading job definition from {:?}", path);
    TomlJobFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn load_renderer(template_dir: Option<&Path>) -> Result<PlaceholderRenderer> {
    match template_dir {
        Some(dir) => {
            info!("Loading templates from {:?}", dir);
            Ok(PlaceholderRenderer::from_dir(dir).map_err(EngineError::from)?)
        }
        None => Ok(PlaceholderRenderer::builtin()),
    }
}

/// Indents every line of a multi-line report for nesting under a headline.
fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_parameters<'a>(parameters: impl IntoIterator<Item = (&'a String, &'a f64)>) -> String {
    parameters
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn indent_prefixes_each_line() {
        assert_eq!(indent("a\nb", "  "), "  a\n  b");
    }

    #[test]
    fn parameters_are_listed_in_key_order() {
        let mut parameters = BTreeMap::new();
        parameters.insert("sphere.radius".to_string(), 0.4);
        parameters.insert("beam.thickness".to_string(), 0.1);
        assert_eq!(
            format_parameters(&parameters),
            "beam.thickness=0.1, sphere.radius=0.4"
        );
    }

    #[test]
    fn load_job_wraps_schema_errors_with_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.toml");
        fs::write(&path, "[job]\nname = \"Broken\"\n").unwrap();

        let err = load_job(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { ref path, .. } if path.ends_with("job.toml")));
    }

    #[test]
    fn missing_template_dir_is_reported() {
        let dir = tempdir().unwrap();
        let err = load_renderer(Some(&dir.path().join("absent"))).unwrap_err();
        assert!(matches!(err, CliError::Core(EngineError::Render(_))));
    }
}
