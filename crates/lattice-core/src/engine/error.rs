use thiserror::Error;

use super::code_check::CodeReport;
use super::config::ConfigError;
use super::render::RenderError;
use super::validation::GeometryReport;
use crate::core::models::ids::{BeamId, SphereId};
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Beam {beam_id} references sphere {sphere_id}, which is not in the sphere list")]
    EndpointNotFound { beam_id: BeamId, sphere_id: SphereId },

    #[error("Geometry validation failed for {job_id}:\n{summary}", summary = report.summary())]
    GeometryInvalid { job_id: String, report: GeometryReport },

    #[error("Rendered code validation failed for {job_id}:\n{summary}", summary = report.summary())]
    CodeInvalid { job_id: String, report: CodeReport },

    #[error("Template rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata for '{path}': {source}", path = path.display())]
    Metadata {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

impl EngineError {
    /// Whether the error concerns one job only, so a batch may skip it and continue.
    pub fn is_job_local(&self) -> bool {
        matches!(
            self,
            Self::EndpointNotFound { .. } | Self::GeometryInvalid { .. } | Self::CodeInvalid { .. }
        )
    }

    /// Pipeline stage a job-local error originates from.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::EndpointNotFound { .. } => Some("resolve"),
            Self::GeometryInvalid { .. } => Some("geometry"),
            Self::CodeInvalid { .. } => Some("code"),
            _ => None,
        }
    }
}
