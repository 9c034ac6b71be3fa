//! Pipeline errors

use crate::stage::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Error of a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: lakeflat_core::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write run manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl PipelineError {
    /// Stage that failed, if the failure happened inside one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Underlying core error, if any
    pub fn core_error(&self) -> Option<&lakeflat_core::Error> {
        match self {
            PipelineError::Stage { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for pipeline runs
pub type Result<T> = std::result::Result<T, PipelineError>;
