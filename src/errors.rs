//! Error types for the optimization pipeline

use std::path::PathBuf;

use derive_more::{Display, From};
use polytile_passes::ConfigError;
use schedule_tree::ValidationError;

use crate::scop::ScopError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Display, Debug, From)]
#[display("{kind}")]
pub struct PipelineError {
    #[from]
    kind: Box<PipelineErrorKind>,
}

impl<E> From<E> for PipelineError
where
    PipelineErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        PipelineError {
            kind: Box::new(PipelineErrorKind::from(error)),
        }
    }
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        PipelineErrorKind::Io {
            path: path.into(),
            error,
        }
        .into()
    }

    pub fn kind(&self) -> &PipelineErrorKind {
        &self.kind
    }
}

#[derive(Display, Debug)]
pub enum PipelineErrorKind {
    #[display("Cannot read {}: {error}", path.display())]
    Io { path: PathBuf, error: std::io::Error },

    #[display("Malformed SCoP description: {_0}")]
    Json(serde_json::Error),

    #[display("Invalid SCoP: {_0}")]
    Scop(ScopError),

    #[display("Invalid schedule: {_0}")]
    Validation(ValidationError),

    #[display("Invalid configuration: {_0}")]
    Config(ConfigError),
}

impl From<serde_json::Error> for PipelineErrorKind {
    fn from(error: serde_json::Error) -> Self {
        PipelineErrorKind::Json(error)
    }
}

impl From<ScopError> for PipelineErrorKind {
    fn from(error: ScopError) -> Self {
        PipelineErrorKind::Scop(error)
    }
}

impl From<ValidationError> for PipelineErrorKind {
    fn from(error: ValidationError) -> Self {
        PipelineErrorKind::Validation(error)
    }
}

impl From<ConfigError> for PipelineErrorKind {
    fn from(error: ConfigError) -> Self {
        PipelineErrorKind::Config(error)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            PipelineErrorKind::Io { error, .. } => Some(error),
            PipelineErrorKind::Json(e) => Some(e),
            PipelineErrorKind::Scop(e) => Some(e),
            PipelineErrorKind::Validation(e) => Some(e),
            PipelineErrorKind::Config(e) => Some(e),
        }
    }
}
