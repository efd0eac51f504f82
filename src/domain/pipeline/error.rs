use crate::domain::chunking::ChunkingError;
use crate::error::AppError;
use crate::infrastructure::extraction::ExtractionError;
use crate::infrastructure::rate_limit::RateLimitError;
use crate::infrastructure::repositories::RemoteApiError;

/// Hard failure of one batch task. Soft-empty batches are not failures and
/// never appear here.
#[derive(Debug, thiserror::Error)]
pub enum BatchFailure {
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    #[error(transparent)]
    Api(#[from] RemoteApiError),

    #[error("batch task died: {0}")]
    TaskDied(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("document produced no extractable text")]
    NoContent,

    #[error("synthesis failed for batch {batch_index}: {source}")]
    BatchFailed {
        batch_index: usize,
        #[source]
        source: BatchFailure,
    },

    #[error("audio combine failed: {0}")]
    CombineFailed(#[source] RemoteApiError),

    #[error("dispatch produced no audio fragments")]
    SynthesisFailed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ChunkingError> for PipelineError {
    fn from(err: ChunkingError) -> Self {
        PipelineError::InvalidInput(err.to_string())
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::NotFound(_) => PipelineError::InvalidInput(err.to_string()),
            ExtractionError::Encrypted(_)
            | ExtractionError::Malformed(_)
            | ExtractionError::Timeout => PipelineError::UnsupportedDocument(err.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => AppError::BadRequest(msg),
            PipelineError::UnsupportedDocument(msg) => AppError::UnprocessableDocument(msg),
            PipelineError::NoContent => {
                AppError::UnprocessableDocument("document produced no extractable text".to_string())
            }
            PipelineError::BatchFailed { .. }
            | PipelineError::CombineFailed(_)
            | PipelineError::SynthesisFailed => AppError::ExternalService(err.to_string()),
            PipelineError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
