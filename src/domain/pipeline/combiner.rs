use std::sync::Arc;

use super::error::PipelineError;
use crate::infrastructure::repositories::CombineRepository;

/// Sends the ordered fragment collection to the remote combine operation and
/// returns the single combined artifact reference. No retries here; retry
/// policy, if any, belongs to the caller.
pub struct AudioCombiner {
    combine_repository: Arc<dyn CombineRepository>,
}

impl AudioCombiner {
    pub fn new(combine_repository: Arc<dyn CombineRepository>) -> Self {
        Self { combine_repository }
    }

    pub async fn combine(
        &self,
        fragments: &[String],
        output_name: &str,
    ) -> Result<String, PipelineError> {
        if fragments.is_empty() {
            return Err(PipelineError::InvalidInput(
                "fragment collection cannot be empty".to_string(),
            ));
        }
        if output_name.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "output name cannot be empty".to_string(),
            ));
        }

        self.combine_repository
            .combine(fragments, output_name)
            .await
            .map_err(PipelineError::CombineFailed)
    }
}
