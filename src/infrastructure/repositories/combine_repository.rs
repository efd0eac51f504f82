use async_trait::async_trait;

use super::RemoteApiError;

/// Repository for the remote audio-combine operation.
#[async_trait]
pub trait CombineRepository: Send + Sync {
    /// Combine the ordered fragment references into one artifact named after
    /// `output_name`. Returns the reference to the combined file.
    ///
    /// # Errors
    /// Returns an error if the endpoint is unreachable, answers with a
    /// non-success status, or omits the output reference.
    async fn combine(
        &self,
        fragment_paths: &[String],
        output_name: &str,
    ) -> Result<String, RemoteApiError>;
}
