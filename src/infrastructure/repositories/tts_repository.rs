use async_trait::async_trait;

use super::RemoteApiError;

/// Repository for batch speech synthesis.
/// Abstracts the remote TTS endpoint so the dispatcher can be exercised
/// against mocks.
///
/// Implementations are responsible for:
/// - Issuing one remote call per batch of chunk texts
/// - Returning the fragment references in the order the service produced them
/// - Distinguishing a malformed-but-successful response (empty fragment list)
///   from a transport or status failure (error)
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one batch of chunk texts.
    ///
    /// Returns the audio fragment references for this batch, in service
    /// order. An empty list means the service answered but produced nothing
    /// usable; callers treat that as a soft failure.
    ///
    /// # Errors
    /// Returns an error if the endpoint is unreachable or answers with a
    /// non-success status.
    async fn synthesize_batch(&self, texts: &[String]) -> Result<Vec<String>, RemoteApiError>;
}
