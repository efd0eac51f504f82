use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::tts_repository::TtsRepository;
use super::RemoteApiError;

/// Wire request for the TTS endpoint.
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a [String],
}

/// Wire response from the TTS endpoint. `file_paths` is optional so a
/// malformed body surfaces as a soft failure instead of a decode error.
#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    file_paths: Option<Vec<String>>,
}

/// HTTP implementation of the TTS repository
pub struct HttpTtsRepository {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTtsRepository {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl TtsRepository for HttpTtsRepository {
    async fn synthesize_batch(&self, texts: &[String]) -> Result<Vec<String>, RemoteApiError> {
        let start_time = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthesisRequest { text: texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                endpoint = %self.endpoint,
                status = %status.as_u16(),
                batch_len = texts.len(),
                "TTS endpoint returned failure status"
            );
            return Err(RemoteApiError::Status(status));
        }

        let body: SynthesisResponse = response.json().await?;

        let fragments = match body.file_paths {
            Some(paths) => paths,
            None => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    batch_len = texts.len(),
                    "TTS response missing file_paths, treating batch as empty"
                );
                Vec::new()
            }
        };

        tracing::info!(
            endpoint = %self.endpoint,
            batch_len = texts.len(),
            fragment_count = fragments.len(),
            latency_ms = start_time.elapsed().as_millis(),
            "TTS batch synthesized"
        );

        Ok(fragments)
    }
}
