use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::combine_repository::CombineRepository;
use super::RemoteApiError;

#[derive(Debug, Serialize)]
struct CombineRequest<'a> {
    file_paths: &'a [String],
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CombineResponse {
    file_path: Option<String>,
}

/// HTTP implementation of the combine repository
pub struct HttpCombineRepository {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCombineRepository {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl CombineRepository for HttpCombineRepository {
    async fn combine(
        &self,
        fragment_paths: &[String],
        output_name: &str,
    ) -> Result<String, RemoteApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CombineRequest {
                file_paths: fragment_paths,
                file_name: output_name,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                endpoint = %self.endpoint,
                status = %status.as_u16(),
                fragment_count = fragment_paths.len(),
                "Combine endpoint returned failure status"
            );
            return Err(RemoteApiError::Status(status));
        }

        let body: CombineResponse = response.json().await?;

        // Unlike the TTS call, a combine response without an output reference
        // leaves the caller with nothing to return, so it is a hard failure.
        let combined = body
            .file_path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                RemoteApiError::MalformedResponse("combine response missing file_path".to_string())
            })?;

        tracing::info!(
            endpoint = %self.endpoint,
            fragment_count = fragment_paths.len(),
            combined_path = %combined,
            "Audio fragments combined"
        );

        Ok(combined)
    }
}
