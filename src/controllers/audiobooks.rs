use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::pipeline::AudiobookServiceApi,
    error::{AppError, AppResult},
    infrastructure::storage::FileStore,
};

use super::documents::attachment_header;

/// Request for POST /api/audiobooks
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAudiobookRequest {
    pub file_name: String,
}

/// Response for POST /api/audiobooks
#[derive(Debug, Serialize, Deserialize)]
pub struct AudiobookResponse {
    pub file_path: String,
}

pub struct AudiobooksController {
    audiobook_service: Arc<dyn AudiobookServiceApi>,
    document_storage: Arc<FileStore>,
    audio_storage: Arc<FileStore>,
}

impl AudiobooksController {
    pub fn new(
        audiobook_service: Arc<dyn AudiobookServiceApi>,
        document_storage: Arc<FileStore>,
        audio_storage: Arc<FileStore>,
    ) -> Self {
        Self {
            audiobook_service,
            document_storage,
            audio_storage,
        }
    }

    /// POST /api/audiobooks - Convert a stored document into an audiobook
    pub async fn create(
        State(controller): State<Arc<AudiobooksController>>,
        Json(request): Json<CreateAudiobookRequest>,
    ) -> AppResult<Json<AudiobookResponse>> {
        if request.file_name.trim().is_empty() {
            return Err(AppError::BadRequest("Filename cannot be empty".to_string()));
        }

        tracing::info!(file_name = %request.file_name, "Processing file for TTS");

        // Locate the document in the upload storage
        let document_path = controller.document_storage.load(&request.file_name).await?;

        let file_path = controller
            .audiobook_service
            .process_document_to_audio(&document_path, &request.file_name)
            .await
            .map_err(AppError::from)?;

        tracing::info!(
            file_name = %request.file_name,
            file_path = %file_path,
            "Successfully generated audiobook"
        );

        Ok(Json(AudiobookResponse { file_path }))
    }

    /// GET /api/audiobooks/:filename - Serve a combined audiobook as attachment
    pub async fn download(
        State(controller): State<Arc<AudiobooksController>>,
        Path(filename): Path<String>,
    ) -> AppResult<(HeaderMap, Body)> {
        let path = controller.audio_storage.load(&filename).await?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to read audiobook: {e}")))?;

        tracing::info!(filename = %filename, size = data.len(), "Serving audiobook");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "application/octet-stream".parse().unwrap(),
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            attachment_header(&filename)
                .map_err(|e| AppError::Internal(format!("invalid filename header: {e}")))?,
        );

        Ok((headers, Body::from(data)))
    }
}
