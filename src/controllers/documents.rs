use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    infrastructure::storage::FileStore,
};

/// Response for POST /api/documents
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_name: String,
}

pub struct DocumentsController {
    storage: Arc<FileStore>,
}

impl DocumentsController {
    pub fn new(storage: Arc<FileStore>) -> Self {
        Self { storage }
    }

    /// GET /api/documents - List uploaded document names
    pub async fn list(
        State(controller): State<Arc<DocumentsController>>,
    ) -> AppResult<Json<Vec<String>>> {
        let names = controller.storage.load_all().await?;

        tracing::info!(count = names.len(), "Listed uploaded files");
        Ok(Json(names))
    }

    /// POST /api/documents - Upload a PDF document (multipart `file` field)
    pub async fn upload(
        State(controller): State<Arc<DocumentsController>>,
        mut multipart: Multipart,
    ) -> AppResult<(StatusCode, Json<UploadResponse>)> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
        {
            if field.name() != Some("file") {
                continue;
            }

            let file_name = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::BadRequest("upload is missing a filename".to_string()))?;

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;

            controller.storage.store(&file_name, &data).await?;

            tracing::info!(file_name = %file_name, "Successfully uploaded file");
            return Ok((StatusCode::CREATED, Json(UploadResponse { file_name })));
        }

        Err(AppError::BadRequest(
            "multipart body is missing a `file` field".to_string(),
        ))
    }

    /// GET /api/documents/:filename - Serve a stored document as attachment
    pub async fn serve(
        State(controller): State<Arc<DocumentsController>>,
        Path(filename): Path<String>,
    ) -> AppResult<(HeaderMap, Body)> {
        let path = controller.storage.load(&filename).await?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to read stored file: {e}")))?;

        tracing::info!(filename = %filename, size = data.len(), "Serving file");

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/pdf".parse().unwrap());
        headers.insert(
            header::CONTENT_DISPOSITION,
            attachment_header(&filename)
                .map_err(|e| AppError::Internal(format!("invalid filename header: {e}")))?,
        );

        Ok((headers, Body::from(data)))
    }
}

pub(crate) fn attachment_header(
    filename: &str,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
}
