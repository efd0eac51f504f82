use std::path::{Path, PathBuf};

use crate::error::AppError;

const MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50 MiB
const ALLOWED_EXTENSIONS: &[&str] = &[".pdf"];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("file cannot be empty")]
    EmptyFile,

    #[error("file size {size} exceeds maximum allowed size of {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("invalid file type, only PDF files are allowed")]
    UnsupportedExtension,

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidFilename(_)
            | StorageError::EmptyFile
            | StorageError::UnsupportedExtension => AppError::BadRequest(err.to_string()),
            StorageError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::NotFound(name) => AppError::NotFound(name),
            StorageError::Io(_) => AppError::Internal(err.to_string()),
        }
    }
}

/// Flat filesystem store for one directory of files.
///
/// Filenames are restricted to bare names: anything containing a path
/// separator or a parent reference is rejected before it ever touches the
/// filesystem, so a stored file can only land directly under the root.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tracing::info!(root = %self.root.display(), "Storage directory ready");
        Ok(())
    }

    /// Resolve a bare filename under the root, rejecting traversal attempts.
    fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidFilename(
                "filename cannot be empty".to_string(),
            ));
        }

        let is_bare_name = !trimmed.contains('/')
            && !trimmed.contains('\\')
            && trimmed != "."
            && trimmed != ".."
            && !trimmed.contains("..");
        if !is_bare_name {
            tracing::warn!(filename = %trimmed, "Rejected path traversal attempt");
            return Err(StorageError::InvalidFilename(trimmed.to_string()));
        }

        Ok(self.root.join(trimmed))
    }

    /// Validate and write an uploaded document.
    pub async fn store(&self, filename: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        if data.is_empty() {
            return Err(StorageError::EmptyFile);
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(StorageError::FileTooLarge {
                size: data.len(),
                max: MAX_FILE_SIZE,
            });
        }

        let lowered = filename.trim().to_lowercase();
        if !ALLOWED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
            return Err(StorageError::UnsupportedExtension);
        }

        let destination = self.resolve(filename)?;
        tokio::fs::write(&destination, data).await?;

        tracing::info!(
            filename = %filename,
            size = data.len(),
            "Successfully stored file"
        );

        Ok(destination)
    }

    /// Resolve a stored file, requiring it to exist.
    pub async fn load(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let path = self.resolve(filename)?;

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotFound(filename.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// List the names of all stored files, sorted.
    pub async fn load_all(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Remove every stored file and the root itself.
    pub async fn delete_all(&self) -> Result<(), StorageError> {
        tracing::warn!(root = %self.root.display(), "Deleting all files from storage");
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
