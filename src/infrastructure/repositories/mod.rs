pub mod combine_repository;
pub mod http_combine_repository;
pub mod http_tts_repository;
pub mod tts_repository;

pub use combine_repository::CombineRepository;
pub use http_combine_repository::HttpCombineRepository;
pub use http_tts_repository::HttpTtsRepository;
pub use tts_repository::TtsRepository;

/// Failure talking to a remote speech endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RemoteApiError {
    #[error("endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("endpoint returned a malformed response: {0}")]
    MalformedResponse(String),
}
