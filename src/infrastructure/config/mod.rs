use std::time::Duration;

use serde::Deserialize;
use std::env;

use crate::domain::chunking::ChunkStrategy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    // Remote speech endpoints
    pub tts_url: String,
    pub combine_url: String,
    // Storage
    pub storage_dir: String,
    pub audio_dir: String,
    // Pipeline tuning
    pub worker_pool_size: usize,
    pub batch_size: usize,
    pub rate_limit_permits: u32,
    pub rate_limit_refresh: Duration,
    pub rate_limit_timeout: Duration,
    pub chunk_strategy: ChunkStrategyName,
    pub chunk_max_chars: usize,
    pub chunk_max_sentences: usize,
    pub shutdown_grace: Duration,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategyName {
    Chars,
    Sentences,
}

impl From<ChunkStrategyName> for ChunkStrategy {
    fn from(name: ChunkStrategyName) -> Self {
        match name {
            ChunkStrategyName::Chars => ChunkStrategy::Chars,
            ChunkStrategyName::Sentences => ChunkStrategy::Sentences,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            tts_url: env::var("TTS_URL")?,
            combine_url: env::var("COMBINE_URL")?,
            storage_dir: env::var("STORAGE_DIR").unwrap_or_else(|_| "upload_dir".to_string()),
            audio_dir: env::var("AUDIO_DIR").unwrap_or_else(|_| "audio_files".to_string()),
            worker_pool_size: env::var("WORKER_POOL_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            batch_size: env::var("BATCH_SIZE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            rate_limit_permits: env::var("RATE_LIMIT_PERMITS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            rate_limit_refresh: Duration::from_millis(
                env::var("RATE_LIMIT_REFRESH_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
            ),
            rate_limit_timeout: Duration::from_millis(
                env::var("RATE_LIMIT_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()?,
            ),
            chunk_strategy: env::var("CHUNK_STRATEGY")
                .unwrap_or_else(|_| "chars".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "sentences" => ChunkStrategyName::Sentences,
                    _ => ChunkStrategyName::Chars,
                })?,
            chunk_max_chars: env::var("CHUNK_MAX_CHARS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            chunk_max_sentences: env::var("CHUNK_MAX_SENTENCES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            shutdown_grace: Duration::from_secs(
                env::var("SHUTDOWN_GRACE_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
            ),
        };

        Ok(config)
    }
}
