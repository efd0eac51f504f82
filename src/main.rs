use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audiobook_backend::domain::pipeline::{
    AudioCombiner, AudiobookService, BatchDispatcher, ChunkingSettings,
};
use audiobook_backend::infrastructure::config::{Config, LogFormat};
use audiobook_backend::infrastructure::http::start_http_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Audiobook Backend on {}:{}",
        config.host,
        config.port
    );

    // Prepare storage directories
    let document_storage = Arc::new(
        audiobook_backend::infrastructure::storage::FileStore::new(&config.storage_dir),
    );
    document_storage.init().await?;
    let audio_storage = Arc::new(audiobook_backend::infrastructure::storage::FileStore::new(
        &config.audio_dir,
    ));
    audio_storage.init().await?;
    tracing::info!(
        storage_dir = %config.storage_dir,
        audio_dir = %config.audio_dir,
        "Storage initialized"
    );

    let config = Arc::new(config);
    let http_client = reqwest::Client::new();

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject the shared HTTP client)
    tracing::info!("Instantiating repositories...");
    let tts_repository = Arc::new(
        audiobook_backend::infrastructure::repositories::HttpTtsRepository::new(
            http_client.clone(),
            config.tts_url.clone(),
        ),
    );
    let combine_repository = Arc::new(
        audiobook_backend::infrastructure::repositories::HttpCombineRepository::new(
            http_client,
            config.combine_url.clone(),
        ),
    );

    // 2. Instantiate the process-wide rate limiter (one bucket for every
    //    dispatch, across all requests)
    let rate_limiter = Arc::new(
        audiobook_backend::infrastructure::rate_limit::RateLimiter::new(
            config.rate_limit_permits,
            config.rate_limit_refresh,
            config.rate_limit_timeout,
        ),
    );

    // 3. Instantiate the pipeline (inject repositories and limiter)
    tracing::info!("Instantiating pipeline...");
    let extractor = Arc::new(
        audiobook_backend::infrastructure::extraction::PdfTextExtractor::new(),
    );
    let dispatcher = BatchDispatcher::new(
        tts_repository,
        rate_limiter,
        config.batch_size,
        config.worker_pool_size,
        config.shutdown_grace,
    );
    let combiner = AudioCombiner::new(combine_repository);
    let audiobook_service = Arc::new(AudiobookService::new(
        extractor,
        dispatcher,
        combiner,
        ChunkingSettings {
            strategy: config.chunk_strategy.clone().into(),
            max_chars: config.chunk_max_chars,
            max_sentences: config.chunk_max_sentences,
        },
    ));

    // 4. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let documents_controller = Arc::new(
        audiobook_backend::controllers::documents::DocumentsController::new(
            document_storage.clone(),
        ),
    );
    let audiobooks_controller = Arc::new(
        audiobook_backend::controllers::audiobooks::AudiobooksController::new(
            audiobook_service,
            document_storage.clone(),
            audio_storage,
        ),
    );

    // Start HTTP server with all routes
    start_http_server(
        config,
        documents_controller,
        audiobooks_controller,
        document_storage,
    )
    .await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "audiobook_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "audiobook_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
