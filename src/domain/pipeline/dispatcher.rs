use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::error::{BatchFailure, PipelineError};
use super::FragmentCollection;
use crate::domain::chunking::TextChunk;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::repositories::TtsRepository;

/// Outcome of one batch task. A tagged value instead of error control flow,
/// so the order-preserving aggregation below can be tested without I/O.
#[derive(Debug)]
enum BatchOutcome {
    Fragments(Vec<String>),
    Empty,
    Failed(BatchFailure),
}

/// Turns an ordered chunk sequence into an ordered fragment collection by
/// fanning batches out to the TTS endpoint.
///
/// All batches are spawned up front; a semaphore bounds how many run at once,
/// and every worker takes a rate-limiter permit before its remote call.
/// Results are collected by awaiting the batch handles in submission order,
/// which keeps the fragment collection in document order no matter how the
/// batches complete.
pub struct BatchDispatcher {
    tts_repository: Arc<dyn TtsRepository>,
    rate_limiter: Arc<RateLimiter>,
    batch_size: usize,
    pool_size: usize,
    shutdown_grace: Duration,
}

impl BatchDispatcher {
    pub fn new(
        tts_repository: Arc<dyn TtsRepository>,
        rate_limiter: Arc<RateLimiter>,
        batch_size: usize,
        pool_size: usize,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            tts_repository,
            rate_limiter,
            batch_size,
            pool_size,
            shutdown_grace,
        }
    }

    pub async fn dispatch(
        &self,
        chunks: Vec<TextChunk>,
    ) -> Result<FragmentCollection, PipelineError> {
        if self.batch_size == 0 || self.pool_size == 0 {
            return Err(PipelineError::InvalidInput(
                "batch size and pool size must be positive".to_string(),
            ));
        }

        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<Vec<TextChunk>> = chunks
            .chunks(self.batch_size)
            .map(|batch| batch.to_vec())
            .collect();

        tracing::info!(
            chunk_count = batches.iter().map(Vec::len).sum::<usize>(),
            batch_count = batches.len(),
            batch_size = self.batch_size,
            pool_size = self.pool_size,
            "Dispatching chunk batches"
        );

        let handles = self.spawn_batch_tasks(batches);
        self.collect_in_submission_order(handles).await
    }

    fn spawn_batch_tasks(&self, batches: Vec<Vec<TextChunk>>) -> Vec<JoinHandle<BatchOutcome>> {
        let workers = Arc::new(Semaphore::new(self.pool_size));

        batches
            .into_iter()
            .map(|batch| {
                let workers = workers.clone();
                let rate_limiter = self.rate_limiter.clone();
                let repository = self.tts_repository.clone();

                tokio::spawn(async move {
                    let _worker = match workers.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return BatchOutcome::Failed(BatchFailure::TaskDied(
                                "worker pool closed".to_string(),
                            ))
                        }
                    };

                    if let Err(e) = rate_limiter.acquire().await {
                        return BatchOutcome::Failed(e.into());
                    }

                    let texts: Vec<String> = batch.into_iter().map(|chunk| chunk.text).collect();
                    match repository.synthesize_batch(&texts).await {
                        Ok(fragments) if fragments.is_empty() => BatchOutcome::Empty,
                        Ok(fragments) => BatchOutcome::Fragments(fragments),
                        Err(e) => BatchOutcome::Failed(e.into()),
                    }
                })
            })
            .collect()
    }

    async fn collect_in_submission_order(
        &self,
        handles: Vec<JoinHandle<BatchOutcome>>,
    ) -> Result<FragmentCollection, PipelineError> {
        let mut fragments = Vec::new();
        let mut first_failure: Option<PipelineError> = None;
        let mut remaining = Vec::new();

        for (batch_index, handle) in handles.into_iter().enumerate() {
            if first_failure.is_some() {
                remaining.push(handle);
                continue;
            }

            match handle.await {
                Ok(BatchOutcome::Fragments(mut batch_fragments)) => {
                    tracing::debug!(
                        batch_index,
                        fragment_count = batch_fragments.len(),
                        "Batch complete"
                    );
                    fragments.append(&mut batch_fragments);
                }
                Ok(BatchOutcome::Empty) => {
                    tracing::warn!(batch_index, "Batch produced no fragments, continuing");
                }
                Ok(BatchOutcome::Failed(cause)) => {
                    tracing::error!(batch_index, error = %cause, "Batch failed, aborting dispatch");
                    first_failure = Some(PipelineError::BatchFailed {
                        batch_index,
                        source: cause,
                    });
                }
                Err(join_error) => {
                    tracing::error!(batch_index, error = %join_error, "Batch task died, aborting dispatch");
                    first_failure = Some(PipelineError::BatchFailed {
                        batch_index,
                        source: BatchFailure::TaskDied(join_error.to_string()),
                    });
                }
            }
        }

        match first_failure {
            Some(error) => {
                self.shut_down_pool(remaining).await;
                Err(error)
            }
            None => Ok(fragments),
        }
    }

    /// Drain the still-running batch tasks, letting them finish within the
    /// grace period, then force-cancel whatever is left. A forced shutdown is
    /// logged, never escalated.
    async fn shut_down_pool(&self, mut remaining: Vec<JoinHandle<BatchOutcome>>) {
        if remaining.is_empty() {
            return;
        }

        let drained = tokio::time::timeout(self.shutdown_grace, async {
            for handle in remaining.iter_mut() {
                let _ = handle.await;
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                grace_secs = self.shutdown_grace.as_secs(),
                "Worker pool did not drain within grace period, cancelling remaining batches"
            );
            for handle in &remaining {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::RemoteApiError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn chunks(count: usize) -> Vec<TextChunk> {
        (0..count)
            .map(|index| TextChunk {
                index,
                text: format!("chunk-{index}"),
            })
            .collect()
    }

    fn limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(
            1000,
            Duration::from_secs(1),
            Duration::from_secs(30),
        ))
    }

    fn dispatcher(
        repository: Arc<dyn TtsRepository>,
        rate_limiter: Arc<RateLimiter>,
        batch_size: usize,
        pool_size: usize,
    ) -> BatchDispatcher {
        BatchDispatcher::new(
            repository,
            rate_limiter,
            batch_size,
            pool_size,
            Duration::from_secs(60),
        )
    }

    fn batch_index_of(texts: &[String], batch_size: usize) -> usize {
        let chunk_index: usize = texts[0].trim_start_matches("chunk-").parse().unwrap();
        chunk_index / batch_size
    }

    /// Echoes every chunk text back as a fragment, with an optional per-batch
    /// delay inversely proportional to the batch index so later batches
    /// complete first.
    struct EchoTts {
        batch_size: usize,
        total_batches: usize,
        inverse_delays: bool,
        calls: Mutex<Vec<Vec<String>>>,
        in_flight: AtomicUsize,
    }

    impl EchoTts {
        fn new(batch_size: usize, total_batches: usize, inverse_delays: bool) -> Self {
            Self {
                batch_size,
                total_batches,
                inverse_delays,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TtsRepository for EchoTts {
        async fn synthesize_batch(&self, texts: &[String]) -> Result<Vec<String>, RemoteApiError> {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(texts.to_vec());

            if self.inverse_delays {
                let batch_index = batch_index_of(texts, self.batch_size);
                let delay_ms = 100 * (self.total_batches - batch_index) as u64;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(texts.iter().map(|text| format!("audio/{text}.wav")).collect())
        }
    }

    /// Fails the batch at `failing_batch`, succeeds elsewhere.
    struct FailingTts {
        batch_size: usize,
        failing_batch: usize,
        in_flight: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TtsRepository for FailingTts {
        async fn synthesize_batch(&self, texts: &[String]) -> Result<Vec<String>, RemoteApiError> {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let result = if batch_index_of(texts, self.batch_size) == self.failing_batch {
                Err(RemoteApiError::Status(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                ))
            } else {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(texts.to_vec())
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    /// Returns an empty fragment list for one batch, echoes the rest.
    struct SoftEmptyTts {
        batch_size: usize,
        empty_batch: usize,
    }

    #[async_trait]
    impl TtsRepository for SoftEmptyTts {
        async fn synthesize_batch(&self, texts: &[String]) -> Result<Vec<String>, RemoteApiError> {
            if batch_index_of(texts, self.batch_size) == self.empty_batch {
                Ok(Vec::new())
            } else {
                Ok(texts.to_vec())
            }
        }
    }

    struct PanickingTts;

    #[async_trait]
    impl TtsRepository for PanickingTts {
        async fn synthesize_batch(&self, _texts: &[String]) -> Result<Vec<String>, RemoteApiError> {
            panic!("the dispatcher must never call the repository for empty input");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fragments_come_back_in_submission_order() {
        // Inverse delays make batch 2 finish first and batch 0 last.
        let repository = Arc::new(EchoTts::new(3, 3, true));
        let dispatcher = dispatcher(repository.clone(), limiter(), 3, 8);

        let fragments = dispatcher.dispatch(chunks(9)).await.unwrap();

        let expected: Vec<String> = (0..9).map(|i| format!("audio/chunk-{i}.wav")).collect();
        assert_eq!(fragments, expected);
    }

    #[tokio::test]
    async fn test_batches_partition_chunks_without_gaps_or_overlap() {
        let repository = Arc::new(EchoTts::new(3, 3, false));
        let dispatcher = dispatcher(repository.clone(), limiter(), 3, 4);

        dispatcher.dispatch(chunks(7)).await.unwrap();

        let mut calls = repository.calls.lock().unwrap().clone();
        calls.sort_by_key(|texts| batch_index_of(texts, 3));

        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].len(), 3);
        assert_eq!(calls[1].len(), 3);
        assert_eq!(calls[2].len(), 1);

        let rebuilt: Vec<String> = calls.into_iter().flatten().collect();
        let original: Vec<String> = chunks(7).into_iter().map(|c| c.text).collect();
        assert_eq!(rebuilt, original);
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_without_touching_pool_or_limiter() {
        // A zero-permit limiter would fail any acquire; the panicking
        // repository would fail any call. Neither may be reached.
        let starved = Arc::new(RateLimiter::new(
            0,
            Duration::from_secs(1),
            Duration::from_millis(1),
        ));
        let dispatcher = dispatcher(Arc::new(PanickingTts), starved, 5, 10);

        let fragments = dispatcher.dispatch(Vec::new()).await.unwrap();

        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn test_soft_empty_batch_degrades_gracefully() {
        let repository = Arc::new(SoftEmptyTts {
            batch_size: 1,
            empty_batch: 1,
        });
        let dispatcher = dispatcher(repository, limiter(), 1, 4);

        let fragments = dispatcher.dispatch(chunks(3)).await.unwrap();

        // Batch 1 contributes nothing; order of the rest is preserved.
        assert_eq!(fragments, vec!["chunk-0", "chunk-2"]);
    }

    #[tokio::test]
    async fn test_hard_failure_surfaces_first_cause_and_drains_pool() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let repository = Arc::new(FailingTts {
            batch_size: 1,
            failing_batch: 1,
            in_flight: in_flight.clone(),
        });
        let dispatcher = dispatcher(repository, limiter(), 1, 4);

        let err = dispatcher.dispatch(chunks(3)).await.unwrap_err();

        match err {
            PipelineError::BatchFailed {
                batch_index,
                source: BatchFailure::Api(RemoteApiError::Status(status)),
            } => {
                assert_eq!(batch_index, 1);
                assert_eq!(status.as_u16(), 503);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Every worker finished or was cancelled before dispatch returned.
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_twenty_batches_respect_the_rate_limit() {
        let rate_limiter = Arc::new(RateLimiter::new(
            5,
            Duration::from_secs(1),
            Duration::from_secs(30),
        ));
        let repository = Arc::new(EchoTts::new(1, 20, false));
        let dispatcher = dispatcher(repository, rate_limiter, 1, 20);

        let start = tokio::time::Instant::now();
        let fragments = dispatcher.dispatch(chunks(20)).await.unwrap();

        assert_eq!(fragments.len(), 20);
        // 5 permits per period: 20 calls need at least 3 refills.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_invalid_input() {
        let dispatcher = dispatcher(Arc::new(PanickingTts), limiter(), 0, 4);

        let err = dispatcher.dispatch(chunks(3)).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
