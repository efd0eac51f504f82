pub mod combiner;
pub mod dispatcher;
pub mod error;
pub mod service;

pub use combiner::AudioCombiner;
pub use dispatcher::BatchDispatcher;
pub use error::{BatchFailure, PipelineError};
pub use service::{AudiobookService, AudiobookServiceApi, ChunkingSettings};

/// Ordered audio fragment references across all batches, in submission order.
pub type FragmentCollection = Vec<String>;
