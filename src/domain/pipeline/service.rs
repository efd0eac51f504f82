use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::combiner::AudioCombiner;
use super::dispatcher::BatchDispatcher;
use super::error::PipelineError;
use crate::domain::chunking::{self, ChunkStrategy, TextChunk};
use crate::infrastructure::extraction::DocumentTextExtractor;

/// Chunking knobs for one service instance.
#[derive(Debug, Clone)]
pub struct ChunkingSettings {
    pub strategy: ChunkStrategy,
    pub max_chars: usize,
    pub max_sentences: usize,
}

/// The document-to-audiobook pipeline: PDF path in, combined audio reference
/// out.
pub struct AudiobookService {
    extractor: Arc<dyn DocumentTextExtractor>,
    dispatcher: BatchDispatcher,
    combiner: AudioCombiner,
    chunking: ChunkingSettings,
}

impl AudiobookService {
    pub fn new(
        extractor: Arc<dyn DocumentTextExtractor>,
        dispatcher: BatchDispatcher,
        combiner: AudioCombiner,
        chunking: ChunkingSettings,
    ) -> Self {
        Self {
            extractor,
            dispatcher,
            combiner,
            chunking,
        }
    }

    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>, PipelineError> {
        let chunks = match self.chunking.strategy {
            ChunkStrategy::Chars => chunking::chunk_by_chars(text, self.chunking.max_chars)?,
            ChunkStrategy::Sentences => {
                chunking::chunk_by_sentences(text, self.chunking.max_sentences)?
            }
        };
        Ok(chunks)
    }
}

#[async_trait]
pub trait AudiobookServiceApi: Send + Sync {
    /// Convert one stored document into a single combined audio artifact.
    ///
    /// This operation:
    /// - Extracts the document text and splits it into bounded chunks
    /// - Dispatches chunk batches to the TTS endpoint, rate limited and in
    ///   document order
    /// - Combines the resulting fragments into one output file
    ///
    /// Returns the reference to the combined artifact.
    async fn process_document_to_audio(
        &self,
        document_path: &Path,
        output_name: &str,
    ) -> Result<String, PipelineError>;
}

#[async_trait]
impl AudiobookServiceApi for AudiobookService {
    async fn process_document_to_audio(
        &self,
        document_path: &Path,
        output_name: &str,
    ) -> Result<String, PipelineError> {
        // 1. Validate caller arguments
        if output_name.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "output name cannot be empty".to_string(),
            ));
        }

        tracing::info!(
            document = %document_path.display(),
            output_name = %output_name,
            "Audiobook pipeline started"
        );

        // 2. Extract the document text (existence and encryption checks live
        //    in the extractor)
        let text = self.extractor.extract_text(document_path).await?;

        // 3. Chunk it; a document with no extractable text is not an error
        //    at the chunking layer but ends the pipeline here
        let chunks = self.chunk(&text)?;
        if chunks.is_empty() {
            tracing::warn!(document = %document_path.display(), "No extractable text");
            return Err(PipelineError::NoContent);
        }

        tracing::info!(
            text_length = text.len(),
            chunk_count = chunks.len(),
            "Document chunked"
        );

        // 4. Fan the batches out to the TTS endpoint
        let fragments = self.dispatcher.dispatch(chunks).await?;

        // 5. All-soft-failed dispatch means there is nothing to combine
        if fragments.is_empty() {
            tracing::error!(document = %document_path.display(), "Dispatch produced no fragments");
            return Err(PipelineError::SynthesisFailed);
        }

        tracing::info!(fragment_count = fragments.len(), "Synthesis complete");

        // 6. Combine into the final artifact
        let combined = self.combiner.combine(&fragments, output_name).await?;

        tracing::info!(combined_path = %combined, "Audiobook pipeline finished");

        Ok(combined)
    }
}
