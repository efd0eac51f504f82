use serde::Serialize;

/// How extracted text is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Character-bounded windows snapped to sentence/word boundaries.
    Chars,
    /// Fixed number of sentences per chunk.
    Sentences,
}

/// One bounded unit of source text, ordered by `index` within its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    #[error("chunk limit must be positive, got {0}")]
    InvalidLimit(usize),
}

/// Split text into chunks of at most `max_chars` characters, preferring to cut
/// on sentence or word boundaries.
///
/// For every window whose right edge falls before the end of the text, the cut
/// point is moved back to the nearest `". "` boundary, or failing that the
/// nearest space, as long as the boundary lies within the trailing fifth of
/// the window. Chunks are trimmed; empty chunks are dropped.
pub fn chunk_by_chars(text: &str, max_chars: usize) -> Result<Vec<TextChunk>, ChunkingError> {
    if max_chars == 0 {
        return Err(ChunkingError::InvalidLimit(max_chars));
    }

    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total_len {
        let edge = (start + max_chars).min(total_len);

        let cut = if edge < total_len {
            find_cut_point(&chars, start, edge, max_chars)
        } else {
            edge
        };

        let chunk_text: String = chars[start..cut].iter().collect();
        let trimmed = chunk_text.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                index: chunks.len(),
                text: trimmed.to_string(),
            });
        }

        start = cut;
    }

    Ok(chunks)
}

/// Find where to cut a window that does not reach the end of the text.
///
/// Boundaries are only accepted in `[edge - max_chars/5, edge)`, so a cut
/// never shortens the chunk by more than a fifth of the window.
fn find_cut_point(chars: &[char], start: usize, edge: usize, max_chars: usize) -> usize {
    let floor = edge.saturating_sub(max_chars / 5).max(start);

    // Nearest sentence boundary: the space of a ". " pair. Cutting at the
    // space keeps the period in this chunk; the trim drops the space from
    // the next one.
    for i in (floor..edge).rev() {
        if chars[i] == ' ' && i > 0 && chars[i - 1] == '.' {
            return i;
        }
    }

    // Nearest word boundary.
    for i in (floor..edge).rev() {
        if chars[i] == ' ' {
            return i;
        }
    }

    edge
}

/// Split text into chunks of at most `max_sentences` sentences.
///
/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace; the
/// tail after the last terminator counts as a final sentence.
pub fn chunk_by_sentences(
    text: &str,
    max_sentences: usize,
) -> Result<Vec<TextChunk>, ChunkingError> {
    if max_sentences == 0 {
        return Err(ChunkingError::InvalidLimit(max_sentences));
    }

    let sentence_pattern = regex::Regex::new(r"[.!?]+\s+").unwrap();

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut sentences_in_current = 0;
    let mut last_end = 0;

    let mut push_sentence =
        |current: &mut String, sentences_in_current: &mut usize, sentence: &str| {
            current.push_str(sentence);
            *sentences_in_current += 1;
            if *sentences_in_current == max_sentences {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    chunks.push(TextChunk {
                        index: chunks.len(),
                        text: trimmed.to_string(),
                    });
                }
                current.clear();
                *sentences_in_current = 0;
            }
        };

    for mat in sentence_pattern.find_iter(text) {
        push_sentence(
            &mut current,
            &mut sentences_in_current,
            &text[last_end..mat.end()],
        );
        last_end = mat.end();
    }

    // Tail after the last terminator.
    if last_end < text.len() {
        push_sentence(&mut current, &mut sentences_in_current, &text[last_end..]);
    }

    // Flush the final partial chunk.
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(TextChunk {
            index: chunks.len(),
            text: trimmed.to_string(),
        });
    }

    Ok(chunks)
}
