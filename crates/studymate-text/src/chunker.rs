use tracing::{debug, info, warn};

use studymate_core::config::ChunkingSettings;
use studymate_core::error::{Error, Result};
use studymate_core::traits::DocumentExtractor;

/// Chunks of one document plus the page statistics gathered on the way.
#[derive(Debug, Clone)]
pub struct ChunkedDocument {
    pub chunks: Vec<String>,
    pub pages: usize,
    pub pages_with_text: usize,
}

/// Splits extracted page text into sentence-aligned chunks of at most
/// `max_chars` characters, dropping chunks of `min_chars` or fewer.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
    min_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self { Self::new(&ChunkingSettings::default()) }
}

impl Chunker {
    pub fn new(settings: &ChunkingSettings) -> Self {
        Self { max_chars: settings.max_chars.max(2), min_chars: settings.min_chars }
    }

    pub fn chunk(&self, extractor: &dyn DocumentExtractor, bytes: &[u8]) -> Result<ChunkedDocument> {
        if bytes.is_empty() {
            return Err(Error::EmptyDocument);
        }
        let pages = extractor.extract_pages(bytes).map_err(|e| {
            warn!(error = %e, "document could not be opened");
            Error::EmptyDocument
        })?;
        if pages.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let page_count = pages.len();
        let mut pages_with_text = 0usize;
        let mut raw_chunks = Vec::new();
        for (page_index, page) in pages.into_iter().enumerate() {
            let text = match page {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = page_index + 1, error = %e, "skipping unreadable page");
                    continue;
                }
            };
            if text.trim().is_empty() { continue; }
            pages_with_text += 1;
            raw_chunks.extend(self.chunk_text(&text));
        }
        if pages_with_text == 0 {
            return Err(Error::NoExtractableText);
        }

        let produced = raw_chunks.len();
        let chunks: Vec<String> = raw_chunks
            .into_iter()
            .filter(|c| c.trim().chars().count() > self.min_chars)
            .collect();
        debug!(produced, kept = chunks.len(), "filtered short chunks");
        if chunks.is_empty() {
            return Err(Error::NoValidChunks);
        }
        info!(pages = page_count, pages_with_text, chunks = chunks.len(), "document chunked");
        Ok(ChunkedDocument { chunks, pages: page_count, pages_with_text })
    }

    /// Greedily pack the sentences of one page into chunks. Each sentence is
    /// re-terminated with a period; a chunk is flushed when the next sentence
    /// would push it past `max_chars`.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_len = 0usize;
        for sentence in split_sentences(text) {
            for piece in self.bounded_pieces(&sentence) {
                let piece_len = piece.chars().count() + 1;
                let needed = if buffer.is_empty() { piece_len } else { buffer_len + 1 + piece_len };
                if needed > self.max_chars && !buffer.is_empty() {
                    chunks.push(std::mem::take(&mut buffer));
                    buffer_len = 0;
                }
                if !buffer.is_empty() {
                    buffer.push(' ');
                    buffer_len += 1;
                }
                buffer.push_str(&piece);
                buffer.push('.');
                buffer_len += piece_len;
            }
        }
        if !buffer.is_empty() { chunks.push(buffer); }
        chunks
    }

    // A sentence longer than the chunk budget is cut on word boundaries; a
    // single overlong word is cut on characters.
    fn bounded_pieces(&self, sentence: &str) -> Vec<String> {
        let limit = self.max_chars - 1;
        if sentence.chars().count() <= limit {
            return vec![sentence.to_string()];
        }
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();
            if word_len > limit {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                pieces.extend(chars.chunks(limit).map(|c| c.iter().collect::<String>()));
                continue;
            }
            let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
            if needed > limit {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        if !current.is_empty() { pieces.push(current); }
        pieces
    }
}

/// Split on runs of `.`, `!` and `?`, collapsing internal whitespace.
fn split_sentences(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(['.', '!', '?'])
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
}
