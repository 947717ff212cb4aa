//! Collaborator seams: embedding, document extraction and text normalization.

pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g., `fake:xxh64:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Page-by-page plain-text extraction from an uploaded byte stream.
///
/// The outer error means the whole stream is unusable. Inner errors are
/// per-page and recoverable: the page is skipped.
pub trait DocumentExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> anyhow::Result<Vec<anyhow::Result<String>>>;
}

/// Optional spelling/grammar pass applied to questions before retrieval.
pub trait TextNormalizer: Send + Sync {
    fn correct(&self, text: &str) -> anyhow::Result<String>;
}
