use tracing::{debug, warn};

use studymate_core::config::RetrievalSettings;
use studymate_core::keywords::{extract_keywords, rank_by_keywords};
use studymate_core::types::{RetrievedChunk, SourceKind};
use studymate_core::{Error, Result};
use studymate_embed::{Embedder, EmbeddingModel};

use crate::flat::{normalize_l2, FlatIpIndex};
use crate::index_build::Index;

/// How much of the document keyword retrieval may scan and keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordBudget {
    pub scan_limit: usize,
    pub top_n: usize,
}

impl KeywordBudget {
    pub const STANDARD: Self = Self { scan_limit: 20, top_n: 3 };
    pub const EXTENDED: Self = Self { scan_limit: 30, top_n: 4 };
}

impl Default for KeywordBudget {
    fn default() -> Self { Self::STANDARD }
}

/// Finds the chunks most relevant to a query. Never fails: every problem
/// degrades to an empty result.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(settings: RetrievalSettings) -> Self { Self { settings } }

    pub fn settings(&self) -> &RetrievalSettings { &self.settings }

    /// `k` caps vector hits only; keyword retrieval keeps `budget.top_n`.
    pub fn search(
        &self,
        query: &str,
        chunks: &[String],
        index: Option<&Index>,
        model: &EmbeddingModel,
        k: usize,
        budget: KeywordBudget,
    ) -> Vec<RetrievedChunk> {
        if query.trim().is_empty() || chunks.is_empty() || k == 0 {
            debug!("nothing to retrieve");
            return Vec::new();
        }
        let Some(index) = index else {
            warn!("retrieval without an index");
            return Vec::new();
        };
        match (index, model.embedder()) {
            (Index::Vector(flat), Some(embedder)) => self.vector_search(query, chunks, flat, embedder, k).unwrap_or_else(|e| {
                warn!(error = %e, "continuing without context");
                Vec::new()
            }),
            (Index::Vector(_), None) => {
                warn!("vector index present but no embedder, using keyword overlap");
                self.keyword_search(query, chunks, budget)
            }
            (Index::FastMode, _) => self.keyword_search(query, chunks, budget),
        }
    }

    /// Like `search`, but when nothing qualifies falls back to the leading
    /// chunks so that some context is always supplied: `max_results` of them
    /// after a vector search, `budget.top_n` after a keyword search.
    pub fn search_or_leading(
        &self,
        query: &str,
        chunks: &[String],
        index: Option<&Index>,
        model: &EmbeddingModel,
        k: usize,
        budget: KeywordBudget,
    ) -> Vec<RetrievedChunk> {
        let hits = self.search(query, chunks, index, model, k, budget);
        if !hits.is_empty() {
            return hits;
        }
        let vector_mode = matches!(index, Some(Index::Vector(_))) && model.is_available();
        leading(chunks, if vector_mode { self.settings.max_results } else { budget.top_n })
    }

    /// Chunk texts for `search`, most relevant first.
    pub fn retrieve(
        &self,
        query: &str,
        chunks: &[String],
        index: Option<&Index>,
        model: &EmbeddingModel,
        k: usize,
    ) -> Vec<String> {
        texts(chunks, &self.search(query, chunks, index, model, k, KeywordBudget::default()))
    }

    fn vector_search(&self, query: &str, chunks: &[String], index: &FlatIpIndex, embedder: &dyn Embedder, k: usize) -> Result<Vec<RetrievedChunk>> {
        let k = k.min(self.settings.max_results).min(chunks.len()).min(index.len());
        if k == 0 { return Ok(Vec::new()); }
        let mut query_vec = embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::RetrievalFailure(format!("query embedding failed: {e}")))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::RetrievalFailure("query embedding came back empty".into()))?;
        if query_vec.len() != index.dim() || !normalize_l2(&mut query_vec) {
            return Err(Error::RetrievalFailure(format!(
                "unusable query embedding (dim {}, expected {})",
                query_vec.len(),
                index.dim()
            )));
        }
        let hits: Vec<RetrievedChunk> = index
            .search(&query_vec, k)
            .into_iter()
            .filter(|(pos, score)| *score > self.settings.similarity_threshold && *pos < chunks.len())
            .filter(|(pos, _)| !chunks[*pos].trim().is_empty())
            .take(self.settings.max_results)
            .map(|(position, score)| RetrievedChunk { position, score, source: SourceKind::Vector })
            .collect();
        debug!(requested = k, returned = hits.len(), "vector retrieval");
        Ok(hits)
    }

    fn keyword_search(&self, query: &str, chunks: &[String], budget: KeywordBudget) -> Vec<RetrievedChunk> {
        let keywords = extract_keywords(query, self.settings.keyword_min_len);
        if keywords.is_empty() {
            debug!("query has no keywords");
            return Vec::new();
        }
        let hits: Vec<RetrievedChunk> = rank_by_keywords(chunks.iter().take(budget.scan_limit).map(String::as_str), &keywords)
            .into_iter()
            .take(budget.top_n)
            .map(|(position, _, score)| RetrievedChunk { position, score: score as f32, source: SourceKind::Keyword })
            .collect();
        debug!(keywords = keywords.len(), returned = hits.len(), "keyword retrieval");
        hits
    }
}

/// The first `n` chunks, unfiltered.
pub fn leading(chunks: &[String], n: usize) -> Vec<RetrievedChunk> {
    (0..n.min(chunks.len()))
        .map(|position| RetrievedChunk { position, score: 0.0, source: SourceKind::Leading })
        .collect()
}

/// Resolve hits to chunk texts, skipping any position out of bounds.
pub fn texts(chunks: &[String], hits: &[RetrievedChunk]) -> Vec<String> {
    hits.iter().filter_map(|h| chunks.get(h.position).cloned()).collect()
}
