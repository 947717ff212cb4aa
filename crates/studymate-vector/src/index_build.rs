//! Index construction: embeds chunks into a flat inner-product index, or
//! yields the fast-mode marker when vectors are unavailable.
//!
//! Typical flow:
//! 1) Cap input to `max_chunks`, drop chunks of `min_chunk_chars` or fewer
//! 2) Embed in batches of `batch_size`, validating result shape
//! 3) L2-normalize every vector and add it under its chunk position

use tracing::{debug, info, warn};

use studymate_core::config::IndexSettings;
use studymate_core::error::{Error, Result};
use studymate_embed::{Embedder, EmbeddingModel};

use crate::flat::{normalize_l2, FlatIpIndex};

/// Similarity index for one document.
#[derive(Debug, Clone)]
pub enum Index {
    Vector(FlatIpIndex),
    /// No vectors; retrieval uses keyword overlap.
    FastMode,
}

impl Index {
    pub fn is_fast_mode(&self) -> bool { matches!(self, Self::FastMode) }

    pub fn count(&self) -> usize {
        match self {
            Self::Vector(index) => index.len(),
            Self::FastMode => 0,
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Vector(_) => "vector",
            Self::FastMode => "fast",
        }
    }
}

/// Build the index for `chunks`, degrading to fast mode when the embedding
/// capability is unavailable, fast mode is forced, or vector construction
/// fails. Errors only when there are no chunks at all.
pub fn build_index(chunks: &[String], model: &EmbeddingModel, settings: &IndexSettings) -> Result<Index> {
    if chunks.is_empty() {
        return Err(Error::NoValidChunks);
    }
    if settings.force_fast_mode {
        info!("fast mode forced by configuration");
        return Ok(Index::FastMode);
    }
    let Some(embedder) = model.embedder() else {
        info!(reason = %model.describe(), "no embedding capability, using fast mode");
        return Ok(Index::FastMode);
    };
    match build_vector_index(chunks, embedder, settings) {
        Ok(index) => Ok(Index::Vector(index)),
        Err(e) => {
            warn!(error = %e, "vector index build failed, falling back to fast mode");
            Ok(Index::FastMode)
        }
    }
}

/// Strict vector-mode construction; every failure is reported.
pub fn build_vector_index(chunks: &[String], embedder: &dyn Embedder, settings: &IndexSettings) -> Result<FlatIpIndex> {
    let selected: Vec<(usize, &String)> = chunks
        .iter()
        .enumerate()
        .take(settings.max_chunks)
        .filter(|(_, c)| c.trim().chars().count() > settings.min_chunk_chars)
        .collect();
    if selected.is_empty() {
        return Err(Error::NoValidChunks);
    }
    if chunks.len() > settings.max_chunks {
        debug!(total = chunks.len(), cap = settings.max_chunks, "capping chunks for vector index");
    }

    let mut index: Option<FlatIpIndex> = None;
    for batch in selected.chunks(settings.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|(_, c)| (*c).clone()).collect();
        let embeddings = embedder.embed_batch(&texts).map_err(|e| Error::EmbeddingFailure(e.to_string()))?;
        if embeddings.len() != texts.len() {
            return Err(Error::EmbeddingFailure(format!("expected {} embeddings, got {}", texts.len(), embeddings.len())));
        }
        for ((position, _), mut vector) in batch.iter().zip(embeddings) {
            if vector.is_empty() {
                return Err(Error::EmbeddingFailure("embedding has non-positive dimension".into()));
            }
            let index = index.get_or_insert_with(|| FlatIpIndex::new(vector.len()));
            if !normalize_l2(&mut vector) {
                return Err(Error::EmbeddingFailure(format!("embedding for chunk {position} has zero norm")));
            }
            index.add(*position, &vector).map_err(|e| Error::IndexBuildFailure(e.to_string()))?;
        }
        debug!(batch = texts.len(), "embedded batch");
    }

    let index = index.ok_or_else(|| Error::EmbeddingFailure("embedding returned an empty result".into()))?;
    info!(vectors = index.len(), dim = index.dim(), embedder = embedder.id(), "vector index built");
    Ok(index)
}
