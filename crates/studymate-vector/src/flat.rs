//! Exact (flat) inner-product index over L2-normalized vectors.
//!
//! With unit-length rows and queries the inner product equals cosine
//! similarity. Rows remember the chunk position they were built from because
//! indexing may skip chunks.

use serde::{Deserialize, Serialize};

use studymate_core::types::ChunkPosition;

/// Scale `v` to unit L2 length in place. Returns false (leaving `v`
/// untouched) for zero or non-finite vectors.
pub fn normalize_l2(v: &mut [f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON || !norm.is_finite() { return false; }
    for x in v.iter_mut() { *x /= norm; }
    true
}

pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
    positions: Vec<ChunkPosition>,
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new(), positions: Vec::new() } }

    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.positions.len() }
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }
    pub fn positions(&self) -> &[ChunkPosition] { &self.positions }

    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        (row < self.len()).then(|| &self.data[row * self.dim..(row + 1) * self.dim])
    }

    /// Append a row. The caller supplies an already normalized vector.
    pub fn add(&mut self, position: ChunkPosition, vector: &[f32]) -> anyhow::Result<()> {
        anyhow::ensure!(vector.len() == self.dim, "vector has dimension {}, index expects {}", vector.len(), self.dim);
        self.data.extend_from_slice(vector);
        self.positions.push(position);
        Ok(())
    }

    /// The `k` rows with the highest inner product against `query`, best
    /// first; ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(ChunkPosition, f32)> {
        if self.dim == 0 || query.len() != self.dim || k == 0 { return Vec::new(); }
        let mut scored: Vec<(ChunkPosition, f32)> = self
            .data
            .chunks_exact(self.dim)
            .zip(&self.positions)
            .map(|(row, &pos)| (pos, inner_product(row, query)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}
