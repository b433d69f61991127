// src/services/vector_index.rs
//! Static vector index over the embedded policy document.
//!
//! The index is a single `index.json` inside the index directory. It is small
//! (a few hundred chunks at most), so search is a brute-force cosine scan.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a IndexedChunk,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    embedding_model: String,
    dimensions: usize,
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Build an index from embedded chunks. All embeddings must share one
    /// non-zero dimension.
    pub fn new(embedding_model: impl Into<String>, chunks: Vec<IndexedChunk>) -> Result<Self, AppError> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        let index = Self { embedding_model: embedding_model.into(), dimensions, chunks };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.chunks.is_empty() {
            return Err(AppError::Index("index contains no chunks".to_string()));
        }
        if self.dimensions == 0 {
            return Err(AppError::Index("embeddings must not be empty".to_string()));
        }
        if let Some(bad) = self.chunks.iter().find(|c| c.embedding.len() != self.dimensions) {
            return Err(AppError::Index(format!(
                "chunk {} has {} dimensions, expected {}",
                bad.id,
                bad.embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(AppError::IndexMissing(dir.to_path_buf()));
        }

        let raw = std::fs::read_to_string(&path)?;
        let index: VectorIndex = serde_json::from_str(&raw)?;
        index.validate()?;

        info!(
            "Loaded vector index from {} ({} chunks, {} dimensions, model {})",
            dir.display(),
            index.chunks.len(),
            index.dimensions,
            index.embedding_model
        );
        Ok(index)
    }

    pub fn save(&self, dir: &Path) -> Result<(), AppError> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string(self)?;
        std::fs::write(dir.join(INDEX_FILE), json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// The `k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk<'_>>, AppError> {
        if query.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk { chunk, score: cosine_similarity(query, &chunk.embedding) })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Cosine similarity of two equal-length vectors; 0.0 when either is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk { id: id.to_string(), content: format!("content {id}"), embedding }
    }

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_of_identical_and_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0));
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn search_ranks_best_first_and_caps_at_k() {
        let index = VectorIndex::new(
            "test-model",
            vec![
                chunk("a", vec![0.8, 0.2]),
                chunk("b", vec![0.1, 0.9]),
                chunk("c", vec![0.9, 0.0]),
            ],
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "c");
        assert_eq!(hits[1].chunk.id, "a");
    }

    #[test]
    fn search_rejects_dimension_mismatch() {
        let index = VectorIndex::new("test-model", vec![chunk("a", vec![1.0, 0.0])]).unwrap();
        assert!(matches!(index.search(&[1.0, 0.0, 0.0], 1), Err(AppError::Index(_))));
    }

    #[test]
    fn new_rejects_mixed_dimensions() {
        let result = VectorIndex::new(
            "test-model",
            vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0])],
        );
        assert!(matches!(result, Err(AppError::Index(_))));
    }

    #[test]
    fn new_rejects_empty_index() {
        assert!(matches!(VectorIndex::new("test-model", vec![]), Err(AppError::Index(_))));
    }

    #[test]
    fn load_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(VectorIndex::load(&missing), Err(AppError::IndexMissing(_))));
    }

    #[test]
    fn saved_index_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::new(
            "test-model",
            vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])],
        )
        .unwrap();
        index.save(dir.path()).unwrap();

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimensions(), 2);
        assert_eq!(loaded.embedding_model(), "test-model");
        assert_eq!(loaded.search(&[0.0, 1.0], 1).unwrap()[0].chunk.id, "b");
    }
}
