// src/services/index_builder.rs
//! Offline index construction: policy text -> chunks -> embeddings -> disk.

use std::path::Path;

use tracing::info;
use uuid::Uuid;

use super::llm::LanguageModel;
use super::text_splitter::TextSplitter;
use super::vector_index::{IndexedChunk, VectorIndex};
use crate::error::AppError;

const EMBED_BATCH_SIZE: usize = 64;

/// Chunk and embed `text`. Fails on blank input.
pub async fn build_index(
    text: &str,
    splitter: &TextSplitter,
    model: &dyn LanguageModel,
) -> Result<VectorIndex, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Index(
            "source text is empty; add content to generate meaningful embeddings".to_string(),
        ));
    }

    let pieces = splitter.split(text);
    info!(
        "Total chunks created: {} (size {}, overlap {})",
        pieces.len(),
        splitter.chunk_size(),
        splitter.chunk_overlap()
    );

    let mut chunks = Vec::with_capacity(pieces.len());
    for batch in pieces.chunks(EMBED_BATCH_SIZE) {
        let embeddings = model.embed(batch).await?;
        if embeddings.len() != batch.len() {
            return Err(AppError::Upstream(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }
        chunks.extend(batch.iter().zip(embeddings).map(|(content, embedding)| IndexedChunk {
            id: Uuid::new_v4().to_string(),
            content: content.clone(),
            embedding,
        }));
    }

    VectorIndex::new(model.embedding_model(), chunks)
}

/// Read the policy file, build the index and persist it under `index_dir`.
pub async fn build_index_from_file(
    policy_path: &Path,
    index_dir: &Path,
    splitter: &TextSplitter,
    model: &dyn LanguageModel,
) -> Result<VectorIndex, AppError> {
    let text = tokio::fs::read_to_string(policy_path).await.map_err(|e| {
        AppError::Index(format!("cannot read {}: {e}", policy_path.display()))
    })?;

    let index = build_index(&text, splitter, model).await?;
    index.save(index_dir)?;
    info!("Embeddings complete. Stored in {}", index_dir.display());
    Ok(index)
}
