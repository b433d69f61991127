// src/services/retriever.rs
//! Question answering over the policy index.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::llm::{LanguageModel, PromptMessage};
use super::vector_index::VectorIndex;
use crate::error::AppError;

pub const SYSTEM_PROMPT: &str = "You are RMG’s virtual assistant.
Keep answers under 3–4 sentences.
Guide visitors to understand services and encourage them to contact us.
Do not generate or share full or partial project plans, marketing strategies, frameworks, or documents.
Do not copy or summarise extracts from internal consulting materials.
Instead, explain services in general terms and redirect users to our team for tailored solutions.";

/// "Ask a question, get an answer."
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, AppError>;
}

pub fn build_prompt(context: &str, question: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(SYSTEM_PROMPT),
        PromptMessage::user(format!(
            "Use the following context to answer the question, but DO NOT copy it directly or provide extracts.\n\nContext:\n{context}\n\nQuestion: {question}"
        )),
    ]
}

/// Embeds the question, pulls the `top_k` nearest chunks from the index and
/// asks the model to answer from them.
pub struct RagRetriever {
    index: Arc<VectorIndex>,
    model: Arc<dyn LanguageModel>,
    top_k: usize,
}

impl RagRetriever {
    /// Fails when the index was embedded with a different model than the one
    /// used for queries.
    pub fn new(
        index: Arc<VectorIndex>,
        model: Arc<dyn LanguageModel>,
        top_k: usize,
    ) -> Result<Self, AppError> {
        if index.embedding_model() != model.embedding_model() {
            return Err(AppError::Index(format!(
                "index was built with embedding model '{}' but '{}' is configured; rebuild it with `build-index`",
                index.embedding_model(),
                model.embedding_model()
            )));
        }
        Ok(Self { index, model, top_k })
    }
}

#[async_trait]
impl AnswerService for RagRetriever {
    async fn answer(&self, question: &str) -> Result<String, AppError> {
        let query = self
            .model
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("no embedding returned for question".to_string()))?;

        let hits = self.index.search(&query, self.top_k)?;
        debug!(
            "Retrieved {} chunks (best score {:.3})",
            hits.len(),
            hits.first().map(|h| h.score).unwrap_or_default()
        );

        let context = hits
            .iter()
            .map(|h| h.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        self.model.complete(&build_prompt(&context, question)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::Role;
    use crate::services::vector_index::IndexedChunk;
    use std::sync::Mutex;

    /// Embeds by keyword and echoes the user prompt back as the completion.
    struct KeywordModel {
        prompts: Mutex<Vec<Vec<PromptMessage>>>,
        fail_completion: bool,
    }

    impl KeywordModel {
        fn new() -> Self {
            Self { prompts: Mutex::new(Vec::new()), fail_completion: false }
        }
    }

    #[async_trait]
    impl LanguageModel for KeywordModel {
        fn embedding_model(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
            Ok(inputs
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.contains("web") as u8 as f32,
                        t.contains("marketing") as u8 as f32,
                        t.contains("price") as u8 as f32,
                    ]
                })
                .collect())
        }

        async fn complete(&self, messages: &[PromptMessage]) -> Result<String, AppError> {
            if self.fail_completion {
                return Err(AppError::Upstream("model unavailable".to_string()));
            }
            self.prompts.lock().unwrap().push(messages.to_vec());
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }
    }

    fn index() -> Arc<VectorIndex> {
        let chunk = |id: &str, content: &str, embedding: Vec<f32>| IndexedChunk {
            id: id.to_string(),
            content: content.to_string(),
            embedding,
        };
        Arc::new(
            VectorIndex::new(
                "keyword",
                vec![
                    chunk("1", "We build web platforms.", vec![1.0, 0.0, 0.0]),
                    chunk("2", "We run marketing campaigns.", vec![0.0, 1.0, 0.0]),
                    chunk("3", "Pricing is tailored per project.", vec![0.0, 0.0, 1.0]),
                ],
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn prompt_carries_system_rules_context_and_question() {
        let model = Arc::new(KeywordModel::new());
        let retriever = RagRetriever::new(index(), model.clone(), 1).unwrap();

        let answer = retriever.answer("Do you do web work?").await.unwrap();
        assert!(answer.contains("We build web platforms."));
        assert!(!answer.contains("marketing campaigns"));
        assert!(answer.ends_with("Question: Do you do web work?"));

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0][0].role, Role::System);
        assert_eq!(prompts[0][0].content, SYSTEM_PROMPT);
        assert_eq!(prompts[0][1].role, Role::User);
    }

    #[tokio::test]
    async fn context_joins_top_k_chunks_with_blank_lines() {
        let retriever = RagRetriever::new(index(), Arc::new(KeywordModel::new()), 2).unwrap();
        let answer = retriever.answer("web marketing").await.unwrap();
        assert!(answer.contains("We build web platforms.\n\nWe run marketing campaigns."));
    }

    #[tokio::test]
    async fn same_question_gives_same_answer() {
        let retriever = RagRetriever::new(index(), Arc::new(KeywordModel::new()), 2).unwrap();
        let first = retriever.answer("What is the price?").await.unwrap();
        let second = retriever.answer("What is the price?").await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn index_from_another_embedding_model_is_rejected() {
        let index = Arc::new(
            VectorIndex::new(
                "text-embedding-ada-002",
                vec![IndexedChunk {
                    id: "1".to_string(),
                    content: "We build web platforms.".to_string(),
                    embedding: vec![1.0, 0.0],
                }],
            )
            .unwrap(),
        );
        let result = RagRetriever::new(index, Arc::new(KeywordModel::new()), 4);
        match result {
            Err(AppError::Index(msg)) => {
                assert!(msg.contains("text-embedding-ada-002"));
                assert!(msg.contains("keyword"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("mismatched embedding model was accepted"),
        }
    }

    #[tokio::test]
    async fn completion_failure_propagates() {
        let model = KeywordModel { prompts: Mutex::new(Vec::new()), fail_completion: true };
        let retriever = RagRetriever::new(index(), Arc::new(model), 2).unwrap();
        assert!(matches!(
            retriever.answer("web").await,
            Err(AppError::Upstream(_))
        ));
    }
}
