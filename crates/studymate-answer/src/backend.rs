//! Backend seams. A [`Backend`] answers a question from context; a
//! [`Completion`] is a raw text-completion service that [`PromptedBackend`]
//! wraps with one of the prompt styles.

use std::sync::Arc;

use async_trait::async_trait;
use studymate_core::keywords::leading_words;
use studymate_core::traits::TextNormalizer;

use crate::normalize::normalize_or_keep;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Name shown next to this backend's contribution, e.g. `OpenAI`.
    fn label(&self) -> &str;

    async fn answer(&self, question: &str, context: &str) -> anyhow::Result<String>;
}

/// One completion call: a single attempt, no retry.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait Completion: Send + Sync {
    fn label(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;
}

const DETAILED_SYSTEM: &str =
    "You are a helpful AI assistant that answers questions based on PDF documents. Provide accurate, detailed responses.";
const BRIEF_SYSTEM: &str = "You are a helpful assistant. Give concise, accurate answers.";
const BRIEF_CONTEXT_WORDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Full context, long answer.
    #[default]
    Detailed,
    /// Context cut to its first 100 words and a normalized question; short answer.
    Brief,
}

impl PromptStyle {
    pub fn request(self, question: &str, context: &str, normalizer: Option<&dyn TextNormalizer>) -> CompletionRequest {
        match self {
            Self::Detailed => CompletionRequest {
                system: DETAILED_SYSTEM.to_string(),
                prompt: format!(
                    "Based on the following PDF content, answer the question accurately and comprehensively.\n\n\
                     Context from PDF:\n{context}\n\n\
                     Question: {question}\n\n\
                     Please provide a detailed, accurate answer based on the PDF content. \
                     If the information isn't in the PDF, mention that clearly."
                ),
                max_tokens: 500,
                temperature: 0.3,
            },
            Self::Brief => {
                let question = normalize_or_keep(normalizer, question);
                let context = truncate_words(context, BRIEF_CONTEXT_WORDS);
                CompletionRequest {
                    system: BRIEF_SYSTEM.to_string(),
                    prompt: format!(
                        "Answer this question based on the PDF content:\n\n\
                         Context: {context}\n\n\
                         Question: {question}\n\n\
                         Answer briefly and accurately:"
                    ),
                    max_tokens: 150,
                    temperature: 0.2,
                }
            }
        }
    }
}

/// Text longer than `n` words is cut to its first `n` words plus `...`;
/// shorter text is returned unchanged.
pub fn truncate_words(text: &str, n: usize) -> String {
    if text.split_whitespace().count() > n {
        format!("{}...", leading_words(text, n))
    } else {
        text.to_string()
    }
}

/// Adapts a [`Completion`] service into a [`Backend`].
pub struct PromptedBackend<C> {
    client: C,
    style: PromptStyle,
    normalizer: Option<Arc<dyn TextNormalizer>>,
}

impl<C: Completion> PromptedBackend<C> {
    pub fn new(client: C, style: PromptStyle) -> Self {
        Self { client, style, normalizer: None }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn style(&self) -> PromptStyle { self.style }
}

#[async_trait]
impl<C: Completion> Backend for PromptedBackend<C> {
    fn label(&self) -> &str { self.client.label() }

    async fn answer(&self, question: &str, context: &str) -> anyhow::Result<String> {
        let request = self.style.request(question, context, self.normalizer.as_deref());
        let text = self.client.complete(&request).await?;
        Ok(text.trim().to_string())
    }
}
