use async_trait::async_trait;
use studymate_core::keywords::{extract_keywords, leading_words, rank_by_keywords};
use studymate_core::Error;

use crate::backend::Backend;

pub const FAST_AI_LABEL: &str = "Fast AI";

const SENTENCE_WINDOW: usize = 5;
const MAX_SENTENCES: usize = 2;

/// Local backend that answers by quoting the best matching context
/// sentences. Needs no network and never times out.
#[derive(Debug, Clone)]
pub struct ExtractiveBackend {
    keyword_min_len: usize,
}

impl Default for ExtractiveBackend {
    fn default() -> Self { Self { keyword_min_len: 3 } }
}

impl ExtractiveBackend {
    pub fn new(keyword_min_len: usize) -> Self { Self { keyword_min_len } }

    pub fn extract(&self, question: &str, context: &str) -> studymate_core::Result<String> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let context = if context.trim().is_empty() { "No specific context provided." } else { context };

        let keywords = extract_keywords(question, self.keyword_min_len);
        let sentences: Vec<&str> = context
            .split('.')
            .take(SENTENCE_WINDOW)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let best: Vec<&str> = rank_by_keywords(sentences, &keywords)
            .into_iter()
            .take(MAX_SENTENCES)
            .map(|(_, s, _)| s)
            .collect();

        if best.is_empty() {
            let about: String = question.chars().take(50).collect();
            Ok(format!(
                "Regarding your question about '{about}...': The document contains information about {}. \
                 Please ask more specific questions for detailed answers.",
                leading_words(context, 30)
            ))
        } else {
            Ok(format!("Based on the document: {}", best.join(" ")))
        }
    }
}

#[async_trait]
impl Backend for ExtractiveBackend {
    fn label(&self) -> &str { FAST_AI_LABEL }

    async fn answer(&self, question: &str, context: &str) -> anyhow::Result<String> {
        Ok(self.extract(question, context)?)
    }
}
