use std::collections::BTreeMap;

use serde::Serialize;
use studymate_core::types::{ChatEntry, DocumentInfo};

/// Aggregate figures over a chat history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatStats {
    pub questions: usize,
    /// Whitespace-separated words across every question and answer.
    pub total_words: usize,
    /// Answers each backend or generator contributed to.
    pub usage: BTreeMap<String, usize>,
}

impl ChatStats {
    pub fn from_history(history: &[ChatEntry]) -> Self {
        let mut stats = Self { questions: history.len(), ..Self::default() };
        for entry in history {
            stats.total_words += entry.question.split_whitespace().count() + entry.answer.split_whitespace().count();
            for label in &entry.contributors {
                *stats.usage.entry(label.clone()).or_insert(0) += 1;
            }
        }
        stats
    }

    pub fn distinct_contributors(&self) -> usize { self.usage.len() }
}

/// Snapshot of what a session can do right now.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub embedding: String,
    pub embedding_available: bool,
    pub backends: Vec<String>,
    pub index_mode: Option<String>,
    pub document: Option<DocumentInfo>,
    pub questions: usize,
}
